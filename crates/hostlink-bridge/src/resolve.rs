//! Property resolver
//!
//! Maps a script key on a host value to a field, map entry or method:
//!
//! ```text
//! Pointer  -> pointer method set -> pointee field -> value method set
//! Record   -> field -> value method set
//! Map      -> entry by literal key
//! ```
//!
//! Keys are lower-camel; record members are looked up by the title-cased key.
//! A miss is [`BridgeError::UndefinedProperty`], which callers recover from.

use hostlink_sdk::ScriptValue;
use tracing::trace;

use crate::bridge::CallContext;
use crate::config::BridgeConfig;
use crate::convert::ValueKind;
use crate::error::{BridgeError, BridgeResult};
use crate::host::{HostValue, ObjectRef, Receiver};
use crate::invoke::HostFunction;
use crate::naming::{is_exported, to_host_name, to_script_name};

/// A resolved property
#[derive(Debug, Clone)]
pub enum Property {
    /// Record field
    Field {
        /// Record holding the field
        object: ObjectRef,
        /// Registered field name
        name: &'static str,
        /// Whether the record is reached through a pointer
        addressable: bool,
    },
    /// Map entry
    Entry(HostValue),
    /// Method bound to its receiver
    Method(HostFunction),
}

impl Property {
    /// Current value of the property
    pub fn read(&self) -> BridgeResult<HostValue> {
        match self {
            Property::Field { object, name, .. } => object
                .introspect()
                .read_field(name)?
                .ok_or_else(|| BridgeError::UndefinedProperty {
                    key: to_script_name(name),
                }),
            Property::Entry(value) => Ok(value.clone()),
            Property::Method(f) => Ok(HostValue::Func(f.clone())),
        }
    }

    /// Check if script may assign to this property
    pub fn is_assignable(&self) -> bool {
        match self {
            Property::Field {
                object,
                name,
                addressable,
            } => *addressable && object.introspect().field_writable(name),
            Property::Entry(_) | Property::Method(_) => false,
        }
    }

    /// Declared kind of a field property
    pub fn kind(&self) -> ValueKind {
        match self {
            Property::Field { object, name, .. } => object
                .introspect()
                .field_kind(name)
                .unwrap_or(ValueKind::Other),
            Property::Entry(_) | Property::Method(_) => ValueKind::Other,
        }
    }
}

/// Resolve `key` on `value`
pub fn resolve(value: &HostValue, key: &str) -> BridgeResult<Property> {
    let found = match value {
        HostValue::Pointer(obj) => method(obj, key, Receiver::Pointer)
            .or_else(|| field(obj, key, true))
            .or_else(|| method(obj, key, Receiver::Value)),
        HostValue::Record(obj) => field(obj, key, false).or_else(|| method(obj, key, Receiver::Value)),
        HostValue::Map(map) => map.get(key).cloned().map(Property::Entry),
        _ => None,
    };
    trace!(target: "hostlink::resolve", kind = value.type_name(), key, found = found.is_some(), "resolve");
    found.ok_or_else(|| BridgeError::UndefinedProperty {
        key: key.to_string(),
    })
}

fn field(obj: &ObjectRef, key: &str, addressable: bool) -> Option<Property> {
    let name = obj.introspect().find_field(&to_host_name(key))?;
    is_exported(name).then(|| Property::Field {
        object: obj.clone(),
        name,
        addressable,
    })
}

fn method(obj: &ObjectRef, key: &str, receiver: Receiver) -> Option<Property> {
    let name = to_host_name(key);
    if !is_exported(&name) {
        return None;
    }
    obj.introspect()
        .bind_method(&name, receiver)
        .map(Property::Method)
}

/// Check whether `key` resolves on `value`
pub fn has(value: &HostValue, key: &str) -> bool {
    resolve(value, key).is_ok()
}

/// Current value of `key` on `value`; methods come back bound
pub fn get(value: &HostValue, key: &str) -> BridgeResult<HostValue> {
    resolve(value, key)?.read()
}

/// Assign a script value to `key` on `value`.
///
/// Returns `false` when the property exists but is not an assignable field.
/// Numbers narrow to the field's declared numeric kind while decoding.
pub fn set(
    cx: &mut CallContext<'_>,
    value: &HostValue,
    key: &str,
    new_value: &ScriptValue,
) -> BridgeResult<bool> {
    let property = resolve(value, key)?;
    if !property.is_assignable() {
        trace!(target: "hostlink::resolve", key, "property is not assignable");
        return Ok(false);
    }
    let Property::Field { object, name, .. } = &property else {
        return Ok(false);
    };
    object.introspect().write_field(cx, name, new_value)
}

/// Script-visible keys of `value`: fields then methods, lower-camel,
/// first occurrence kept
pub fn enumerate(value: &HostValue, config: &BridgeConfig) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    let mut push = |key: String| {
        if !keys.contains(&key) {
            keys.push(key);
        }
    };

    match value {
        HostValue::Pointer(obj) | HostValue::Record(obj) => {
            let receiver = match value {
                HostValue::Pointer(_) => Receiver::Pointer,
                _ => Receiver::Value,
            };
            for name in obj.field_names() {
                if is_exported(name) {
                    push(to_script_name(name));
                }
            }
            for name in obj.method_names(receiver) {
                if is_exported(name) {
                    push(to_script_name(name));
                }
            }
        }
        HostValue::Map(map) if config.enumerate_map_keys => {
            for key in map.keys() {
                push(key.clone());
            }
        }
        _ => {}
    }
    keys
}
