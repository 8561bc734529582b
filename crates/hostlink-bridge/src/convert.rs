//! Conversion traits between script values and host types
//!
//! [`FromScript`] types are what host functions may take as parameters and
//! what writable fields may hold. Anything `DeserializeOwned + Default` goes
//! through the fallback codec; [`Shared`] resolves a bridged proxy back to
//! its record by identity.
//!
//! [`IntoHost`] types are what host functions may return and fields may
//! expose.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use hostlink_sdk::ScriptValue;
use serde::de::value::Error as DeError;
use serde::de::{DeserializeOwned, IntoDeserializer};

use crate::bridge::CallContext;
use crate::descriptor::Bridged;
use crate::error::{BridgeError, BridgeResult};
use crate::host::{HostValue, Shared};
use crate::invoke::HostFunction;

// ============================================================================
// Declared kinds and numeric coercion
// ============================================================================

/// Declared kind of a field, as far as coercion cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `isize`
    Isize,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `usize`
    Usize,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `String`
    String,
    /// Anything else
    Other,
}

impl ValueKind {
    /// Kind of a Rust type
    pub fn of<T: 'static>() -> Self {
        let id = TypeId::of::<T>();
        let table: [(TypeId, ValueKind); 14] = [
            (TypeId::of::<bool>(), ValueKind::Bool),
            (TypeId::of::<i8>(), ValueKind::I8),
            (TypeId::of::<i16>(), ValueKind::I16),
            (TypeId::of::<i32>(), ValueKind::I32),
            (TypeId::of::<i64>(), ValueKind::I64),
            (TypeId::of::<isize>(), ValueKind::Isize),
            (TypeId::of::<u8>(), ValueKind::U8),
            (TypeId::of::<u16>(), ValueKind::U16),
            (TypeId::of::<u32>(), ValueKind::U32),
            (TypeId::of::<u64>(), ValueKind::U64),
            (TypeId::of::<usize>(), ValueKind::Usize),
            (TypeId::of::<f32>(), ValueKind::F32),
            (TypeId::of::<f64>(), ValueKind::F64),
            (TypeId::of::<String>(), ValueKind::String),
        ];
        table
            .iter()
            .find(|(t, _)| *t == id)
            .map(|(_, kind)| *kind)
            .unwrap_or(ValueKind::Other)
    }

    /// Check for integer or float kinds
    pub fn is_numeric(self) -> bool {
        !matches!(self, ValueKind::Bool | ValueKind::String | ValueKind::Other)
    }

    /// Narrow a script number to this kind; `None` for non-numeric kinds.
    ///
    /// Integers truncate toward zero to `i64` (saturating, NaN is 0) and then
    /// wrap to the declared width. `u64` and `usize` saturate at their own
    /// maximum for large positive numbers. Floats keep NaN and infinities;
    /// `f32` rounds through single precision.
    pub fn coerce_number(self, n: f64) -> Option<Narrowed> {
        let int = truncate(n);
        let narrowed = match self {
            ValueKind::I8 => Narrowed::Int(int as i8 as i64),
            ValueKind::I16 => Narrowed::Int(int as i16 as i64),
            ValueKind::I32 => Narrowed::Int(int as i32 as i64),
            ValueKind::I64 => Narrowed::Int(int),
            ValueKind::Isize => Narrowed::Int(int as isize as i64),
            ValueKind::U8 => Narrowed::Uint(int as u8 as u64),
            ValueKind::U16 => Narrowed::Uint(int as u16 as u64),
            ValueKind::U32 => Narrowed::Uint(int as u32 as u64),
            ValueKind::U64 => Narrowed::Uint(truncate_unsigned(n)),
            ValueKind::Usize => Narrowed::Uint(truncate_unsigned(n) as usize as u64),
            ValueKind::F32 => Narrowed::Float(n as f32 as f64),
            ValueKind::F64 => Narrowed::Float(n),
            ValueKind::Bool | ValueKind::String | ValueKind::Other => return None,
        };
        Some(narrowed)
    }
}

/// A script number already narrowed to a host numeric kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Narrowed {
    /// Signed integer kinds
    Int(i64),
    /// Unsigned integer kinds
    Uint(u64),
    /// `f32` and `f64`
    Float(f64),
}

impl Narrowed {
    /// Deserialize straight from the primitive, without an `f64` or JSON hop
    pub fn decode<T: DeserializeOwned>(self) -> BridgeResult<T> {
        let decoded: Result<T, DeError> = match self {
            Narrowed::Int(i) => T::deserialize(i.into_deserializer()),
            Narrowed::Uint(u) => T::deserialize(u.into_deserializer()),
            Narrowed::Float(f) => T::deserialize(f.into_deserializer()),
        };
        decoded.map_err(|e| BridgeError::decode(std::any::type_name::<T>(), e))
    }
}

#[inline]
fn truncate(n: f64) -> i64 {
    // `as` truncates toward zero, saturates and maps NaN to 0
    n as i64
}

#[inline]
fn truncate_unsigned(n: f64) -> u64 {
    if n >= 0.0 {
        n as u64
    } else {
        truncate(n) as u64
    }
}

// ============================================================================
// Script -> host
// ============================================================================

/// A host type that can be produced from a script value
pub trait FromScript: Sized + Send + 'static {
    /// Convert an argument or assigned value
    fn from_script(cx: &mut CallContext<'_>, value: &ScriptValue) -> BridgeResult<Self>;

    /// Value for a missing trailing argument
    fn zero() -> BridgeResult<Self>;

    /// Declared kind, for numeric coercion
    fn kind() -> ValueKind {
        ValueKind::Other
    }

    /// Name used in signatures and diagnostics
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<T> FromScript for T
where
    T: DeserializeOwned + Default + Send + 'static,
{
    fn from_script(cx: &mut CallContext<'_>, value: &ScriptValue) -> BridgeResult<Self> {
        if let ScriptValue::Number(n) = value {
            if let Some(narrowed) = Self::kind().coerce_number(*n) {
                return narrowed.decode();
            }
        }
        cx.decode::<T>(value)
    }

    fn zero() -> BridgeResult<Self> {
        Ok(T::default())
    }

    fn kind() -> ValueKind {
        ValueKind::of::<T>()
    }
}

impl<T: Bridged> FromScript for Shared<T> {
    fn from_script(cx: &mut CallContext<'_>, value: &ScriptValue) -> BridgeResult<Self> {
        match cx.proxied(value)? {
            Some(host) => host
                .as_object()
                .and_then(|obj| obj.downcast::<T>())
                .ok_or_else(|| BridgeError::mismatch(T::type_name(), host.type_name())),
            None => Err(BridgeError::mismatch(
                format!("proxied {}", T::type_name()),
                value.type_name(),
            )),
        }
    }

    fn zero() -> BridgeResult<Self> {
        Err(BridgeError::Argument(format!(
            "missing required argument of type {}",
            T::type_name()
        )))
    }

    fn type_name() -> &'static str {
        T::type_name()
    }
}

impl FromScript for HostValue {
    fn from_script(cx: &mut CallContext<'_>, value: &ScriptValue) -> BridgeResult<Self> {
        if let Some(host) = cx.proxied(value)? {
            return Ok(host);
        }
        Ok(cx.decode_tree(value)?.map(host_from_json).unwrap_or(HostValue::Nil))
    }

    fn zero() -> BridgeResult<Self> {
        Ok(HostValue::Nil)
    }
}

/// Raw script value, passed through untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Raw(pub ScriptValue);

impl Raw {
    /// Unwrap
    pub fn into_inner(self) -> ScriptValue {
        self.0
    }
}

impl FromScript for Raw {
    fn from_script(_cx: &mut CallContext<'_>, value: &ScriptValue) -> BridgeResult<Self> {
        Ok(Raw(value.clone()))
    }

    fn zero() -> BridgeResult<Self> {
        Ok(Raw(ScriptValue::Undefined))
    }
}

/// Build a host tree from a decoded payload
pub fn host_from_json(value: serde_json::Value) -> HostValue {
    match value {
        serde_json::Value::Null => HostValue::Nil,
        serde_json::Value::Bool(b) => HostValue::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                HostValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                HostValue::Uint(u)
            } else {
                HostValue::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => HostValue::Str(s),
        serde_json::Value::Array(items) => {
            HostValue::List(items.into_iter().map(host_from_json).collect())
        }
        serde_json::Value::Object(map) => HostValue::Map(Arc::new(
            map.into_iter().map(|(k, v)| (k, host_from_json(v))).collect(),
        )),
    }
}

// ============================================================================
// Host -> script
// ============================================================================

/// A host type the bridge can expose to script
pub trait IntoHost {
    /// Convert into the dynamic host view
    fn into_host(self) -> HostValue;
}

impl IntoHost for HostValue {
    fn into_host(self) -> HostValue {
        self
    }
}

impl IntoHost for bool {
    fn into_host(self) -> HostValue {
        HostValue::Bool(self)
    }
}

macro_rules! impl_into_host_int {
    ($($t:ty),*) => {
        $(impl IntoHost for $t {
            fn into_host(self) -> HostValue {
                HostValue::Int(self as i64)
            }
        })*
    };
}

macro_rules! impl_into_host_uint {
    ($($t:ty),*) => {
        $(impl IntoHost for $t {
            fn into_host(self) -> HostValue {
                HostValue::Uint(self as u64)
            }
        })*
    };
}

impl_into_host_int!(i8, i16, i32, i64, isize);
impl_into_host_uint!(u8, u16, u32, u64, usize);

impl IntoHost for f32 {
    fn into_host(self) -> HostValue {
        HostValue::Float(self as f64)
    }
}

impl IntoHost for f64 {
    fn into_host(self) -> HostValue {
        HostValue::Float(self)
    }
}

impl IntoHost for String {
    fn into_host(self) -> HostValue {
        HostValue::Str(self)
    }
}

impl IntoHost for &str {
    fn into_host(self) -> HostValue {
        HostValue::Str(self.to_string())
    }
}

impl IntoHost for char {
    fn into_host(self) -> HostValue {
        HostValue::Str(self.to_string())
    }
}

impl<T: IntoHost> IntoHost for Vec<T> {
    fn into_host(self) -> HostValue {
        HostValue::List(self.into_iter().map(IntoHost::into_host).collect())
    }
}

impl<T: IntoHost> IntoHost for Option<T> {
    fn into_host(self) -> HostValue {
        self.map(IntoHost::into_host).unwrap_or(HostValue::Nil)
    }
}

impl<T: Bridged> IntoHost for Shared<T> {
    fn into_host(self) -> HostValue {
        HostValue::pointer(&self)
    }
}

impl IntoHost for HostFunction {
    fn into_host(self) -> HostValue {
        HostValue::Func(self)
    }
}

impl<V: IntoHost> IntoHost for BTreeMap<String, V> {
    fn into_host(self) -> HostValue {
        HostValue::map(self.into_iter().map(|(k, v)| (k, v.into_host())))
    }
}

impl<V: IntoHost> IntoHost for HashMap<String, V> {
    fn into_host(self) -> HostValue {
        HostValue::map(self.into_iter().map(|(k, v)| (k, v.into_host())))
    }
}

impl IntoHost for serde_json::Value {
    fn into_host(self) -> HostValue {
        host_from_json(self)
    }
}
