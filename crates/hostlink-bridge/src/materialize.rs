//! Struct materializer
//!
//! Copies a record onto a plain script object once: every exported method is
//! bound and wrapped, every exported field is marshaled (nested records
//! become proxies). Later changes on either side are not reflected.

use hostlink_sdk::{ObjectId, ScriptValue};
use tracing::debug;

use crate::bridge::CallContext;
use crate::error::{BridgeError, BridgeResult};
use crate::host::{HostValue, Receiver};
use crate::marshal;
use crate::naming::{is_exported, to_script_name};

pub(crate) fn push_struct(cx: &mut CallContext<'_>, value: &HostValue) -> BridgeResult<ObjectId> {
    let (obj, receiver) = match value {
        HostValue::Pointer(obj) => (obj, Receiver::Pointer),
        HostValue::Record(obj) => (obj, Receiver::Value),
        other => return Err(BridgeError::NotARecord(other.type_name().to_string())),
    };

    let target = cx.runtime().create_object();

    for name in obj.method_names(receiver) {
        if !is_exported(name) {
            continue;
        }
        if let Some(f) = obj.introspect().bind_method(name, receiver) {
            let callable = marshal::wrap_function(cx, f);
            cx.runtime()
                .put_property(target, &to_script_name(name), ScriptValue::Object(callable))?;
        }
    }

    for name in obj.field_names() {
        if !is_exported(name) {
            continue;
        }
        let field = match obj.introspect().read_field(name)? {
            Some(HostValue::Nil) | None => continue,
            Some(field) => field,
        };
        let pushed = marshal::push_value(cx, field)?;
        cx.runtime()
            .put_property(target, &to_script_name(name), pushed)?;
    }

    debug!(target: "hostlink::marshal", type_name = obj.type_name(), object = %target, "materialized record");
    Ok(target)
}
