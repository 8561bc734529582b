//! Host -> script value marshaling

use hostlink_sdk::{native_fn, ObjectId, ScriptValue};
use tracing::{debug, warn};

use crate::bridge::CallContext;
use crate::error::BridgeResult;
use crate::host::HostValue;
use crate::invoke::HostFunction;
use crate::proxy;

/// Push one host value into script.
///
/// Primitives travel directly, lists become arrays, records, pointers and
/// maps are proxied and functions are wrapped. Values without a script
/// representation become `null`.
pub(crate) fn push_value(cx: &mut CallContext<'_>, value: HostValue) -> BridgeResult<ScriptValue> {
    Ok(match value {
        HostValue::Nil => ScriptValue::Null,
        HostValue::Bool(b) => ScriptValue::Bool(b),
        HostValue::Int(i) => ScriptValue::Number(i as f64),
        HostValue::Uint(u) => ScriptValue::Number(u as f64),
        HostValue::Float(f) => ScriptValue::Number(f),
        HostValue::Str(s) => ScriptValue::String(s),
        HostValue::List(items) => {
            let mut elements = Vec::with_capacity(items.len());
            for item in items {
                elements.push(push_value(cx, item)?);
            }
            ScriptValue::Object(cx.runtime().create_array(elements))
        }
        HostValue::Map(_) if !cx.config().proxy_maps => {
            debug!(target: "hostlink::marshal", "map proxying disabled, pushing null");
            ScriptValue::Null
        }
        value @ (HostValue::Record(_) | HostValue::Pointer(_) | HostValue::Map(_)) => {
            ScriptValue::Object(proxy::install(cx, value)?)
        }
        HostValue::Func(f) => ScriptValue::Object(wrap_function(cx, f)),
        HostValue::Unsupported(type_name) => {
            debug!(target: "hostlink::marshal", type_name, "no script representation, pushing null");
            ScriptValue::Null
        }
    })
}

/// Push an ordered list of host values as one script array
pub(crate) fn push_values(
    cx: &mut CallContext<'_>,
    values: Vec<HostValue>,
) -> BridgeResult<ScriptValue> {
    push_value(cx, HostValue::List(values))
}

/// Push the settled results of a host call: nothing is `undefined`, one
/// result is itself, several are an array
pub(crate) fn push_returns(
    cx: &mut CallContext<'_>,
    mut values: Vec<HostValue>,
) -> BridgeResult<ScriptValue> {
    match values.len() {
        0 => Ok(ScriptValue::Undefined),
        1 => push_value(cx, values.remove(0)),
        _ => push_values(cx, values),
    }
}

/// Expose a host function as a script callable.
///
/// Errors raised by the call are thrown into script as exceptions.
pub(crate) fn wrap_function(cx: &mut CallContext<'_>, f: HostFunction) -> ObjectId {
    let bridge = cx.bridge().clone();
    let name = f.name().to_string();
    let callable = native_fn(move |rt, args| {
        let mut cx = CallContext::new(&bridge, rt);
        f.call_from_script(&mut cx, args).map_err(|e| {
            warn!(target: "hostlink::invoke", function = %f.name(), error = %e, "host call failed");
            e.into_script_error()
        })
    });
    cx.runtime().create_function(&name, callable)
}
