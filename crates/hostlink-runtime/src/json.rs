//! JSON encoding and decoding with `JSON.stringify` / `JSON.parse` semantics
//!
//! - integral numbers print as integers, non-finite numbers as `null`
//! - `undefined` and functions are omitted from objects and become `null`
//!   inside arrays; at top level they have no encoding
//! - proxies encode through their `ownKeys` and `get` traps
//! - nesting deeper than `max_depth` (including any cycle) is a `RangeError`

use hostlink_sdk::{ScriptError, ScriptResult, ScriptRuntime, ScriptValue};
use serde_json::{Map, Number, Value};
use tracing::trace;

use crate::heap::{HeapObject, HeapRuntime};

pub(crate) fn encode(rt: &mut HeapRuntime, value: &ScriptValue) -> ScriptResult<Option<String>> {
    match to_json(rt, value, 0)? {
        Some(tree) => serde_json::to_string(&tree)
            .map(Some)
            .map_err(|e| ScriptError::TypeError(e.to_string())),
        None => Ok(None),
    }
}

pub(crate) fn decode(rt: &mut HeapRuntime, text: &str) -> ScriptResult<ScriptValue> {
    let tree: Value = serde_json::from_str(text)
        .map_err(|e| ScriptError::thrown("SyntaxError", e.to_string()))?;
    Ok(from_json(rt, tree))
}

/// Number in its JSON form
pub fn number_to_json(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 {
        if n >= i64::MIN as f64 && n < i64::MAX as f64 {
            return Value::Number(Number::from(n as i64));
        }
        if n >= 0.0 && n < u64::MAX as f64 {
            return Value::Number(Number::from(n as u64));
        }
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

enum Shape {
    Array(Vec<ScriptValue>),
    Object(Vec<(String, ScriptValue)>),
    Proxy,
    Function,
}

fn to_json(rt: &mut HeapRuntime, value: &ScriptValue, depth: usize) -> ScriptResult<Option<Value>> {
    let id = match value {
        ScriptValue::Undefined => return Ok(None),
        ScriptValue::Null => return Ok(Some(Value::Null)),
        ScriptValue::Bool(b) => return Ok(Some(Value::Bool(*b))),
        ScriptValue::Number(n) => return Ok(Some(number_to_json(*n))),
        ScriptValue::String(s) => return Ok(Some(Value::String(s.clone()))),
        ScriptValue::Object(id) => *id,
    };

    if depth >= rt.options().max_depth {
        return Err(ScriptError::RangeError(format!(
            "maximum encode depth of {} exceeded",
            rt.options().max_depth
        )));
    }

    let shape = match rt.object(id)? {
        HeapObject::Array(items) => Shape::Array(items.clone()),
        HeapObject::Plain(props) => Shape::Object(props.clone()),
        HeapObject::Proxy(_) => Shape::Proxy,
        HeapObject::Function { .. } => Shape::Function,
    };

    match shape {
        Shape::Function => Ok(None),
        Shape::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in &items {
                out.push(to_json(rt, item, depth + 1)?.unwrap_or(Value::Null));
            }
            Ok(Some(Value::Array(out)))
        }
        Shape::Object(props) => {
            let mut out = Map::new();
            for (key, item) in &props {
                if let Some(encoded) = to_json(rt, item, depth + 1)? {
                    out.insert(key.clone(), encoded);
                }
            }
            Ok(Some(Value::Object(out)))
        }
        Shape::Proxy => {
            trace!(target: "hostlink::runtime", object = %id, "encoding proxy through traps");
            let mut out = Map::new();
            for key in rt.own_keys(id)? {
                let item = rt.get_property(id, &key)?;
                if let Some(encoded) = to_json(rt, &item, depth + 1)? {
                    out.insert(key, encoded);
                }
            }
            Ok(Some(Value::Object(out)))
        }
    }
}

fn from_json(rt: &mut HeapRuntime, tree: Value) -> ScriptValue {
    match tree {
        Value::Null => ScriptValue::Null,
        Value::Bool(b) => ScriptValue::Bool(b),
        Value::Number(n) => ScriptValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => ScriptValue::String(s),
        Value::Array(items) => {
            let items = items.into_iter().map(|item| from_json(rt, item)).collect();
            ScriptValue::Object(rt.create_array(items))
        }
        Value::Object(map) => {
            let entries: Vec<(String, ScriptValue)> = map
                .into_iter()
                .map(|(k, v)| (k, from_json(rt, v)))
                .collect();
            rt.object_from(entries)
        }
    }
}
