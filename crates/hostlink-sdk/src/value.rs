//! ScriptValue — the runtime-side value model
//!
//! Primitives travel inline. Everything with identity (plain objects,
//! arrays, native functions, proxies) is an [`ObjectId`] into the runtime's
//! own heap; two values name the same object iff their ids are equal.
//!
//! ```text
//! undefined | null | bool | number (f64) | string | object(ObjectId)
//! ```

use std::fmt;

/// Identity of an object owned by a script runtime.
///
/// Ids are only meaningful for the runtime that issued them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Create from the runtime's raw slot number
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw slot number
    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId(#{})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A value as observed by script code.
///
/// Numbers are always `f64`, matching the runtime's native number
/// representation; integer widths exist only on the host side.
#[derive(Clone, PartialEq, Default)]
pub enum ScriptValue {
    /// Absent value (missing argument, missing property)
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// String
    String(String),
    /// Heap object (plain object, array, function or proxy)
    Object(ObjectId),
}

impl ScriptValue {
    /// Check if value is `undefined`
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, ScriptValue::Undefined)
    }

    /// Check if value is `null`
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, ScriptValue::Null)
    }

    /// Check if value is `null` or `undefined`
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, ScriptValue::Null | ScriptValue::Undefined)
    }

    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract object id
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            ScriptValue::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Get type name for diagnostics (mirrors `typeof`, with `null` split out)
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Undefined => "undefined",
            ScriptValue::Null => "null",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Object(_) => "object",
        }
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Undefined => write!(f, "ScriptValue::Undefined"),
            ScriptValue::Null => write!(f, "ScriptValue::Null"),
            ScriptValue::Bool(b) => write!(f, "ScriptValue::Bool({})", b),
            ScriptValue::Number(n) => write!(f, "ScriptValue::Number({})", n),
            ScriptValue::String(s) => write!(f, "ScriptValue::String({:?})", s),
            ScriptValue::Object(id) => write!(f, "ScriptValue::Object({})", id),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Bool(b)
    }
}

impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self {
        ScriptValue::Number(n)
    }
}

impl From<i32> for ScriptValue {
    fn from(n: i32) -> Self {
        ScriptValue::Number(n as f64)
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::String(s.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        ScriptValue::String(s)
    }
}

impl From<ObjectId> for ScriptValue {
    fn from(id: ObjectId) -> Self {
        ScriptValue::Object(id)
    }
}
