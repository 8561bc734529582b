//! Host-side value model
//!
//! [`HostValue`] is the dynamic view the bridge takes of any host value that
//! crosses into script. Records are reached through [`ObjectRef`], a
//! type-erased handle onto a [`Shared`] record and its capability table.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use hostlink_sdk::ScriptValue;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::bridge::CallContext;
use crate::convert::ValueKind;
use crate::descriptor::{Bridged, RecordCell};
use crate::error::{BridgeError, BridgeResult};
use crate::invoke::HostFunction;

// ============================================================================
// Shared records
// ============================================================================

/// Shared, lock-protected ownership of a host record.
///
/// This is the host "pointer to record": proxies of a `Shared<T>` read and
/// write the live value, and passing the proxy back into a host function
/// taking `Shared<T>` yields the same allocation.
pub struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    /// Wrap a value
    pub fn new(value: T) -> Self {
        Shared(Arc::new(RwLock::new(value)))
    }

    /// Lock for reading (blocking)
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    /// Lock for writing (blocking)
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }

    /// Check if both point at the same allocation
    pub fn ptr_eq(&self, other: &Shared<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn try_read(&self) -> BridgeResult<RwLockReadGuard<'_, T>> {
        self.0.try_read().ok_or(BridgeError::Busy {
            type_name: std::any::type_name::<T>(),
        })
    }

    pub(crate) fn try_write(&self) -> BridgeResult<RwLockWriteGuard<'_, T>> {
        self.0.try_write().ok_or(BridgeError::Busy {
            type_name: std::any::type_name::<T>(),
        })
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared(Arc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Some(value) => f.debug_tuple("Shared").field(&*value).finish(),
            None => f.write_str("Shared(<locked>)"),
        }
    }
}

// ============================================================================
// Type-erased records
// ============================================================================

/// Which method set a lookup consults.
///
/// A by-value record only has its value-receiver methods; a pointer has
/// both, with pointer-receiver methods taking priority on a name clash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// Value method set
    Value,
    /// Pointer method set
    Pointer,
}

/// Type-erased access to a record and its capability table
pub(crate) trait Introspect: Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Registered field names, declaration order
    fn field_names(&self) -> Vec<&'static str>;

    /// Registered name matching `name` exactly
    fn find_field(&self, name: &str) -> Option<&'static str>;

    fn field_kind(&self, name: &str) -> Option<ValueKind>;

    fn field_writable(&self, name: &str) -> bool;

    /// Current value of a field; `None` if there is no such field
    fn read_field(&self, name: &str) -> BridgeResult<Option<HostValue>>;

    /// Decode `value` into the field and assign it; `false` if the field
    /// does not exist or is read-only
    fn write_field(
        &self,
        cx: &mut CallContext<'_>,
        name: &str,
        value: &ScriptValue,
    ) -> BridgeResult<bool>;

    fn method_names(&self, receiver: Receiver) -> Vec<&'static str>;

    fn bind_method(&self, name: &str, receiver: Receiver) -> Option<HostFunction>;

    /// Address of the underlying allocation
    fn identity(&self) -> usize;

    fn as_any(&self) -> &dyn Any;
}

/// Reference to a shared record, erased over its type
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn Introspect>);

impl ObjectRef {
    /// Erase a shared record
    pub fn new<T: Bridged>(shared: Shared<T>) -> Self {
        ObjectRef(Arc::new(RecordCell::new(shared)))
    }

    /// Registered type name
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// Recover the typed record
    pub fn downcast<T: Bridged>(&self) -> Option<Shared<T>> {
        self.0
            .as_any()
            .downcast_ref::<RecordCell<T>>()
            .map(|cell| cell.shared().clone())
    }

    /// Check if both refer to the same record
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        self.0.identity() == other.0.identity()
    }

    /// Registered field names, declaration order
    pub fn field_names(&self) -> Vec<&'static str> {
        self.0.field_names()
    }

    /// Names of the methods in the given method set
    pub fn method_names(&self, receiver: Receiver) -> Vec<&'static str> {
        self.0.method_names(receiver)
    }

    pub(crate) fn introspect(&self) -> &dyn Introspect {
        &*self.0
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.0.type_name(), self.0.identity())
    }
}

// ============================================================================
// HostValue
// ============================================================================

/// A host value as seen by the bridge
#[derive(Clone, Default)]
pub enum HostValue {
    /// Nil pointer, `None`, unit
    #[default]
    Nil,
    /// Boolean
    Bool(bool),
    /// Signed integer of any width
    Int(i64),
    /// Unsigned integer of any width
    Uint(u64),
    /// Floating point of any width
    Float(f64),
    /// String
    Str(String),
    /// Ordered sequence
    List(Vec<HostValue>),
    /// String-keyed map; read-only from script
    Map(Arc<BTreeMap<String, HostValue>>),
    /// By-value snapshot of a record; fields are not writable
    Record(ObjectRef),
    /// Live shared record; fields are writable
    Pointer(ObjectRef),
    /// Callable
    Func(HostFunction),
    /// Value with no script representation (marshals to `null`)
    Unsupported(&'static str),
}

impl HostValue {
    /// Live pointer to a shared record
    pub fn pointer<T: Bridged>(shared: &Shared<T>) -> Self {
        HostValue::Pointer(ObjectRef::new(shared.clone()))
    }

    /// By-value snapshot of a record
    pub fn record<T: Bridged>(value: T) -> Self {
        HostValue::Record(ObjectRef::new(Shared::new(value)))
    }

    /// String-keyed map
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, HostValue)>,
    {
        HostValue::Map(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Check if value is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, HostValue::Nil)
    }

    /// Record behind a `Record` or `Pointer`
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            HostValue::Record(obj) | HostValue::Pointer(obj) => Some(obj),
            _ => None,
        }
    }

    /// Extract a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract any number as `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Int(i) => Some(*i as f64),
            HostValue::Uint(u) => Some(*u as f64),
            HostValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Extract a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Nil => "nil",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Uint(_) => "uint",
            HostValue::Float(_) => "float",
            HostValue::Str(_) => "string",
            HostValue::List(_) => "list",
            HostValue::Map(_) => "map",
            HostValue::Record(obj) | HostValue::Pointer(obj) => obj.type_name(),
            HostValue::Func(_) => "func",
            HostValue::Unsupported(name) => name,
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Nil, HostValue::Nil) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Uint(a), HostValue::Uint(b)) => a == b,
            (HostValue::Float(a), HostValue::Float(b)) => a == b,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::List(a), HostValue::List(b)) => a == b,
            (HostValue::Map(a), HostValue::Map(b)) => a == b,
            (HostValue::Record(a), HostValue::Record(b))
            | (HostValue::Pointer(a), HostValue::Pointer(b)) => a.ptr_eq(b),
            (HostValue::Func(a), HostValue::Func(b)) => a.ptr_eq(b),
            (HostValue::Unsupported(a), HostValue::Unsupported(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Nil => write!(f, "Nil"),
            HostValue::Bool(b) => write!(f, "Bool({})", b),
            HostValue::Int(i) => write!(f, "Int({})", i),
            HostValue::Uint(u) => write!(f, "Uint({})", u),
            HostValue::Float(x) => write!(f, "Float({})", x),
            HostValue::Str(s) => write!(f, "Str({:?})", s),
            HostValue::List(items) => f.debug_tuple("List").field(items).finish(),
            HostValue::Map(map) => f.debug_tuple("Map").field(&**map).finish(),
            HostValue::Record(obj) => write!(f, "Record({:?})", obj),
            HostValue::Pointer(obj) => write!(f, "Pointer({:?})", obj),
            HostValue::Func(func) => write!(f, "Func({})", func.name()),
            HostValue::Unsupported(name) => write!(f, "Unsupported({})", name),
        }
    }
}
