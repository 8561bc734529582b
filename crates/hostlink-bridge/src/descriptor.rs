//! Capability tables
//!
//! A [`TypeDescriptor`] lists what script may do with a record type: its
//! fields (getter plus optional setter) and its methods (value or pointer
//! receiver). Descriptors are built once per type from [`Bridged::describe`]
//! and cached process-wide by `TypeId`.
//!
//! ```ignore
//! impl Bridged for Person {
//!     fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self> {
//!         builder
//!             .field("Name", |p: &Person| p.name.clone(), |p: &mut Person, v: String| p.name = v)
//!             .readonly("Id", |p: &Person| p.id)
//!             .method("Greet", |p: &Person, other: String| format!("hi {}, I'm {}", other, p.name))
//!             .pointer_method("Rename", |p: &mut Person, v: String| p.name = v)
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use hostlink_sdk::ScriptValue;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::bridge::CallContext;
use crate::convert::{FromScript, IntoHost, ValueKind};
use crate::error::BridgeResult;
use crate::host::{HostValue, Introspect, Receiver, Shared};
use crate::invoke::{HostFunction, PointerMethod, Signature, ValueMethod};

/// A host record type that can be exposed to script.
///
/// Implement by hand with the [`TypeBuilder`] or with `#[derive(Bridged)]`.
pub trait Bridged: Sized + Send + Sync + 'static {
    /// Register fields and methods
    fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self>;

    /// Name used in diagnostics
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

// ============================================================================
// Descriptor
// ============================================================================

type Getter<T> = Box<dyn Fn(&T) -> HostValue + Send + Sync>;
type Assign<T> = Box<dyn FnOnce(&mut T) + Send>;
type Stager<T> =
    Box<dyn Fn(&mut CallContext<'_>, &ScriptValue) -> BridgeResult<Assign<T>> + Send + Sync>;
type Binder<T> = Box<dyn Fn(&Shared<T>) -> HostFunction + Send + Sync>;

struct FieldEntry<T> {
    name: &'static str,
    kind: ValueKind,
    get: Getter<T>,
    stage: Option<Stager<T>>,
}

struct MethodEntry<T> {
    name: &'static str,
    receiver: Receiver,
    signature: Signature,
    bind: Binder<T>,
}

/// Fields and methods of a record type
pub struct TypeDescriptor<T> {
    name: &'static str,
    fields: Vec<FieldEntry<T>>,
    field_index: FxHashMap<&'static str, usize>,
    methods: Vec<MethodEntry<T>>,
}

impl<T: Bridged> TypeDescriptor<T> {
    /// Registered type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Names of the methods in the given method set, declaration order,
    /// each name once
    pub fn method_names(&self, receiver: Receiver) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for m in &self.methods {
            if receiver == Receiver::Value && m.receiver == Receiver::Pointer {
                continue;
            }
            if !names.contains(&m.name) {
                names.push(m.name);
            }
        }
        names
    }

    /// Signature of a method in the given method set
    pub fn method_signature(&self, name: &str, receiver: Receiver) -> Option<&Signature> {
        self.method(name, receiver).map(|m| &m.signature)
    }

    fn field(&self, name: &str) -> Option<&FieldEntry<T>> {
        self.field_index.get(name).map(|&i| &self.fields[i])
    }

    fn method(&self, name: &str, receiver: Receiver) -> Option<&MethodEntry<T>> {
        let find = |wanted: Receiver| {
            self.methods
                .iter()
                .find(|m| m.name == name && m.receiver == wanted)
        };
        match receiver {
            Receiver::Pointer => find(Receiver::Pointer).or_else(|| find(Receiver::Value)),
            Receiver::Value => find(Receiver::Value),
        }
    }
}

impl<T> fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields.iter().map(|e| e.name).collect::<Vec<_>>())
            .field("methods", &self.methods.iter().map(|e| e.name).collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder handed to [`Bridged::describe`]
pub struct TypeBuilder<T> {
    name: &'static str,
    fields: Vec<FieldEntry<T>>,
    methods: Vec<MethodEntry<T>>,
}

impl<T: Bridged> TypeBuilder<T> {
    /// Create an empty builder
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Register a readable and writable field
    pub fn field<V, G, S>(mut self, name: &'static str, get: G, set: S) -> Self
    where
        V: IntoHost + FromScript,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let set = Arc::new(set);
        let stage: Stager<T> = Box::new(move |cx: &mut CallContext<'_>, value: &ScriptValue| {
            let decoded = V::from_script(cx, value)?;
            let set = Arc::clone(&set);
            let assign: Assign<T> = Box::new(move |this: &mut T| set(this, decoded));
            Ok(assign)
        });
        self.fields.push(FieldEntry {
            name,
            kind: V::kind(),
            get: Box::new(move |this: &T| get(this).into_host()),
            stage: Some(stage),
        });
        self
    }

    /// Register a read-only field
    pub fn readonly<V, G>(mut self, name: &'static str, get: G) -> Self
    where
        V: IntoHost + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.fields.push(FieldEntry {
            name,
            kind: ValueKind::of::<V>(),
            get: Box::new(move |this: &T| get(this).into_host()),
            stage: None,
        });
        self
    }

    /// Register a nested record field; script sees a by-value snapshot
    pub fn record<U, G>(mut self, name: &'static str, get: G) -> Self
    where
        U: Bridged + Clone,
        G: Fn(&T) -> &U + Send + Sync + 'static,
    {
        self.fields.push(FieldEntry {
            name,
            kind: ValueKind::Other,
            get: Box::new(move |this: &T| HostValue::record(get(this).clone())),
            stage: None,
        });
        self
    }

    /// Register a method with a value receiver (`&T`)
    pub fn method<M, F>(mut self, name: &'static str, f: F) -> Self
    where
        F: ValueMethod<T, M>,
    {
        let f = Arc::new(f);
        let signature = F::signature();
        let bound_signature = signature.clone();
        self.methods.push(MethodEntry {
            name,
            receiver: Receiver::Value,
            signature,
            bind: Box::new(move |this: &Shared<T>| {
                let f = Arc::clone(&f);
                let this = this.clone();
                HostFunction::from_invoker(name, bound_signature.clone(), move |cx, args| {
                    f.invoke(&this, cx, args)
                })
            }),
        });
        self
    }

    /// Register a method with a pointer receiver (`&mut T`)
    pub fn pointer_method<M, F>(mut self, name: &'static str, f: F) -> Self
    where
        F: PointerMethod<T, M>,
    {
        let f = Arc::new(f);
        let signature = F::signature();
        let bound_signature = signature.clone();
        self.methods.push(MethodEntry {
            name,
            receiver: Receiver::Pointer,
            signature,
            bind: Box::new(move |this: &Shared<T>| {
                let f = Arc::clone(&f);
                let this = this.clone();
                HostFunction::from_invoker(name, bound_signature.clone(), move |cx, args| {
                    f.invoke(&this, cx, args)
                })
            }),
        });
        self
    }

    /// Finish the table
    pub fn build(self) -> TypeDescriptor<T> {
        let mut field_index = FxHashMap::default();
        for (i, field) in self.fields.iter().enumerate() {
            field_index.entry(field.name).or_insert(i);
        }
        TypeDescriptor {
            name: self.name,
            fields: self.fields,
            field_index,
            methods: self.methods,
        }
    }
}

// ============================================================================
// Cache
// ============================================================================

static DESCRIPTORS: Lazy<RwLock<FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

/// Capability table of `T`, built on first use
pub fn descriptor_of<T: Bridged>() -> Arc<TypeDescriptor<T>> {
    let id = TypeId::of::<T>();
    if let Some(found) = cached::<T>(DESCRIPTORS.read().get(&id)) {
        return found;
    }

    let built: Arc<TypeDescriptor<T>> = Arc::new(T::describe(TypeBuilder::new(T::type_name())).build());
    debug!(
        target: "hostlink::registry",
        type_name = built.name,
        fields = built.fields.len(),
        methods = built.methods.len(),
        "built type descriptor"
    );

    let mut table = DESCRIPTORS.write();
    let entry = table
        .entry(id)
        .or_insert_with(|| built.clone() as Arc<dyn Any + Send + Sync>);
    cached::<T>(Some(entry)).unwrap_or(built)
}

fn cached<T: Bridged>(entry: Option<&Arc<dyn Any + Send + Sync>>) -> Option<Arc<TypeDescriptor<T>>> {
    entry.and_then(|any| Arc::clone(any).downcast::<TypeDescriptor<T>>().ok())
}

// ============================================================================
// Erased record
// ============================================================================

/// A shared record paired with its table; the concrete [`Introspect`]
pub(crate) struct RecordCell<T: Bridged> {
    shared: Shared<T>,
    descriptor: Arc<TypeDescriptor<T>>,
}

impl<T: Bridged> RecordCell<T> {
    pub(crate) fn new(shared: Shared<T>) -> Self {
        Self {
            shared,
            descriptor: descriptor_of::<T>(),
        }
    }

    pub(crate) fn shared(&self) -> &Shared<T> {
        &self.shared
    }
}

impl<T: Bridged> Introspect for RecordCell<T> {
    fn type_name(&self) -> &'static str {
        self.descriptor.name
    }

    fn field_names(&self) -> Vec<&'static str> {
        self.descriptor.field_names()
    }

    fn find_field(&self, name: &str) -> Option<&'static str> {
        self.descriptor.field(name).map(|f| f.name)
    }

    fn field_kind(&self, name: &str) -> Option<ValueKind> {
        self.descriptor.field(name).map(|f| f.kind)
    }

    fn field_writable(&self, name: &str) -> bool {
        self.descriptor
            .field(name)
            .is_some_and(|f| f.stage.is_some())
    }

    fn read_field(&self, name: &str) -> BridgeResult<Option<HostValue>> {
        let Some(field) = self.descriptor.field(name) else {
            return Ok(None);
        };
        let this = self.shared.try_read()?;
        Ok(Some((field.get)(&this)))
    }

    fn write_field(
        &self,
        cx: &mut CallContext<'_>,
        name: &str,
        value: &ScriptValue,
    ) -> BridgeResult<bool> {
        let Some(stage) = self.descriptor.field(name).and_then(|f| f.stage.as_ref()) else {
            return Ok(false);
        };
        // Decoding may re-enter the runtime; the lock is taken afterwards.
        let assign = stage(cx, value)?;
        let mut this = self.shared.try_write()?;
        assign(&mut this);
        Ok(true)
    }

    fn method_names(&self, receiver: Receiver) -> Vec<&'static str> {
        self.descriptor.method_names(receiver)
    }

    fn bind_method(&self, name: &str, receiver: Receiver) -> Option<HostFunction> {
        self.descriptor
            .method(name, receiver)
            .map(|m| (m.bind)(&self.shared))
    }

    fn identity(&self) -> usize {
        self.shared.identity()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
