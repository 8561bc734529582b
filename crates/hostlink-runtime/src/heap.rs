//! HeapRuntime - object arena implementing the runtime contract
//!
//! Objects live in a grow-only arena addressed by [`ObjectId`]. There is no
//! collector; the arena is released with the runtime.

use std::fmt;
use std::sync::Arc;

use hostlink_sdk::{
    NativeCallable, ObjectId, ProxyHandler, ScriptError, ScriptResult, ScriptRuntime, ScriptValue,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::json;
use crate::options::RuntimeOptions;

pub(crate) enum HeapObject {
    /// Plain object; properties keep insertion order
    Plain(Vec<(String, ScriptValue)>),
    Array(Vec<ScriptValue>),
    Function {
        name: String,
        callable: NativeCallable,
    },
    Proxy(Arc<dyn ProxyHandler>),
}

/// In-memory scripting runtime without a parser.
///
/// Host code drives it directly: property reads and writes, calls, JSON and
/// module loading go through the same paths a script engine would take, so
/// proxies and native functions see realistic traffic.
pub struct HeapRuntime {
    objects: Vec<HeapObject>,
    global: ObjectId,
    module_search: Option<ScriptValue>,
    modules: FxHashMap<String, ScriptValue>,
    options: RuntimeOptions,
}

impl HeapRuntime {
    /// Create a runtime with default options
    pub fn new() -> Self {
        Self::with_options(RuntimeOptions::default())
    }

    /// Create a runtime with the given options
    pub fn with_options(options: RuntimeOptions) -> Self {
        let mut rt = Self {
            objects: Vec::new(),
            global: ObjectId::from_raw(0),
            module_search: None,
            modules: FxHashMap::default(),
            options,
        };
        rt.global = rt.alloc(HeapObject::Plain(Vec::new()));
        rt
    }

    /// Runtime options
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Number of live objects, the global object included
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn alloc(&mut self, object: HeapObject) -> ObjectId {
        let id = ObjectId::from_raw(self.objects.len() as u64);
        self.objects.push(object);
        id
    }

    pub(crate) fn object(&self, id: ObjectId) -> ScriptResult<&HeapObject> {
        usize::try_from(id.as_raw())
            .ok()
            .and_then(|i| self.objects.get(i))
            .ok_or(ScriptError::InvalidObject(id))
    }

    fn object_mut(&mut self, id: ObjectId) -> ScriptResult<&mut HeapObject> {
        usize::try_from(id.as_raw())
            .ok()
            .and_then(|i| self.objects.get_mut(i))
            .ok_or(ScriptError::InvalidObject(id))
    }

    pub(crate) fn handler_of(&self, id: ObjectId) -> Option<Arc<dyn ProxyHandler>> {
        match self.object(id) {
            Ok(HeapObject::Proxy(handler)) => Some(Arc::clone(handler)),
            _ => None,
        }
    }

    // ========================================================================
    // Script-level helpers
    // ========================================================================

    /// Read a global variable
    pub fn get_global(&mut self, name: &str) -> ScriptResult<ScriptValue> {
        let global = self.global;
        self.get_property(global, name)
    }

    /// Assign a global variable
    pub fn set_global(&mut self, name: &str, value: ScriptValue) -> ScriptResult<()> {
        let global = self.global;
        self.put_property(global, name, value)
    }

    /// `target[key]`
    pub fn get(&mut self, target: &ScriptValue, key: &str) -> ScriptResult<ScriptValue> {
        match target {
            ScriptValue::Object(id) => self.get_property(*id, key),
            ScriptValue::String(s) if key == "length" => {
                Ok(ScriptValue::Number(s.chars().count() as f64))
            }
            ScriptValue::Undefined | ScriptValue::Null => Err(ScriptError::TypeError(format!(
                "cannot read property '{}' of {}",
                key,
                target.type_name()
            ))),
            _ => Ok(ScriptValue::Undefined),
        }
    }

    /// `target[key] = value`
    pub fn set(&mut self, target: &ScriptValue, key: &str, value: ScriptValue) -> ScriptResult<()> {
        match target {
            ScriptValue::Object(id) => self.put_property(*id, key, value),
            _ => Err(ScriptError::TypeError(format!(
                "cannot set property '{}' of {}",
                key,
                target.type_name()
            ))),
        }
    }

    /// `target[key](...args)`
    pub fn call_method(
        &mut self,
        target: &ScriptValue,
        key: &str,
        args: &[ScriptValue],
    ) -> ScriptResult<ScriptValue> {
        let callee = self.get(target, key)?;
        if !callee.as_object().is_some_and(|id| self.is_callable(id)) {
            return Err(ScriptError::TypeError(format!("{} is not a function", key)));
        }
        self.call(&callee, args)
    }

    /// Call a global function
    pub fn call_global(&mut self, name: &str, args: &[ScriptValue]) -> ScriptResult<ScriptValue> {
        let global = ScriptValue::Object(self.global);
        self.call_method(&global, name, args)
    }

    /// `key in target`
    pub fn has(&mut self, target: &ScriptValue, key: &str) -> ScriptResult<bool> {
        match target {
            ScriptValue::Object(id) => self.has_property(*id, key),
            _ => Err(ScriptError::TypeError(format!(
                "cannot use 'in' operator to search for '{}' in {}",
                key,
                target.type_name()
            ))),
        }
    }

    /// `Object.keys(target)`
    pub fn keys(&mut self, target: &ScriptValue) -> ScriptResult<Vec<String>> {
        match target {
            ScriptValue::Object(id) => self.own_keys(*id),
            _ => Ok(Vec::new()),
        }
    }

    /// Elements of an array
    pub fn array_items(&self, value: &ScriptValue) -> Option<Vec<ScriptValue>> {
        match self.object(value.as_object()?) {
            Ok(HeapObject::Array(items)) => Some(items.clone()),
            _ => None,
        }
    }

    /// Build a plain object from key/value pairs
    pub fn object_from<K: Into<String>>(
        &mut self,
        entries: impl IntoIterator<Item = (K, ScriptValue)>,
    ) -> ScriptValue {
        let props = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        ScriptValue::Object(self.alloc(HeapObject::Plain(props)))
    }

    /// `JSON.stringify(value)`
    pub fn stringify(&mut self, value: &ScriptValue) -> ScriptResult<Option<String>> {
        self.json_encode(value)
    }

    /// Resolve a module through the installed module-search hook.
    ///
    /// The hook is called with the module id; whatever it returns is the
    /// module and is cached for later requires of the same id.
    pub fn require(&mut self, id: &str) -> ScriptResult<ScriptValue> {
        if let Some(module) = self.modules.get(id) {
            return Ok(module.clone());
        }
        let hook = self
            .module_search
            .clone()
            .ok_or_else(|| ScriptError::ReferenceError(format!("cannot find module '{}'", id)))?;

        debug!(target: "hostlink::runtime", module = id, "searching module");
        let module = self.call(&hook, &[ScriptValue::String(id.to_string())])?;
        if module.is_nullish() {
            return Err(ScriptError::ReferenceError(format!(
                "cannot find module '{}'",
                id
            )));
        }
        self.modules.insert(id.to_string(), module.clone());
        Ok(module)
    }
}

impl Default for HeapRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HeapRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapRuntime")
            .field("objects", &self.objects.len())
            .field("modules", &self.modules.len())
            .field("options", &self.options)
            .finish()
    }
}

/// Largest key that names an array element; anything above is not an index
const MAX_ARRAY_INDEX: u64 = u32::MAX as u64 - 1;

fn array_index(key: &str) -> Option<usize> {
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse::<u64>()
        .ok()
        .filter(|&i| i <= MAX_ARRAY_INDEX)
        .and_then(|i| usize::try_from(i).ok())
}

impl ScriptRuntime for HeapRuntime {
    fn global_object(&self) -> ObjectId {
        self.global
    }

    fn create_object(&mut self) -> ObjectId {
        self.alloc(HeapObject::Plain(Vec::new()))
    }

    fn create_array(&mut self, items: Vec<ScriptValue>) -> ObjectId {
        self.alloc(HeapObject::Array(items))
    }

    fn create_function(&mut self, name: &str, callable: NativeCallable) -> ObjectId {
        self.alloc(HeapObject::Function {
            name: name.to_string(),
            callable,
        })
    }

    fn create_proxy(&mut self, handler: Arc<dyn ProxyHandler>) -> ObjectId {
        self.alloc(HeapObject::Proxy(handler))
    }

    fn get_property(&mut self, object: ObjectId, key: &str) -> ScriptResult<ScriptValue> {
        trace!(target: "hostlink::runtime", %object, key, "get");
        match self.object(object)? {
            HeapObject::Plain(props) => Ok(props
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()),
            HeapObject::Array(items) => {
                if key == "length" {
                    return Ok(ScriptValue::Number(items.len() as f64));
                }
                Ok(array_index(key)
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default())
            }
            HeapObject::Function { name, .. } => Ok(if key == "name" {
                ScriptValue::String(name.clone())
            } else {
                ScriptValue::Undefined
            }),
            HeapObject::Proxy(handler) => {
                let handler = Arc::clone(handler);
                handler.get(self, key)
            }
        }
    }

    fn put_property(&mut self, object: ObjectId, key: &str, value: ScriptValue) -> ScriptResult<()> {
        trace!(target: "hostlink::runtime", %object, key, "put");
        let strict = self.options.strict;
        let max_len = self.options.max_array_length;
        match self.object_mut(object)? {
            HeapObject::Plain(props) => {
                match props.iter_mut().find(|(k, _)| k == key) {
                    Some((_, slot)) => *slot = value,
                    None => props.push((key.to_string(), value)),
                }
                Ok(())
            }
            HeapObject::Array(items) => {
                let Some(i) = array_index(key) else {
                    return Ok(());
                };
                if i >= items.len() {
                    let len = i
                        .checked_add(1)
                        .filter(|&len| len <= max_len)
                        .ok_or_else(|| {
                            ScriptError::RangeError(format!(
                                "invalid array length: index {} exceeds {}",
                                i, max_len
                            ))
                        })?;
                    items.resize(len, ScriptValue::Undefined);
                }
                items[i] = value;
                Ok(())
            }
            HeapObject::Function { .. } => Ok(()),
            HeapObject::Proxy(handler) => {
                let handler = Arc::clone(handler);
                if handler.set(self, key, value)? || !strict {
                    Ok(())
                } else {
                    Err(ScriptError::TypeError(format!(
                        "'set' on proxy: trap returned falsish for property '{}'",
                        key
                    )))
                }
            }
        }
    }

    fn has_property(&mut self, object: ObjectId, key: &str) -> ScriptResult<bool> {
        match self.object(object)? {
            HeapObject::Plain(props) => Ok(props.iter().any(|(k, _)| k == key)),
            HeapObject::Array(items) => {
                Ok(key == "length" || array_index(key).is_some_and(|i| i < items.len()))
            }
            HeapObject::Function { .. } => Ok(key == "name"),
            HeapObject::Proxy(handler) => {
                let handler = Arc::clone(handler);
                handler.has(self, key)
            }
        }
    }

    fn own_keys(&mut self, object: ObjectId) -> ScriptResult<Vec<String>> {
        match self.object(object)? {
            HeapObject::Plain(props) => Ok(props.iter().map(|(k, _)| k.clone()).collect()),
            HeapObject::Array(items) => Ok((0..items.len()).map(|i| i.to_string()).collect()),
            HeapObject::Function { .. } => Ok(Vec::new()),
            HeapObject::Proxy(handler) => {
                let handler = Arc::clone(handler);
                handler.own_keys(self)
            }
        }
    }

    fn is_array(&self, object: ObjectId) -> bool {
        matches!(self.object(object), Ok(HeapObject::Array(_)))
    }

    fn is_callable(&self, object: ObjectId) -> bool {
        matches!(self.object(object), Ok(HeapObject::Function { .. }))
    }

    fn proxy_handler(&self, object: ObjectId) -> Option<Arc<dyn ProxyHandler>> {
        self.handler_of(object)
    }

    fn call(&mut self, callee: &ScriptValue, args: &[ScriptValue]) -> ScriptResult<ScriptValue> {
        let id = callee.as_object().ok_or_else(|| {
            ScriptError::TypeError(format!("{} is not a function", callee.type_name()))
        })?;
        let (name, callable) = match self.object(id)? {
            HeapObject::Function { name, callable } => (name.clone(), Arc::clone(callable)),
            _ => return Err(ScriptError::TypeError(format!("{} is not a function", id))),
        };
        trace!(target: "hostlink::runtime", function = %name, argc = args.len(), "call");
        let rt: &mut dyn ScriptRuntime = self;
        callable(rt, args)
    }

    fn json_encode(&mut self, value: &ScriptValue) -> ScriptResult<Option<String>> {
        json::encode(self, value)
    }

    fn json_decode(&mut self, text: &str) -> ScriptResult<ScriptValue> {
        json::decode(self, text)
    }

    fn set_module_search(&mut self, hook: ScriptValue) -> ScriptResult<()> {
        if !hook.as_object().is_some_and(|id| self.is_callable(id)) {
            return Err(ScriptError::TypeError(
                "module search hook must be a function".to_string(),
            ));
        }
        self.module_search = Some(hook);
        self.modules.clear();
        Ok(())
    }
}
