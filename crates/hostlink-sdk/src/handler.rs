//! Native callables and proxy trap handlers
//!
//! Both are implemented by the bridge and stored inside the runtime; the
//! runtime invokes them with itself as the context so they may re-enter.

use std::any::Any;
use std::sync::Arc;

use crate::context::ScriptRuntime;
use crate::error::ScriptResult;
use crate::value::ScriptValue;

/// A function implemented natively and callable from script.
///
/// Receives the runtime and the positional arguments exactly as supplied by
/// the script call (no padding, no truncation).
pub type NativeCallable =
    Arc<dyn Fn(&mut dyn ScriptRuntime, &[ScriptValue]) -> ScriptResult<ScriptValue> + Send + Sync>;

/// Wrap a closure as a [`NativeCallable`]
pub fn native_fn<F>(f: F) -> NativeCallable
where
    F: Fn(&mut dyn ScriptRuntime, &[ScriptValue]) -> ScriptResult<ScriptValue> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Trap set of a proxy object.
///
/// Mirrors the runtime's dynamic property protocol. `enumerate` and
/// `own_keys` report the same list unless an implementor overrides one.
pub trait ProxyHandler: Send + Sync {
    /// `get` trap; missing properties yield `undefined`
    fn get(&self, rt: &mut dyn ScriptRuntime, key: &str) -> ScriptResult<ScriptValue>;

    /// `set` trap; `false` when the property is not writable
    fn set(&self, rt: &mut dyn ScriptRuntime, key: &str, value: ScriptValue) -> ScriptResult<bool>;

    /// `has` trap
    fn has(&self, rt: &mut dyn ScriptRuntime, key: &str) -> ScriptResult<bool>;

    /// `ownKeys` trap
    fn own_keys(&self, rt: &mut dyn ScriptRuntime) -> ScriptResult<Vec<String>>;

    /// `enumerate` trap
    fn enumerate(&self, rt: &mut dyn ScriptRuntime) -> ScriptResult<Vec<String>> {
        self.own_keys(rt)
    }

    /// Downcast support, so the owner of a handler can recognise its own proxies
    fn as_any(&self) -> &dyn Any;
}
