//! ScriptRuntime trait — abstract runtime operations
//!
//! Defines the interface an embedded scripting runtime implements so the
//! object bridge can surface host values into it. The bridge programs
//! against this trait only; it never depends on engine internals.

use std::sync::Arc;

use crate::error::ScriptResult;
use crate::handler::{NativeCallable, ProxyHandler};
use crate::value::{ObjectId, ScriptValue};

/// Abstract runtime context for the object bridge.
///
/// All calls are synchronous. A runtime is single-threaded: native callables
/// and proxy traps receive `&mut dyn ScriptRuntime` and may re-enter it.
pub trait ScriptRuntime {
    // ========================================================================
    // Object Creation
    // ========================================================================

    /// The runtime's global object
    fn global_object(&self) -> ObjectId;

    /// Allocate a new empty plain object
    fn create_object(&mut self) -> ObjectId;

    /// Allocate a new array holding `items` in order
    fn create_array(&mut self, items: Vec<ScriptValue>) -> ObjectId;

    /// Allocate a callable backed by native code
    fn create_function(&mut self, name: &str, callable: NativeCallable) -> ObjectId;

    /// Allocate a proxy object whose property operations are trapped by `handler`
    fn create_proxy(&mut self, handler: Arc<dyn ProxyHandler>) -> ObjectId;

    // ========================================================================
    // Property Access
    // ========================================================================

    /// Read a property (proxies dispatch to their `get` trap)
    fn get_property(&mut self, object: ObjectId, key: &str) -> ScriptResult<ScriptValue>;

    /// Write a property (proxies dispatch to their `set` trap)
    fn put_property(&mut self, object: ObjectId, key: &str, value: ScriptValue) -> ScriptResult<()>;

    /// Check for a property (proxies dispatch to their `has` trap)
    fn has_property(&mut self, object: ObjectId, key: &str) -> ScriptResult<bool>;

    /// Enumerable own keys in order (proxies dispatch to `ownKeys`)
    fn own_keys(&mut self, object: ObjectId) -> ScriptResult<Vec<String>>;

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Check if an object is an array
    fn is_array(&self, object: ObjectId) -> bool;

    /// Check if an object is callable
    fn is_callable(&self, object: ObjectId) -> bool;

    /// The trap handler of a proxy object, `None` for any other object.
    ///
    /// This is the identity side table the bridge uses to get from a script
    /// object back to the host value it proxies.
    fn proxy_handler(&self, object: ObjectId) -> Option<Arc<dyn ProxyHandler>>;

    // ========================================================================
    // Execution
    // ========================================================================

    /// Call a function value with positional arguments (synchronous)
    fn call(&mut self, callee: &ScriptValue, args: &[ScriptValue]) -> ScriptResult<ScriptValue>;

    // ========================================================================
    // Portable Encoding
    // ========================================================================

    /// Encode a value to portable text; `None` when the value has no
    /// encoding (`undefined`, functions)
    fn json_encode(&mut self, value: &ScriptValue) -> ScriptResult<Option<String>>;

    /// Decode portable text into a fresh script value
    fn json_decode(&mut self, text: &str) -> ScriptResult<ScriptValue>;

    // ========================================================================
    // Module Loading
    // ========================================================================

    /// Install the callable the runtime's module loader consults to find
    /// module sources
    fn set_module_search(&mut self, hook: ScriptValue) -> ScriptResult<()>;
}
