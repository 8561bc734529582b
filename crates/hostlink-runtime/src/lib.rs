//! Hostlink reference runtime
//!
//! An in-memory implementation of [`hostlink_sdk::ScriptRuntime`]: an object
//! arena with plain objects, arrays, native functions and proxies, JSON
//! encode/decode and a module-search hook. It has no parser; host code drives
//! property access and calls directly, which is enough to exercise the object
//! bridge end to end.

pub mod heap;
pub mod json;
pub mod options;

pub use heap::HeapRuntime;
pub use json::number_to_json;
pub use options::RuntimeOptions;
