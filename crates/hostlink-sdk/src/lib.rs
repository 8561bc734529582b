//! Hostlink SDK - the runtime contract consumed by the object bridge
//!
//! This crate provides the minimal types and traits a scripting runtime must
//! implement so host objects can be exposed to it, without depending on the
//! bridge itself.
//!
//! # Example
//!
//! ```ignore
//! use hostlink_sdk::{native_fn, ScriptRuntime, ScriptValue};
//!
//! fn install(rt: &mut dyn ScriptRuntime) {
//!     let f = rt.create_function("answer", native_fn(|_rt, _args| Ok(ScriptValue::Number(42.0))));
//!     let global = rt.global_object();
//!     rt.put_property(global, "answer", ScriptValue::Object(f)).unwrap();
//! }
//! ```

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod handler;
pub mod value;

pub use context::ScriptRuntime;
pub use error::{ScriptError, ScriptResult};
pub use handler::{native_fn, NativeCallable, ProxyHandler};
pub use value::{ObjectId, ScriptValue};
