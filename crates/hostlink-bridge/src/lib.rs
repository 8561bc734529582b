//! Hostlink - dynamic object bridge for embedded scripting runtimes
//!
//! Exposes host records, shared pointers to records, string-keyed maps, bound
//! methods and free functions to a scripting runtime implementing
//! [`hostlink_sdk::ScriptRuntime`], without rewriting them for the bridge.
//!
//! # Architecture
//!
//! ```text
//! host code ──► Bridge (installer / materializer)
//!                  │
//!                  ▼
//!   script ◄──► proxy traps ──► resolve ──► descriptor (capability table)
//!                  │                 │
//!                  ▼                 ▼
//!               marshal ◄──────── invoke ──► convert / codec
//!                  │
//!                  ▼
//!               registry (Handle -> HostValue)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hostlink_bridge::{Bridge, Bridged, Shared};
//!
//! #[derive(Bridged, Default)]
//! pub struct Person {
//!     pub first_name: String,
//!     pub age: u8,
//! }
//!
//! let bridge = Bridge::new();
//! let person = Shared::new(Person::default());
//! bridge.proxy_global(&mut rt, "person", person.clone())?;
//! bridge.push_global_function(&mut rt, "add", |a: i64, b: i64| a + b)?;
//! ```

#![warn(missing_docs)]

extern crate self as hostlink_bridge;

pub mod bridge;
pub mod codec;
pub mod config;
pub mod convert;
pub mod descriptor;
pub mod error;
pub mod host;
pub mod invoke;
mod marshal;
mod materialize;
pub mod naming;
mod proxy;
pub mod registry;
pub mod resolve;

pub use bridge::{Bridge, CallContext};
pub use codec::{FallbackCodec, JsonCodec};
pub use config::{BridgeConfig, ConfigError};
pub use convert::{FromScript, IntoHost, Narrowed, Raw, ValueKind};
pub use descriptor::{descriptor_of, Bridged, TypeBuilder, TypeDescriptor};
pub use error::{BridgeError, BridgeResult};
pub use host::{HostValue, ObjectRef, Receiver, Shared};
pub use invoke::{
    HostFunction, IntoHostFunction, IntoReturns, Param, ParamType, PointerMethod, ReturnList,
    ReturnShape, Signature, TrailingError, ValueMethod, Variadic,
};
pub use registry::{Handle, ObjectRegistry};

pub use hostlink_derive::Bridged;

/// Re-exported runtime contract
pub use hostlink_sdk as sdk;
