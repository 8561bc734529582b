//! Bridge facade
//!
//! A [`Bridge`] owns the object registry, the fallback codec and the
//! configuration of one runtime context, and exposes the installer API used by
//! host code. [`CallContext`] pairs a bridge with the runtime it is serving
//! for the duration of one host call or trap.

use std::fmt;
use std::sync::Arc;

use hostlink_sdk::{ObjectId, ScriptRuntime, ScriptValue};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::codec::{self, FallbackCodec, JsonCodec};
use crate::config::BridgeConfig;
use crate::convert::{FromScript, IntoHost};
use crate::error::BridgeResult;
use crate::host::HostValue;
use crate::invoke::{HostFunction, IntoHostFunction};
use crate::registry::ObjectRegistry;
use crate::{marshal, materialize, proxy};

// ============================================================================
// CallContext
// ============================================================================

/// A bridge and the runtime it is serving
pub struct CallContext<'a> {
    bridge: &'a Bridge,
    runtime: &'a mut dyn ScriptRuntime,
}

impl<'a> CallContext<'a> {
    /// Pair a bridge with a runtime
    pub fn new(bridge: &'a Bridge, runtime: &'a mut dyn ScriptRuntime) -> Self {
        Self { bridge, runtime }
    }

    /// The bridge
    pub fn bridge(&self) -> &'a Bridge {
        self.bridge
    }

    /// Bridge configuration
    pub fn config(&self) -> &'a BridgeConfig {
        &self.bridge.shared.config
    }

    /// The runtime, for re-entrant calls
    pub fn runtime(&mut self) -> &mut (dyn ScriptRuntime + 'a) {
        &mut *self.runtime
    }

    /// Host value behind a bridged proxy.
    ///
    /// `Ok(None)` when `value` is not a proxy installed by a bridge; an
    /// `UnexpectedPointer` error when it is one whose handle this bridge's
    /// registry does not know.
    pub fn proxied(&self, value: &ScriptValue) -> BridgeResult<Option<HostValue>> {
        match proxy::handle_of(&*self.runtime, value) {
            Some(handle) => self.bridge.registry().get(handle).map(Some),
            None => Ok(None),
        }
    }

    /// Fallback-decode a script value into `T`; no payload yields `T::default()`
    pub fn decode<T: DeserializeOwned + Default>(&mut self, value: &ScriptValue) -> BridgeResult<T> {
        match self.decode_tree(value)? {
            Some(tree) => codec::decode_tree(tree),
            None => Ok(T::default()),
        }
    }

    /// Fallback-encode a script value into a parsed tree
    pub fn decode_tree(&mut self, value: &ScriptValue) -> BridgeResult<Option<serde_json::Value>> {
        let codec = Arc::clone(&self.bridge.shared.codec);
        codec::encode_tree(codec.as_ref(), &mut *self.runtime, value)
    }

    /// Push a host value into script
    pub fn push(&mut self, value: impl IntoHost) -> BridgeResult<ScriptValue> {
        marshal::push_value(self, value.into_host())
    }
}

// ============================================================================
// Bridge
// ============================================================================

struct BridgeShared {
    registry: ObjectRegistry,
    codec: Arc<dyn FallbackCodec>,
    config: BridgeConfig,
}

/// Object bridge for one runtime context.
///
/// Cloning is cheap and shares the registry. Give every runtime context its
/// own bridge.
#[derive(Clone)]
pub struct Bridge {
    shared: Arc<BridgeShared>,
}

impl Bridge {
    /// Create a bridge with the default configuration and JSON codec
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    /// Create a bridge with the JSON codec
    pub fn with_config(config: BridgeConfig) -> Self {
        Self::with_codec(config, Arc::new(JsonCodec))
    }

    /// Create a bridge with a custom fallback codec
    pub fn with_codec(config: BridgeConfig, codec: Arc<dyn FallbackCodec>) -> Self {
        Bridge {
            shared: Arc::new(BridgeShared {
                registry: ObjectRegistry::new(),
                codec,
                config,
            }),
        }
    }

    /// Object registry
    pub fn registry(&self) -> &ObjectRegistry {
        &self.shared.registry
    }

    /// Configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    /// Fallback codec
    pub fn codec(&self) -> &dyn FallbackCodec {
        self.shared.codec.as_ref()
    }

    /// Pair with a runtime
    pub fn context<'a>(&'a self, rt: &'a mut dyn ScriptRuntime) -> CallContext<'a> {
        CallContext::new(self, rt)
    }

    // ========================================================================
    // Proxies
    // ========================================================================

    /// Register `value` and return a live proxy for it
    pub fn proxy_value(
        &self,
        rt: &mut dyn ScriptRuntime,
        value: impl IntoHost,
    ) -> BridgeResult<ObjectId> {
        proxy::install(&mut self.context(rt), value.into_host())
    }

    /// Proxy `value` and install it as global `name`
    pub fn proxy_global(
        &self,
        rt: &mut dyn ScriptRuntime,
        name: &str,
        value: impl IntoHost,
    ) -> BridgeResult<ObjectId> {
        let object = self.proxy_value(rt, value)?;
        put_global(rt, name, ScriptValue::Object(object))?;
        Ok(object)
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Copy a record onto a fresh plain object
    pub fn push_struct(
        &self,
        rt: &mut dyn ScriptRuntime,
        value: impl IntoHost,
    ) -> BridgeResult<ObjectId> {
        materialize::push_struct(&mut self.context(rt), &value.into_host())
    }

    /// Materialize a record and install it as global `name`
    pub fn push_global_struct(
        &self,
        rt: &mut dyn ScriptRuntime,
        name: &str,
        value: impl IntoHost,
    ) -> BridgeResult<ObjectId> {
        let object = self.push_struct(rt, value)?;
        put_global(rt, name, ScriptValue::Object(object))?;
        Ok(object)
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Marshal one host value
    pub fn push_value(
        &self,
        rt: &mut dyn ScriptRuntime,
        value: impl IntoHost,
    ) -> BridgeResult<ScriptValue> {
        marshal::push_value(&mut self.context(rt), value.into_host())
    }

    /// Marshal one host value and install it as global `name`
    pub fn push_global_value(
        &self,
        rt: &mut dyn ScriptRuntime,
        name: &str,
        value: impl IntoHost,
    ) -> BridgeResult<ScriptValue> {
        let pushed = self.push_value(rt, value)?;
        put_global(rt, name, pushed.clone())?;
        Ok(pushed)
    }

    /// Marshal an ordered list of host values as one array
    pub fn push_values(
        &self,
        rt: &mut dyn ScriptRuntime,
        values: Vec<HostValue>,
    ) -> BridgeResult<ScriptValue> {
        marshal::push_values(&mut self.context(rt), values)
    }

    /// Marshal a list of host values and install the array as global `name`
    pub fn push_global_values(
        &self,
        rt: &mut dyn ScriptRuntime,
        name: &str,
        values: Vec<HostValue>,
    ) -> BridgeResult<ScriptValue> {
        let pushed = self.push_values(rt, values)?;
        put_global(rt, name, pushed.clone())?;
        Ok(pushed)
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// Wrap a host function as a script callable
    pub fn push_function<M, F>(
        &self,
        rt: &mut dyn ScriptRuntime,
        name: &str,
        f: F,
    ) -> BridgeResult<ScriptValue>
    where
        F: IntoHostFunction<M>,
    {
        let f = HostFunction::new(name, f);
        Ok(ScriptValue::Object(marshal::wrap_function(
            &mut self.context(rt),
            f,
        )))
    }

    /// Wrap a host function and install it as global `name`
    pub fn push_global_function<M, F>(
        &self,
        rt: &mut dyn ScriptRuntime,
        name: &str,
        f: F,
    ) -> BridgeResult<ScriptValue>
    where
        F: IntoHostFunction<M>,
    {
        let pushed = self.push_function(rt, name, f)?;
        put_global(rt, name, pushed.clone())?;
        Ok(pushed)
    }

    /// Install a host function as the runtime's module-search hook
    pub fn set_require_function<M, F>(
        &self,
        rt: &mut dyn ScriptRuntime,
        f: F,
    ) -> BridgeResult<ScriptValue>
    where
        F: IntoHostFunction<M>,
    {
        let hook = self.push_function(rt, "modSearch", f)?;
        rt.set_module_search(hook.clone())?;
        debug!(target: "hostlink::proxy", "installed module search hook");
        Ok(hook)
    }

    // ========================================================================
    // Recovery
    // ========================================================================

    /// Host value behind a script object, if it is one of this bridge's
    /// proxies
    pub fn get_proxy(
        &self,
        rt: &mut dyn ScriptRuntime,
        value: &ScriptValue,
    ) -> BridgeResult<Option<HostValue>> {
        self.context(rt).proxied(value)
    }

    /// Convert a script value into a host type, as a parameter would be
    pub fn from_script<T: FromScript>(
        &self,
        rt: &mut dyn ScriptRuntime,
        value: &ScriptValue,
    ) -> BridgeResult<T> {
        T::from_script(&mut self.context(rt), value)
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("registry", &self.shared.registry)
            .field("codec", &self.shared.codec.name())
            .field("config", &self.shared.config)
            .finish()
    }
}

fn put_global(rt: &mut dyn ScriptRuntime, name: &str, value: ScriptValue) -> BridgeResult<()> {
    let global = rt.global_object();
    rt.put_property(global, name, value)?;
    Ok(())
}
