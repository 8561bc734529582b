//! Proxy object installer
//!
//! A proxy is a script object whose property protocol is trapped by a
//! [`HostProxy`]. The handler carries the registry handle of the value it
//! stands for, so the runtime's proxy table maps the script object straight
//! back to its host value.

use std::any::Any;
use std::sync::Arc;

use hostlink_sdk::{ObjectId, ProxyHandler, ScriptResult, ScriptRuntime, ScriptValue};
use tracing::{debug, trace, warn};

use crate::bridge::{Bridge, CallContext};
use crate::error::{BridgeError, BridgeResult};
use crate::host::HostValue;
use crate::registry::Handle;
use crate::{marshal, resolve};

/// Trap handler of a bridged proxy
pub(crate) struct HostProxy {
    bridge: Bridge,
    handle: Handle,
}

impl HostProxy {
    fn target(&self) -> BridgeResult<HostValue> {
        self.bridge.registry().get(self.handle)
    }

    fn trap<R>(
        &self,
        rt: &mut dyn ScriptRuntime,
        trap: &'static str,
        f: impl FnOnce(&mut CallContext<'_>, HostValue) -> BridgeResult<R>,
    ) -> ScriptResult<R> {
        let mut cx = CallContext::new(&self.bridge, rt);
        self.target()
            .and_then(|target| f(&mut cx, target))
            .map_err(|e| {
                warn!(target: "hostlink::proxy", handle = %self.handle, trap, error = %e, "proxy trap failed");
                e.into_script_error()
            })
    }
}

impl ProxyHandler for HostProxy {
    fn get(&self, rt: &mut dyn ScriptRuntime, key: &str) -> ScriptResult<ScriptValue> {
        trace!(target: "hostlink::proxy", handle = %self.handle, key, "get");
        self.trap(rt, "get", |cx, target| match resolve::get(&target, key) {
            Ok(value) => marshal::push_value(cx, value),
            Err(BridgeError::UndefinedProperty { .. }) => Ok(ScriptValue::Undefined),
            Err(e) => Err(e),
        })
    }

    fn set(&self, rt: &mut dyn ScriptRuntime, key: &str, value: ScriptValue) -> ScriptResult<bool> {
        trace!(target: "hostlink::proxy", handle = %self.handle, key, "set");
        self.trap(rt, "set", |cx, target| match resolve::set(cx, &target, key, &value) {
            Err(BridgeError::UndefinedProperty { .. }) => Ok(false),
            other => other,
        })
    }

    fn has(&self, rt: &mut dyn ScriptRuntime, key: &str) -> ScriptResult<bool> {
        self.trap(rt, "has", |_, target| Ok(resolve::has(&target, key)))
    }

    fn own_keys(&self, rt: &mut dyn ScriptRuntime) -> ScriptResult<Vec<String>> {
        self.trap(rt, "ownKeys", |cx, target| Ok(resolve::enumerate(&target, cx.config())))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Register `value` and create a proxy for it
pub(crate) fn install(cx: &mut CallContext<'_>, value: HostValue) -> BridgeResult<ObjectId> {
    let kind = value.type_name();
    let handle = cx.bridge().registry().add(value);
    let handler = Arc::new(HostProxy {
        bridge: cx.bridge().clone(),
        handle,
    });
    let object = cx.runtime().create_proxy(handler);
    debug!(target: "hostlink::proxy", %handle, %object, kind, "installed proxy");
    Ok(object)
}

/// Handle behind a script value, if it is a proxy installed by any bridge
pub(crate) fn handle_of(rt: &dyn ScriptRuntime, value: &ScriptValue) -> Option<Handle> {
    let object = value.as_object()?;
    let handler = rt.proxy_handler(object)?;
    handler
        .as_any()
        .downcast_ref::<HostProxy>()
        .map(|proxy| proxy.handle)
}
