//! Fallback codec
//!
//! Script values that are not bridged proxies reach host types through a
//! portable text encoding: the runtime encodes the value, the codec parses the
//! text into a `serde_json::Value` tree and serde decodes that tree into the
//! requested type.

use hostlink_sdk::{ScriptRuntime, ScriptValue};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::{BridgeError, BridgeResult};

/// Portable encode/decode pair used for non-proxied script values
pub trait FallbackCodec: Send + Sync {
    /// Codec name for diagnostics
    fn name(&self) -> &'static str;

    /// Encode a script value; `None` when it has no encoding (`undefined`)
    fn encode(&self, rt: &mut dyn ScriptRuntime, value: &ScriptValue)
        -> BridgeResult<Option<String>>;

    /// Parse an encoded payload into a tree
    fn parse(&self, payload: &str) -> BridgeResult<serde_json::Value>;
}

/// JSON through the runtime's own encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl FallbackCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(
        &self,
        rt: &mut dyn ScriptRuntime,
        value: &ScriptValue,
    ) -> BridgeResult<Option<String>> {
        let payload = rt.json_encode(value)?;
        Ok(payload.filter(|p| !p.is_empty()))
    }

    fn parse(&self, payload: &str) -> BridgeResult<serde_json::Value> {
        serde_json::from_str(payload).map_err(|e| BridgeError::decode("payload", e))
    }
}

/// Encode `value` and parse the payload; `None` when there is nothing to decode
pub(crate) fn encode_tree(
    codec: &dyn FallbackCodec,
    rt: &mut dyn ScriptRuntime,
    value: &ScriptValue,
) -> BridgeResult<Option<serde_json::Value>> {
    match codec.encode(rt, value)? {
        Some(payload) => {
            trace!(target: "hostlink::marshal", codec = codec.name(), %payload, "encoded script value");
            codec.parse(&payload).map(Some)
        }
        None => Ok(None),
    }
}

/// Decode a parsed tree into `T`
pub(crate) fn decode_tree<T: DeserializeOwned>(tree: serde_json::Value) -> BridgeResult<T> {
    serde_json::from_value(tree).map_err(|e| BridgeError::decode(std::any::type_name::<T>(), e))
}
