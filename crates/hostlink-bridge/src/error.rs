//! Error types for the object bridge

use hostlink_sdk::ScriptError;

use crate::registry::Handle;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur while resolving, converting or invoking host values
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// No field, map entry or method answers to the key
    #[error("undefined property '{key}'")]
    UndefinedProperty {
        /// Script-side key that missed
        key: String,
    },

    /// Handle does not resolve in this registry (stale or foreign proxy)
    #[error("unexpected pointer: handle {handle} is not registered")]
    UnexpectedPointer {
        /// The handle that failed to resolve
        handle: Handle,
    },

    /// Fallback payload could not be decoded into the requested type
    #[error("cannot decode {target}: {message}")]
    Decode {
        /// Requested host type
        target: &'static str,
        /// Decoder message
        message: String,
    },

    /// Trailing error returned by a host function
    #[error("{0}")]
    Host(anyhow::Error),

    /// Script value has the wrong shape for the requested host type
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Requested host type
        expected: String,
        /// What script supplied
        got: String,
    },

    /// Missing required argument or too many arguments
    #[error("argument error: {0}")]
    Argument(String),

    /// Object lock already held, by the host or by a method still running
    /// on the same record
    #[error("{type_name} is busy: record is locked")]
    Busy {
        /// Host type of the locked object
        type_name: &'static str,
    },

    /// Materializer input is not a record or pointer to record
    #[error("cannot materialize {0}: not a record")]
    NotARecord(String),

    /// Error raised by the runtime during a re-entrant call
    #[error(transparent)]
    Script(#[from] ScriptError),
}

impl BridgeError {
    /// Create a decode error for `target`
    pub fn decode(target: &'static str, message: impl ToString) -> Self {
        BridgeError::Decode {
            target,
            message: message.to_string(),
        }
    }

    /// Create a type mismatch error
    pub fn mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        BridgeError::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Check if this is a resolution miss
    pub fn is_undefined_property(&self) -> bool {
        matches!(self, BridgeError::UndefinedProperty { .. })
    }

    /// Convert into the exception thrown into script
    pub fn into_script_error(self) -> ScriptError {
        match self {
            BridgeError::Script(e) => e,
            BridgeError::Host(e) => ScriptError::thrown("Error", format!("{:#}", e)),
            e @ (BridgeError::Decode { .. }
            | BridgeError::TypeMismatch { .. }
            | BridgeError::Argument(_)) => ScriptError::TypeError(e.to_string()),
            e @ BridgeError::UndefinedProperty { .. } => ScriptError::ReferenceError(e.to_string()),
            e => ScriptError::thrown("BridgeError", e.to_string()),
        }
    }
}

impl From<BridgeError> for ScriptError {
    fn from(e: BridgeError) -> Self {
        e.into_script_error()
    }
}
