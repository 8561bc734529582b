//! Error types for the runtime contract

use crate::value::ObjectId;

/// Result type for runtime calls
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Errors raised by (or thrown into) a script runtime.
///
/// Every error that crosses into script becomes one of these; the runtime
/// surfaces it as an exception.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    /// Operation applied to a value of the wrong type
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Unknown global or module
    #[error("ReferenceError: {0}")]
    ReferenceError(String),

    /// Value out of range (e.g. encode depth exceeded)
    #[error("RangeError: {0}")]
    RangeError(String),

    /// Object id does not name a live object in this runtime
    #[error("Invalid object reference: {0}")]
    InvalidObject(ObjectId),

    /// Exception thrown by native code
    #[error("{name}: {message}")]
    Thrown {
        /// Error class name as seen by script
        name: String,
        /// Error message
        message: String,
    },
}

impl ScriptError {
    /// Create a thrown error with the given class name
    pub fn thrown(name: impl Into<String>, message: impl Into<String>) -> Self {
        ScriptError::Thrown {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Message without the error class prefix
    pub fn message(&self) -> String {
        match self {
            ScriptError::TypeError(m) | ScriptError::ReferenceError(m) | ScriptError::RangeError(m) => {
                m.clone()
            }
            ScriptError::InvalidObject(id) => format!("invalid object reference {}", id),
            ScriptError::Thrown { message, .. } => message.clone(),
        }
    }
}

impl From<String> for ScriptError {
    fn from(s: String) -> Self {
        ScriptError::thrown("Error", s)
    }
}

impl From<&str> for ScriptError {
    fn from(s: &str) -> Self {
        ScriptError::thrown("Error", s)
    }
}
