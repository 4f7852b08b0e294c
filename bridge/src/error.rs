use bprust_schema::SchemaHash;
use thiserror::Error;

use crate::thunk::ThunkViolation;

/// Result type for the `bprust_bridge` library
pub type Result<T> = std::result::Result<T, error_stack::Report<BridgeError>>;

/// Errors raised by the call bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// An entry was used before the host registered its table
    #[error("Call bridge is not active: register the host table before any call")]
    NotActive,

    /// The host tried to register a second table
    #[error("Call bridge is already registered; the host table cannot be replaced")]
    AlreadyRegistered,

    /// The host table was built for a different bridge ABI
    #[error("ABI version mismatch: bridge expects {expected}, host table reports {found}")]
    AbiVersionMismatch {
        /// Version this bridge implements
        expected: u32,
        /// Version stamped in the host table
        found:    u32,
    },

    /// The host table was built against a different schema document
    #[error("Schema mismatch: loaded schema hash {expected}, host table hash {found}")]
    SchemaMismatch {
        /// Hash of the loaded schema document
        expected: SchemaHash,
        /// Hash stamped in the host table
        found:    SchemaHash,
    },

    /// The schema has no such function on the class or its super chain
    #[error("Unknown function `{function}` on class `{class}`")]
    UnknownFunction {
        /// Class searched first
        class:    String,
        /// Function name
        function: String,
    },

    /// A parameter buffer does not match the function's layout
    #[error("Layout mismatch for `{function}`: {detail}")]
    LayoutMismatch {
        /// Function whose layout was expected
        function: String,
        /// What differed
        detail:   String,
    },

    /// A parameter type cannot be laid out
    #[error("Unsupported parameter layout: {0}")]
    UnsupportedLayout(String),

    /// The host broke the custom-thunk call sequence
    #[error("Thunk protocol violation: {0}")]
    ThunkProtocolViolation(ThunkViolation),

    /// The schema document or its stamp could not be loaded
    #[error("Schema load failed: {0}")]
    Schema(String),

    /// A call targeted a null object
    #[error("Null target object for `{0}`")]
    NullObject(String),

    /// A name cannot cross the ABI as a C string
    #[error("Invalid name `{0}`: contains an interior nul byte")]
    InvalidName(String),
}

impl BridgeError {
    /// Create a layout mismatch error
    pub fn layout_mismatch(function: &str, detail: impl std::fmt::Display) -> Self {
        Self::LayoutMismatch {
            function: function.to_string(),
            detail:   detail.to_string(),
        }
    }

    /// Create an unknown function error
    pub fn unknown_function(class: &str, function: &str) -> Self {
        Self::UnknownFunction {
            class:    class.to_string(),
            function: function.to_string(),
        }
    }
}
