//! Central error types for the interop bridge.
//!
//! Input-contract errors (missing callback, non-shareable texture, bad format,
//! null shared handle) are raised before any bridge state changes. Native call
//! failures carry the call name and the HRESULT it returned.

use thiserror::Error;

use crate::format::TextureFormat;

/// Main error type for bridge and pipeline operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A required callback was not supplied
    #[error("Missing required callback: {0}")]
    MissingCallback(&'static str),

    /// Texture lacks the cross-device shared flag
    #[error("Texture must be created with the shared resource flag")]
    NotShareable,

    /// Texture format has no legacy-device equivalent
    #[error("Texture format {0:?} is not compatible with shared resource opening")]
    UnsupportedFormat(TextureFormat),

    /// The OS returned a null shared handle
    #[error("Invalid shared handle")]
    InvalidSharedHandle,

    /// A numeric or structural argument was rejected
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A native device, texture or draw call failed
    #[error("{call} failed with HRESULT {code:#010x}")]
    Native { call: &'static str, code: i32 },

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl BridgeError {
    /// True for errors caused by the caller's inputs rather than the driver.
    pub fn is_input_contract(&self) -> bool {
        matches!(
            self,
            BridgeError::MissingCallback(_)
                | BridgeError::NotShareable
                | BridgeError::UnsupportedFormat(_)
                | BridgeError::InvalidSharedHandle
                | BridgeError::InvalidArgument(_)
        )
    }

    /// The HRESULT of a failed native call, if this is one.
    pub fn hresult(&self) -> Option<i32> {
        match self {
            BridgeError::Native { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Extension trait for adding context to Option types.
pub trait OptionExt<T> {
    /// Convert None to BridgeError::Other with the given message.
    fn context(self, msg: &str) -> BridgeResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context(self, msg: &str) -> BridgeResult<T> {
        self.ok_or_else(|| BridgeError::Other(msg.to_string()))
    }
}

/// Maps `windows` crate results onto [`BridgeError::Native`].
#[cfg(windows)]
pub trait HResultExt<T> {
    /// Tag a failed native call with its name.
    fn native(self, call: &'static str) -> BridgeResult<T>;
}

#[cfg(windows)]
impl<T> HResultExt<T> for windows_core::Result<T> {
    fn native(self, call: &'static str) -> BridgeResult<T> {
        self.map_err(|e| BridgeError::Native {
            call,
            code: e.code().0,
        })
    }
}

/// Type alias for Results using BridgeError.
pub type BridgeResult<T> = Result<T, BridgeError>;
