//! Engine error type.
//!
//! Every fallible engine call returns [`VgResult`]. Errors are grouped into
//! four stable categories ([`ErrorCode`]) so hosts can branch on the category
//! (e.g. recreate the device on `Backend`) without parsing messages.

use thiserror::Error;

pub type VgResult<T> = Result<T, VgError>;

/// Stable error category.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    InvalidArgument,
    OutOfMemory,
    Backend,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VgError {
    /// Bad input or wrong context state (no open frame, foreign path, bad style).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation failure or a fixed-depth stack overflow.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// GPU-side failure; usually fatal to the current frame.
    #[error("backend failure: {0}")]
    Backend(String),

    /// The active backend does not implement the operation.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl VgError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn oom(msg: impl Into<String>) -> Self {
        Self::OutOfMemory(msg.into())
    }

    pub(crate) fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::OutOfMemory(_) => ErrorCode::OutOfMemory,
            Self::Backend(_) => ErrorCode::Backend,
            Self::Unsupported(_) => ErrorCode::Unsupported,
        }
    }
}
