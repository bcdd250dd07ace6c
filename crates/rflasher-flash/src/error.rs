//! Session-level error taxonomy
//!
//! Mirrors the component-prefixed error kinds the CLI reports on: each
//! variant renders with its own kind name as the prefix (`Argument:`,
//! `LayoutInvalid:`, ...) and carries the lower-level error it was
//! converted from.

use rflasher_core::layout::LayoutError;
use rflasher_core::wp::WpError;
use rflasher_core::Error as CoreError;

/// Errors a `Session` operation can fail with.
///
/// Ordered roughly by severity, matching the spec's error-kind list.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Unknown option, missing file, contradictory flags.
    #[error("Argument: {0}")]
    Argument(String),

    /// Cannot acquire the big lock, cannot open the log file, powerd lock
    /// write failed.
    #[error("Environment: {0}")]
    Environment(String),

    /// Chip name unknown, region name unknown, no chip detected.
    #[error("NotFound: {0}")]
    NotFound(String),

    /// Multiple chip matches with no `--chip` given, multiple FMAPs,
    /// overlapping included regions.
    #[error("Ambiguous: {0}")]
    Ambiguous(String),

    /// Chip lacks the requested write/erase/unlock/WP function.
    #[error("UnsupportedOperation: {0}")]
    UnsupportedOperation(String),

    /// Underlying read/write/command failed.
    #[error("TransportError: {0}")]
    TransportError(String),

    /// Verify failure, status-register read-back mismatch, WP range not
    /// representable.
    #[error("Mismatch: {0}")]
    Mismatch(String),

    /// Region outside chip, start > end, malformed layout file.
    #[error("LayoutInvalid: {0}")]
    LayoutInvalid(String),
}

impl SessionError {
    /// Build an `Argument` error from a message.
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }

    /// Build an `Environment` error from a message.
    pub fn environment(msg: impl Into<String>) -> Self {
        Self::Environment(msg.into())
    }

    /// Build a `NotFound` error from a message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build an `Ambiguous` error from a message.
    pub fn ambiguous(msg: impl Into<String>) -> Self {
        Self::Ambiguous(msg.into())
    }

    /// Build an `UnsupportedOperation` error from a message.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    /// Build a `Mismatch` error from a message.
    pub fn mismatch(msg: impl Into<String>) -> Self {
        Self::Mismatch(msg.into())
    }
}

impl From<CoreError> for SessionError {
    fn from(e: CoreError) -> Self {
        SessionError::TransportError(e.to_string())
    }
}

impl From<LayoutError> for SessionError {
    fn from(e: LayoutError) -> Self {
        SessionError::LayoutInvalid(e.to_string())
    }
}

impl From<WpError> for SessionError {
    fn from(e: WpError) -> Self {
        match e {
            WpError::ChipUnsupported => {
                SessionError::UnsupportedOperation("write protection".to_string())
            }
            WpError::RangeUnsupported => {
                SessionError::Mismatch("WP range not representable".to_string())
            }
            WpError::ModeUnsupported => {
                SessionError::UnsupportedOperation("WP mode".to_string())
            }
            WpError::VerifyFailed => {
                SessionError::Mismatch("WP status register read-back mismatch".to_string())
            }
            other => SessionError::TransportError(other.to_string()),
        }
    }
}

impl From<Box<dyn std::error::Error>> for SessionError {
    fn from(e: Box<dyn std::error::Error>) -> Self {
        SessionError::TransportError(e.to_string())
    }
}

/// Convenience alias for session-level results.
pub type SessionResult<T> = Result<T, SessionError>;
