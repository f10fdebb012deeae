//! Centralized error types for the Voxcast core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Gives each variant a stable machine-readable code via [`ErrorCode`]
//!
//! The library itself has no HTTP surface, so no `IntoResponse` impl lives
//! here; an embedding binary that exposes one maps [`ErrorCode::code`] onto
//! its own response type.

use serde::Serialize;
use thiserror::Error;

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a machine-readable error code for API responses.
    fn code(&self) -> &'static str;
}

/// Application-wide error type for the Voxcast playback runtime.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum VoxError {
    /// The transcoder subprocess failed to start, crashed, timed out, or
    /// produced an empty stream.
    #[error("load failed for {identity}: {reason}")]
    Load {
        /// Track identity that failed to load.
        identity: String,
        /// Human-readable failure reason (includes captured stderr, if any).
        reason: String,
    },

    /// PCM read from the loader's reader failed repeatedly.
    #[error("decode failed for {identity}: {reason}")]
    Decode {
        /// Track identity being decoded when the failure occurred.
        identity: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// Opus encoding failed on a single frame.
    #[error("encode failed: {reason}")]
    Encode {
        /// Human-readable failure reason.
        reason: String,
    },

    /// Send on a closed voice sink.
    #[error("voice send failed: {reason}")]
    VoiceSend {
        /// Human-readable failure reason.
        reason: String,
    },

    /// The platform could not confirm the voice channel within the timeout.
    #[error("voice join failed: {reason}")]
    VoiceJoin {
        /// Human-readable failure reason.
        reason: String,
    },

    /// Operation attempted on an empty queue.
    #[error("queue underflow: {reason}")]
    QueueUnderflow {
        /// Human-readable description of the attempted operation.
        reason: String,
    },

    /// Invalid configuration parameter.
    #[error("invalid configuration: {reason}")]
    Config {
        /// Human-readable description of the invalid value.
        reason: String,
    },

    /// Unexpected internal error; never a recoverable per-frame condition.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorCode for VoxError {
    fn code(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load_error",
            Self::Decode { .. } => "decode_error",
            Self::Encode { .. } => "encode_error",
            Self::VoiceSend { .. } => "voice_send_error",
            Self::VoiceJoin { .. } => "voice_join_error",
            Self::QueueUnderflow { .. } => "queue_underflow",
            Self::Config { .. } => "config_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Convenient Result alias for application-wide operations.
pub type VoxResult<T> = Result<T, VoxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_returns_correct_code() {
        let err = VoxError::Load {
            identity: "abc".into(),
            reason: "timed out".into(),
        };
        assert_eq!(err.code(), "load_error");
    }

    #[test]
    fn queue_underflow_returns_correct_code() {
        let err = VoxError::QueueUnderflow {
            reason: "remove on empty queue".into(),
        };
        assert_eq!(err.code(), "queue_underflow");
        assert!(err.to_string().contains("queue underflow"));
    }
}
