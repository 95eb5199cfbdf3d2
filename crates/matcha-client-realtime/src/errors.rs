//! Error types for the realtime layer
//!
//! Connection-level failures only. None of these escape the channel manager
//! as panics or return values: they become one-line diagnostics on the
//! handler's `on_error` and log records.

// ----------------------------------------------------------------------------
// Realtime Errors
// ----------------------------------------------------------------------------

/// Errors produced while establishing or driving a realtime link
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("endpoint base URL cannot carry a path")]
    InvalidBase,

    #[error("connect failed: {reason}")]
    ConnectFailed { reason: String },

    #[error("connect timed out after {timeout_ms}ms")]
    ConnectTimeout { timeout_ms: u64 },

    #[error("link error: {reason}")]
    Link { reason: String },
}

impl RealtimeError {
    /// Create a connect-failed error with a reason
    pub fn connect_failed<R: Into<String>>(reason: R) -> Self {
        RealtimeError::ConnectFailed {
            reason: reason.into(),
        }
    }

    /// Create a link error with a reason
    pub fn link<R: Into<String>>(reason: R) -> Self {
        RealtimeError::Link {
            reason: reason.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_are_one_line() {
        let errors = [
            RealtimeError::connect_failed("connection refused"),
            RealtimeError::ConnectTimeout { timeout_ms: 10_000 },
            RealtimeError::link("broken pipe"),
        ];
        for err in errors {
            assert!(!err.to_string().contains('\n'));
        }
    }
}
