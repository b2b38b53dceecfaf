// ── Core error types ──
//
// User-facing errors from overkiz-core, following the bridge's failure
// taxonomy: authentication is fatal at startup, a failed refresh is
// contained (the cache keeps its last snapshot), and a rejected dispatch
// surfaces to the caller of that one request. The api-layer error is
// folded in per operation so the context survives the translation.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cannot obtain a vendor session. Fatal at startup -- the bridge
    /// refuses to serve traffic without one.
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Device listing failed. Recoverable: the cache retains its last
    /// good snapshot and the next interval retries.
    #[error("device refresh failed: {message}")]
    FetchFailed { message: String },

    /// The vendor rejected (or never received) an action batch. Surfaces
    /// to the caller of that dispatch; not retried automatically.
    #[error("batch submission failed: {message}")]
    SubmitRejected { message: String },

    /// An operation was attempted before `connect()` or after `shutdown()`.
    #[error("bridge is not connected")]
    Disconnected,

    /// Invalid bridge configuration.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn auth(err: overkiz_api::Error) -> Self {
        match err {
            overkiz_api::Error::Authentication { message } => {
                Self::AuthenticationFailed { message }
            }
            other => Self::AuthenticationFailed {
                message: other.to_string(),
            },
        }
    }

    pub(crate) fn fetch(err: overkiz_api::Error) -> Self {
        Self::FetchFailed {
            message: err.to_string(),
        }
    }

    pub(crate) fn submit(err: overkiz_api::Error) -> Self {
        Self::SubmitRejected {
            message: err.to_string(),
        }
    }
}
