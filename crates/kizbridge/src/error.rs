//! Binary error type with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use overkiz_config::ConfigError;
use overkiz_core::CoreError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
}

#[derive(Debug, Error, Diagnostic)]
pub enum ServerError {
    #[error("configuration error")]
    #[diagnostic(
        code(kizbridge::config),
        help("Check the file passed via --config (and any OVERKIZ_* overrides).")
    )]
    Config(#[from] ConfigError),

    #[error("vendor session error")]
    #[diagnostic(
        code(kizbridge::vendor),
        help(
            "The bridge refuses to serve without a vendor session.\n\
             Verify the token (local mode) or the account credentials (cloud mode)."
        )
    )]
    Core(#[from] CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => exit_code::CONFIG,
            Self::Core(CoreError::AuthenticationFailed { .. }) => exit_code::AUTH,
            _ => exit_code::GENERAL,
        }
    }
}
