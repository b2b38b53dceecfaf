//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// Exit codes for process termination.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("unknown region '{name}'")]
    #[diagnostic(
        code(kiztoken::region),
        help(
            "Expected one of \"europe\", \"middle east\", \"africa\", \"asia\", \
             \"pacific\" or \"north america\"."
        )
    )]
    UnknownRegion { name: String },

    #[error("authentication failed")]
    #[diagnostic(
        code(kiztoken::auth),
        help("Verify the username and password of your Overkiz account.")
    )]
    AuthFailed {
        #[source]
        source: overkiz_api::Error,
    },

    #[error("vendor API call failed")]
    #[diagnostic(code(kiztoken::api))]
    Api(#[from] overkiz_api::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownRegion { .. } => exit_code::USAGE,
            Self::AuthFailed { .. } => exit_code::AUTH,
            _ => exit_code::GENERAL,
        }
    }
}
