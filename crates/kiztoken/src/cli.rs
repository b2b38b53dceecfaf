//! Clap derive structures for the `kiztoken` CLI.

use clap::{ArgAction, Args, Parser, Subcommand};

/// kiztoken -- manage the developer tokens local gateways accept
#[derive(Debug, Parser)]
#[command(
    name = "kiztoken",
    version,
    about = "Manage Overkiz developer tokens",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify cloud credentials
    Login {
        #[command(flatten)]
        auth: AuthArgs,
    },

    /// List the developer tokens registered on a gateway
    List {
        #[command(flatten)]
        auth: AuthArgs,

        /// The PIN of the gateway
        #[arg(long)]
        pin: String,
    },

    /// Create and activate a new developer token
    Create {
        #[command(flatten)]
        auth: AuthArgs,

        /// The PIN of the gateway
        #[arg(long)]
        pin: String,

        /// The label of the new token
        #[arg(long, default_value = "kizbridge token")]
        label: String,
    },

    /// Delete an existing developer token
    Delete {
        #[command(flatten)]
        auth: AuthArgs,

        /// The PIN of the gateway
        #[arg(long)]
        pin: String,

        /// The UUID of the token to delete
        #[arg(long)]
        uuid: String,
    },
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    /// Region: "europe", "middle east", "africa", "asia", "pacific" or "north america"
    #[arg(long)]
    pub region: String,

    /// Overkiz account username
    #[arg(long)]
    pub username: String,

    /// Account password (falls back to an interactive prompt)
    #[arg(long, env = "OVERKIZ_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}
