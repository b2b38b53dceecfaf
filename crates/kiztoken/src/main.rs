//! kiztoken: manage the developer tokens local gateways accept.
//!
//! Each invocation opens a fresh cloud session (login, operation,
//! logout). A token's value is shown exactly once, at creation; the
//! vendor never discloses it again.

mod cli;
mod error;

use clap::Parser;
use secrecy::SecretString;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

use overkiz_api::transport::TransportConfig;
use overkiz_api::{Region, SessionClient};

use crate::cli::{AuthArgs, Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Login { auth } => {
            let session = open_session(&auth).await?;
            // Ask the vendor to confirm the fresh session really took.
            let authenticated = session.is_authenticated().await?;
            if authenticated {
                println!("Logged in!");
            } else {
                println!("Login accepted but the session is not authenticated.");
            }
            close_session(&session).await;
            Ok(())
        }
        Command::List { auth, pin } => {
            let session = open_session(&auth).await?;
            let result = list_tokens(&session, &pin).await;
            close_session(&session).await;
            result
        }
        Command::Create { auth, pin, label } => {
            let session = open_session(&auth).await?;
            let result = create_token(&session, &pin, &label).await;
            close_session(&session).await;
            result
        }
        Command::Delete { auth, pin, uuid } => {
            let session = open_session(&auth).await?;
            let result = delete_token(&session, &pin, &uuid).await;
            close_session(&session).await;
            result
        }
    }
}

// ── Session handling ────────────────────────────────────────────────

async fn open_session(auth: &AuthArgs) -> Result<SessionClient, CliError> {
    let region = Region::from_name(&auth.region).ok_or_else(|| CliError::UnknownRegion {
        name: auth.region.clone(),
    })?;

    let password = match &auth.password {
        Some(password) => SecretString::from(password.clone()),
        None => SecretString::from(rpassword::prompt_password("Overkiz password: ")?),
    };

    let session = SessionClient::with_session(
        overkiz_api::session::cloud_api_url(region),
        &TransportConfig::default(),
    )
    .map_err(|source| CliError::AuthFailed { source })?;

    session
        .login(&auth.username, &password)
        .await
        .map_err(|source| CliError::AuthFailed { source })?;

    Ok(session)
}

/// Best-effort logout; the cookie session dies with the process anyway.
async fn close_session(session: &SessionClient) {
    if let Err(e) = session.logout().await {
        tracing::warn!(error = %e, "logout failed (non-fatal)");
    }
}

// ── Commands ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct TokenRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Scope")]
    scope: String,
}

async fn list_tokens(session: &SessionClient, pin: &str) -> Result<(), CliError> {
    let tokens = session.list_tokens(pin).await?;
    if tokens.is_empty() {
        println!("No tokens registered for gateway {pin}.");
        return Ok(());
    }

    let rows: Vec<TokenRow> = tokens
        .iter()
        .map(|token| TokenRow {
            label: token.label.clone(),
            created: token
                .created_at()
                .map_or_else(|| "-".into(), |ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            uuid: token.uuid.clone(),
            scope: token.scope.clone(),
        })
        .collect();

    println!("{}", Table::new(rows));
    Ok(())
}

async fn create_token(session: &SessionClient, pin: &str, label: &str) -> Result<(), CliError> {
    let token = session.create_token(pin, label).await?;
    println!("Token: {token}");
    println!("Store the token somewhere safe! You will never be able to view it again.");
    Ok(())
}

async fn delete_token(session: &SessionClient, pin: &str, uuid: &str) -> Result<(), CliError> {
    session.delete_token(pin, uuid).await?;
    println!("Token deleted");
    Ok(())
}
