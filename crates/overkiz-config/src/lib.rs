//! Shared configuration for the Overkiz bridge binaries.
//!
//! A TOML file plus `OVERKIZ_`-prefixed environment overrides, loaded
//! through figment and validated into an `overkiz_core::BridgeConfig`.
//! The core crate never reads files -- binaries load here and hand the
//! result in.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use overkiz_api::Region;
use overkiz_core::{BridgeConfig, TlsVerification, VendorEndpoint};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub vendor: Vendor,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Deployment mode: which vendor endpoint the bridge talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Local gateway with a pre-issued developer token.
    Local,
    /// Cloud account with username/password login.
    Cloud,
}

/// The `[vendor]` section.
#[derive(Debug, Deserialize)]
pub struct Vendor {
    pub mode: Mode,

    /// Cloud region name (required in cloud mode).
    pub region: Option<String>,

    /// Gateway identifier ("pod"/PIN). In local mode it doubles as the
    /// host fallback: `gateway-{pod}.local`.
    pub pod: Option<String>,

    /// LAN hostname or address of the gateway (local mode).
    pub gateway_host: Option<String>,

    /// Pre-issued developer token (local mode).
    pub token: Option<SecretString>,

    /// Cloud account credentials.
    pub user_id: Option<String>,
    pub password: Option<SecretString>,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Accept the gateway's self-signed certificate. Off by default;
    /// enabling it is logged loudly at client build time.
    #[serde(default)]
    pub danger_accept_invalid_certs: bool,

    /// Custom CA certificate file (PEM).
    pub ca_cert: Option<PathBuf>,
}

fn default_refresh_interval() -> u64 {
    300
}
fn default_timeout() -> u64 {
    30
}

/// The `[http]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_interface")]
    pub interface: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional path prefix the API is served under.
    #[serde(default)]
    pub context_root: Option<String>,

    /// Peer addresses allowed to reach the API. Empty means everyone.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,

    /// Trust `X-Forwarded-For` from a reverse proxy in front of the
    /// bridge when matching `allowed_hosts`.
    #[serde(default)]
    pub behind_proxy: bool,
}

fn default_interface() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            port: default_port(),
            context_root: None,
            allowed_hosts: Vec::new(),
            behind_proxy: false,
        }
    }
}

impl HttpConfig {
    /// The socket address to bind, validating the interface field.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .interface
            .parse()
            .map_err(|_| invalid("http.interface", format!("not an IP address: {}", self.interface)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load configuration from a TOML file plus environment overrides.
///
/// Environment variables use the `OVERKIZ_` prefix with `__` separating
/// sections, e.g. `OVERKIZ_VENDOR__TOKEN` or `OVERKIZ_HTTP__PORT`.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("OVERKIZ_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Validation / translation ────────────────────────────────────────

impl Config {
    /// Validate the vendor section and build the core bridge config.
    pub fn bridge_config(&self) -> Result<BridgeConfig, ConfigError> {
        let v = &self.vendor;

        let endpoint = match v.mode {
            Mode::Local => {
                let token = v
                    .token
                    .clone()
                    .ok_or_else(|| invalid("vendor.token", "required in local mode"))?;
                let host = match (&v.gateway_host, &v.pod) {
                    (Some(host), _) => host.clone(),
                    (None, Some(pod)) => format!("gateway-{pod}.local"),
                    (None, None) => {
                        return Err(invalid(
                            "vendor.gateway_host",
                            "local mode needs gateway_host or pod",
                        ));
                    }
                };
                VendorEndpoint::local_gateway(&host, token)
                    .map_err(|e| invalid("vendor.gateway_host", e.to_string()))?
            }
            Mode::Cloud => {
                let region_name = v
                    .region
                    .as_deref()
                    .ok_or_else(|| invalid("vendor.region", "required in cloud mode"))?;
                let region = parse_region(region_name)?;
                let user_id = v
                    .user_id
                    .clone()
                    .ok_or_else(|| invalid("vendor.user_id", "required in cloud mode"))?;
                let password = v
                    .password
                    .clone()
                    .ok_or_else(|| invalid("vendor.password", "required in cloud mode"))?;
                VendorEndpoint::cloud(region, user_id, password)
            }
        };

        let tls = if v.danger_accept_invalid_certs {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = v.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        Ok(BridgeConfig {
            endpoint,
            tls,
            timeout: Duration::from_secs(v.timeout_secs),
            refresh_interval: Duration::from_secs(v.refresh_interval_secs),
        })
    }
}

/// Parse a region name, listing the accepted values on failure.
pub fn parse_region(name: &str) -> Result<Region, ConfigError> {
    Region::from_name(name).ok_or_else(|| {
        invalid(
            "vendor.region",
            format!(
                "unknown region '{name}'; expected one of \"europe\", \"middle east\", \
                 \"africa\", \"asia\", \"pacific\" or \"north america\""
            ),
        )
    })
}
