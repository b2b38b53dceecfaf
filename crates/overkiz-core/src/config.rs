// ── Runtime bridge configuration ──
//
// These types describe *how* to reach the vendor API. They carry
// credential data and connection tuning, but never touch disk -- the
// binaries construct a `BridgeConfig` from their own config sources and
// hand it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use overkiz_api::Region;

/// Where and how to reach the vendor API.
#[derive(Debug, Clone)]
pub enum VendorEndpoint {
    /// Local gateway in developer mode: bearer token against the LAN host.
    Local { api_url: Url, token: SecretString },
    /// Cloud account: username/password login against the regional host.
    Cloud {
        api_url: Url,
        user_id: String,
        password: SecretString,
    },
}

impl VendorEndpoint {
    /// Conventional local-gateway endpoint for a host on the LAN.
    pub fn local_gateway(
        gateway_host: &str,
        token: SecretString,
    ) -> Result<Self, overkiz_api::Error> {
        Ok(Self::Local {
            api_url: overkiz_api::session::local_api_url(gateway_host)?,
            token,
        })
    }

    /// Conventional cloud endpoint for a regional account.
    pub fn cloud(region: Region, user_id: String, password: SecretString) -> Self {
        Self::Cloud {
            api_url: overkiz_api::session::cloud_api_url(region),
            user_id,
            password,
        }
    }
}

/// TLS verification strategy (core-level mirror of the api crate's TlsMode).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). The default -- skipping verification is
    /// an explicit opt-in for gateways with self-signed certificates.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification.
    DangerAcceptInvalid,
}

/// Configuration for one bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Vendor endpoint and credentials.
    pub endpoint: VendorEndpoint,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout for vendor calls.
    pub timeout: Duration,
    /// How often the device cache refreshes. Zero disables the
    /// background task (initial load only).
    pub refresh_interval: Duration,
}

impl BridgeConfig {
    pub fn new(endpoint: VendorEndpoint) -> Self {
        Self {
            endpoint,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh_interval: Duration::from_secs(300),
        }
    }
}
