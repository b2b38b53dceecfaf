// Session client for the Overkiz enduser API.
//
// Two deployment modes share one client type: a local gateway reached with
// a pre-issued developer token (bearer header), and the cloud API reached
// with a username/password login (cookie session). The mode decides the
// base URL and how requests authenticate; once built, a session is
// immutable for the life of the process -- there is no re-login on expiry.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Overkiz cloud region. Decides which regional host serves the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Europe,
    MiddleEast,
    Africa,
    Asia,
    Pacific,
    NorthAmerica,
}

impl Region {
    /// The cloud host serving this region.
    pub fn host(self) -> &'static str {
        match self {
            Self::Europe | Self::MiddleEast | Self::Africa => "ha101-1.overkiz.com",
            Self::Asia | Self::Pacific => "ha201-1.overkiz.com",
            Self::NorthAmerica => "ha401-1.overkiz.com",
        }
    }

    /// Parse the region names the vendor documents. Returns `None` for
    /// anything else.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "europe" => Some(Self::Europe),
            "middle east" => Some(Self::MiddleEast),
            "africa" => Some(Self::Africa),
            "asia" => Some(Self::Asia),
            "pacific" => Some(Self::Pacific),
            "north america" => Some(Self::NorthAmerica),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Europe => "europe",
            Self::MiddleEast => "middle east",
            Self::Africa => "africa",
            Self::Asia => "asia",
            Self::Pacific => "pacific",
            Self::NorthAmerica => "north america",
        }
    }
}

/// Base URL of a local gateway's enduser API.
///
/// Gateways expose the API on port 8443 behind a self-signed certificate.
pub fn local_api_url(gateway_host: &str) -> Result<Url, Error> {
    Url::parse(&format!(
        "https://{gateway_host}:8443/enduser-mobile-web/1/enduserAPI"
    ))
    .map_err(Error::InvalidUrl)
}

/// Base URL of the cloud enduser API for a region.
pub fn cloud_api_url(region: Region) -> Url {
    Url::parse(&format!(
        "https://{}/enduser-mobile-web/enduserAPI",
        region.host()
    ))
    .expect("regional host is a valid URL")
}

/// HTTP client for one authenticated vendor session.
///
/// Cheaply cloneable (the inner `reqwest::Client` is reference-counted),
/// so concurrent callers never serialize on a lock around it.
#[derive(Debug, Clone)]
pub struct SessionClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SessionClient {
    /// Create a client that authenticates every request with a bearer
    /// token (local-gateway mode).
    pub fn with_bearer(
        base_url: Url,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())).map_err(|_| {
                Error::Authentication {
                    message: "token contains characters not valid in an HTTP header".into(),
                }
            })?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, base_url })
    }

    /// Create a client that authenticates through a cookie-jar session
    /// (cloud mode). Call [`login`](Self::login) before issuing requests.
    ///
    /// If the transport doesn't already include a cookie jar, one is
    /// created automatically.
    pub fn with_session(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self { http, base_url })
    }

    /// The API base URL this session talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Authenticate a cloud session with username/password.
    ///
    /// `POST /login` with form-encoded credentials; the session cookie
    /// lands in the client's jar and rides along on subsequent requests.
    pub async fn login(&self, user_id: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.api_url("login")?;
        debug!("logging in at {}", url);

        let form = [
            ("userId", user_id),
            ("userPassword", password.expose_secret()),
        ];

        let resp = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        debug!("login successful");
        Ok(())
    }

    /// End a cloud session.
    ///
    /// `POST /logout`
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.api_url("logout")?;
        debug!("logging out at {}", url);

        let _resp = self
            .http
            .post(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        debug!("logout complete");
        Ok(())
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build a full URL for an API path below the base URL.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&full).map_err(Error::InvalidUrl)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request, check the status, and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        Self::decode(resp).await
    }

    /// Send a POST request with a JSON body, check the status, and decode
    /// the JSON response.
    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::decode(resp).await
    }

    /// Send a DELETE request and check the status. The body is discarded.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {}", url);

        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// Check the status and decode the body, keeping the raw text for
    /// diagnostics on either failure.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
