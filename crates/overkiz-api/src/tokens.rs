// Developer-token endpoints
//
// Local gateways accept bearer tokens that are minted through the cloud
// account: generate an opaque token, then activate it for a gateway ("pod")
// with devmode scope. These endpoints require a logged-in cloud session.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::session::SessionClient;

/// A developer token registered on a gateway.
///
/// The listing endpoint never returns the token value itself -- only
/// metadata. The value is shown exactly once, at activation.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayToken {
    #[serde(default)]
    pub label: String,
    pub uuid: String,
    #[serde(default)]
    pub scope: String,
    #[serde(rename = "gatewayId")]
    pub gateway_id: String,
    /// Creation time in epoch milliseconds.
    #[serde(rename = "gatewayCreationTime", default)]
    pub gateway_creation_time: i64,
}

impl GatewayToken {
    /// Creation time as a UTC timestamp, if the vendor supplied one.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        if self.gateway_creation_time == 0 {
            return None;
        }
        Utc.timestamp_millis_opt(self.gateway_creation_time).single()
    }
}

#[derive(Debug, Deserialize)]
struct AuthenticatedResponse {
    #[serde(default)]
    authenticated: bool,
}

#[derive(Debug, Deserialize)]
struct TokenValueResponse {
    token: String,
}

#[derive(Debug, Serialize)]
struct ActivateTokenRequest<'a> {
    label: &'a str,
    token: &'a str,
    scope: &'a str,
}

impl SessionClient {
    /// Whether the current cookie session is still authenticated.
    ///
    /// `GET /authenticated`
    pub async fn is_authenticated(&self) -> Result<bool, Error> {
        let url = self.api_url("authenticated")?;
        let resp: AuthenticatedResponse = self.get_json(url).await?;
        Ok(resp.authenticated)
    }

    /// List the developer tokens registered on a gateway.
    ///
    /// `GET /config/{pod}/local/tokens/devmode`. The response can include
    /// entries for other gateways on the account; they are filtered out.
    pub async fn list_tokens(&self, pod: &str) -> Result<Vec<GatewayToken>, Error> {
        let url = self.api_url(&format!("config/{pod}/local/tokens/devmode"))?;
        let tokens: Vec<GatewayToken> = self.get_json(url).await?;
        Ok(tokens
            .into_iter()
            .filter(|t| t.gateway_id == pod)
            .collect())
    }

    /// Generate a fresh (not yet activated) token value.
    ///
    /// `GET /config/{pod}/local/tokens/generate`
    pub async fn generate_token(&self, pod: &str) -> Result<String, Error> {
        let url = self.api_url(&format!("config/{pod}/local/tokens/generate"))?;
        let resp: TokenValueResponse = self.get_json(url).await?;
        Ok(resp.token)
    }

    /// Activate a generated token on a gateway with devmode scope.
    ///
    /// `POST /config/{pod}/local/tokens`. Returns the activated token
    /// value -- the only time the vendor ever discloses it.
    pub async fn activate_token(
        &self,
        pod: &str,
        label: &str,
        token: &str,
    ) -> Result<String, Error> {
        let url = self.api_url(&format!("config/{pod}/local/tokens"))?;
        let body = ActivateTokenRequest {
            label,
            token,
            scope: "devmode",
        };
        let resp: TokenValueResponse = self.post_json(url, &body).await?;
        Ok(resp.token)
    }

    /// Generate and activate a token in one step.
    pub async fn create_token(&self, pod: &str, label: &str) -> Result<String, Error> {
        let generated = self.generate_token(pod).await?;
        debug!(pod, label, "token generated, activating");
        self.activate_token(pod, label, &generated).await
    }

    /// Delete a token by its UUID.
    ///
    /// `DELETE /config/{pod}/local/tokens/{uuid}`
    pub async fn delete_token(&self, pod: &str, uuid: &str) -> Result<(), Error> {
        let url = self.api_url(&format!("config/{pod}/local/tokens/{uuid}"))?;
        self.delete(url).await
    }
}
