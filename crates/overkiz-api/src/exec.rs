// Batch action execution
//
// `POST /exec/apply` bundles commands for multiple devices into one request
// that the vendor executes asynchronously: a 2xx response means the batch
// was accepted, not that any shutter has moved.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::session::SessionClient;

/// One batch of actions, submitted as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Human-readable batch name, shown in the vendor's execution history.
    pub label: String,
    pub actions: Vec<Action>,
}

/// Commands addressed to a single device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "deviceURL")]
    pub device_url: String,
    pub commands: Vec<CommandSpec>,
}

/// A single vendor command, e.g. `open` or `close`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

impl CommandSpec {
    /// A parameterless command.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }
}

/// Response envelope from `POST /exec/apply`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecResponse {
    /// Identifier of the asynchronous execution, when the vendor returns one.
    #[serde(rename = "execId", default)]
    pub exec_id: Option<String>,
}

impl SessionClient {
    /// Submit a batch action request for asynchronous execution.
    ///
    /// Success means "accepted": the vendor queues the batch and executes
    /// it on its own schedule; per-device outcomes are not reported here.
    pub async fn submit_action(&self, request: &ActionRequest) -> Result<ExecResponse, Error> {
        let url = self.api_url("exec/apply")?;
        tracing::debug!(
            label = %request.label,
            actions = request.actions.len(),
            "submitting batch action"
        );
        self.post_json(url, request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn close_request() -> ActionRequest {
        ActionRequest {
            label: "closeRollerShutters".into(),
            actions: vec![
                Action {
                    device_url: "io://1234-5678-9012/111111".into(),
                    commands: vec![CommandSpec::named("close")],
                },
                Action {
                    device_url: "io://1234-5678-9012/222222".into(),
                    commands: vec![CommandSpec::named("close")],
                },
            ],
        }
    }

    #[test]
    fn action_request_round_trips_through_json() {
        let request = close_request();
        let json = serde_json::to_string(&request).unwrap();
        let parsed: ActionRequest = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, request);
        assert_eq!(parsed.label, "closeRollerShutters");
        assert_eq!(parsed.actions.len(), 2);
        for (action, original) in parsed.actions.iter().zip(&request.actions) {
            assert_eq!(action.device_url, original.device_url);
            assert_eq!(action.commands[0].name, "close");
        }
    }

    #[test]
    fn device_url_serializes_with_vendor_casing() {
        let json = serde_json::to_value(close_request()).unwrap();
        let first = &json["actions"][0];
        assert!(first.get("deviceURL").is_some());
        // Parameterless commands omit the parameters array entirely.
        assert!(first["commands"][0].get("parameters").is_none());
    }
}
