// HTTP front door: REST routes over the bridge core.
//
// The routing layer only translates between HTTP and the core's two
// operations -- cache reads and dispatch. The "0 devices found" vs
// "N devices commanded" distinction is decided in the core; here it
// just becomes a status code.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use overkiz_config::HttpConfig;
use overkiz_core::{Bridge, Device};

use crate::host_filter::{self, HostFilter};

/// Build the application router for the given bridge and HTTP settings.
pub fn router(bridge: Bridge, http: &HttpConfig) -> Router {
    let api = Router::new()
        .route("/devices", get(list_devices))
        .route("/devices/{class}", get(list_devices_by_class))
        .route("/devices/RollerShutters/open", get(open_roller_shutters))
        .route("/devices/RollerShutters/close", get(close_roller_shutters))
        .with_state(bridge);

    let mut app = Router::new().nest(&api_prefix(http.context_root.as_deref()), api);

    if !http.allowed_hosts.is_empty() {
        let filter = HostFilter::new(&http.allowed_hosts, http.behind_proxy);
        app = app.layer(axum::middleware::from_fn_with_state(
            filter,
            host_filter::enforce,
        ));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(60)))
}

/// `{context_root}/api/v1`, normalized to a leading slash and no
/// trailing slash.
fn api_prefix(context_root: Option<&str>) -> String {
    let mut root = context_root
        .unwrap_or("")
        .trim()
        .trim_end_matches('/')
        .to_owned();
    if !root.is_empty() && !root.starts_with('/') {
        root.insert(0, '/');
    }
    format!("{root}/api/v1")
}

// ── Handlers ────────────────────────────────────────────────────────

async fn list_devices(State(bridge): State<Bridge>) -> Json<Vec<Device>> {
    Json(bridge.devices(None))
}

async fn list_devices_by_class(
    State(bridge): State<Bridge>,
    Path(class): Path<String>,
) -> Json<Vec<Device>> {
    Json(bridge.devices(Some(&class)))
}

async fn open_roller_shutters(State(bridge): State<Bridge>) -> Response {
    dispatch_roller_shutters(&bridge, "open").await
}

async fn close_roller_shutters(State(bridge): State<Bridge>) -> Response {
    dispatch_roller_shutters(&bridge, "close").await
}

/// 404 when nothing matched, 202 when the batch was accepted, 502 when
/// the vendor rejected it or was unreachable.
async fn dispatch_roller_shutters(bridge: &Bridge, action: &str) -> Response {
    match bridge.dispatch(action, "RollerShutter").await {
        Ok(0) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No RollerShutters found" })),
        )
            .into_response(),
        Ok(_) => (
            StatusCode::ACCEPTED,
            Json(json!({ "status": "Executing" })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, action, "dispatch failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}
