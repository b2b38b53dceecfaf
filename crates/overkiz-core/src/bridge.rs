// ── Bridge lifecycle ──
//
// Owns the vendor session and the device cache: authenticates on connect,
// loads the initial snapshot, then refreshes on a fixed interval until
// shutdown. Dispatch turns a high-level action into a single vendor batch.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use overkiz_api::transport::{TlsMode, TransportConfig};
use overkiz_api::{Action, ActionRequest, CommandSpec, Device, SessionClient};

use crate::config::{BridgeConfig, TlsVerification, VendorEndpoint};
use crate::error::CoreError;
use crate::store::DeviceStore;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<BridgeInner>`. Manages the vendor session,
/// the device cache, and the background refresh task.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    config: BridgeConfig,
    store: DeviceStore,
    session: Mutex<Option<SessionClient>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Bridge {
    /// Create a new Bridge from configuration. Does NOT authenticate --
    /// call [`connect()`](Self::connect) to obtain a session and start the
    /// refresh task.
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                config,
                store: DeviceStore::new(),
                session: Mutex::new(None),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the bridge configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Access the underlying device cache.
    pub fn store(&self) -> &DeviceStore {
        &self.inner.store
    }

    /// Cancellation token observed by the background task. Binaries tie
    /// this to process shutdown so the refresh loop exits with the server.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Authenticate and start the refresh loop.
    ///
    /// A failed authentication is fatal and returned to the caller. A
    /// failed *initial* device load is not: the cache starts empty and
    /// recovers on the next scheduled refresh.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let transport = build_transport(&self.inner.config);

        let client = match &self.inner.config.endpoint {
            VendorEndpoint::Local { api_url, token } => {
                SessionClient::with_bearer(api_url.clone(), token, &transport)
                    .map_err(CoreError::auth)?
            }
            VendorEndpoint::Cloud {
                api_url,
                user_id,
                password,
            } => {
                let client = SessionClient::with_session(api_url.clone(), &transport)
                    .map_err(CoreError::auth)?;
                client
                    .login(user_id, password)
                    .await
                    .map_err(CoreError::auth)?;
                debug!("cloud session established");
                client
            }
        };

        *self.inner.session.lock().await = Some(client);

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "initial device load failed");
        }

        let interval = self.inner.config.refresh_interval;
        if !interval.is_zero() {
            let bridge = self.clone();
            let cancel = self.inner.cancel.clone();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(refresh_task(bridge, interval, cancel)));
        }

        info!(devices = self.inner.store.len(), "connected to vendor API");
        Ok(())
    }

    /// Stop the refresh loop and drop the session.
    ///
    /// Cancellation is observed at the next tick; an in-flight vendor
    /// call completes (or times out) naturally before the task exits.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        *self.inner.session.lock().await = None;
        debug!("bridge shut down");
    }

    /// Clone the current session out of the slot.
    async fn session(&self) -> Result<SessionClient, CoreError> {
        self.inner
            .session
            .lock()
            .await
            .clone()
            .ok_or(CoreError::Disconnected)
    }

    // ── Cache refresh ────────────────────────────────────────────

    /// Fetch the device inventory and replace the cache snapshot.
    ///
    /// On failure the previous snapshot stays published untouched.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let session = self.session().await?;
        let devices = session.fetch_devices().await.map_err(CoreError::fetch)?;
        debug!(devices = devices.len(), "device refresh complete");
        self.inner.store.apply_snapshot(devices);
        Ok(())
    }

    // ── Reads & dispatch ─────────────────────────────────────────

    /// Current devices, optionally filtered by class, in snapshot order.
    pub fn devices(&self, class: Option<&str>) -> Vec<Device> {
        self.inner.store.devices_by_class(class.unwrap_or(""))
    }

    /// Send `action_name` to every cached device of `device_class` as one
    /// vendor batch.
    ///
    /// Returns how many devices were targeted. Zero means nothing matched
    /// and **no vendor call was made** -- a valid outcome, distinct from
    /// failure. A non-zero return means the batch was accepted for
    /// asynchronous execution, not that it completed.
    pub async fn dispatch(
        &self,
        action_name: &str,
        device_class: &str,
    ) -> Result<usize, CoreError> {
        let devices = self.inner.store.devices_by_class(device_class);
        if devices.is_empty() {
            debug!(class = device_class, "dispatch found no matching devices");
            return Ok(0);
        }

        let request = ActionRequest {
            label: format!("{action_name}{device_class}s"),
            actions: devices
                .iter()
                .map(|device| Action {
                    device_url: device.device_url.clone(),
                    commands: vec![CommandSpec::named(action_name)],
                })
                .collect(),
        };

        let session = self.session().await?;
        let accepted = session
            .submit_action(&request)
            .await
            .map_err(CoreError::submit)?;

        info!(
            label = %request.label,
            devices = devices.len(),
            exec_id = ?accepted.exec_id,
            "batch accepted for execution"
        );
        Ok(devices.len())
    }
}

// ── Background task ──────────────────────────────────────────────

/// Periodically refresh the device cache until cancelled.
///
/// A failed refresh is logged and the loop continues on its interval --
/// it never crashes the task or surfaces to request handlers.
async fn refresh_task(bridge: Bridge, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = bridge.refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Build a [`TransportConfig`] from the bridge configuration.
fn build_transport(config: &BridgeConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
        cookie_jar: None, // SessionClient::with_session adds one automatically
    }
}
