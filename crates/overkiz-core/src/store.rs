// ── Device snapshot store ──
//
// Whole-list snapshots published through a `watch` channel. The refresher
// replaces the snapshot atomically; readers clone the `Arc` out of the
// channel and can never observe a torn or partially written list. Order
// of the vendor response is preserved -- the snapshot is the sequence the
// gateway reported, not a keyed map.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use overkiz_api::Device;

/// In-memory device cache with atomic whole-snapshot replacement.
///
/// A failed refresh never touches the store, so once loaded it stays
/// stale-but-available until the next successful refresh.
pub struct DeviceStore {
    snapshot: watch::Sender<Arc<Vec<Device>>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl DeviceStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (last_refresh, _) = watch::channel(None);
        Self {
            snapshot,
            last_refresh,
        }
    }

    /// Replace the published snapshot wholesale and stamp the refresh time.
    pub fn apply_snapshot(&self, devices: Vec<Device>) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(devices));
        self.last_refresh.send_modify(|t| *t = Some(Utc::now()));
    }

    /// The current snapshot (cheap `Arc` clone).
    pub fn devices(&self) -> Arc<Vec<Device>> {
        self.snapshot.borrow().clone()
    }

    /// Devices whose class matches, in snapshot order. An empty class
    /// returns the full snapshot.
    pub fn devices_by_class(&self, class: &str) -> Vec<Device> {
        let snap = self.devices();
        if class.is_empty() {
            return snap.as_ref().clone();
        }
        snap.iter().filter(|d| d.class == class).cloned().collect()
    }

    /// Subscribe to snapshot replacements via a `watch::Receiver`.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Device>>> {
        self.snapshot.subscribe()
    }

    pub fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.borrow().is_empty()
    }

    /// When the last successful refresh happened, or `None` if the store
    /// has never been loaded.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    /// How long ago the last successful refresh occurred.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn device(label: &str, class: &str, url: &str) -> Device {
        Device {
            label: label.into(),
            class: class.into(),
            device_url: url.into(),
        }
    }

    fn mixed_snapshot() -> Vec<Device> {
        vec![
            device("Kitchen shutter", "RollerShutter", "io://gw/1"),
            device("Hallway light", "Light", "io://gw/2"),
            device("Bedroom shutter", "RollerShutter", "io://gw/3"),
            device("Garden sensor", "TemperatureSensor", "io://gw/4"),
            device("Attic shutter", "RollerShutter", "io://gw/5"),
        ]
    }

    #[test]
    fn filter_by_class_preserves_snapshot_order() {
        let store = DeviceStore::new();
        store.apply_snapshot(mixed_snapshot());

        let shutters = store.devices_by_class("RollerShutter");
        assert_eq!(shutters.len(), 3);
        assert_eq!(
            shutters.iter().map(|d| d.device_url.as_str()).collect::<Vec<_>>(),
            ["io://gw/1", "io://gw/3", "io://gw/5"]
        );
    }

    #[test]
    fn empty_class_returns_full_snapshot() {
        let store = DeviceStore::new();
        store.apply_snapshot(mixed_snapshot());

        assert_eq!(store.devices_by_class("").len(), 5);
        assert_eq!(store.devices().len(), 5);
    }

    #[test]
    fn unknown_class_returns_empty() {
        let store = DeviceStore::new();
        store.apply_snapshot(mixed_snapshot());

        assert!(store.devices_by_class("GarageDoor").is_empty());
    }

    #[test]
    fn snapshot_is_replaced_wholesale() {
        let store = DeviceStore::new();
        store.apply_snapshot(mixed_snapshot());

        let before = store.devices();
        store.apply_snapshot(vec![device("Only shutter", "RollerShutter", "io://gw/9")]);

        // The reader that grabbed the old Arc still sees a complete list.
        assert_eq!(before.len(), 5);
        assert_eq!(store.len(), 1);
        assert_eq!(store.devices()[0].device_url, "io://gw/9");
    }

    #[test]
    fn last_refresh_is_stamped_on_apply() {
        let store = DeviceStore::new();
        assert!(store.last_refresh().is_none());
        assert!(store.data_age().is_none());

        store.apply_snapshot(Vec::new());
        assert!(store.last_refresh().is_some());
        assert!(store.data_age().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reads_never_observe_torn_snapshots() {
        let store = Arc::new(DeviceStore::new());
        store.apply_snapshot(mixed_snapshot()); // 5 devices

        let mut readers = Vec::new();
        for _ in 0..4 {
            let store = Arc::clone(&store);
            readers.push(tokio::spawn(async move {
                for _ in 0..1_000 {
                    let len = store.devices().len();
                    // Either the 5-device or the 2-device snapshot --
                    // never anything in between.
                    assert!(len == 5 || len == 2, "torn snapshot of {len} devices");
                }
            }));
        }

        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for i in 0..500 {
                    if i % 2 == 0 {
                        store.apply_snapshot(vec![
                            device("a", "RollerShutter", "io://gw/1"),
                            device("b", "RollerShutter", "io://gw/2"),
                        ]);
                    } else {
                        store.apply_snapshot(mixed_snapshot());
                    }
                }
            })
        };

        for reader in readers {
            reader.await.unwrap();
        }
        writer.await.unwrap();
    }
}
