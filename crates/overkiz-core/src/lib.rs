// overkiz-core: vendor session lifecycle, device cache, and action dispatch.

pub mod bridge;
pub mod config;
pub mod error;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::Bridge;
pub use config::{BridgeConfig, TlsVerification, VendorEndpoint};
pub use error::CoreError;
pub use store::DeviceStore;

// Re-export the vendor types consumers handle directly.
pub use overkiz_api::{Device, Region};
