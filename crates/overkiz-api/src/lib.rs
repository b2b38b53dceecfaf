// overkiz-api: Async Rust client for the Overkiz enduser API (local gateway + cloud)

pub mod error;
pub mod exec;
pub mod session;
pub mod setup;
pub mod tokens;
pub mod transport;

pub use error::Error;
pub use exec::{Action, ActionRequest, CommandSpec, ExecResponse};
pub use session::{Region, SessionClient};
pub use setup::Device;
pub use tokens::GatewayToken;
pub use transport::{TlsMode, TransportConfig};
