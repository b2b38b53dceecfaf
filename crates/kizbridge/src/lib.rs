// kizbridge library surface: router construction and error types, shared
// between the binary and the integration tests.

pub mod error;
pub mod host_filter;
pub mod routes;
