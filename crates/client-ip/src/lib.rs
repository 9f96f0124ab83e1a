//! Resolves the true client IP for requests that crossed one or more
//! reverse proxies.
//!
//! When the directly connected peer is a trusted proxy, the last entry
//! of the configured forwarding header (e.g. `X-Forwarded-For`) is
//! taken as the client address; otherwise the connection peer address
//! is used as-is. The result is attached to the request as a
//! [`ClientIp`] extension by [`ClientIpLayer`].

mod error;
mod layer;
mod trust;

pub use error::ConfigError;
pub use layer::{ClientIpLayer, ClientIpService};
pub use trust::TrustedProxies;

/// The resolved client address, attached to requests as an extension.
///
/// Held as a string: a value reported by a trusted proxy is taken
/// verbatim from the forwarding header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);
