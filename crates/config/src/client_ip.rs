use serde::Deserialize;

/// Configuration for resolving the client IP from a forwarding header.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientIpConfig {
    /// Header carrying the comma-separated proxy chain.
    pub header: String,
    /// Peers allowed to report a forwarded client address, as exact IP
    /// addresses or CIDR blocks. An empty list trusts every peer.
    pub trusted_hosts: Vec<String>,
}

impl Default for ClientIpConfig {
    fn default() -> Self {
        Self {
            header: "X-Forwarded-For".to_owned(),
            trusted_hosts: Vec::new(),
        }
    }
}
