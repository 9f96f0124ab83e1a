use std::net::IpAddr;

use config::ClientIpConfig;

use crate::{ClientIp, error::ConfigError};

/// A single trusted peer entry, either an exact address or a CIDR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrustedHost {
    Address(IpAddr),
    Cidr { network: IpAddr, prefix: u8 },
}

impl TrustedHost {
    fn parse(entry: &str) -> Result<Self, ConfigError> {
        if let Ok(address) = entry.parse::<IpAddr>() {
            return Ok(TrustedHost::Address(address));
        }

        parse_cidr(entry).ok_or_else(|| ConfigError::InvalidTrustedHost(entry.to_owned()))
    }

    fn matches(&self, peer: IpAddr) -> bool {
        match *self {
            TrustedHost::Address(address) => address == peer,
            TrustedHost::Cidr { network, prefix } => ip_in_cidr(peer, network, prefix),
        }
    }
}

fn parse_cidr(entry: &str) -> Option<TrustedHost> {
    let (network, prefix) = entry.split_once('/')?;

    // A CIDR block has exactly one slash.
    if prefix.contains('/') {
        return None;
    }

    let network: IpAddr = network.parse().ok()?;
    let prefix: u8 = prefix.parse().ok()?;

    let bit_width = match network {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };

    if !(1..=bit_width).contains(&prefix) {
        return None;
    }

    Some(TrustedHost::Cidr { network, prefix })
}

/// Compares the top `prefix` bits of both addresses. Addresses of
/// different families never match.
fn ip_in_cidr(address: IpAddr, network: IpAddr, prefix: u8) -> bool {
    match (address, network) {
        (IpAddr::V4(address), IpAddr::V4(network)) => {
            let shift = 32 - u32::from(prefix);
            u32::from(network) >> shift == u32::from(address) >> shift
        }
        (IpAddr::V6(address), IpAddr::V6(network)) => {
            let shift = 128 - u32::from(prefix);
            u128::from(network) >> shift == u128::from(address) >> shift
        }
        _ => false,
    }
}

/// Validated set of reverse proxies allowed to report the client
/// address through a forwarding header.
///
/// Immutable after construction, so it can be shared freely across
/// request handlers without synchronization.
#[derive(Debug, Clone)]
pub struct TrustedProxies {
    header_name: String,
    trusted_hosts: Vec<TrustedHost>,
}

impl TrustedProxies {
    /// Validates the header name and every trusted host entry. Entries
    /// are either exact IP addresses or CIDR blocks; the first invalid
    /// entry aborts construction.
    pub fn new<I>(header_name: impl Into<String>, trusted_hosts: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let header_name = header_name.into();

        if header_name.is_empty() {
            return Err(ConfigError::EmptyHeaderName);
        }

        let trusted_hosts = trusted_hosts
            .into_iter()
            .map(|entry| TrustedHost::parse(entry.as_ref()))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            header_name,
            trusted_hosts,
        })
    }

    pub fn from_config(config: &ClientIpConfig) -> Result<Self, ConfigError> {
        Self::new(config.header.clone(), &config.trusted_hosts)
    }

    /// Name of the forwarding header this resolver reads.
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// Whether the directly connected peer may report a forwarded
    /// client address. An empty trusted-host list trusts every peer.
    pub fn is_trusted(&self, peer: IpAddr) -> bool {
        self.trusted_hosts.is_empty() || self.trusted_hosts.iter().any(|host| host.matches(peer))
    }

    /// Resolves the client IP from the forwarding header value and the
    /// connection peer address.
    ///
    /// The rightmost chain entry was appended by the proxy closest to
    /// us, so that is the one we take. The value is passed through as
    /// reported, without validating it as an address. An absent or
    /// empty header, or an untrusted peer, falls back to the peer
    /// address itself.
    pub fn resolve(&self, header_value: Option<&str>, peer: IpAddr) -> ClientIp {
        if let Some(chain) = header_value.filter(|value| !value.is_empty()) {
            if self.is_trusted(peer) {
                let client = chain.split(',').next_back().unwrap_or(chain).trim();
                return ClientIp(client.to_owned());
            }

            log::debug!("ignoring {} header from untrusted peer {peer}", self.header_name);
        }

        ClientIp(peer.to_string())
    }
}
