#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("client IP header name cannot be empty")]
    EmptyHeaderName,
    #[error("\"{0}\" is not a valid IP address or CIDR")]
    InvalidTrustedHost(String),
}
