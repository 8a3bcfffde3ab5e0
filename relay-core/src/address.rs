//! OR endpoint address parsing
//!
//! Onionoo advertises relay endpoints as `"<ipv4>:<port>"` or
//! `"[<ipv6>]:<port>"`. Parsing yields the canonical IP literal and port.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

/// A validated relay endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Parsed IP address
    pub ip: IpAddr,
    /// Port number
    pub port: u16,
}

impl Endpoint {
    /// Canonical IP literal (no brackets, compressed IPv6)
    pub fn ip_literal(&self) -> String {
        self.ip.to_string()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

/// Reasons an endpoint string was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("empty address")]
    Empty,

    #[error("no port in address {0:?}")]
    MissingPort(String),

    #[error("unclosed bracket in address {0:?}")]
    UnclosedBracket(String),

    #[error("invalid IP {ip:?} in address {raw:?}")]
    InvalidIp { raw: String, ip: String },

    #[error("invalid port {port:?} in address {raw:?}")]
    InvalidPort { raw: String, port: String },
}

impl AddressError {
    /// The offending input string
    pub fn input(&self) -> &str {
        match self {
            AddressError::Empty => "",
            AddressError::MissingPort(raw) | AddressError::UnclosedBracket(raw) => raw,
            AddressError::InvalidIp { raw, .. } | AddressError::InvalidPort { raw, .. } => raw,
        }
    }
}

/// Parse an endpoint like `185.220.101.33:10033` or `[2a0b:f4c2:2::33]:10033`
pub fn parse_endpoint(raw: &str) -> Result<Endpoint, AddressError> {
    if raw.is_empty() {
        return Err(AddressError::Empty);
    }

    let (host, port) = match raw.strip_prefix('[') {
        Some(rest) => {
            let (host, after) = rest
                .split_once(']')
                .ok_or_else(|| AddressError::UnclosedBracket(raw.to_string()))?;
            let port = after
                .strip_prefix(':')
                .ok_or_else(|| AddressError::MissingPort(raw.to_string()))?;
            (host, port)
        }
        None => raw
            .rsplit_once(':')
            .ok_or_else(|| AddressError::MissingPort(raw.to_string()))?,
    };

    let ip: IpAddr = host.parse().map_err(|_| AddressError::InvalidIp {
        raw: raw.to_string(),
        ip: host.to_string(),
    })?;

    let port: u16 = port.parse().map_err(|_| AddressError::InvalidPort {
        raw: raw.to_string(),
        port: port.to_string(),
    })?;

    Ok(Endpoint { ip, port })
}
