//! Destination address resolution
//!
//! Resolution is a capability so the default blocking lookup can be swapped
//! for an asynchronous resolver without touching the registration workflow.
//! The default implementation runs on the reactor thread and will stall the
//! loop under slow DNS.

use crate::error::{GatewayError, Result};
use std::net::{SocketAddr, ToSocketAddrs};

/// Pluggable host-to-address resolution
pub trait ResolveAddress {
    /// Resolve `host` to a concrete transport endpoint on `port`
    ///
    /// An empty host resolves the local loopback name. The first IPv4 or
    /// IPv6 result in the system resolution order wins.
    fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr>;
}

/// Blocking system resolver (getaddrinfo order)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl ResolveAddress for SystemResolver {
    fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr> {
        let host = if host.is_empty() { "localhost" } else { host };

        let mut addrs = (host, port)
            .to_socket_addrs()
            .map_err(|_| GatewayError::Resolution(host.to_string()))?;

        addrs
            .next()
            .ok_or_else(|| GatewayError::Resolution(host.to_string()))
    }
}
