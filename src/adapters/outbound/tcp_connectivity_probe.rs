//! TCP Connectivity Probe
//!
//! Implements ConnectivityProbe with a raw TCP connect to a fixed IP
//! endpoint followed by a single hostname lookup.

use crate::domain::ports::ConnectivityProbe;
use crate::domain::value_objects::ConnectivityState;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};

/// Port used for the hostname lookup; only the name matters.
const LOOKUP_PORT: u16 = 443;

/// TCP + system-resolver connectivity probe.
pub struct TcpConnectivityProbe {
    /// IP endpoint that should always accept connections
    target: SocketAddr,
    /// Hostname that should always resolve
    hostname: String,
    /// Timeout for each of the two probes
    timeout: Duration,
}

impl TcpConnectivityProbe {
    pub fn new(target: SocketAddr, hostname: impl Into<String>, timeout: Duration) -> Self {
        Self {
            target,
            hostname: hostname.into(),
            timeout,
        }
    }

    async fn transport_ok(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(self.target)).await {
            Ok(Ok(mut stream)) => {
                let _ = stream.shutdown().await;
                true
            }
            Ok(Err(e)) => {
                tracing::warn!("connectivity probe to {} failed: {}", self.target, e);
                false
            }
            Err(_) => {
                tracing::warn!("connectivity probe to {} timed out", self.target);
                false
            }
        }
    }

    async fn dns_ok(&self) -> bool {
        let lookup = lookup_host((self.hostname.as_str(), LOOKUP_PORT));
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(mut addrs)) => addrs.next().is_some(),
            Ok(Err(e)) => {
                tracing::warn!("probe lookup of {} failed: {}", self.hostname, e);
                false
            }
            Err(_) => {
                tracing::warn!("probe lookup of {} timed out", self.hostname);
                false
            }
        }
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectivityProbe {
    async fn probe(&self) -> ConnectivityState {
        if !self.transport_ok().await {
            return ConnectivityState::Offline;
        }
        if !self.dns_ok().await {
            return ConnectivityState::DnsImpaired;
        }
        ConnectivityState::Online
    }
}
