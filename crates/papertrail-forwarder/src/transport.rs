// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Syslog transport used to ship forwarded messages.
//!
//! Messages go out as RFC 3164 datagrams over UDP, one datagram per message.
//! There is no delivery confirmation: a successful send only means the
//! datagram left the socket.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

use syslog::{Facility, Formatter3164, LogFormat, Severity};
use tracing::debug;

use crate::error::TransportError;

/// Opens per-invocation connections to a syslog collector.
pub trait Transport {
    type Connection: Connection;

    /// Opens a connection to `host:port`, tagging every message with `tag`.
    fn open(&self, host: &str, port: u16, tag: &str) -> Result<Self::Connection, TransportError>;
}

/// A scoped handle to a syslog collector. Dropping it releases the socket.
pub trait Connection {
    /// Sends `message` at informational severity.
    fn info(&mut self, message: &str) -> Result<(), TransportError>;
}

/// UDP syslog transport.
#[derive(Debug, Clone)]
pub struct SyslogUdpTransport {
    facility: Facility,
    hostname: Option<String>,
}

impl Default for SyslogUdpTransport {
    fn default() -> Self {
        Self {
            // Priority 0 is what the collector has always been dialed with.
            facility: Facility::LOG_KERN,
            hostname: Formatter3164::default().hostname,
        }
    }
}

impl SyslogUdpTransport {
    /// Overrides the hostname written into every message. `None` omits it.
    #[must_use]
    pub fn with_hostname(mut self, hostname: Option<String>) -> Self {
        self.hostname = hostname;
        self
    }

    fn formatter(&self, tag: &str) -> Formatter3164 {
        Formatter3164 {
            facility: self.facility,
            hostname: self.hostname.clone(),
            process: tag.to_string(),
            pid: std::process::id(),
        }
    }
}

impl Transport for SyslogUdpTransport {
    type Connection = SyslogConnection;

    fn open(&self, host: &str, port: u16, tag: &str) -> Result<SyslogConnection, TransportError> {
        let address = format!("{host}:{port}");
        let open_error = |reason: String| TransportError::Open {
            address: address.clone(),
            reason,
        };

        let target = address
            .to_socket_addrs()
            .map_err(|e| open_error(e.to_string()))?
            .next()
            .ok_or_else(|| open_error("no address resolved".to_string()))?;

        let local = if target.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local).map_err(|e| open_error(e.to_string()))?;
        debug!("Opened syslog connection to {} ({}) with tag {}", address, target, tag);

        Ok(SyslogConnection {
            socket,
            target,
            formatter: self.formatter(tag),
        })
    }
}

/// Connection returned by [`SyslogUdpTransport`].
pub struct SyslogConnection {
    socket: UdpSocket,
    target: SocketAddr,
    formatter: Formatter3164,
}

impl SyslogConnection {
    fn encode(&self, severity: Severity, message: &str) -> Result<Vec<u8>, TransportError> {
        let mut buf = Vec::new();
        self.formatter
            .format(&mut buf, severity, message)
            .map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(buf)
    }
}

impl Connection for SyslogConnection {
    fn info(&mut self, message: &str) -> Result<(), TransportError> {
        let datagram = self.encode(Severity::LOG_INFO, message)?;
        self.socket
            .send_to(&datagram, self.target)
            .map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(())
    }
}
