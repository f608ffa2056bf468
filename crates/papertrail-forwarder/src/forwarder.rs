// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The forwarding pipeline.
//!
//! ```text
//!   payload ──> BatchDecoder ──> LogBatch
//!                                   │
//!                                   v
//!                         open Connection(host, port, log group)
//!                                   │
//!                    for each event, in order:
//!                      message_transform(message, event)
//!                        ├─ keep  ──> Connection::info(message)
//!                        └─ drop  ──> skipped
//! ```
//!
//! Only decode failures and connection-open failures fail an invocation. A
//! message that cannot be sent is logged and counted in
//! [`ForwardSummary::failed`], and the remaining events are still forwarded.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::config::{Config, ConfigOption};
use crate::decoder::{BatchDecoder, CloudWatchLogsDecoder, LogBatch};
use crate::error::ForwarderError;
use crate::transport::{Connection, SyslogUdpTransport, Transport};

/// Per-invocation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardSummary {
    /// Messages handed to the connection without error.
    pub sent: usize,
    /// Events dropped by the message transform.
    pub skipped: usize,
    /// Messages the connection failed to send.
    pub failed: usize,
}

/// Forwards every event of `batch` that survives the message transform.
///
/// Opens one connection tagged with the batch's log group, even when the batch
/// holds no events, and releases it before returning.
pub fn forward<T: Transport>(
    config: &Config,
    batch: &LogBatch,
    transport: &T,
) -> Result<ForwardSummary, ForwarderError> {
    let mut connection = transport.open(
        &config.papertrail_host,
        config.papertrail_port,
        &batch.log_group,
    )?;

    let mut summary = ForwardSummary::default();
    for event in &batch.log_events {
        let (line, keep) = (config.message_transform)(&event.message, event);
        if !keep {
            summary.skipped += 1;
            continue;
        }

        match connection.info(&line) {
            Ok(()) => {
                trace!("Forwarded log event {} from {}", event.id, batch.log_group);
                summary.sent += 1;
            }
            Err(e) => {
                warn!("Failed to forward log event {}: {}", event.id, e);
                summary.failed += 1;
            }
        }
    }

    debug!(
        "Forwarded batch from {}: sent={} skipped={} failed={}",
        batch.log_group, summary.sent, summary.skipped, summary.failed
    );
    Ok(summary)
}

/// Handler forwarding CloudWatch Logs batches to Papertrail.
///
/// Built once and reused across invocations. It holds no mutable state, so a
/// single instance can serve concurrent invocations behind an `Arc`.
pub struct Forwarder<D = CloudWatchLogsDecoder, T = SyslogUdpTransport> {
    config: Arc<Config>,
    decoder: D,
    transport: T,
}

impl Forwarder {
    /// Creates a handler from `PAPERTRAIL_HOST`, `PAPERTRAIL_PORT` and `options`.
    pub fn new<I>(options: I) -> Result<Self, ForwarderError>
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        let config = Config::build(options)?;
        Ok(Self {
            config: Arc::new(config),
            decoder: CloudWatchLogsDecoder,
            transport: SyslogUdpTransport::default(),
        })
    }
}

impl<D: BatchDecoder, T: Transport> Forwarder<D, T> {
    /// Wires a handler from explicit parts. `config` is validated first.
    pub fn with_parts(config: Config, decoder: D, transport: T) -> Result<Self, ForwarderError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            decoder,
            transport,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handles one invocation: decodes `payload` and forwards its events.
    pub fn handle(&self, payload: &[u8]) -> Result<ForwardSummary, ForwarderError> {
        let batch = self.decoder.decode(payload)?;
        if batch.is_control_message() {
            debug!("Received CloudWatch Logs control message");
        }
        debug!(
            "Decoded batch from {} with {} events",
            batch.log_group,
            batch.log_events.len()
        );

        forward(&self.config, &batch, &self.transport)
    }
}
