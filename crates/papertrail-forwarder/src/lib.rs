// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwards CloudWatch Logs subscription batches to a Papertrail (syslog) log
//! target.
//!
//! A [`Forwarder`] is built once from the environment and a list of
//! [`ConfigOption`]s, then invoked once per inbound batch:
//!
//! ```rust,ignore
//! use papertrail_forwarder::{with_message_transform, Forwarder};
//!
//! let forwarder = Forwarder::new([with_message_transform(|message, _event| {
//!     (message.trim_end().to_string(), !message.starts_with("REPORT"))
//! })])?;
//!
//! forwarder.handle(&payload)?;
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod decoder;
pub mod error;
pub mod forwarder;
pub mod transport;

pub use config::{
    identity_transform, with_message_transform, with_papertrail_host, with_papertrail_port,
    Config, ConfigOption, MessageTransform,
};
pub use decoder::{BatchDecoder, CloudWatchLogsDecoder, LogBatch, LogEvent};
pub use error::{ConfigurationError, DecodeError, ForwarderError, TransportError};
pub use forwarder::{forward, ForwardSummary, Forwarder};
pub use transport::{Connection, SyslogConnection, SyslogUdpTransport, Transport};
