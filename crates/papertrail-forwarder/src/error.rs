// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors raised while validating a forwarder configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("missing host value for Papertrail log target")]
    MissingHost,

    /// Port 0 is treated the same as an unset port.
    #[error("missing port value for Papertrail log target")]
    MissingPort,
}

/// Errors raised while decoding an inbound CloudWatch Logs payload.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid CloudWatch Logs envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("invalid base64 in CloudWatch Logs data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to decompress CloudWatch Logs data: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("invalid CloudWatch Logs payload: {0}")]
    Payload(#[source] serde_json::Error),
}

/// Errors raised by the syslog transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("failed to open syslog connection to {address}: {reason}")]
    Open { address: String, reason: String },

    #[error("failed to send syslog message: {0}")]
    Send(String),
}

/// Terminal failure of a single forwarder invocation or of handler setup.
#[derive(Debug, thiserror::Error)]
pub enum ForwarderError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
