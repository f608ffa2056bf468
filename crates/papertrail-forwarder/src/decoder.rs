// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Decoding of CloudWatch Logs subscription events.
//!
//! CloudWatch delivers a subscription batch as a small JSON envelope whose
//! `awslogs.data` field holds a base64 encoded, gzip compressed JSON document:
//!
//! ```text
//! {"awslogs": {"data": "H4sIAAAAAAAA..."}}
//!                        │
//!                        v  base64 -> gunzip
//! {"messageType": "DATA_MESSAGE", "logGroup": "...", "logEvents": [...]}
//! ```

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use serde::Deserialize;

use crate::error::DecodeError;

/// `messageType` of the batch CloudWatch sends to verify a new subscription.
pub const CONTROL_MESSAGE: &str = "CONTROL_MESSAGE";

/// One log line of a batch, as emitted by the source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogEvent {
    #[serde(default)]
    pub id: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
    pub message: String,
}

/// All records of one invocation, sharing a source log group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBatch {
    #[serde(default)]
    pub message_type: String,
    #[serde(default)]
    pub owner: String,
    pub log_group: String,
    #[serde(default)]
    pub log_stream: String,
    #[serde(default)]
    pub subscription_filters: Vec<String>,
    #[serde(default)]
    pub log_events: Vec<LogEvent>,
}

impl LogBatch {
    pub fn is_control_message(&self) -> bool {
        self.message_type == CONTROL_MESSAGE
    }
}

/// Turns a raw invocation payload into a [`LogBatch`].
pub trait BatchDecoder {
    fn decode(&self, payload: &[u8]) -> Result<LogBatch, DecodeError>;
}

#[derive(Deserialize)]
struct Envelope {
    awslogs: AwsLogs,
}

#[derive(Deserialize)]
struct AwsLogs {
    data: String,
}

/// Decoder for the `{"awslogs": {"data": ...}}` subscription event.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudWatchLogsDecoder;

impl CloudWatchLogsDecoder {
    /// Decodes the base64 + gzip `awslogs.data` field on its own.
    pub fn decode_data(&self, data: &str) -> Result<LogBatch, DecodeError> {
        let compressed = STANDARD.decode(data.trim())?;

        let mut json = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut json)
            .map_err(DecodeError::Decompress)?;

        serde_json::from_slice(&json).map_err(DecodeError::Payload)
    }
}

impl BatchDecoder for CloudWatchLogsDecoder {
    fn decode(&self, payload: &[u8]) -> Result<LogBatch, DecodeError> {
        let envelope: Envelope = serde_json::from_slice(payload).map_err(DecodeError::Envelope)?;
        self.decode_data(&envelope.awslogs.data)
    }
}
