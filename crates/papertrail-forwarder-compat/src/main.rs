// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, sync::Arc};
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    task::JoinSet,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use papertrail_forwarder::{ForwardSummary, Forwarder, ForwarderError};

#[tokio::main]
pub async fn main() {
    let log_level = env::var("PAPERTRAIL_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(log_level).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let forwarder = match Forwarder::new(Vec::new()) {
        Ok(f) => Arc::new(f),
        Err(e) => {
            error!("Error creating Papertrail forwarder: {e}");
            return;
        }
    };
    info!(
        "papertrail-forwarder: forwarding to {}",
        forwarder.config().address()
    );

    let mut invocations = JoinSet::new();
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut invocation_id: u64 = 0;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Error reading invocation payload from stdin: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        invocation_id += 1;
        let forwarder = Arc::clone(&forwarder);
        invocations.spawn_blocking(move || {
            let result = forwarder.handle(line.as_bytes());
            (invocation_id, result)
        });

        // reap whatever already finished so results are logged as they come in
        while let Some(joined) = invocations.try_join_next() {
            log_outcome(joined);
        }
    }

    while let Some(joined) = invocations.join_next().await {
        log_outcome(joined);
    }
    debug!("Input closed, shutting down");
}

fn log_outcome(
    joined: Result<(u64, Result<ForwardSummary, ForwarderError>), tokio::task::JoinError>,
) {
    match joined {
        Ok((id, Ok(summary))) => info!(
            "invocation {id}: sent={} skipped={} failed={}",
            summary.sent, summary.skipped, summary.failed
        ),
        Ok((id, Err(e))) => error!("invocation {id} failed: {e}"),
        Err(e) => error!("invocation task failed: {e}"),
    }
}
