/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! In-memory stand-ins for the remote services used by `topic-bridge`
//! integration tests, recording every call they receive.

mod recording_pubsub;
pub use recording_pubsub::{PubSubCall, RecordingPubSub, TOPIC_ARN_PREFIX};
mod recording_queue;
pub use recording_queue::{RecordingQueue, QUEUE_ARN, QUEUE_URL};
mod static_registry;
pub use static_registry::StaticRegistry;

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly `tracing` subscriber once per process.
/// `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
