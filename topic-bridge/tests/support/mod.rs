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

use integration_test_utils::{RecordingPubSub, RecordingQueue, StaticRegistry, QUEUE_URL};
use std::sync::Arc;
use topic_bridge::{BridgeConfig, MessageMetadata, SubscriptionManager};

pub(crate) const EVENT_KEY: &str = "NS.Tests.Event";
pub(crate) const EVENT_TOPIC: &str = "NS_Tests_Event";
pub(crate) const BASE_EVENT_KEY: &str = "NS.Tests.BaseEvent";
#[allow(dead_code)]
pub(crate) const BASE_EVENT_TOPIC: &str = "NS_Tests_BaseEvent";

#[allow(dead_code)]
pub(crate) struct Event;
#[allow(dead_code)]
pub(crate) struct OtherEvent;
#[allow(dead_code)]
pub(crate) struct Marker;

pub(crate) fn event_metadata() -> MessageMetadata {
    MessageMetadata::new(EVENT_KEY).with_supertypes([BASE_EVENT_KEY])
}

/// `Event`, `OtherEvent` and the `BaseEvent` supertype. `Marker` has no metadata.
pub(crate) fn registry() -> StaticRegistry {
    StaticRegistry::new()
        .with_type::<Event>(event_metadata())
        .with_type::<OtherEvent>(MessageMetadata::new("NS.Tests.OtherEvent"))
        .with_identifier(MessageMetadata::new(BASE_EVENT_KEY))
}

pub(crate) struct Harness {
    pub(crate) pubsub: Arc<RecordingPubSub>,
    pub(crate) queue: Arc<RecordingQueue>,
    pub(crate) manager: SubscriptionManager,
}

pub(crate) fn harness(config: BridgeConfig) -> Harness {
    harness_with(RecordingPubSub::new(), RecordingQueue::default(), config)
}

pub(crate) fn harness_with(
    pubsub: RecordingPubSub,
    queue: RecordingQueue,
    config: BridgeConfig,
) -> Harness {
    let pubsub = Arc::new(pubsub);
    let queue = Arc::new(queue);
    let manager = manager_for(pubsub.clone(), queue.clone(), config);
    Harness {
        pubsub,
        queue,
        manager,
    }
}

/// A further manager over the same services, as a restarted process would build.
pub(crate) fn manager_for(
    pubsub: Arc<RecordingPubSub>,
    queue: Arc<RecordingQueue>,
    config: BridgeConfig,
) -> SubscriptionManager {
    match SubscriptionManager::new(QUEUE_URL, pubsub, queue, Arc::new(registry()), config) {
        Ok(manager) => manager,
        Err(error) => panic!("Failed to create subscription manager: {}", error),
    }
}
