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

mod support;

use futures::future::join_all;
use integration_test_utils::{PubSubCall, RecordingPubSub, RecordingQueue, QUEUE_ARN};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use support::{
    event_metadata, harness, harness_with, Event, Marker, OtherEvent, BASE_EVENT_KEY,
    BASE_EVENT_TOPIC, EVENT_KEY, EVENT_TOPIC,
};
use topic_bridge::{
    BridgeConfig, BridgeError, MessageKey, PolicyConfig, Topic, TopicName, TypeDescriptor,
};

fn topic_arn(name: &str) -> String {
    RecordingPubSub::topic_arn(name)
}

#[tokio::test]
async fn missing_topic_is_created_before_the_queue_subscribes() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig::default());

    h.manager
        .subscribe(&TypeDescriptor::of::<Event>(), None)
        .await
        .unwrap();

    let calls = h.pubsub.calls();
    let create = calls
        .iter()
        .position(|call| matches!(call, PubSubCall::CreateTopic { .. }))
        .unwrap();
    let subscribe = calls
        .iter()
        .position(|call| matches!(call, PubSubCall::Subscribe { .. }))
        .unwrap();
    assert!(create < subscribe);
    assert_eq!(h.pubsub.created_topic_names(), vec![EVENT_TOPIC.to_string()]);
    assert_eq!(
        h.pubsub.subscribe_calls(),
        vec![(topic_arn(EVENT_TOPIC), QUEUE_ARN.to_string())]
    );
    assert_eq!(h.pubsub.raw_delivery_calls().len(), 1);
}

#[tokio::test]
async fn existing_topic_is_not_created_again() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig::default());
    h.pubsub.seed_topic(EVENT_TOPIC);

    h.manager
        .subscribe(&TypeDescriptor::of::<Event>(), None)
        .await
        .unwrap();

    assert!(h.pubsub.created_topic_names().is_empty());
    assert_eq!(h.pubsub.subscribe_calls().len(), 1);
}

#[tokio::test]
async fn repeated_subscribe_is_a_no_op() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig::default());

    for _ in 0..3 {
        h.manager
            .subscribe(&TypeDescriptor::of::<Event>(), None)
            .await
            .unwrap();
    }

    assert_eq!(h.pubsub.created_topic_names().len(), 1);
    assert_eq!(h.pubsub.subscribe_calls().len(), 1);
    assert_eq!(h.queue.policy_reads(), 1);
    assert_eq!(h.queue.policy_writes().len(), 1);
}

#[tokio::test]
async fn types_without_metadata_are_ignored() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig::default());

    h.manager
        .subscribe(&TypeDescriptor::of::<Marker>(), None)
        .await
        .unwrap();
    h.manager
        .unsubscribe(&TypeDescriptor::of::<Marker>())
        .await
        .unwrap();

    assert!(h.pubsub.calls().is_empty());
    assert_eq!(h.queue.arn_lookups(), 0);
    assert_eq!(h.queue.policy_reads(), 0);
}

#[tokio::test]
async fn topic_created_callback_sees_the_sanitized_name() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig::default());
    let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::default();
    let recorder = seen.clone();
    let on_created = move |name: &TopicName, topic: &Topic| {
        recorder
            .lock()
            .unwrap()
            .push((name.to_string(), topic.arn().to_string()));
    };

    h.manager
        .subscribe(&TypeDescriptor::of::<Event>(), Some(&on_created))
        .await
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(EVENT_TOPIC.to_string(), topic_arn(EVENT_TOPIC))]
    );
}

#[tokio::test]
async fn unsubscribe_without_subscription_issues_no_unsubscribe_call() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig::default());

    // Topic missing entirely.
    h.manager
        .unsubscribe(&TypeDescriptor::of::<Event>())
        .await
        .unwrap();
    assert_eq!(h.pubsub.list_calls(), 0);

    // Topic present, only other queues subscribed.
    let topic = h.pubsub.seed_topic(EVENT_TOPIC);
    h.pubsub
        .seed_subscription(&topic, "arn:aws:sqs:us-east-1:123456789012:otherQueue");
    h.manager
        .unsubscribe(&TypeDescriptor::of::<Event>())
        .await
        .unwrap();

    assert_eq!(h.pubsub.list_calls(), 1);
    assert!(h.pubsub.unsubscribe_calls().is_empty());
    assert!(h.pubsub.created_topic_names().is_empty());
}

#[tokio::test]
async fn unsubscribe_pages_through_foreign_subscriptions() {
    integration_test_utils::init_logging();
    let h = harness_with(
        RecordingPubSub::new().with_page_size(2),
        RecordingQueue::default(),
        BridgeConfig::default(),
    );
    let topic = h.pubsub.seed_topic(EVENT_TOPIC);
    for n in 0..5 {
        h.pubsub.seed_subscription(
            &topic,
            &format!("arn:aws:sqs:us-east-1:123456789012:otherQueue{n}"),
        );
    }

    h.manager
        .subscribe(&TypeDescriptor::of::<Event>(), None)
        .await
        .unwrap();
    h.manager
        .unsubscribe(&TypeDescriptor::of::<Event>())
        .await
        .unwrap();

    assert_eq!(h.pubsub.list_calls(), 3);
    assert_eq!(h.pubsub.unsubscribe_calls().len(), 1);
    assert!(h
        .pubsub
        .subscriptions_of(&topic)
        .iter()
        .all(|listed| listed.endpoint != QUEUE_ARN));
    assert_eq!(h.pubsub.subscriptions_of(&topic).len(), 5);

    // Unsubscribing forgets the key, so subscribing works again.
    h.manager
        .subscribe(&TypeDescriptor::of::<Event>(), None)
        .await
        .unwrap();
    assert_eq!(h.pubsub.subscribe_calls().len(), 2);
}

#[tokio::test]
async fn failed_subscribe_is_not_recorded() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig::default());
    h.pubsub.fail_on("subscribe_queue");

    let error = h
        .manager
        .subscribe(&TypeDescriptor::of::<Event>(), None)
        .await
        .unwrap_err();
    match error {
        BridgeError::Transient { operation, key, .. } => {
            assert_eq!(operation, "subscribe_queue");
            assert_eq!(key, Some(MessageKey::new(EVENT_KEY)));
        }
        other => panic!("unexpected error: {other}"),
    }

    h.pubsub.clear_failure("subscribe_queue");
    h.manager
        .subscribe(&TypeDescriptor::of::<Event>(), None)
        .await
        .unwrap();

    assert_eq!(h.pubsub.subscribe_calls().len(), 2);
    assert_eq!(h.pubsub.created_topic_names().len(), 1);
}

#[tokio::test]
async fn failed_create_leaves_no_cached_topic() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig::default());
    h.pubsub.fail_on("create_topic");

    assert!(h
        .manager
        .subscribe(&TypeDescriptor::of::<Event>(), None)
        .await
        .is_err());
    assert!(h.pubsub.subscribe_calls().is_empty());
    assert!(h.queue.policy_writes().is_empty());

    h.pubsub.clear_failure("create_topic");
    assert_eq!(h.manager.topics().find_topic(&event_metadata()).await.unwrap(), None);
}

#[tokio::test]
async fn policy_setup_can_be_disabled() {
    integration_test_utils::init_logging();
    let config = BridgeConfig {
        policy: PolicyConfig {
            setup_topic_policies_when_subscribing: false,
            ..PolicyConfig::default()
        },
        ..BridgeConfig::default()
    };
    let h = harness(config);

    h.manager
        .subscribe(&TypeDescriptor::of::<Event>(), None)
        .await
        .unwrap();

    assert_eq!(h.pubsub.subscribe_calls().len(), 1);
    assert_eq!(h.queue.policy_reads(), 0);
    assert!(h.queue.policy_writes().is_empty());
}

#[tokio::test]
async fn type_hierarchy_subscribes_supertype_topics_when_enabled() {
    integration_test_utils::init_logging();
    let flat = harness(BridgeConfig::default());
    let hierarchy = harness(BridgeConfig {
        subscribe_to_type_hierarchy: true,
        ..BridgeConfig::default()
    });

    flat.manager
        .subscribe(&TypeDescriptor::of::<Event>(), None)
        .await
        .unwrap();
    hierarchy
        .manager
        .subscribe(&TypeDescriptor::of::<Event>(), None)
        .await
        .unwrap();

    assert_eq!(flat.pubsub.created_topic_names(), vec![EVENT_TOPIC.to_string()]);
    assert_eq!(
        hierarchy.pubsub.created_topic_names(),
        vec![EVENT_TOPIC.to_string(), BASE_EVENT_TOPIC.to_string()]
    );
    assert_eq!(hierarchy.pubsub.subscribe_calls().len(), 2);
    assert_eq!(hierarchy.queue.policy_writes().len(), 1);
}

#[tokio::test]
async fn unknown_supertype_is_skipped() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig {
        subscribe_to_type_hierarchy: true,
        ..BridgeConfig::default()
    });
    let orphan = event_metadata().with_supertypes(["NS.Tests.Unregistered", BASE_EVENT_KEY]);

    h.manager.subscribe_metadata(&orphan, None).await.unwrap();

    assert_eq!(
        h.pubsub.created_topic_names(),
        vec![EVENT_TOPIC.to_string(), BASE_EVENT_TOPIC.to_string()]
    );
    assert_eq!(
        h.pubsub.subscribe_calls(),
        vec![
            (topic_arn(EVENT_TOPIC), QUEUE_ARN.to_string()),
            (topic_arn(BASE_EVENT_TOPIC), QUEUE_ARN.to_string()),
        ]
    );
}

#[tokio::test]
async fn only_unknown_supertypes_leave_the_own_topic() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig {
        subscribe_to_type_hierarchy: true,
        ..BridgeConfig::default()
    });
    let orphan = event_metadata().with_supertypes(["NS.Tests.Unregistered"]);

    h.manager.subscribe_metadata(&orphan, None).await.unwrap();

    assert_eq!(h.pubsub.created_topic_names(), vec![EVENT_TOPIC.to_string()]);
    assert_eq!(h.pubsub.subscribe_calls().len(), 1);
    assert_eq!(h.queue.policy_writes().len(), 1);
}

#[tokio::test]
async fn unknown_mapped_event_is_not_found() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig {
        event_to_events: BTreeMap::from([(
            MessageKey::new("NS.Tests.OtherEvent"),
            vec![MessageKey::new(EVENT_KEY), MessageKey::new("NS.Tests.Unregistered")],
        )]),
        ..BridgeConfig::default()
    });

    let error = h
        .manager
        .subscribe(&TypeDescriptor::of::<OtherEvent>(), None)
        .await
        .unwrap_err();

    assert!(matches!(error, BridgeError::NotFound { identifier } if identifier == "NS.Tests.Unregistered"));
    assert!(h.pubsub.calls().is_empty());
}

#[tokio::test]
async fn event_to_topics_mapping_replaces_the_own_topic() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig {
        event_to_topics: BTreeMap::from([(
            MessageKey::new(EVENT_KEY),
            vec!["legacy.orders".to_string()],
        )]),
        ..BridgeConfig::default()
    });

    h.manager
        .subscribe(&TypeDescriptor::of::<Event>(), None)
        .await
        .unwrap();

    assert_eq!(h.pubsub.created_topic_names(), vec!["legacy-orders".to_string()]);
    assert_eq!(
        h.pubsub.subscribe_calls(),
        vec![(topic_arn("legacy-orders"), QUEUE_ARN.to_string())]
    );
}

#[tokio::test]
async fn event_to_events_mapping_uses_the_mapped_event_topics() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig {
        event_to_events: BTreeMap::from([(
            MessageKey::new("NS.Tests.OtherEvent"),
            vec![MessageKey::new(EVENT_KEY), MessageKey::new("NS.Tests.BaseEvent")],
        )]),
        ..BridgeConfig::default()
    });

    h.manager
        .subscribe(&TypeDescriptor::of::<OtherEvent>(), None)
        .await
        .unwrap();

    assert_eq!(
        h.pubsub.created_topic_names(),
        vec![EVENT_TOPIC.to_string(), BASE_EVENT_TOPIC.to_string()]
    );
    assert_eq!(h.pubsub.subscribe_calls().len(), 2);
}

#[tokio::test]
async fn invalid_mappings_fail_at_construction() {
    let config = BridgeConfig {
        event_to_events: BTreeMap::from([(
            MessageKey::new(EVENT_KEY),
            vec![MessageKey::new(EVENT_KEY)],
        )]),
        ..BridgeConfig::default()
    };

    let result = topic_bridge::SubscriptionManager::new(
        integration_test_utils::QUEUE_URL,
        Arc::new(RecordingPubSub::new()),
        Arc::new(RecordingQueue::default()),
        Arc::new(support::registry()),
        config,
    );

    assert!(matches!(result, Err(BridgeError::Conflict { .. })));
}

#[tokio::test]
async fn racing_subscribers_observe_one_topic() {
    integration_test_utils::init_logging();
    let h = harness_with(
        RecordingPubSub::new().with_create_delay(Duration::from_millis(20)),
        RecordingQueue::default(),
        BridgeConfig::default(),
    );
    let descriptor = TypeDescriptor::of::<Event>();

    let results = join_all((0..8).map(|_| h.manager.subscribe(&descriptor, None))).await;

    assert!(results.iter().all(Result::is_ok));
    let topic = h
        .manager
        .topics()
        .find_topic(&event_metadata())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(topic.arn(), topic_arn(EVENT_TOPIC));
    assert_eq!(h.pubsub.subscriptions_of(&topic).len(), 1);
    assert_eq!(h.queue.policy().statements.len(), 1);
    // Every caller shares one run of the subscription steps.
    assert_eq!(h.pubsub.created_topic_names(), vec![EVENT_TOPIC.to_string()]);
    assert_eq!(h.pubsub.subscribe_calls().len(), 1);
    assert_eq!(h.pubsub.raw_delivery_calls().len(), 1);
    assert_eq!(h.queue.policy_writes().len(), 1);
}

#[tokio::test]
async fn caller_after_a_failed_racing_subscribe_retries() {
    integration_test_utils::init_logging();
    let h = harness_with(
        RecordingPubSub::new().with_create_delay(Duration::from_millis(20)),
        RecordingQueue::default(),
        BridgeConfig::default(),
    );
    h.queue.fail_on("set_queue_access_policy");
    let descriptor = TypeDescriptor::of::<Event>();

    let results = join_all((0..2).map(|_| h.manager.subscribe(&descriptor, None))).await;

    // Callers run the steps one after the other and each fails on its own.
    assert!(results.iter().all(Result::is_err));
    assert!(h.pubsub.subscribe_calls().is_empty());
    assert_eq!(h.queue.policy_reads(), 2);
}

#[tokio::test]
async fn unsubscribe_ignores_other_protocols_on_the_queue_endpoint() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig::default());
    let topic = h.pubsub.seed_topic(EVENT_TOPIC);
    h.pubsub
        .seed_subscription_with_protocol(&topic, "lambda", QUEUE_ARN);

    h.manager
        .unsubscribe(&TypeDescriptor::of::<Event>())
        .await
        .unwrap();

    assert_eq!(h.pubsub.list_calls(), 1);
    assert!(h.pubsub.unsubscribe_calls().is_empty());
    assert_eq!(h.pubsub.subscriptions_of(&topic).len(), 1);
}

#[tokio::test]
async fn publishers_resolve_topics_through_the_directory() {
    integration_test_utils::init_logging();
    let h = harness(BridgeConfig::default());

    let created = h
        .manager
        .topics()
        .create_if_absent(&event_metadata(), None)
        .await
        .unwrap();
    let by_type = h
        .manager
        .topics()
        .find_topic_for_type(&TypeDescriptor::of::<Event>())
        .await
        .unwrap();
    let by_identifier = h
        .manager
        .topics()
        .find_topic_for_identifier(EVENT_KEY)
        .await
        .unwrap();
    let unknown = h
        .manager
        .topics()
        .find_topic_for_type(&TypeDescriptor::of::<Marker>())
        .await;

    assert_eq!(by_type, Some(created.clone()));
    assert_eq!(by_identifier, Some(created));
    assert!(matches!(unknown, Err(BridgeError::NotFound { .. })));
    assert_eq!(h.pubsub.created_topic_names().len(), 1);
}
