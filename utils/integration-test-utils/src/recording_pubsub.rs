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

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use topic_bridge::{
    ListedSubscription, PubSubService, ServiceError, SubscriptionPage, SubscriptionRef, Topic,
    SQS_PROTOCOL,
};

/// Topic ARNs handed out by [`RecordingPubSub`] are this prefix plus the name.
pub const TOPIC_ARN_PREFIX: &str = "arn:aws:sns:us-east-1:123456789012:";

const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PubSubCall {
    FindTopic {
        name: String,
    },
    CreateTopic {
        name: String,
    },
    Subscribe {
        topic_arn: String,
        queue_arn: String,
    },
    SetRawDelivery {
        subscription_arn: String,
    },
    ListSubscriptions {
        topic_arn: String,
        token: Option<String>,
    },
    Unsubscribe {
        subscription_arn: String,
    },
}

#[derive(Default)]
struct State {
    topics: BTreeMap<String, Topic>,
    subscriptions: BTreeMap<String, Vec<ListedSubscription>>,
    calls: Vec<PubSubCall>,
    failing: HashSet<&'static str>,
    subscription_counter: usize,
}

/// Pub/sub service that keeps topics and subscriptions in memory.
///
/// Creating or subscribing is idempotent like the real service. Any
/// operation can be made to fail with [`RecordingPubSub::fail_on`].
pub struct RecordingPubSub {
    page_size: usize,
    create_delay: Option<Duration>,
    state: Mutex<State>,
}

impl Default for RecordingPubSub {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPubSub {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            create_delay: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Lists subscriptions `page_size` at a time.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Suspends every create call, widening the window for racing callers.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("recording state poisoned")
    }

    pub fn topic_arn(name: &str) -> String {
        format!("{TOPIC_ARN_PREFIX}{name}")
    }

    /// Makes a topic exist without recording a call.
    pub fn seed_topic(&self, name: &str) -> Topic {
        let topic = Topic::new(Self::topic_arn(name));
        self.state()
            .topics
            .insert(name.to_string(), topic.clone());
        topic
    }

    /// Adds a subscription of `endpoint` to `topic` without recording a call.
    pub fn seed_subscription(&self, topic: &Topic, endpoint: &str) -> String {
        self.seed_subscription_with_protocol(topic, SQS_PROTOCOL, endpoint)
    }

    /// Seeds a subscription delivering over `protocol`, e.g. a function
    /// subscribed under the same resource identifier as the queue.
    pub fn seed_subscription_with_protocol(
        &self,
        topic: &Topic,
        protocol: &str,
        endpoint: &str,
    ) -> String {
        let mut state = self.state();
        Self::add_subscription(&mut state, topic, protocol, endpoint)
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.state().failing.insert(operation);
    }

    pub fn clear_failure(&self, operation: &'static str) {
        self.state().failing.remove(operation);
    }

    pub fn calls(&self) -> Vec<PubSubCall> {
        self.state().calls.clone()
    }

    pub fn created_topic_names(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PubSubCall::CreateTopic { name } => Some(name),
                _ => None,
            })
            .collect()
    }

    /// `(topic ARN, queue ARN)` of every subscribe call.
    pub fn subscribe_calls(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PubSubCall::Subscribe {
                    topic_arn,
                    queue_arn,
                } => Some((topic_arn, queue_arn)),
                _ => None,
            })
            .collect()
    }

    pub fn raw_delivery_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PubSubCall::SetRawDelivery { subscription_arn } => Some(subscription_arn),
                _ => None,
            })
            .collect()
    }

    pub fn unsubscribe_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PubSubCall::Unsubscribe { subscription_arn } => Some(subscription_arn),
                _ => None,
            })
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, PubSubCall::ListSubscriptions { .. }))
            .count()
    }

    pub fn subscriptions_of(&self, topic: &Topic) -> Vec<ListedSubscription> {
        self.state()
            .subscriptions
            .get(topic.arn())
            .cloned()
            .unwrap_or_default()
    }

    fn add_subscription(
        state: &mut State,
        topic: &Topic,
        protocol: &str,
        endpoint: &str,
    ) -> String {
        state.subscription_counter += 1;
        let subscription_arn = format!("{}:{}", topic.arn(), state.subscription_counter);
        state
            .subscriptions
            .entry(topic.arn().to_string())
            .or_default()
            .push(ListedSubscription {
                subscription_arn: subscription_arn.clone(),
                endpoint: endpoint.to_string(),
                protocol: protocol.to_string(),
            });
        subscription_arn
    }

    /// Records `call`, then fails with an injected error if `operation` was
    /// marked as failing.
    fn record(&self, operation: &'static str, call: PubSubCall) -> Result<(), ServiceError> {
        let mut state = self.state();
        state.calls.push(call);
        if state.failing.contains(operation) {
            return Err(ServiceError::new(operation, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl PubSubService for RecordingPubSub {
    async fn find_topic_by_name(&self, name: &str) -> Result<Option<Topic>, ServiceError> {
        self.record(
            "find_topic_by_name",
            PubSubCall::FindTopic {
                name: name.to_string(),
            },
        )?;
        Ok(self.state().topics.get(name).cloned())
    }

    async fn create_topic(&self, name: &str) -> Result<Topic, ServiceError> {
        self.record(
            "create_topic",
            PubSubCall::CreateTopic {
                name: name.to_string(),
            },
        )?;
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }

        let topic = self
            .state()
            .topics
            .entry(name.to_string())
            .or_insert_with(|| Topic::new(Self::topic_arn(name)))
            .clone();
        Ok(topic)
    }

    async fn subscribe_queue(
        &self,
        topic: &Topic,
        queue_arn: &str,
    ) -> Result<SubscriptionRef, ServiceError> {
        self.record(
            "subscribe_queue",
            PubSubCall::Subscribe {
                topic_arn: topic.arn().to_string(),
                queue_arn: queue_arn.to_string(),
            },
        )?;

        let mut state = self.state();
        let existing = state
            .subscriptions
            .get(topic.arn())
            .and_then(|listed| listed.iter().find(|s| s.delivers_to_queue(queue_arn)))
            .map(|s| s.subscription_arn.clone());
        let subscription_arn = match existing {
            Some(arn) => arn,
            None => Self::add_subscription(&mut state, topic, SQS_PROTOCOL, queue_arn),
        };
        Ok(SubscriptionRef::new(subscription_arn))
    }

    async fn set_subscription_raw_delivery(
        &self,
        subscription: &SubscriptionRef,
    ) -> Result<(), ServiceError> {
        self.record(
            "set_subscription_raw_delivery",
            PubSubCall::SetRawDelivery {
                subscription_arn: subscription.arn().to_string(),
            },
        )
    }

    async fn list_subscriptions_page(
        &self,
        topic: &Topic,
        continuation_token: Option<&str>,
    ) -> Result<SubscriptionPage, ServiceError> {
        self.record(
            "list_subscriptions_page",
            PubSubCall::ListSubscriptions {
                topic_arn: topic.arn().to_string(),
                token: continuation_token.map(str::to_string),
            },
        )?;

        let offset = match continuation_token {
            None => 0,
            Some(token) => token.parse::<usize>().map_err(|_| {
                ServiceError::new("list_subscriptions_page", format!("bad token '{token}'"))
            })?,
        };
        let listed = self.subscriptions_of(topic);
        let end = (offset + self.page_size).min(listed.len());
        let subscriptions = listed.get(offset..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_token = (end < listed.len()).then(|| end.to_string());

        Ok(SubscriptionPage {
            subscriptions,
            next_token,
        })
    }

    async fn unsubscribe(&self, subscription: &SubscriptionRef) -> Result<(), ServiceError> {
        self.record(
            "unsubscribe",
            PubSubCall::Unsubscribe {
                subscription_arn: subscription.arn().to_string(),
            },
        )?;

        for listed in self.state().subscriptions.values_mut() {
            listed.retain(|s| s.subscription_arn != subscription.arn());
        }
        Ok(())
    }
}
