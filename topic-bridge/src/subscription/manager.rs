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

//! Subscribes a queue to the topics of message types and keeps the queue's
//! access policy allowing those topics to deliver.

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::metadata::{
    MessageKey, MessageMetadata, MessageRegistry, PrefixedTopicNameGenerator, TopicNameGenerator,
    TypeDescriptor,
};
use crate::observability::{events, fields};
use crate::policy::arn::Arn;
use crate::policy::patterns::topic_arn_patterns;
use crate::policy::planner::plan_policy_update;
use crate::service::{PubSubService, QueueService, Topic};
use crate::subscription::subscription_pages::find_matching_subscription;
use crate::subscription::subscription_record::SubscriptionRecord;
use crate::topology::topic_directory::{TopicCreatedCallback, TopicDirectory};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

const COMPONENT: &str = "subscription_manager";

/// Where the events of one message type are delivered from.
enum SubscriptionTarget<'a> {
    /// An explicitly configured topic name.
    Named(&'a str),
    /// The topic derived from a message type's metadata.
    Event(MessageMetadata),
}

/// Drives the subscription lifecycle of one queue.
///
/// Steps for a single message type run strictly in order: resolve the
/// target topics, create missing ones, authorize them in the queue policy,
/// then subscribe and enable raw delivery. A key is recorded as subscribed
/// only after every step succeeded, so a failed or cancelled call can simply
/// be repeated. Concurrent calls for one key share a single run of the steps,
/// and queue policy updates of one manager never interleave.
pub struct SubscriptionManager {
    queue_url: String,
    queue_arn: OnceCell<String>,
    pubsub: Arc<dyn PubSubService>,
    queues: Arc<dyn QueueService>,
    registry: Arc<dyn MessageRegistry>,
    config: BridgeConfig,
    topics: TopicDirectory,
    subscribed: SubscriptionRecord,
    policy_update: Mutex<()>,
}

impl SubscriptionManager {
    /// Builds a manager for the queue at `queue_url` using the configured
    /// topic name prefix. Fails when `config` does not validate.
    pub fn new(
        queue_url: impl Into<String>,
        pubsub: Arc<dyn PubSubService>,
        queues: Arc<dyn QueueService>,
        registry: Arc<dyn MessageRegistry>,
        config: BridgeConfig,
    ) -> BridgeResult<Self> {
        let name_generator = Arc::new(PrefixedTopicNameGenerator::new(
            config.topic_name_prefix.clone(),
        ));
        Self::with_topic_name_generator(queue_url, pubsub, queues, registry, name_generator, config)
    }

    pub fn with_topic_name_generator(
        queue_url: impl Into<String>,
        pubsub: Arc<dyn PubSubService>,
        queues: Arc<dyn QueueService>,
        registry: Arc<dyn MessageRegistry>,
        name_generator: Arc<dyn TopicNameGenerator>,
        config: BridgeConfig,
    ) -> BridgeResult<Self> {
        config.validate()?;

        let topics = TopicDirectory::new(pubsub.clone(), registry.clone(), name_generator);
        Ok(Self {
            queue_url: queue_url.into(),
            queue_arn: OnceCell::new(),
            pubsub,
            queues,
            registry,
            config,
            topics,
            subscribed: SubscriptionRecord::new(),
            policy_update: Mutex::new(()),
        })
    }

    /// Topic resolution and creation for collaborators that publish.
    pub fn topics(&self) -> &TopicDirectory {
        &self.topics
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Subscribes the queue to the topics of the type. Types without
    /// metadata are ignored without any remote call.
    pub async fn subscribe(
        &self,
        descriptor: &TypeDescriptor,
        on_topic_created: Option<&TopicCreatedCallback>,
    ) -> BridgeResult<()> {
        let Some(metadata) = self.registry.metadata_for_type(descriptor) else {
            debug!(
                event = events::SUBSCRIBE_IGNORED_NO_METADATA,
                component = COMPONENT,
                type_name = descriptor.type_name(),
                reason = fields::REASON_NO_METADATA,
                "type has no message metadata, nothing to subscribe"
            );
            return Ok(());
        };
        self.subscribe_metadata(&metadata, on_topic_created).await
    }

    pub async fn subscribe_metadata(
        &self,
        metadata: &MessageMetadata,
        on_topic_created: Option<&TopicCreatedCallback>,
    ) -> BridgeResult<()> {
        let key = metadata.key();
        let slot = self.subscribed.slot(key).await;

        let mut topic_count = None;
        let established = {
            let topic_count = &mut topic_count;
            slot.get_or_try_init(move || async move {
                info!(
                    event = events::SUBSCRIBE_START,
                    component = COMPONENT,
                    message_key = key.as_str(),
                    "subscribing queue"
                );
                *topic_count = Some(self.establish(metadata, on_topic_created).await?);
                Ok::<_, BridgeError>(())
            })
            .await
        };

        match (established, topic_count) {
            (Ok(_), Some(topic_count)) => {
                info!(
                    event = events::SUBSCRIBE_OK,
                    component = COMPONENT,
                    message_key = key.as_str(),
                    topic_count,
                    "queue subscribed"
                );
                Ok(())
            }
            (Ok(_), None) => {
                debug!(
                    event = events::SUBSCRIBE_SKIPPED_ALREADY_SUBSCRIBED,
                    component = COMPONENT,
                    message_key = key.as_str(),
                    reason = fields::REASON_ALREADY_SUBSCRIBED,
                    "already subscribed in this process"
                );
                Ok(())
            }
            (Err(err), _) => {
                warn!(
                    event = events::SUBSCRIBE_FAILED,
                    component = COMPONENT,
                    message_key = key.as_str(),
                    error = %err,
                    "subscribing queue failed"
                );
                Err(err)
            }
        }
    }

    /// Removes the queue's subscriptions to the topics of the type. A topic
    /// or subscription that does not exist is not an error.
    pub async fn unsubscribe(&self, descriptor: &TypeDescriptor) -> BridgeResult<()> {
        let Some(metadata) = self.registry.metadata_for_type(descriptor) else {
            debug!(
                event = events::SUBSCRIBE_IGNORED_NO_METADATA,
                component = COMPONENT,
                type_name = descriptor.type_name(),
                reason = fields::REASON_NO_METADATA,
                "type has no message metadata, nothing to unsubscribe"
            );
            return Ok(());
        };
        self.unsubscribe_metadata(&metadata).await
    }

    pub async fn unsubscribe_metadata(&self, metadata: &MessageMetadata) -> BridgeResult<()> {
        let key = metadata.key();
        debug!(
            event = events::UNSUBSCRIBE_START,
            component = COMPONENT,
            message_key = key.as_str(),
            "unsubscribing queue"
        );

        for target in self.subscription_targets(metadata)? {
            let topic = match target {
                SubscriptionTarget::Named(name) => self.topics.find_topic_named(name).await?,
                SubscriptionTarget::Event(target) => self.topics.find_topic(&target).await?,
            };
            let Some(topic) = topic else {
                debug!(
                    event = events::UNSUBSCRIBE_TOPIC_MISSING,
                    component = COMPONENT,
                    message_key = key.as_str(),
                    "topic does not exist, nothing to unsubscribe"
                );
                continue;
            };

            let queue_arn = self.queue_arn().await?;
            let found = find_matching_subscription(self.pubsub.as_ref(), &topic, queue_arn)
                .await
                .map_err(|err| BridgeError::transient(Some(key), err))?;
            let Some(subscription) = found else {
                debug!(
                    event = events::UNSUBSCRIBE_SUBSCRIPTION_MISSING,
                    component = COMPONENT,
                    message_key = key.as_str(),
                    topic_arn = topic.arn(),
                    "queue is not subscribed to topic"
                );
                continue;
            };

            self.pubsub
                .unsubscribe(&subscription)
                .await
                .map_err(|err| BridgeError::transient(Some(key), err))?;
            info!(
                event = events::UNSUBSCRIBE_OK,
                component = COMPONENT,
                message_key = key.as_str(),
                topic_arn = topic.arn(),
                subscription_arn = subscription.arn(),
                "queue unsubscribed"
            );
        }

        self.subscribed.forget(key).await;
        Ok(())
    }

    async fn establish(
        &self,
        metadata: &MessageMetadata,
        on_topic_created: Option<&TopicCreatedCallback>,
    ) -> BridgeResult<usize> {
        let key = metadata.key();
        let topics = self.ensure_topics(metadata, on_topic_created).await?;
        self.authorize(key, &topics).await?;

        let queue_arn = self.queue_arn().await?;
        for topic in &topics {
            let subscription = self
                .pubsub
                .subscribe_queue(topic, queue_arn)
                .await
                .map_err(|err| BridgeError::transient(Some(key), err))?;
            self.pubsub
                .set_subscription_raw_delivery(&subscription)
                .await
                .map_err(|err| BridgeError::transient(Some(key), err))?;
            debug!(
                event = events::RAW_DELIVERY_SET,
                component = COMPONENT,
                message_key = key.as_str(),
                topic_arn = topic.arn(),
                subscription_arn = subscription.arn(),
                "raw delivery enabled"
            );
        }
        Ok(topics.len())
    }

    /// Mapped topics and events replace the type's own topic. Without a
    /// mapping the type's own topic is used, followed by the topics of its
    /// supertypes when the type hierarchy is subscribed too. Supertypes the
    /// registry does not know are skipped, unknown mapped events are
    /// `NotFound`.
    fn subscription_targets<'a>(
        &'a self,
        metadata: &MessageMetadata,
    ) -> BridgeResult<Vec<SubscriptionTarget<'a>>> {
        let key = metadata.key();
        let mapped_topics = self.config.event_to_topics.get(key);
        let mapped_events = self.config.event_to_events.get(key);

        if mapped_topics.is_none() && mapped_events.is_none() {
            let mut targets = vec![SubscriptionTarget::Event(metadata.clone())];
            if self.config.subscribe_to_type_hierarchy {
                for supertype in metadata.supertypes() {
                    match self.registry.metadata_for_identifier(supertype.as_str()) {
                        Some(supertype) => targets.push(SubscriptionTarget::Event(supertype)),
                        None => debug!(
                            event = events::SUPERTYPE_SKIPPED_NO_METADATA,
                            component = COMPONENT,
                            message_key = key.as_str(),
                            supertype = supertype.as_str(),
                            reason = fields::REASON_NO_METADATA,
                            "supertype has no message metadata, not subscribing to it"
                        ),
                    }
                }
            }
            return Ok(targets);
        }

        let mut targets: Vec<SubscriptionTarget<'a>> = mapped_topics
            .into_iter()
            .flatten()
            .map(|name| SubscriptionTarget::Named(name.as_str()))
            .collect();
        for event in mapped_events.into_iter().flatten() {
            targets.push(SubscriptionTarget::Event(self.lookup(event)?));
        }
        Ok(targets)
    }

    fn lookup(&self, key: &MessageKey) -> BridgeResult<MessageMetadata> {
        self.registry
            .metadata_for_identifier(key.as_str())
            .ok_or_else(|| BridgeError::NotFound {
                identifier: key.as_str().to_string(),
            })
    }

    async fn ensure_topics(
        &self,
        metadata: &MessageMetadata,
        on_topic_created: Option<&TopicCreatedCallback>,
    ) -> BridgeResult<Vec<Topic>> {
        let mut topics: Vec<Topic> = Vec::new();
        for target in self.subscription_targets(metadata)? {
            let topic = match target {
                SubscriptionTarget::Named(name) => {
                    self.topics.create_topic_named(name, on_topic_created).await?
                }
                SubscriptionTarget::Event(target) => {
                    self.topics.create_if_absent(&target, on_topic_created).await?
                }
            };
            if !topics.contains(&topic) {
                topics.push(topic);
            }
        }
        Ok(topics)
    }

    async fn authorize(&self, key: &MessageKey, topics: &[Topic]) -> BridgeResult<()> {
        if !self.config.policy.setup_topic_policies_when_subscribing {
            debug!(
                event = events::POLICY_SETUP_DISABLED,
                component = COMPONENT,
                message_key = key.as_str(),
                reason = fields::REASON_POLICY_SETUP_DISABLED,
                "queue policy setup is disabled"
            );
            return Ok(());
        }

        let queue_arn = self.queue_arn().await?;
        let patterns = self.topic_patterns(queue_arn)?;

        let _update = self.policy_update.lock().await;
        let current = self
            .queues
            .get_queue_access_policy(&self.queue_url)
            .await
            .map_err(|err| BridgeError::transient(Some(key), err))?;

        let Some(updated) =
            plan_policy_update(&current, queue_arn, topics.iter().map(Topic::arn), &patterns)
        else {
            debug!(
                event = events::POLICY_RECONCILE_UNCHANGED,
                component = COMPONENT,
                message_key = key.as_str(),
                reason = fields::REASON_ALREADY_GRANTED,
                "queue policy already allows every topic"
            );
            return Ok(());
        };

        self.queues
            .set_queue_access_policy(&self.queue_url, &updated)
            .await
            .map_err(|err| BridgeError::transient(Some(key), err))?;
        info!(
            event = events::POLICY_RECONCILE_UPDATED,
            component = COMPONENT,
            message_key = key.as_str(),
            topic_arns = %fields::format_topic_arns(topics),
            statement_count = updated.statements.len(),
            "queue policy updated"
        );
        Ok(())
    }

    fn topic_patterns(&self, queue_arn: &str) -> BridgeResult<BTreeSet<String>> {
        let policy = &self.config.policy;
        if !policy.has_pattern_conditions() {
            return Ok(BTreeSet::new());
        }
        let queue_arn: Arn = queue_arn.parse()?;
        Ok(topic_arn_patterns(policy, &self.config.topic_name_prefix, &queue_arn))
    }

    async fn queue_arn(&self) -> BridgeResult<&str> {
        self.queue_arn
            .get_or_try_init(|| async {
                self.queues
                    .queue_arn(&self.queue_url)
                    .await
                    .map_err(|err| BridgeError::transient(None, err))
            })
            .await
            .map(String::as_str)
    }
}
