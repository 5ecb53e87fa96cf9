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

//! Topic directory: cached topic-name derivation and topic resolution.

use crate::error::{BridgeError, BridgeResult};
use crate::metadata::{
    MessageKey, MessageMetadata, MessageRegistry, TopicNameGenerator, TypeDescriptor,
};
use crate::observability::events;
use crate::service::{PubSubService, Topic};
use crate::topology::topic_name::TopicName;
use std::sync::Arc;
use topic_cache::KeyedCache;
use tracing::{debug, info, warn};

const COMPONENT: &str = "topic_directory";

/// Invoked with the sanitized name and the new topic right after a remote
/// create succeeds and before the topic is published to the cache.
pub type TopicCreatedCallback = dyn Fn(&TopicName, &Topic) + Send + Sync;

/// Resolves message types to topics, creating topics on demand.
///
/// Entries are published only after the remote call that produced them
/// succeeded and are never evicted. When two callers race to create the same
/// topic, both may reach the pub/sub service (which is idempotent on name),
/// but only the first published [`Topic`] is ever returned for the key.
pub struct TopicDirectory {
    pubsub: Arc<dyn PubSubService>,
    registry: Arc<dyn MessageRegistry>,
    name_generator: Arc<dyn TopicNameGenerator>,
    topics: KeyedCache<MessageKey, Topic>,
    topic_names: KeyedCache<MessageKey, TopicName>,
    named_topics: KeyedCache<TopicName, Topic>,
}

impl TopicDirectory {
    pub fn new(
        pubsub: Arc<dyn PubSubService>,
        registry: Arc<dyn MessageRegistry>,
        name_generator: Arc<dyn TopicNameGenerator>,
    ) -> Self {
        Self {
            pubsub,
            registry,
            name_generator,
            topics: KeyedCache::new(),
            topic_names: KeyedCache::new(),
            named_topics: KeyedCache::new(),
        }
    }

    /// Returns the cached topic name for the message type, deriving and
    /// caching it on first use.
    pub async fn resolve_topic_name(&self, metadata: &MessageMetadata) -> BridgeResult<TopicName> {
        if let Some(name) = self.topic_names.get(metadata.key()).await {
            return Ok(name);
        }

        let raw = self.name_generator.generate(metadata);
        let Some(name) = TopicName::sanitize(&raw) else {
            warn!(
                event = events::TOPIC_NAME_REJECTED,
                component = COMPONENT,
                message_key = metadata.key().as_str(),
                raw_name = raw.as_str(),
                "generated topic name is unusable after sanitization"
            );
            return Err(BridgeError::InvalidName {
                key: Some(metadata.key().clone()),
                raw,
            });
        };

        Ok(self
            .topic_names
            .get_or_insert(metadata.key().clone(), name)
            .await)
    }

    /// Returns the topic for the message type if it exists. Never creates.
    pub async fn find_topic(&self, metadata: &MessageMetadata) -> BridgeResult<Option<Topic>> {
        let key = metadata.key();
        if let Some(topic) = self.topics.get(key).await {
            debug!(
                event = events::TOPIC_CACHE_HIT,
                component = COMPONENT,
                message_key = key.as_str(),
                topic_arn = topic.arn(),
                "topic served from cache"
            );
            return Ok(Some(topic));
        }

        let name = self.resolve_topic_name(metadata).await?;
        match self.lookup_remote(&name, Some(key)).await? {
            Some(topic) => Ok(Some(self.topics.get_or_insert(key.clone(), topic).await)),
            None => Ok(None),
        }
    }

    /// Like [`TopicDirectory::find_topic`], resolving the type through the
    /// metadata registry first. An unknown type is a configuration error.
    pub async fn find_topic_for_type(
        &self,
        descriptor: &TypeDescriptor,
    ) -> BridgeResult<Option<Topic>> {
        let metadata =
            self.registry
                .metadata_for_type(descriptor)
                .ok_or_else(|| BridgeError::NotFound {
                    identifier: descriptor.type_name().to_string(),
                })?;
        self.find_topic(&metadata).await
    }

    /// Like [`TopicDirectory::find_topic`] for a wire-level type identifier.
    pub async fn find_topic_for_identifier(&self, identifier: &str) -> BridgeResult<Option<Topic>> {
        let metadata = self
            .registry
            .metadata_for_identifier(identifier)
            .ok_or_else(|| BridgeError::NotFound {
                identifier: identifier.to_string(),
            })?;
        self.find_topic(&metadata).await
    }

    /// Returns the existing topic for the message type or creates it.
    pub async fn create_if_absent(
        &self,
        metadata: &MessageMetadata,
        on_created: Option<&TopicCreatedCallback>,
    ) -> BridgeResult<Topic> {
        if let Some(existing) = self.find_topic(metadata).await? {
            return Ok(existing);
        }

        let key = metadata.key();
        let name = self.resolve_topic_name(metadata).await?;
        let created = self.create_remote(&name, Some(key)).await?;
        if let Some(on_created) = on_created {
            on_created(&name, &created);
        }

        let stored = self.topics.get_or_insert(key.clone(), created.clone()).await;
        if stored != created {
            info!(
                event = events::TOPIC_CACHE_PUBLISH_RACE,
                component = COMPONENT,
                message_key = key.as_str(),
                created_arn = created.arn(),
                stored_arn = stored.arn(),
                "concurrent creation already published a topic for this key"
            );
        }
        Ok(stored)
    }

    /// Finds a topic by an explicitly configured name. Never creates.
    pub async fn find_topic_named(&self, raw_name: &str) -> BridgeResult<Option<Topic>> {
        let name = Self::sanitize_configured(raw_name)?;
        if let Some(topic) = self.named_topics.get(&name).await {
            return Ok(Some(topic));
        }

        match self.lookup_remote(&name, None).await? {
            Some(topic) => Ok(Some(self.named_topics.get_or_insert(name, topic).await)),
            None => Ok(None),
        }
    }

    /// Returns or creates a topic by an explicitly configured name.
    pub async fn create_topic_named(
        &self,
        raw_name: &str,
        on_created: Option<&TopicCreatedCallback>,
    ) -> BridgeResult<Topic> {
        if let Some(existing) = self.find_topic_named(raw_name).await? {
            return Ok(existing);
        }

        let name = Self::sanitize_configured(raw_name)?;
        let created = self.create_remote(&name, None).await?;
        if let Some(on_created) = on_created {
            on_created(&name, &created);
        }
        Ok(self.named_topics.get_or_insert(name, created).await)
    }

    fn sanitize_configured(raw_name: &str) -> BridgeResult<TopicName> {
        TopicName::sanitize(raw_name).ok_or_else(|| BridgeError::InvalidName {
            key: None,
            raw: raw_name.to_string(),
        })
    }

    async fn lookup_remote(
        &self,
        name: &TopicName,
        key: Option<&MessageKey>,
    ) -> BridgeResult<Option<Topic>> {
        let found = self
            .pubsub
            .find_topic_by_name(name.as_str())
            .await
            .map_err(|err| BridgeError::transient(key, err))?;

        match &found {
            Some(topic) => debug!(
                event = events::TOPIC_LOOKUP_FOUND,
                component = COMPONENT,
                topic_name = name.as_str(),
                topic_arn = topic.arn(),
                "topic found"
            ),
            None => debug!(
                event = events::TOPIC_LOOKUP_MISSING,
                component = COMPONENT,
                topic_name = name.as_str(),
                "topic does not exist yet"
            ),
        }
        Ok(found)
    }

    async fn create_remote(&self, name: &TopicName, key: Option<&MessageKey>) -> BridgeResult<Topic> {
        debug!(
            event = events::TOPIC_CREATE_START,
            component = COMPONENT,
            topic_name = name.as_str(),
            "creating topic"
        );

        match self.pubsub.create_topic(name.as_str()).await {
            Ok(topic) => {
                info!(
                    event = events::TOPIC_CREATE_OK,
                    component = COMPONENT,
                    topic_name = name.as_str(),
                    topic_arn = topic.arn(),
                    "created topic"
                );
                Ok(topic)
            }
            Err(err) => {
                warn!(
                    event = events::TOPIC_CREATE_FAILED,
                    component = COMPONENT,
                    topic_name = name.as_str(),
                    err = %err,
                    "topic creation failed"
                );
                Err(BridgeError::transient(key, err))
            }
        }
    }
}
