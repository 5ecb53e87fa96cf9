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

//! Remote pub/sub and queue capabilities consumed by the bridge.
//!
//! Implementations wrap the real service clients. Every call is a single
//! remote round trip; none of them retries.

use crate::error::ServiceError;
use crate::policy::PolicyDocument;
use async_trait::async_trait;
use std::fmt::{Display, Formatter};

/// A resolved pub/sub topic, identified by its ARN.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Topic {
    arn: String,
}

impl Topic {
    pub fn new(arn: impl Into<String>) -> Self {
        Self { arn: arn.into() }
    }

    pub fn arn(&self) -> &str {
        &self.arn
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.arn)
    }
}

/// A queue's subscription to a topic.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SubscriptionRef {
    arn: String,
}

impl SubscriptionRef {
    pub fn new(arn: impl Into<String>) -> Self {
        Self { arn: arn.into() }
    }

    pub fn arn(&self) -> &str {
        &self.arn
    }
}

/// Delivery protocol of subscriptions whose endpoint is a queue.
pub const SQS_PROTOCOL: &str = "sqs";

/// One row of a topic's subscription listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListedSubscription {
    pub subscription_arn: String,
    /// Resource identifier of the subscribed endpoint, the queue ARN for queues.
    pub endpoint: String,
    pub protocol: String,
}

impl ListedSubscription {
    /// True for a queue subscription delivering into `queue_arn`.
    pub fn delivers_to_queue(&self, queue_arn: &str) -> bool {
        self.protocol == SQS_PROTOCOL && self.endpoint == queue_arn
    }
}

/// One page of a topic's subscription listing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubscriptionPage {
    pub subscriptions: Vec<ListedSubscription>,
    pub next_token: Option<String>,
}

#[async_trait]
pub trait PubSubService: Send + Sync {
    async fn find_topic_by_name(&self, name: &str) -> Result<Option<Topic>, ServiceError>;

    /// Creates a topic. The service is idempotent on `name`.
    async fn create_topic(&self, name: &str) -> Result<Topic, ServiceError>;

    async fn subscribe_queue(
        &self,
        topic: &Topic,
        queue_arn: &str,
    ) -> Result<SubscriptionRef, ServiceError>;

    /// Enables raw message delivery for a subscription.
    async fn set_subscription_raw_delivery(
        &self,
        subscription: &SubscriptionRef,
    ) -> Result<(), ServiceError>;

    async fn list_subscriptions_page(
        &self,
        topic: &Topic,
        continuation_token: Option<&str>,
    ) -> Result<SubscriptionPage, ServiceError>;

    async fn unsubscribe(&self, subscription: &SubscriptionRef) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait QueueService: Send + Sync {
    /// Resolves a queue URL to the queue's resource identifier.
    async fn queue_arn(&self, queue_url: &str) -> Result<String, ServiceError>;

    /// Returns the queue's access policy, or an empty document if none is set.
    async fn get_queue_access_policy(&self, queue_url: &str)
        -> Result<PolicyDocument, ServiceError>;

    /// Replaces the queue's access policy as a whole.
    async fn set_queue_access_policy(
        &self,
        queue_url: &str,
        policy: &PolicyDocument,
    ) -> Result<(), ServiceError>;
}
