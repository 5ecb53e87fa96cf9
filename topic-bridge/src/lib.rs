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

//! # topic-bridge
//!
//! `topic-bridge` binds a queue to a publish/subscribe backbone. It resolves
//! or lazily creates one topic per message type, subscribes the queue to
//! those topics and keeps the queue's access policy allowing the topics to
//! deliver into it.
//!
//! The remote services are consumed through the [`PubSubService`] and
//! [`QueueService`] capabilities, the message types through a
//! [`MessageRegistry`]. [`SubscriptionManager`] ties them together.
//!
//! ## Queue policy reconciliation
//!
//! The [`policy`] layer is pure. Given the queue's current policy and the
//! topics that must deliver, it plans the next document or reports that
//! nothing needs to change:
//!
//! ```
//! use std::collections::BTreeSet;
//! use topic_bridge::policy::planner::plan_policy_update;
//! use topic_bridge::policy::PolicyDocument;
//!
//! let queue = "arn:aws:sqs:us-east-1:123456789012:billing";
//! let orders = "arn:aws:sns:us-east-1:123456789012:Sales_OrderPlaced";
//! let refunds = "arn:aws:sns:us-east-1:123456789012:Sales_RefundIssued";
//!
//! let updated = plan_policy_update(&PolicyDocument::default(), queue, [orders], &BTreeSet::new())
//!     .expect("an empty policy needs a grant");
//! assert_eq!(updated.statements.len(), 1);
//!
//! // Already allowed: nothing to write.
//! assert!(plan_policy_update(&updated, queue, [orders], &BTreeSet::new()).is_none());
//!
//! // A further topic joins the existing grant instead of adding a statement.
//! let merged = plan_policy_update(&updated, queue, [refunds], &BTreeSet::new()).unwrap();
//! assert_eq!(merged.statements.len(), 1);
//! assert_eq!(merged.statements[0].conditions[0].values, vec![orders, refunds]);
//! ```
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events and never initializes a global
//! subscriber. Binaries and tests are responsible for one-time
//! `tracing_subscriber` initialization.

pub mod config;
pub use config::{BridgeConfig, PolicyConfig};

pub mod error;
pub use error::{BridgeError, BridgeResult, ServiceError};

pub mod metadata;
pub use metadata::{
    MessageKey, MessageMetadata, MessageRegistry, PrefixedTopicNameGenerator, TopicNameGenerator,
    TypeDescriptor,
};

#[doc(hidden)]
pub mod observability;

pub mod policy;
pub use policy::PolicyDocument;

pub mod service;
pub use service::{
    ListedSubscription, PubSubService, QueueService, SubscriptionPage, SubscriptionRef, Topic,
    SQS_PROTOCOL,
};

mod subscription;
pub use subscription::manager::SubscriptionManager;
pub use subscription::subscription_pages::{find_matching_subscription, subscription_pages};
pub use subscription::subscription_record::SubscriptionRecord;

mod topology;
pub use topology::topic_directory::{TopicCreatedCallback, TopicDirectory};
pub use topology::topic_name::{sanitize_topic_name, TopicName, MAX_TOPIC_NAME_LENGTH};
