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

//! Message type identity and the collaborator capabilities that describe it.

use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::borrow::Borrow;
use std::fmt::{Display, Formatter};

/// Stable identifier of a message type, usually its fully qualified name.
///
/// This is the only key used by the topic and subscription caches.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageKey(String);

impl MessageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MessageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for MessageKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MessageKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for MessageKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Runtime handle for a Rust type used to look up its [`MessageMetadata`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
}

impl TypeDescriptor {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// What the metadata registry knows about one message type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageMetadata {
    key: MessageKey,
    supertypes: Vec<MessageKey>,
}

impl MessageMetadata {
    pub fn new(key: impl Into<MessageKey>) -> Self {
        Self {
            key: key.into(),
            supertypes: Vec::new(),
        }
    }

    /// Declares the types this message implements, most specific first.
    pub fn with_supertypes<I, K>(mut self, supertypes: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<MessageKey>,
    {
        self.supertypes = supertypes.into_iter().map(Into::into).collect();
        self
    }

    pub fn key(&self) -> &MessageKey {
        &self.key
    }

    pub fn supertypes(&self) -> &[MessageKey] {
        &self.supertypes
    }
}

/// Maps a runtime type or a wire-level type identifier to message metadata.
///
/// Returning `None` means the type carries no message semantics.
pub trait MessageRegistry: Send + Sync {
    fn metadata_for_type(&self, descriptor: &TypeDescriptor) -> Option<MessageMetadata>;

    fn metadata_for_identifier(&self, identifier: &str) -> Option<MessageMetadata>;
}

/// Produces the raw topic name for a message type. The result is always
/// sanitized by the topic directory before use.
pub trait TopicNameGenerator: Send + Sync {
    fn generate(&self, metadata: &MessageMetadata) -> String;
}

impl<F> TopicNameGenerator for F
where
    F: Fn(&MessageMetadata) -> String + Send + Sync,
{
    fn generate(&self, metadata: &MessageMetadata) -> String {
        self(metadata)
    }
}

/// Default generator: `prefix` followed by the message key with every `.`
/// turned into `_`.
#[derive(Clone, Debug, Default)]
pub struct PrefixedTopicNameGenerator {
    prefix: String,
}

impl PrefixedTopicNameGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn raw_name(prefix: &str, qualified_name: &str) -> String {
        format!("{prefix}{}", qualified_name.replace('.', "_"))
    }
}

impl TopicNameGenerator for PrefixedTopicNameGenerator {
    fn generate(&self, metadata: &MessageMetadata) -> String {
        Self::raw_name(&self.prefix, metadata.key().as_str())
    }
}
