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

use std::any::TypeId;
use std::collections::HashMap;
use topic_bridge::{MessageMetadata, MessageRegistry, TypeDescriptor};

/// Metadata registry built up front by the test.
#[derive(Default)]
pub struct StaticRegistry {
    by_type: HashMap<TypeId, MessageMetadata>,
    by_identifier: HashMap<String, MessageMetadata>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` and its key as a wire identifier.
    pub fn with_type<T: ?Sized + 'static>(mut self, metadata: MessageMetadata) -> Self {
        self.by_type
            .insert(TypeDescriptor::of::<T>().type_id(), metadata.clone());
        self.with_identifier(metadata)
    }

    /// Registers only the wire identifier, e.g. for a supertype.
    pub fn with_identifier(mut self, metadata: MessageMetadata) -> Self {
        self.by_identifier
            .insert(metadata.key().as_str().to_string(), metadata);
        self
    }
}

impl MessageRegistry for StaticRegistry {
    fn metadata_for_type(&self, descriptor: &TypeDescriptor) -> Option<MessageMetadata> {
        self.by_type.get(&descriptor.type_id()).cloned()
    }

    fn metadata_for_identifier(&self, identifier: &str) -> Option<MessageMetadata> {
        self.by_identifier.get(identifier).cloned()
    }
}
