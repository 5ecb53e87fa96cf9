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

use crate::metadata::MessageKey;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Completion slots of the message keys this process subscribes to.
///
/// A slot is set once every subscription step for its key succeeded. All
/// callers for one key share the slot, so its initialization runs once at a
/// time and a failed run leaves it empty for the next caller. The record is
/// only a short-circuit for repeated requests. It says nothing about what the
/// pub/sub service currently holds.
#[derive(Debug, Default)]
pub struct SubscriptionRecord {
    slots: Mutex<HashMap<MessageKey, Arc<OnceCell<()>>>>,
}

impl SubscriptionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `key`, created empty on first use.
    pub async fn slot(&self, key: &MessageKey) -> Arc<OnceCell<()>> {
        self.slots
            .lock()
            .await
            .entry(key.clone())
            .or_default()
            .clone()
    }

    /// Drops the slot. Returns `true` when the key was recorded as subscribed.
    pub async fn forget(&self, key: &MessageKey) -> bool {
        self.slots
            .lock()
            .await
            .remove(key)
            .is_some_and(|slot| slot.initialized())
    }
}
