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

//! Bridge configuration, loaded from json5.

use crate::error::{BridgeError, BridgeResult};
use crate::metadata::MessageKey;
use crate::topology::topic_name::TopicName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn enabled() -> bool {
    true
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    #[serde(default)]
    pub topic_name_prefix: String,
    #[serde(default)]
    pub subscribe_to_type_hierarchy: bool,
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Topic names an event is published to instead of its own topic.
    #[serde(default)]
    pub event_to_topics: BTreeMap<MessageKey, Vec<String>>,
    /// Events whose topics an event is published to instead of its own topic.
    #[serde(default)]
    pub event_to_events: BTreeMap<MessageKey, Vec<MessageKey>>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    #[serde(default = "enabled")]
    pub setup_topic_policies_when_subscribing: bool,
    #[serde(default)]
    pub account_condition: bool,
    #[serde(default)]
    pub topic_name_prefix_condition: bool,
    #[serde(default)]
    pub topic_namespace_conditions: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            setup_topic_policies_when_subscribing: enabled(),
            account_condition: false,
            topic_name_prefix_condition: false,
            topic_namespace_conditions: Vec::new(),
        }
    }
}

impl PolicyConfig {
    /// True when any condition asks for wildcard topic patterns.
    pub fn has_pattern_conditions(&self) -> bool {
        self.account_condition
            || self.topic_name_prefix_condition
            || !self.topic_namespace_conditions.is_empty()
    }
}

impl BridgeConfig {
    pub fn from_json5_str(contents: &str) -> BridgeResult<Self> {
        json5::from_str(contents).map_err(|e| BridgeError::InvalidConfig {
            reason: format!("Unable to parse config: {e}"),
        })
    }

    pub fn from_json5_file(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| BridgeError::InvalidConfig {
            reason: format!("Unable to read config file {}: {e}", path.display()),
        })?;
        Self::from_json5_str(&contents)
    }

    /// Rejects mappings that could never resolve to a topic.
    pub fn validate(&self) -> BridgeResult<()> {
        for (event, topics) in &self.event_to_topics {
            if topics.is_empty() {
                return Err(BridgeError::Conflict {
                    reason: format!("event '{event}' is mapped to an empty list of topics"),
                });
            }
            if let Some(raw) = topics.iter().find(|raw| TopicName::sanitize(raw).is_none()) {
                return Err(BridgeError::InvalidName {
                    key: Some(event.clone()),
                    raw: raw.clone(),
                });
            }
        }

        for (event, targets) in &self.event_to_events {
            if targets.is_empty() {
                return Err(BridgeError::Conflict {
                    reason: format!("event '{event}' is mapped to an empty list of events"),
                });
            }
            if targets.contains(event) {
                return Err(BridgeError::Conflict {
                    reason: format!("event '{event}' is mapped to itself"),
                });
            }
        }

        Ok(())
    }
}
