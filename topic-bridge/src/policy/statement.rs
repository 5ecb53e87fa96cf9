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

//! Authorization statement model for queue access policies.
//!
//! Collections are logically unordered sets. Comparisons live in
//! [`crate::policy::reconciler`] and never rely on element order or on the
//! absence of duplicates.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Action that lets a principal deliver messages into a queue.
pub const SEND_MESSAGE_ACTION: &str = "sqs:SendMessage";
/// Condition type used for topic ARN matching.
pub const ARN_LIKE_CONDITION: &str = "ArnLike";
/// Condition key carrying the ARN of the delivering topic.
pub const SOURCE_ARN_CONDITION_KEY: &str = "aws:SourceArn";
/// Principal provider for account-level identities.
pub const AWS_PRINCIPAL_PROVIDER: &str = "AWS";
/// Marker that turns a condition value into a pattern.
pub const WILDCARD: char = '*';

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct Principal {
    pub provider: String,
    pub id: String,
}

impl Principal {
    pub fn new(provider: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            id: id.into(),
        }
    }

    /// Anyone, usually narrowed down by a condition.
    pub fn everyone() -> Self {
        Self::new(AWS_PRINCIPAL_PROVIDER, "*")
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Condition {
    pub condition_type: String,
    pub condition_key: String,
    pub values: Vec<String>,
}

impl Condition {
    pub fn new<I, S>(condition_type: impl Into<String>, condition_key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            condition_type: condition_type.into(),
            condition_key: condition_key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Matches the ARN of the delivering topic against `values`.
    pub fn source_arn_like<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ARN_LIKE_CONDITION, SOURCE_ARN_CONDITION_KEY, values)
    }

    pub fn value_set(&self) -> BTreeSet<&str> {
        self.values.iter().map(String::as_str).collect()
    }

    pub(crate) fn has_same_operand(&self, other: &Condition) -> bool {
        self.condition_type == other.condition_type && self.condition_key == other.condition_key
    }

    /// True when there is at least one value and every value is a pattern.
    pub fn is_wildcard(&self) -> bool {
        !self.values.is_empty() && self.values.iter().all(|value| value.contains(WILDCARD))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Statement {
    pub sid: Option<String>,
    pub effect: Effect,
    pub principals: Vec<Principal>,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
    pub conditions: Vec<Condition>,
    /// Statement keys outside this model, e.g. `NotPrincipal`, kept verbatim.
    pub unmodeled: BTreeMap<String, Value>,
    /// Condition operands whose values are not strings, by type then key.
    pub unmodeled_conditions: BTreeMap<String, BTreeMap<String, Value>>,
}

impl Statement {
    pub fn new(effect: Effect) -> Self {
        Self {
            sid: None,
            effect,
            principals: Vec::new(),
            actions: Vec::new(),
            resources: Vec::new(),
            conditions: Vec::new(),
            unmodeled: BTreeMap::new(),
            unmodeled_conditions: BTreeMap::new(),
        }
    }

    /// False when the statement carries content the comparisons cannot see.
    /// Such statements never count as granting anything and are never merged.
    pub fn is_fully_modeled(&self) -> bool {
        self.unmodeled.is_empty() && self.unmodeled_conditions.is_empty()
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principals.push(principal);
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resources.push(resource.into());
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}
