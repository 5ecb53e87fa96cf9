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

//! Queue access policy document and its JSON wire form.
//!
//! Keys the model does not interpret, such as `NotPrincipal` or boolean
//! condition values, are carried through decode and encode unchanged.

use crate::error::{BridgeError, BridgeResult};
use crate::policy::statement::{Condition, Effect, Principal, Statement, AWS_PRINCIPAL_PROVIDER};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Policy language version written into every encoded document.
pub const POLICY_VERSION: &str = "2012-10-17";

/// An ordered list of statements attached to a queue.
///
/// The document is always read, modified and written back as a whole.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PolicyDocument {
    pub version: String,
    pub id: Option<String>,
    pub statements: Vec<Statement>,
    /// Document keys outside this model, kept verbatim.
    pub unmodeled: BTreeMap<String, Value>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PolicyDocument {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            id: None,
            statements,
            unmodeled: BTreeMap::new(),
        }
    }

    /// Encodes the document. Output is deterministic: conditions are grouped
    /// by type and key in byte order, all other lists keep their order.
    pub fn to_json(&self) -> BridgeResult<String> {
        serde_json::to_string(&WireDocument::from(self)).map_err(|err| BridgeError::InvalidPolicy {
            reason: err.to_string(),
        })
    }

    /// Decodes a document. A blank string is an empty document, which is what
    /// a queue without a policy reports.
    pub fn from_json(json: &str) -> BridgeResult<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }

        let wire: WireDocument =
            serde_json::from_str(json).map_err(|err| BridgeError::InvalidPolicy {
                reason: err.to_string(),
            })?;
        Ok(wire.into())
    }
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(single) => vec![single],
            OneOrMany::Many(many) => many,
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum WirePrincipal {
    Everyone(String),
    ByProvider(BTreeMap<String, OneOrMany<String>>),
}

#[derive(Deserialize, Serialize)]
struct WireDocument {
    #[serde(rename = "Version", default = "default_version")]
    version: String,
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "Statement", default)]
    statements: OneOrMany<WireStatement>,
    #[serde(flatten)]
    unmodeled: BTreeMap<String, Value>,
}

fn default_version() -> String {
    POLICY_VERSION.to_string()
}

type WireConditions = BTreeMap<String, BTreeMap<String, Value>>;

#[derive(Deserialize, Serialize)]
struct WireStatement {
    #[serde(rename = "Sid", default, skip_serializing_if = "Option::is_none")]
    sid: Option<String>,
    #[serde(rename = "Effect")]
    effect: Effect,
    #[serde(rename = "Principal", default, skip_serializing_if = "Option::is_none")]
    principal: Option<WirePrincipal>,
    #[serde(rename = "Action", default, skip_serializing_if = "Option::is_none")]
    action: Option<OneOrMany<String>>,
    #[serde(rename = "Resource", default, skip_serializing_if = "Option::is_none")]
    resource: Option<OneOrMany<String>>,
    #[serde(rename = "Condition", default, skip_serializing_if = "BTreeMap::is_empty")]
    condition: WireConditions,
    #[serde(flatten)]
    unmodeled: BTreeMap<String, Value>,
}

fn non_empty(values: &[String]) -> Option<OneOrMany<String>> {
    (!values.is_empty()).then(|| OneOrMany::Many(values.to_vec()))
}

/// A single string or an array of strings. Anything else is not a value set.
fn string_values(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(single) => Some(vec![single.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

impl From<&Statement> for WireStatement {
    fn from(statement: &Statement) -> Self {
        let mut by_provider: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for principal in &statement.principals {
            by_provider
                .entry(principal.provider.clone())
                .or_default()
                .push(principal.id.clone());
        }

        let mut grouped: BTreeMap<String, BTreeMap<String, Vec<String>>> = BTreeMap::new();
        for entry in &statement.conditions {
            grouped
                .entry(entry.condition_type.clone())
                .or_default()
                .entry(entry.condition_key.clone())
                .or_default()
                .extend(entry.values.iter().cloned());
        }

        let mut condition: WireConditions = grouped
            .into_iter()
            .map(|(condition_type, keys)| {
                let keys = keys
                    .into_iter()
                    .map(|(key, values)| {
                        (key, Value::Array(values.into_iter().map(Value::String).collect()))
                    })
                    .collect();
                (condition_type, keys)
            })
            .collect();
        for (condition_type, keys) in &statement.unmodeled_conditions {
            let operands = condition.entry(condition_type.clone()).or_default();
            for (key, value) in keys {
                operands.insert(key.clone(), value.clone());
            }
        }

        Self {
            sid: statement.sid.clone(),
            effect: statement.effect,
            principal: (!by_provider.is_empty()).then(|| {
                WirePrincipal::ByProvider(
                    by_provider
                        .into_iter()
                        .map(|(provider, ids)| (provider, OneOrMany::Many(ids)))
                        .collect(),
                )
            }),
            action: non_empty(&statement.actions),
            resource: non_empty(&statement.resources),
            condition,
            unmodeled: statement.unmodeled.clone(),
        }
    }
}

impl From<WireStatement> for Statement {
    fn from(wire: WireStatement) -> Self {
        let principals = match wire.principal {
            None => Vec::new(),
            Some(WirePrincipal::Everyone(id)) if id == "*" => vec![Principal::everyone()],
            Some(WirePrincipal::Everyone(id)) => vec![Principal::new(AWS_PRINCIPAL_PROVIDER, id)],
            Some(WirePrincipal::ByProvider(providers)) => providers
                .into_iter()
                .flat_map(|(provider, ids)| {
                    ids.into_vec()
                        .into_iter()
                        .map(move |id| Principal::new(provider.clone(), id))
                })
                .collect(),
        };

        let mut conditions = Vec::new();
        let mut unmodeled_conditions: WireConditions = BTreeMap::new();
        for (condition_type, keys) in wire.condition {
            for (key, value) in keys {
                match string_values(&value) {
                    Some(values) => {
                        conditions.push(Condition::new(condition_type.clone(), key, values))
                    }
                    None => {
                        unmodeled_conditions
                            .entry(condition_type.clone())
                            .or_default()
                            .insert(key, value);
                    }
                }
            }
        }

        Self {
            sid: wire.sid,
            effect: wire.effect,
            principals,
            actions: wire.action.map(OneOrMany::into_vec).unwrap_or_default(),
            resources: wire.resource.map(OneOrMany::into_vec).unwrap_or_default(),
            conditions,
            unmodeled: wire.unmodeled,
            unmodeled_conditions,
        }
    }
}

impl From<&PolicyDocument> for WireDocument {
    fn from(document: &PolicyDocument) -> Self {
        Self {
            version: document.version.clone(),
            id: document.id.clone(),
            statements: OneOrMany::Many(document.statements.iter().map(WireStatement::from).collect()),
            unmodeled: document.unmodeled.clone(),
        }
    }
}

impl From<WireDocument> for PolicyDocument {
    fn from(wire: WireDocument) -> Self {
        Self {
            version: wire.version,
            id: wire.id,
            statements: wire.statements.into_vec().into_iter().map(Statement::from).collect(),
            unmodeled: wire.unmodeled,
        }
    }
}
