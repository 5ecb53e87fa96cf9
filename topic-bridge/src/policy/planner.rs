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

//! Plans the minimal rewrite of a queue policy so that a set of topics may
//! deliver into the queue.

use crate::policy::document::PolicyDocument;
use crate::policy::reconciler::{
    is_already_granted, permission_statement, permission_statement_for_patterns, statements_equal,
};
use crate::policy::statement::{Effect, Principal, Statement};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

/// Statements sharing a shape differ only in the values of their single
/// condition and can be folded into one statement.
#[derive(Eq, Hash, PartialEq)]
struct MergeShape {
    effect: Effect,
    resources: BTreeSet<String>,
    actions: BTreeSet<String>,
    principals: BTreeSet<Principal>,
    condition_type: String,
    condition_key: String,
}

impl MergeShape {
    /// Statements carrying a `Sid`, unmodeled content, several conditions or
    /// wildcard values have no shape and are never rewritten.
    fn of(statement: &Statement) -> Option<Self> {
        if statement.sid.is_some() || !statement.is_fully_modeled() {
            return None;
        }
        let [condition] = statement.conditions.as_slice() else {
            return None;
        };
        if condition.values.is_empty() || condition.is_wildcard() {
            return None;
        }

        Some(Self {
            effect: statement.effect,
            resources: statement.resources.iter().cloned().collect(),
            actions: statement.actions.iter().cloned().collect(),
            principals: statement.principals.iter().cloned().collect(),
            condition_type: condition.condition_type.clone(),
            condition_key: condition.condition_key.clone(),
        })
    }
}

/// Folds statements of the same shape into the first of them, with the
/// sorted union of their condition values. Order of everything else is kept.
pub fn merge_statements(statements: Vec<Statement>) -> Vec<Statement> {
    let mut merged: Vec<Statement> = Vec::with_capacity(statements.len());
    let mut slots: HashMap<MergeShape, usize> = HashMap::new();

    for statement in statements {
        let Some(shape) = MergeShape::of(&statement) else {
            merged.push(statement);
            continue;
        };

        match slots.entry(shape) {
            Entry::Occupied(slot) => {
                let target = &mut merged[*slot.get()];
                if let (Some(into), Some(from)) =
                    (target.conditions.first_mut(), statement.conditions.first())
                {
                    let union: BTreeSet<String> = into
                        .values
                        .drain(..)
                        .chain(from.values.iter().cloned())
                        .collect();
                    into.values = union.into_iter().collect();
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(merged.len());
                merged.push(statement);
            }
        }
    }

    merged
}

/// Returns the policy to write so that every topic in `topic_arns` may send
/// to `queue_arn`, or `None` when `document` already allows all of them.
///
/// When `patterns` is non-empty a single pattern statement is ensured first;
/// topics it covers are not granted individually. Remaining grants are merged
/// with each other and with existing statements of the same shape.
pub fn plan_policy_update<'a, I>(
    document: &PolicyDocument,
    queue_arn: &str,
    topic_arns: I,
    patterns: &BTreeSet<String>,
) -> Option<PolicyDocument>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut statements = document.statements.clone();
    let mut changed = false;

    if !patterns.is_empty() {
        let pattern_statement = permission_statement_for_patterns(queue_arn, patterns.iter().cloned());
        if !statements
            .iter()
            .any(|existing| statements_equal(&pattern_statement, existing))
        {
            statements.push(pattern_statement);
            changed = true;
        }
    }

    let mut requested = BTreeSet::new();
    let pending: Vec<Statement> = topic_arns
        .into_iter()
        .filter(|topic_arn| requested.insert(*topic_arn))
        .map(|topic_arn| permission_statement(queue_arn, topic_arn))
        .filter(|candidate| !is_already_granted(candidate, &statements))
        .collect();

    if !pending.is_empty() {
        statements.extend(pending);
        statements = merge_statements(statements);
        changed = true;
    }

    changed.then(|| PolicyDocument {
        version: document.version.clone(),
        id: document.id.clone(),
        statements,
        unmodeled: document.unmodeled.clone(),
    })
}
