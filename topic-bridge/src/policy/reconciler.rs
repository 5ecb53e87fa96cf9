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

//! Statement comparison and construction for queue permissions.
//!
//! All functions here are pure. The containment predicates are asymmetric:
//! each asks whether `existing` already grants everything `candidate` needs.

use crate::policy::statement::{Condition, Effect, Principal, Statement, SEND_MESSAGE_ACTION};
use std::collections::BTreeSet;

fn contains_all<T: PartialEq>(existing: &[T], required: &[T]) -> bool {
    required.iter().all(|needed| existing.contains(needed))
}

fn grants_same_access(candidate: &Statement, existing: &Statement) -> bool {
    existing.is_fully_modeled()
        && candidate.effect == existing.effect
        && contains_all(&existing.resources, &candidate.resources)
        && contains_all(&existing.actions, &candidate.actions)
        && contains_all(&existing.principals, &candidate.principals)
}

/// True when `existing` is fully modeled, has the same effect, contains every
/// resource, action and principal of `candidate`, and carries every condition
/// of `candidate` with an identical value set.
pub fn statements_equal(candidate: &Statement, existing: &Statement) -> bool {
    grants_same_access(candidate, existing)
        && candidate.conditions.iter().all(|needed| {
            existing.conditions.iter().any(|present| {
                present.has_same_operand(needed) && present.value_set() == needed.value_set()
            })
        })
}

/// True when `existing` grants the same access as `candidate` and, for every
/// condition of `candidate`, carries a condition on the same type and key
/// whose values include all of the candidate's values.
pub fn is_covered_by(candidate: &Statement, existing: &Statement) -> bool {
    grants_same_access(candidate, existing)
        && candidate.conditions.iter().all(|needed| {
            existing.conditions.iter().any(|present| {
                present.has_same_operand(needed)
                    && present.value_set().is_superset(&needed.value_set())
            })
        })
}

/// True when `existing` grants the same access as `candidate` and has at
/// least one condition made up entirely of wildcard patterns.
pub fn is_covered_by_wildcard(candidate: &Statement, existing: &Statement) -> bool {
    grants_same_access(candidate, existing)
        && existing.conditions.iter().any(Condition::is_wildcard)
}

/// Any of the three checks above against any statement in `statements`.
pub fn is_already_granted(candidate: &Statement, statements: &[Statement]) -> bool {
    statements.iter().any(|existing| {
        statements_equal(candidate, existing)
            || is_covered_by(candidate, existing)
            || is_covered_by_wildcard(candidate, existing)
    })
}

fn send_message_statement(queue_arn: &str, condition: Condition) -> Statement {
    Statement::new(Effect::Allow)
        .with_principal(Principal::everyone())
        .with_action(SEND_MESSAGE_ACTION)
        .with_resource(queue_arn)
        .with_condition(condition)
}

/// Allows `topic_arn` to deliver into the queue.
pub fn permission_statement(queue_arn: &str, topic_arn: &str) -> Statement {
    send_message_statement(queue_arn, Condition::source_arn_like([topic_arn]))
}

/// Allows every topic matching one of `patterns` to deliver into the queue.
///
/// Patterns are deduplicated and sorted byte-wise, so the same set always
/// yields the same statement regardless of input order.
pub fn permission_statement_for_patterns<I, S>(queue_arn: &str, patterns: I) -> Statement
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let sorted: BTreeSet<String> = patterns.into_iter().map(Into::into).collect();
    send_message_statement(queue_arn, Condition::source_arn_like(sorted))
}
