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

//! Wildcard topic patterns granted in a single statement.

use crate::config::PolicyConfig;
use crate::metadata::PrefixedTopicNameGenerator;
use crate::policy::arn::Arn;
use crate::policy::statement::WILDCARD;
use crate::topology::topic_name::sanitize_topic_name;
use std::collections::BTreeSet;

const TOPIC_SERVICE: &str = "sns";

fn topic_pattern(queue_arn: &Arn, topic_name_start: &str) -> String {
    queue_arn
        .sibling(TOPIC_SERVICE, &format!("{topic_name_start}{WILDCARD}"))
        .to_string()
}

/// Topic ARN patterns, in the queue's partition, region and account, that
/// the configured policy conditions ask to allow up front.
pub fn topic_arn_patterns(
    policy: &PolicyConfig,
    topic_name_prefix: &str,
    queue_arn: &Arn,
) -> BTreeSet<String> {
    let mut patterns = BTreeSet::new();

    if policy.account_condition {
        patterns.insert(topic_pattern(queue_arn, ""));
    }

    if policy.topic_name_prefix_condition {
        patterns.insert(topic_pattern(queue_arn, &sanitize_topic_name(topic_name_prefix)));
    }

    for namespace in &policy.topic_namespace_conditions {
        let raw = PrefixedTopicNameGenerator::raw_name(topic_name_prefix, namespace);
        patterns.insert(topic_pattern(queue_arn, &sanitize_topic_name(&raw)));
    }

    patterns
}
