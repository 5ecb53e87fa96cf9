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


//! Canonical structured field values and value-format helpers.

use crate::service::Topic;

pub const NONE: &str = "none";
pub const REASON_NO_METADATA: &str = "no_metadata";
pub const REASON_ALREADY_SUBSCRIBED: &str = "already_subscribed";
pub const REASON_POLICY_SETUP_DISABLED: &str = "policy_setup_disabled";
pub const REASON_ALREADY_GRANTED: &str = "already_granted";

/// Comma separated topic ARNs in the given order, or [`NONE`].
pub fn format_topic_arns(topics: &[Topic]) -> String {
    if topics.is_empty() {
        return NONE.to_string();
    }
    topics.iter().map(Topic::arn).collect::<Vec<_>>().join(",")
}
