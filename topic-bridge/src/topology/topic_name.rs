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

//! Topic-name sanitization.

use std::fmt::{Display, Formatter};

/// Longest name the pub/sub service accepts for a topic.
pub const MAX_TOPIC_NAME_LENGTH: usize = 256;

/// Replaces every character that is not a letter, a digit, `-` or `_` with `-`.
///
/// Total and deterministic; the output has the same number of characters as
/// the input.
pub fn sanitize_topic_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// A sanitized, non-empty topic name within the service's length limit.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct TopicName(String);

impl TopicName {
    /// Sanitizes `raw`. Returns `None` when the result is unusable.
    pub fn sanitize(raw: &str) -> Option<Self> {
        let sanitized = sanitize_topic_name(raw);
        if sanitized.is_empty() || sanitized.chars().count() > MAX_TOPIC_NAME_LENGTH {
            return None;
        }
        Some(Self(sanitized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TopicName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
