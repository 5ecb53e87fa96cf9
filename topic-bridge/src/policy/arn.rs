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

//! Minimal ARN parsing used to derive topic patterns from a queue ARN.

use crate::error::{BridgeError, BridgeResult};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// `arn:<partition>:<service>:<region>:<account>:<resource>`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account: String,
    pub resource: String,
}

impl Arn {
    /// ARN of a topic in the same partition, region and account.
    pub fn sibling(&self, service: &str, resource: &str) -> Arn {
        Arn {
            partition: self.partition.clone(),
            service: service.to_string(),
            region: self.region.clone(),
            account: self.account.clone(),
            resource: resource.to_string(),
        }
    }
}

impl FromStr for Arn {
    type Err = BridgeError;

    fn from_str(arn: &str) -> BridgeResult<Self> {
        let invalid = || BridgeError::InvalidArn {
            arn: arn.to_string(),
        };

        let mut parts = arn.splitn(6, ':');
        if parts.next() != Some("arn") {
            return Err(invalid());
        }
        let mut next = || parts.next().map(str::to_string).ok_or_else(invalid);
        let parsed = Arn {
            partition: next()?,
            service: next()?,
            region: next()?,
            account: next()?,
            resource: next()?,
        };

        if parsed.partition.is_empty() || parsed.service.is_empty() || parsed.resource.is_empty() {
            return Err(invalid());
        }
        Ok(parsed)
    }
}

impl Display for Arn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account, self.resource
        )
    }
}
