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

//! Error taxonomy surfaced to callers of the topic bridge.

use crate::metadata::MessageKey;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by a remote pub/sub or queue service call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceError {
    operation: &'static str,
    message: String,
}

impl ServiceError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }

    /// Name of the remote operation that failed, e.g. `create_topic`.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.message)
    }
}

impl Error for ServiceError {}

/// Failures of topic resolution, subscription orchestration and policy
/// reconciliation.
#[derive(Debug)]
pub enum BridgeError {
    /// A remote call failed. Not retried here.
    Transient {
        operation: &'static str,
        key: Option<MessageKey>,
        source: ServiceError,
    },
    /// The metadata registry could not resolve a type or wire identifier.
    NotFound { identifier: String },
    /// Two configuration settings contradict each other.
    Conflict { reason: String },
    /// A configuration source that could not be read or parsed.
    InvalidConfig { reason: String },
    /// A topic name sanitized to something the pub/sub service cannot accept.
    InvalidName {
        key: Option<MessageKey>,
        raw: String,
    },
    /// A resource identifier that is not a well-formed ARN.
    InvalidArn { arn: String },
    /// A queue access policy document that could not be decoded.
    InvalidPolicy { reason: String },
}

impl BridgeError {
    pub(crate) fn transient(key: Option<&MessageKey>, source: ServiceError) -> Self {
        BridgeError::Transient {
            operation: source.operation(),
            key: key.cloned(),
            source,
        }
    }
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::Transient {
                operation,
                key: Some(key),
                source,
            } => write!(f, "remote call {operation} for '{key}' failed: {source}"),
            BridgeError::Transient {
                operation,
                key: None,
                source,
            } => write!(f, "remote call {operation} failed: {source}"),
            BridgeError::NotFound { identifier } => {
                write!(f, "no message metadata registered for '{identifier}'")
            }
            BridgeError::Conflict { reason } => write!(f, "conflicting configuration: {reason}"),
            BridgeError::InvalidConfig { reason } => {
                write!(f, "unable to load configuration: {reason}")
            }
            BridgeError::InvalidName { key: Some(key), raw } => {
                write!(f, "topic name '{raw}' derived for '{key}' is not usable")
            }
            BridgeError::InvalidName { key: None, raw } => {
                write!(f, "topic name '{raw}' is not usable")
            }
            BridgeError::InvalidArn { arn } => write!(f, "'{arn}' is not a valid ARN"),
            BridgeError::InvalidPolicy { reason } => {
                write!(f, "unable to decode access policy: {reason}")
            }
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BridgeError::Transient { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
