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

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use topic_bridge::{PolicyDocument, QueueService, ServiceError};

pub const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/fakeQueue";
pub const QUEUE_ARN: &str = "arn:aws:sqs:us-east-1:123456789012:fakeQueue";

#[derive(Default)]
struct State {
    policy_json: String,
    arn_lookups: usize,
    policy_reads: usize,
    policy_writes: Vec<PolicyDocument>,
    failing: HashSet<&'static str>,
}

/// Queue service holding one queue's access policy in its JSON wire form.
pub struct RecordingQueue {
    queue_arn: String,
    read_delay: Option<Duration>,
    state: Mutex<State>,
}

impl Default for RecordingQueue {
    fn default() -> Self {
        Self::new(QUEUE_ARN)
    }
}

impl RecordingQueue {
    pub fn new(queue_arn: impl Into<String>) -> Self {
        Self {
            queue_arn: queue_arn.into(),
            read_delay: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Starts from `policy` instead of an empty policy.
    pub fn with_policy(self, policy: &PolicyDocument) -> Self {
        self.state().policy_json = policy.to_json().expect("seed policy encodes");
        self
    }

    /// Starts from raw policy JSON, as another owner may have written it.
    pub fn with_policy_json(self, json: &str) -> Self {
        self.state().policy_json = json.to_string();
        self
    }

    /// Holds every policy read for `delay` after the stored policy was taken,
    /// so concurrent writers all start from the same document.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("recording state poisoned")
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.state().failing.insert(operation);
    }

    pub fn policy(&self) -> PolicyDocument {
        PolicyDocument::from_json(&self.policy_json()).expect("stored policy decodes")
    }

    pub fn policy_json(&self) -> String {
        self.state().policy_json.clone()
    }

    pub fn arn_lookups(&self) -> usize {
        self.state().arn_lookups
    }

    pub fn policy_reads(&self) -> usize {
        self.state().policy_reads
    }

    /// Every document written, oldest first.
    pub fn policy_writes(&self) -> Vec<PolicyDocument> {
        self.state().policy_writes.clone()
    }

    fn check(state: &State, operation: &'static str) -> Result<(), ServiceError> {
        if state.failing.contains(operation) {
            return Err(ServiceError::new(operation, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl QueueService for RecordingQueue {
    async fn queue_arn(&self, _queue_url: &str) -> Result<String, ServiceError> {
        let mut state = self.state();
        state.arn_lookups += 1;
        Self::check(&state, "queue_arn")?;
        Ok(self.queue_arn.clone())
    }

    async fn get_queue_access_policy(
        &self,
        _queue_url: &str,
    ) -> Result<PolicyDocument, ServiceError> {
        let policy_json = {
            let mut state = self.state();
            state.policy_reads += 1;
            Self::check(&state, "get_queue_access_policy")?;
            state.policy_json.clone()
        };
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        PolicyDocument::from_json(&policy_json)
            .map_err(|err| ServiceError::new("get_queue_access_policy", err.to_string()))
    }

    async fn set_queue_access_policy(
        &self,
        _queue_url: &str,
        policy: &PolicyDocument,
    ) -> Result<(), ServiceError> {
        let mut state = self.state();
        Self::check(&state, "set_queue_access_policy")?;
        state.policy_json = policy
            .to_json()
            .map_err(|err| ServiceError::new("set_queue_access_policy", err.to_string()))?;
        state.policy_writes.push(policy.clone());
        Ok(())
    }
}
