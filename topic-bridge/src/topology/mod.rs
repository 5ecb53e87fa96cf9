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

//! Topic layer.
//!
//! Owns the mapping from message keys to sanitized topic names and to
//! resolved [`Topic`](crate::service::Topic) handles, and performs the
//! idempotent "create if absent" against the pub/sub service.

pub(crate) mod topic_directory;
pub(crate) mod topic_name;
