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

//! Queue access-policy layer.
//!
//! Pure statement comparison, construction and merge planning, plus the
//! JSON wire form of policy documents. Nothing here performs remote calls.

pub mod arn;
pub mod document;
pub mod patterns;
pub mod planner;
pub mod reconciler;
pub mod statement;

pub use document::PolicyDocument;
