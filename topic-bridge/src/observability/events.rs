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

//! Canonical structured event names used across `topic-bridge`.

// Topic directory events.
pub const TOPIC_CACHE_HIT: &str = "topic_cache_hit";
pub const TOPIC_LOOKUP_FOUND: &str = "topic_lookup_found";
pub const TOPIC_LOOKUP_MISSING: &str = "topic_lookup_missing";
pub const TOPIC_CREATE_START: &str = "topic_create_start";
pub const TOPIC_CREATE_OK: &str = "topic_create_ok";
pub const TOPIC_CREATE_FAILED: &str = "topic_create_failed";
pub const TOPIC_CACHE_PUBLISH_RACE: &str = "topic_cache_publish_race";
pub const TOPIC_NAME_REJECTED: &str = "topic_name_rejected";

// Subscription lifecycle events.
pub const SUBSCRIBE_START: &str = "subscribe_start";
pub const SUBSCRIBE_OK: &str = "subscribe_ok";
pub const SUBSCRIBE_FAILED: &str = "subscribe_failed";
pub const SUBSCRIBE_SKIPPED_ALREADY_SUBSCRIBED: &str = "subscribe_skipped_already_subscribed";
pub const SUBSCRIBE_IGNORED_NO_METADATA: &str = "subscribe_ignored_no_metadata";
pub const SUPERTYPE_SKIPPED_NO_METADATA: &str = "supertype_skipped_no_metadata";
pub const RAW_DELIVERY_SET: &str = "raw_delivery_set";
pub const UNSUBSCRIBE_START: &str = "unsubscribe_start";
pub const UNSUBSCRIBE_OK: &str = "unsubscribe_ok";
pub const UNSUBSCRIBE_TOPIC_MISSING: &str = "unsubscribe_topic_missing";
pub const UNSUBSCRIBE_SUBSCRIPTION_MISSING: &str = "unsubscribe_subscription_missing";
pub const SUBSCRIPTION_PAGE_FETCHED: &str = "subscription_page_fetched";

// Queue policy events.
pub const POLICY_RECONCILE_UNCHANGED: &str = "policy_reconcile_unchanged";
pub const POLICY_RECONCILE_UPDATED: &str = "policy_reconcile_updated";
pub const POLICY_SETUP_DISABLED: &str = "policy_setup_disabled";
