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

//! Lazy, finite walk over a topic's subscription listing.

use crate::error::ServiceError;
use crate::observability::events;
use crate::service::{PubSubService, SubscriptionPage, SubscriptionRef, Topic};
use futures::stream::{self, Stream, TryStreamExt};
use tracing::debug;

const COMPONENT: &str = "subscription_pages";

enum PageCursor {
    Start,
    Next(String),
    Done,
}

async fn next_page(
    pubsub: &dyn PubSubService,
    topic: &Topic,
    cursor: PageCursor,
) -> Result<Option<(SubscriptionPage, PageCursor)>, ServiceError> {
    let token = match cursor {
        PageCursor::Start => None,
        PageCursor::Next(token) => Some(token),
        PageCursor::Done => return Ok(None),
    };

    let page = pubsub
        .list_subscriptions_page(topic, token.as_deref())
        .await?;
    debug!(
        event = events::SUBSCRIPTION_PAGE_FETCHED,
        component = COMPONENT,
        topic_arn = topic.arn(),
        subscription_count = page.subscriptions.len(),
        has_next = page.next_token.is_some(),
        "fetched subscription page"
    );

    let next = match page.next_token.as_deref() {
        Some(token) if !token.is_empty() && !page.subscriptions.is_empty() => {
            PageCursor::Next(token.to_string())
        }
        _ => PageCursor::Done,
    };
    Ok(Some((page, next)))
}

/// Pages of `topic`'s subscriptions, fetched one at a time as the stream is
/// polled. Ends after a page without a continuation token or without items.
pub fn subscription_pages<'a>(
    pubsub: &'a dyn PubSubService,
    topic: &'a Topic,
) -> impl Stream<Item = Result<SubscriptionPage, ServiceError>> + Send + 'a {
    stream::try_unfold(PageCursor::Start, move |cursor| {
        next_page(pubsub, topic, cursor)
    })
}

/// Finds the queue subscription that delivers `topic` into the queue
/// identified by `queue_arn`, stopping at the first page that contains it.
/// Rows of other protocols never match, even with the same endpoint.
pub async fn find_matching_subscription(
    pubsub: &dyn PubSubService,
    topic: &Topic,
    queue_arn: &str,
) -> Result<Option<SubscriptionRef>, ServiceError> {
    let pages = subscription_pages(pubsub, topic);
    futures::pin_mut!(pages);

    while let Some(page) = pages.try_next().await? {
        if let Some(found) = page
            .subscriptions
            .into_iter()
            .find(|subscription| subscription.delivers_to_queue(queue_arn))
        {
            return Ok(Some(SubscriptionRef::new(found.subscription_arn)));
        }
    }
    Ok(None)
}
