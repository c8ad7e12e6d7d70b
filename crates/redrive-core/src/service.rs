//! The calls this crate makes against a queue service, one request at a time.
//!
//! [`crate::SqsService`] talks to AWS; tests plug in an in-memory service.

use async_trait::async_trait;

use crate::error::ServiceError;

/// One page of queue URLs, with the token for the next page if there is one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueuePage {
    pub queue_urls: Vec<String>,
    pub next_token: Option<String>,
}

/// The subset of queue attributes needed to correlate queues with their DLQs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueAttributes {
    /// Raw `RedrivePolicy` JSON, absent when no DLQ is configured
    pub redrive_policy: Option<String>,
    pub queue_arn: Option<String>,
}

#[async_trait]
pub trait QueueService: Send + Sync {
    /// `ListQueues`, optionally restricted to names starting with `prefix`.
    async fn list_queues(
        &self,
        prefix: Option<&str>,
        next_token: Option<String>,
    ) -> Result<QueuePage, ServiceError>;

    /// `GetQueueAttributes` for `RedrivePolicy` and `QueueArn`.
    async fn queue_attributes(&self, queue_url: &str) -> Result<QueueAttributes, ServiceError>;

    /// `ListDeadLetterSourceQueues` for the DLQ at `dlq_url`.
    async fn list_dead_letter_source_queues(
        &self,
        dlq_url: &str,
        next_token: Option<String>,
    ) -> Result<QueuePage, ServiceError>;

    /// `SendMessage`, returning the id assigned by the service.
    async fn send_message(&self, queue_url: &str, body: &str) -> Result<String, ServiceError>;
}

/// Drains a paginated listing, following `next_token` until the service
/// stops returning one.
pub(crate) async fn collect_pages<F, Fut>(mut fetch: F) -> Result<Vec<String>, ServiceError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<QueuePage, ServiceError>>,
{
    let mut queues = Vec::new();
    let mut token = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(token).await?;
        pages += 1;
        queues.extend(page.queue_urls);

        // an empty token is the same as none; looping on it would never end
        match page.next_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => break,
        }
    }

    log::debug!("collected {} queue urls over {} page(s)", queues.len(), pages);
    Ok(queues)
}
