use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::service::{QueueAttributes, QueuePage, QueueService};
use crate::RedrivePolicy;

const ENDPOINT: &str = "http://sqs.us-east-1.localhost.localstack.cloud:4566/000000000000";
const ARN_PREFIX: &str = "arn:aws:sqs:us-east-1:000000000000";
const DEFAULT_PAGE_SIZE: usize = 1000;

struct FakeQueue {
    name: String,
    redrive_policy: Option<String>,
    fail_attributes: bool,
}

/// In-memory stand-in for SQS, paginating the way `ListQueues` does when
/// `MaxResults` is set.
#[derive(Default)]
pub struct InMemoryQueues {
    queues: Vec<FakeQueue>,
    page_size: Option<usize>,
    fail_listing: bool,
    jitter: bool,
    list_calls: AtomicUsize,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl InMemoryQueues {
    /// `n` queues with no redrive policy, named `queue-00000`, `queue-00001`, ...
    pub fn with_generated(n: usize) -> Self {
        (0..n).fold(Self::default(), |queues, i| {
            queues.queue(&format!("queue-{i:05}"))
        })
    }

    pub fn queue(self, name: &str) -> Self {
        self.push(name, None)
    }

    pub fn queue_with_dlq(self, name: &str, dlq: &str, max_receive_count: Option<u32>) -> Self {
        let policy = RedrivePolicy {
            dead_letter_target_arn: format!("{ARN_PREFIX}:{dlq}"),
            max_receive_count,
        };
        let raw = serde_json::to_string(&policy).unwrap();
        self.push(name, Some(raw))
    }

    pub fn queue_with_raw_policy(self, name: &str, raw: &str) -> Self {
        self.push(name, Some(raw.to_string()))
    }

    fn push(mut self, name: &str, redrive_policy: Option<String>) -> Self {
        self.queues.push(FakeQueue {
            name: name.to_string(),
            redrive_policy,
            fail_attributes: false,
        });
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn fail_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn fail_attributes_for(mut self, name: &str) -> Self {
        for queue in self.queues.iter_mut().filter(|q| q.name == name) {
            queue.fail_attributes = true;
        }
        self
    }

    /// Attribute requests finish after a varying delay, so concurrent
    /// requests complete out of order.
    pub fn jitter_attributes(mut self) -> Self {
        self.jitter = true;
        self
    }

    pub fn url(&self, name: &str) -> String {
        format!("{ENDPOINT}/{name}")
    }

    pub fn arn(&self, name: &str) -> String {
        format!("{ARN_PREFIX}:{name}")
    }

    pub fn urls(&self) -> Vec<String> {
        self.queues.iter().map(|q| self.url(&q.name)).collect()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn find(&self, url: &str) -> Option<(usize, &FakeQueue)> {
        self.queues
            .iter()
            .enumerate()
            .find(|(_, q)| self.url(&q.name) == url)
    }

    fn paginate(&self, urls: Vec<String>, token: Option<String>) -> Result<QueuePage, ServiceError> {
        let start = match token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ServiceError::new("paginate", "invalid next token"))?,
            None => 0,
        };
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        let end = (start + page_size).min(urls.len());

        Ok(QueuePage {
            queue_urls: urls[start.min(end)..end].to_vec(),
            next_token: (end < urls.len()).then(|| end.to_string()),
        })
    }
}

#[async_trait]
impl QueueService for InMemoryQueues {
    async fn list_queues(
        &self,
        prefix: Option<&str>,
        next_token: Option<String>,
    ) -> Result<QueuePage, ServiceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(ServiceError::new("list queues", "AccessDenied"));
        }

        let urls = self
            .queues
            .iter()
            .filter(|q| prefix.map_or(true, |p| q.name.starts_with(p)))
            .map(|q| self.url(&q.name))
            .collect();
        self.paginate(urls, next_token)
    }

    async fn queue_attributes(&self, queue_url: &str) -> Result<QueueAttributes, ServiceError> {
        let Some((index, queue)) = self.find(queue_url) else {
            return Err(ServiceError::new("get queue attributes", "NonExistentQueue"));
        };

        if self.jitter {
            let delay = (index * 7919) % 13;
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }

        if queue.fail_attributes {
            return Err(ServiceError::new("get queue attributes", "Throttling"));
        }

        Ok(QueueAttributes {
            redrive_policy: queue.redrive_policy.clone(),
            queue_arn: Some(self.arn(&queue.name)),
        })
    }

    async fn list_dead_letter_source_queues(
        &self,
        dlq_url: &str,
        next_token: Option<String>,
    ) -> Result<QueuePage, ServiceError> {
        let Some((_, dlq)) = self.find(dlq_url) else {
            return Err(ServiceError::new(
                "list dead letter source queues",
                "NonExistentQueue",
            ));
        };
        let dlq_arn = self.arn(&dlq.name);

        let urls = self
            .queues
            .iter()
            .filter(|q| {
                q.redrive_policy
                    .as_deref()
                    .and_then(RedrivePolicy::parse)
                    .is_some_and(|p| p.dead_letter_target_arn == dlq_arn)
            })
            .map(|q| self.url(&q.name))
            .collect();
        self.paginate(urls, next_token)
    }

    async fn send_message(&self, queue_url: &str, body: &str) -> Result<String, ServiceError> {
        if self.find(queue_url).is_none() {
            return Err(ServiceError::new("send message", "NonExistentQueue"));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push((queue_url.to_string(), body.to_string()));
        Ok(format!("message-{}", sent.len()))
    }
}
