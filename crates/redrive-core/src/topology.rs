//! Queue -> dead letter queue topology.
//!
//! A report is built in three steps: list every queue, fetch each queue's
//! `RedrivePolicy` and `QueueArn`, then parse the policy. Failures on a single
//! queue are logged and recorded on the report; only a failure to list the
//! queues aborts it.

use std::collections::{BTreeMap, HashMap};

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::{PerQueueError, ServiceError};
use crate::policy::RedrivePolicy;
use crate::service::{collect_pages, QueueService};

/// Lists every queue URL visible to `service`, following pagination tokens
/// until the service reports no more pages.
pub async fn list_all_queues<S: QueueService + ?Sized>(
    service: &S,
    prefix: Option<&str>,
) -> Result<Vec<String>, ServiceError> {
    collect_pages(move |token| service.list_queues(prefix, token)).await
}

/// Fetches the raw `RedrivePolicy` attribute of a queue, `None` when the
/// queue has no DLQ configured.
pub async fn redrive_policy_attribute<S: QueueService + ?Sized>(
    service: &S,
    queue_url: &str,
) -> Result<Option<String>, ServiceError> {
    Ok(service.queue_attributes(queue_url).await?.redrive_policy)
}

/// One enumerated queue and its dead letter configuration, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TopologyEntry {
    pub queue_url: String,
    pub queue_arn: Option<String>,
    pub policy: Option<RedrivePolicy>,
}

/// `source` redrives failed messages into `dead_letter`.
///
/// `dead_letter` is the DLQ's URL when its ARN belongs to one of the
/// enumerated queues, otherwise the target ARN as written in the policy.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TopologyEdge {
    pub source: String,
    pub dead_letter: String,
}

#[derive(Debug, Default)]
pub struct TopologyReport {
    /// One entry per queue, in the order the service listed them
    pub entries: Vec<TopologyEntry>,
    /// Queues whose relationship could not be determined
    pub failures: Vec<PerQueueError>,
}

impl TopologyReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn url_by_arn(&self) -> HashMap<&str, &str> {
        self.entries
            .iter()
            .filter_map(|e| Some((e.queue_arn.as_deref()?, e.queue_url.as_str())))
            .collect()
    }

    /// Every source -> DLQ relationship, in enumeration order of the sources.
    pub fn edges(&self) -> Vec<TopologyEdge> {
        let urls = self.url_by_arn();
        self.entries
            .iter()
            .filter_map(|entry| {
                let target = entry.policy.as_ref()?.dead_letter_target_arn.as_str();
                Some(TopologyEdge {
                    source: entry.queue_url.clone(),
                    dead_letter: urls.get(target).copied().unwrap_or(target).to_string(),
                })
            })
            .collect()
    }

    /// Sources that redrive into `dead_letter`, given as either its URL or ARN.
    pub fn sources_of(&self, dead_letter: &str) -> Vec<String> {
        let arn = self
            .entries
            .iter()
            .find(|e| e.queue_url == dead_letter)
            .and_then(|e| e.queue_arn.as_deref())
            .unwrap_or(dead_letter);

        self.entries
            .iter()
            .filter(|e| {
                e.policy
                    .as_ref()
                    .is_some_and(|p| p.dead_letter_target_arn == arn)
            })
            .map(|e| e.queue_url.clone())
            .collect()
    }

    /// Groups the edges by dead letter queue.
    pub fn dead_letter_queues(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for edge in self.edges() {
            grouped.entry(edge.dead_letter).or_default().push(edge.source);
        }
        grouped
    }
}

/// Builds topology reports and answers reverse DLQ lookups for the queues of
/// one region.
pub struct TopologyReporter<S> {
    service: S,
    prefix: Option<String>,
    concurrency: usize,
}

impl<S: QueueService> TopologyReporter<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            prefix: None,
            concurrency: 1,
        }
    }

    /// Only report queues whose name starts with `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Number of attribute requests in flight at once. Entries keep
    /// enumeration order whatever the value.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn list_all_queues(&self) -> Result<Vec<String>, ServiceError> {
        list_all_queues(&self.service, self.prefix.as_deref()).await
    }

    pub async fn report_topology(&self) -> Result<TopologyReport, ServiceError> {
        let queues = self.list_all_queues().await?;
        log::info!("inspecting {} queue(s)", queues.len());

        // `buffered` yields results in input order
        let outcomes: Vec<_> = stream::iter(queues)
            .map(|queue_url| self.inspect(queue_url))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = TopologyReport::default();
        for (entry, failure) in outcomes {
            if let Some(failure) = failure {
                log::warn!("{failure}");
                report.failures.push(failure);
            }
            report.entries.push(entry);
        }

        Ok(report)
    }

    async fn inspect(&self, queue_url: String) -> (TopologyEntry, Option<PerQueueError>) {
        let attributes = match self.service.queue_attributes(&queue_url).await {
            Ok(attributes) => attributes,
            Err(source) => {
                let failure = PerQueueError::AttributeFetch {
                    queue: queue_url.clone(),
                    source,
                };
                let entry = TopologyEntry {
                    queue_url,
                    queue_arn: None,
                    policy: None,
                };
                return (entry, Some(failure));
            }
        };

        let parsed = attributes
            .redrive_policy
            .as_deref()
            .map(str::parse::<RedrivePolicy>);

        let (policy, failure) = match parsed {
            None => (None, None),
            Some(Ok(policy)) => (Some(policy), None),
            Some(Err(source)) => (
                None,
                Some(PerQueueError::InvalidPolicy {
                    queue: queue_url.clone(),
                    source,
                }),
            ),
        };

        let entry = TopologyEntry {
            queue_url,
            queue_arn: attributes.queue_arn,
            policy,
        };
        (entry, failure)
    }

    /// Queues whose redrive policy targets the DLQ at `dlq_url`, as reported
    /// by the service itself. An empty result is not an error.
    pub async fn list_sources_for_dead_letter_queue(
        &self,
        dlq_url: &str,
    ) -> Result<Vec<String>, ServiceError> {
        let service = &self.service;
        collect_pages(move |token| service.list_dead_letter_source_queues(dlq_url, token)).await
    }
}
