//! SQS-backed implementation of [`QueueService`].

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs as sqs;
use sqs::types::QueueAttributeName;

use crate::error::ServiceError;
use crate::service::{QueueAttributes, QueuePage, QueueService};

/// Largest page SQS hands out. `ListQueues` and `ListDeadLetterSourceQueues`
/// only return a `NextToken` when `MaxResults` is set, so every listing asks
/// for it explicitly.
pub const MAX_RESULTS: i32 = 1000;

/// Client for the SQS queues of one account and region.
///
/// The region, credentials, endpoint, retry and timeout behaviour all come
/// from the [`SdkConfig`] it is built from.
///
/// # Example
///
/// ```no_run
/// use redrive::{SqsService, TopologyReporter};
///
/// # async fn example() -> Result<(), redrive::ServiceError> {
/// let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
///     .region("us-east-1")
///     .load()
///     .await;
/// let reporter = TopologyReporter::new(SqsService::from_config(config));
///
/// for entry in reporter.report_topology().await?.entries {
///     println!("{} -> {:?}", entry.queue_url, entry.policy);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SqsService {
    /// The AWS SDK configuration used for SQS operations
    pub config: SdkConfig,
    /// The SQS client instance
    pub client: sqs::Client,
}

impl SqsService {
    /// Creates the service from a pre-built AWS SDK config.
    ///
    /// Callers decide how credentials and endpoints are resolved (e.g. the
    /// CLI's `--local` flag for LocalStack).
    pub fn from_config(config: SdkConfig) -> Self {
        let client = sqs::Client::new(&config);
        Self { config, client }
    }
}

#[async_trait]
impl QueueService for SqsService {
    async fn list_queues(
        &self,
        prefix: Option<&str>,
        next_token: Option<String>,
    ) -> Result<QueuePage, ServiceError> {
        let output = self
            .client
            .list_queues()
            .set_queue_name_prefix(prefix.map(str::to_string))
            .max_results(MAX_RESULTS)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("list queues", e))?;

        Ok(QueuePage {
            queue_urls: output.queue_urls().to_vec(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn queue_attributes(&self, queue_url: &str) -> Result<QueueAttributes, ServiceError> {
        let output = self
            .client
            .get_queue_attributes()
            .queue_url(queue_url)
            .attribute_names(QueueAttributeName::RedrivePolicy)
            .attribute_names(QueueAttributeName::QueueArn)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("get queue attributes", e))?;

        let Some(mut attributes) = output.attributes else {
            return Ok(QueueAttributes::default());
        };

        Ok(QueueAttributes {
            redrive_policy: attributes.remove(&QueueAttributeName::RedrivePolicy),
            queue_arn: attributes.remove(&QueueAttributeName::QueueArn),
        })
    }

    async fn list_dead_letter_source_queues(
        &self,
        dlq_url: &str,
        next_token: Option<String>,
    ) -> Result<QueuePage, ServiceError> {
        let output = self
            .client
            .list_dead_letter_source_queues()
            .queue_url(dlq_url)
            .max_results(MAX_RESULTS)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("list dead letter source queues", e))?;

        Ok(QueuePage {
            queue_urls: output.queue_urls().to_vec(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn send_message(&self, queue_url: &str, body: &str) -> Result<String, ServiceError> {
        let output = self
            .client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("send message", e))?;

        output
            .message_id()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::new("send message", "response carried no message id"))
    }
}
