//! Error types shared by the queue service seam and the topology reporter.

use aws_sdk_sqs::error::{DisplayErrorContext, SdkError};

/// The queue service rejected a request, or the request never reached it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to {operation}: {message}")]
pub struct ServiceError {
    /// Short description of the call that failed, e.g. `list queues`
    pub operation: &'static str,
    pub message: String,
}

impl ServiceError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }

    /// Wraps an AWS SDK error, keeping the service's own error message when
    /// there is one (e.g. `AWS.SimpleQueueService.NonExistentQueue`).
    pub fn from_sdk<E, R>(operation: &'static str, err: SdkError<E, R>) -> Self
    where
        E: std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        let message = match &err {
            SdkError::ServiceError(se) => se.err().to_string(),
            _ => DisplayErrorContext(&err).to_string(),
        };
        Self::new(operation, message)
    }
}

/// Why a raw `RedrivePolicy` attribute did not yield a dead letter target.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("redrive policy is empty")]
    Empty,
    #[error("redrive policy is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("redrive policy has no deadLetterTargetArn")]
    MissingTarget,
}

/// A failure scoped to one queue while building a topology report.
///
/// These never abort the report: the queue is kept with no relationship and
/// enumeration moves on.
#[derive(Debug, thiserror::Error)]
pub enum PerQueueError {
    #[error("could not get attributes for queue {queue}: {source}")]
    AttributeFetch { queue: String, source: ServiceError },
    #[error("could not parse redrive policy of queue {queue}: {source}")]
    InvalidPolicy { queue: String, source: PolicyError },
}

impl PerQueueError {
    pub fn queue(&self) -> &str {
        match self {
            PerQueueError::AttributeFetch { queue, .. } => queue,
            PerQueueError::InvalidPolicy { queue, .. } => queue,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("queue URL was not specified")]
    MissingQueueUrl,
    #[error(transparent)]
    Service(#[from] ServiceError),
}
