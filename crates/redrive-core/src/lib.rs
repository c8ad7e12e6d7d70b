//! # redrive-core
//!
//! Core library for inspecting the dead letter queue relationships between
//! AWS SQS queues.
//!
//! ## Features
//!
//! - **Queue Listing**: List every SQS queue of a region, following
//!   pagination tokens to the end
//! - **Topology Reports**: Fetch and parse each queue's `RedrivePolicy` and
//!   correlate sources with their dead letter queues
//! - **Reverse Lookups**: Ask SQS which queues redrive into a given DLQ
//! - **Sending**: Send a single message to a queue
//!
//! ## Example
//!
//! ```no_run
//! use redrive::{SqsService, TopologyReporter};
//!
//! # async fn example() -> Result<(), redrive::ServiceError> {
//! let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
//!     .load()
//!     .await;
//! let reporter = TopologyReporter::new(SqsService::from_config(config));
//!
//! let report = reporter.report_topology().await?;
//! for edge in report.edges() {
//!     println!("{} -> {}", edge.source, edge.dead_letter);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod policy;
mod send;
mod service;
mod sqs;
mod topology;

#[cfg(test)]
mod test_utils;

pub use error::{PerQueueError, PolicyError, SendError, ServiceError};
pub use policy::RedrivePolicy;
pub use send::send_message;
pub use service::{QueueAttributes, QueuePage, QueueService};
pub use sqs::{SqsService, MAX_RESULTS};
pub use topology::{
    list_all_queues, redrive_policy_attribute, TopologyEdge, TopologyEntry, TopologyReport,
    TopologyReporter,
};
