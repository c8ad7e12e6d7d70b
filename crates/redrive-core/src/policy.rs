//! Parsing of the `RedrivePolicy` queue attribute.
//!
//! SQS stores the policy as a JSON document inside a string attribute:
//!
//! ```json
//! {"deadLetterTargetArn":"arn:aws:sqs:us-east-1:000000000000:orders-dlq","maxReceiveCount":5}
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// The dead letter configuration of a single queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedrivePolicy {
    /// ARN of the queue that receives messages after `max_receive_count` failed receives
    pub dead_letter_target_arn: String,
    pub max_receive_count: Option<u32>,
}

impl RedrivePolicy {
    /// Parses a raw attribute value, treating anything unusable as "no DLQ".
    ///
    /// ```
    /// use redrive::RedrivePolicy;
    ///
    /// assert!(RedrivePolicy::parse("not json").is_none());
    ///
    /// let raw = r#"{"deadLetterTargetArn":"arn:aws:sqs:us-east-1:1:dlq"}"#;
    /// let policy = RedrivePolicy::parse(raw).unwrap();
    /// assert_eq!(policy.dead_letter_target_arn, "arn:aws:sqs:us-east-1:1:dlq");
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPolicy {
    #[serde(default)]
    dead_letter_target_arn: Option<serde_json::Value>,
    #[serde(default)]
    max_receive_count: Option<serde_json::Value>,
}

impl FromStr for RedrivePolicy {
    type Err = PolicyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().is_empty() {
            return Err(PolicyError::Empty);
        }

        let policy: RawPolicy = serde_json::from_str(raw)?;

        let dead_letter_target_arn = match policy.dead_letter_target_arn {
            Some(serde_json::Value::String(arn)) if !arn.trim().is_empty() => arn,
            _ => return Err(PolicyError::MissingTarget),
        };

        Ok(Self {
            dead_letter_target_arn,
            max_receive_count: policy.max_receive_count.as_ref().and_then(receive_count),
        })
    }
}

// the API returns a number, but policies set through the CLI often carry "5"
fn receive_count(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
