//! Process configuration: resolving the region, credentials, endpoint and
//! retry behaviour into an [`SdkConfig`].

use std::time::Duration;

use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_sqs::config::Credentials;
use aws_sdk_sqs::error::DisplayErrorContext;

/// Endpoint used by `--local` when no `--endpoint` is given.
pub const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("missing required configuration: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("could not resolve AWS credentials: {0}")]
    Credentials(String),
}

#[derive(Debug, Clone, clap::Args)]
pub struct AwsArgs {
    /// AWS region; falls back to the AWS profile/instance configuration
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Target LocalStack with static test credentials
    #[arg(long, global = true, action)]
    pub local: bool,

    /// Override the SQS endpoint URL
    #[arg(long, global = true, env = "AWS_ENDPOINT_URL")]
    pub endpoint: Option<String>,

    /// Attempts per request, including the first, for transient failures
    #[arg(long, global = true, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// Give up on a single operation (all of its attempts) after this many seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

/// Configuration that passed validation: every field an operation needs is
/// present and non-empty.
#[derive(Debug, Clone)]
pub struct Settings {
    pub region: Region,
    pub local: bool,
    pub endpoint: Option<String>,
    pub max_attempts: u32,
    pub timeout: Option<Duration>,
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl AwsArgs {
    async fn resolve_region(&self) -> Option<Region> {
        if let Some(region) = non_empty(self.region.as_deref()) {
            return Some(Region::new(region.to_string()));
        }

        if self.local {
            // supports loading region from known env variables
            return RegionProviderChain::default_provider()
                .or_else(Region::from_static("us-east-1"))
                .region()
                .await;
        }

        RegionProviderChain::default_provider().region().await
    }

    /// Validates the AWS arguments together with the fields a command found
    /// missing, reporting every missing field at once.
    pub async fn settings(
        &self,
        mut missing: Vec<&'static str>,
    ) -> Result<Settings, ConfigurationError> {
        let region = self.resolve_region().await;
        if region.is_none() {
            missing.insert(0, "region");
        }

        match region {
            Some(region) if missing.is_empty() => Ok(Settings {
                region,
                local: self.local,
                endpoint: non_empty(self.endpoint.as_deref()).map(str::to_string),
                max_attempts: self.max_attempts,
                timeout: self.timeout_secs.map(Duration::from_secs),
            }),
            _ => Err(ConfigurationError::MissingFields(missing)),
        }
    }
}

impl Settings {
    pub fn endpoint(&self) -> Option<&str> {
        match (&self.endpoint, self.local) {
            (Some(endpoint), _) => Some(endpoint.as_str()),
            (None, true) => Some(LOCALSTACK_ENDPOINT),
            (None, false) => None,
        }
    }

    fn loader(&self) -> aws_config::ConfigLoader {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(self.region.clone())
            .retry_config(RetryConfig::standard().with_max_attempts(self.max_attempts));

        if let Some(timeout) = self.timeout {
            loader = loader.timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(timeout)
                    .build(),
            );
        }

        if let Some(endpoint) = self.endpoint() {
            loader = loader.endpoint_url(endpoint);
        }

        if self.local {
            loader = loader.credentials_provider(Credentials::new(
                "test", "test", None, None, "static",
            ));
        }

        loader
    }

    /// Loads the SDK config and makes sure credentials can be resolved, so a
    /// credential problem fails the run before any queue is touched.
    pub async fn load(&self) -> Result<SdkConfig, ConfigurationError> {
        let config = self.loader().load().await;

        let provider = config.credentials_provider().ok_or_else(|| {
            ConfigurationError::Credentials("no credentials provider configured".to_string())
        })?;
        provider
            .provide_credentials()
            .await
            .map_err(|e| ConfigurationError::Credentials(DisplayErrorContext(&e).to_string()))?;

        log::debug!(
            "loaded aws config for region {} (endpoint: {})",
            self.region,
            self.endpoint().unwrap_or("default")
        );
        Ok(config)
    }
}
