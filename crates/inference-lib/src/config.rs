//! Engine configuration

use crate::retry::RetryPolicy;
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Inference engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Root directory holding versioned model artifact bundles
    #[serde(default = "default_artifact_root")]
    pub artifact_root: PathBuf,

    /// Remote model identifier passed to the chat backend
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Generation cap for one chat response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature for chat generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling parameter for chat generation
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Attempt bound for one remote invocation
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Backoff base delay in seconds; doubles per attempt
    #[serde(default = "default_retry_base_delay_secs")]
    pub retry_base_delay_secs: f64,
}

fn default_artifact_root() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_model_id() -> String {
    "anthropic.claude-3-sonnet-20240229-v1:0".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_retry_max_attempts() -> u32 {
    5
}

fn default_retry_base_delay_secs() -> f64 {
    2.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            artifact_root: default_artifact_root(),
            model_id: default_model_id(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_secs: default_retry_base_delay_secs(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `INFERENCE_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("INFERENCE"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// Retry policy for remote invocations derived from this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_secs_f64(self.retry_base_delay_secs),
        )
    }
}
