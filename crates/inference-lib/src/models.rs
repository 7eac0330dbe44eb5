//! Core data models for the inference engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptive metadata stored next to a serialized model inside an
/// artifact directory (`model_info.json`).
///
/// `model_type`, `target_names` and `created_at` are required; an artifact
/// missing any of them fails schema validation at load time. `is_mock` is
/// never written to disk: mock bundles are synthesized in-process only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub model_type: String,
    /// Class labels in model output order.
    pub target_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    /// Held-out accuracy recorded by the training run, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing)]
    pub is_mock: bool,
}

/// Read-only description of the active model, exposed to the serving layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescription {
    pub model_type: String,
    pub target_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub is_mock: bool,
}

/// Classification output for a single feature vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub class_index: usize,
    pub class_name: String,
}

/// Speaker of a single conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of a conversation. The ordered history is owned by the caller;
/// the engine reads it per call and never stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}
