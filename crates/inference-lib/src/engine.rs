//! Inference façade
//!
//! Single entry point for the serving layer: resolves the active model
//! bundle once per process (degrading to the builtin fallback when the
//! artifact store is empty or broken), serves local predictions, and runs
//! remote conversations through the bounded retry loop.

use crate::artifact::{build_mock_bundle, ArtifactBundle, ArtifactStore, Resolution};
use crate::chat::{ChatBackend, ChatRequest, RemoteError};
use crate::config::EngineConfig;
use crate::models::{ChatMessage, ModelDescription, PredictionResult};
use crate::observability::EngineMetrics;
use crate::retry;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Rejected prediction request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PredictError {
    /// The feature vector does not match the active model's input arity.
    #[error("expected {expected} features, got {actual}")]
    InvalidInput { expected: usize, actual: usize },
}

/// Failed conversation request.
#[derive(Debug, Error)]
pub enum ConverseError {
    /// The remote model could not be reached within the retry budget, or
    /// rejected the request outright. `attempts` is the number of
    /// invocations actually performed.
    #[error("remote inference unavailable after {attempts} attempt(s)")]
    Unavailable {
        attempts: u32,
        #[source]
        source: RemoteError,
    },

    /// The engine was constructed without a chat backend.
    #[error("no chat backend configured")]
    NoBackend,
}

/// Composed inference engine.
///
/// The active bundle is resolved lazily on first use and memoized for the
/// process lifetime; picking up a newer artifact requires a restart.
pub struct InferenceEngine {
    config: EngineConfig,
    store: ArtifactStore,
    backend: Option<Arc<dyn ChatBackend>>,
    bundle: OnceCell<ArtifactBundle>,
    metrics: EngineMetrics,
}

impl InferenceEngine {
    /// Create an engine with a chat backend for `converse`.
    pub fn new(config: EngineConfig, backend: Arc<dyn ChatBackend>) -> Self {
        Self::build(config, Some(backend))
    }

    /// Create a predict-only engine (no remote conversations).
    pub fn without_backend(config: EngineConfig) -> Self {
        Self::build(config, None)
    }

    fn build(config: EngineConfig, backend: Option<Arc<dyn ChatBackend>>) -> Self {
        let store = ArtifactStore::new(&config.artifact_root);
        Self {
            config,
            store,
            backend,
            bundle: OnceCell::new(),
            metrics: EngineMetrics::new(),
        }
    }

    /// Resolve-or-fallback, exactly once per process.
    ///
    /// `OnceCell` coalesces concurrent first callers onto a single
    /// initialization; afterwards the bundle is immutable and reads are
    /// lock-free. Resolution failures are absorbed here and never surfaced.
    async fn active_bundle(&self) -> &ArtifactBundle {
        self.bundle
            .get_or_init(|| async {
                let bundle = match self.store.resolve_latest() {
                    Ok(Resolution::Resolved(bundle)) => bundle,
                    Ok(Resolution::Absent) => {
                        warn!(
                            root = %self.store.root().display(),
                            "No model artifacts found, degrading to builtin fallback model"
                        );
                        self.metrics.inc_fallback_activations();
                        build_mock_bundle()
                    }
                    Err(err) => {
                        warn!(
                            error = %err,
                            "Failed to load model artifact, degrading to builtin fallback model"
                        );
                        self.metrics.inc_fallback_activations();
                        build_mock_bundle()
                    }
                };

                self.metrics
                    .set_model_info(&bundle.version_id, &bundle.metadata.model_type);
                info!(
                    version = %bundle.version_id,
                    model_type = %bundle.metadata.model_type,
                    is_mock = bundle.metadata.is_mock,
                    "Model bundle activated"
                );
                bundle
            })
            .await
    }

    /// Classify one feature vector with the active model.
    ///
    /// Arity is validated before the model runs; local classifier calls are
    /// not flaky, so no retry policy applies here.
    pub async fn predict(&self, features: &[f64]) -> Result<PredictionResult, PredictError> {
        let bundle = self.active_bundle().await;

        let expected = bundle.model.num_features();
        if features.len() != expected {
            self.metrics.inc_prediction_errors();
            return Err(PredictError::InvalidInput {
                expected,
                actual: features.len(),
            });
        }

        let start = Instant::now();
        let class_index = bundle.model.predict(features);
        self.metrics
            .observe_prediction_latency(start.elapsed().as_secs_f64());
        self.metrics.inc_predictions();

        // Load-time validation pins target_names.len() to the model's class
        // count, so the index is always in range.
        let class_name = bundle.metadata.target_names[class_index].clone();
        debug!(
            class_index,
            class = %class_name,
            model_version = %bundle.version_id,
            "Prediction served"
        );

        Ok(PredictionResult {
            class_index,
            class_name,
        })
    }

    /// Generate a reply to `prompt` given the caller-owned ordered history.
    pub async fn converse(
        &self,
        prompt: &str,
        history: &[ChatMessage],
    ) -> Result<String, ConverseError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or(ConverseError::NoBackend)?
            .clone();

        let request = ChatRequest::from_history(&self.config, prompt, history);
        let policy = self.config.retry_policy();
        let model_id = self.config.model_id.as_str();

        let outcome = retry::invoke(&policy, || {
            self.metrics.inc_remote_requests();
            let call = backend.invoke_model(model_id, &request);
            async move {
                let response = call.await?;
                response.into_text().ok_or_else(|| RemoteError::Api {
                    message: "model response contained no text content".to_string(),
                })
            }
        })
        .await;

        match outcome {
            Ok(text) => {
                debug!(model_id, turns = request.messages.len(), "Conversation turn served");
                Ok(text)
            }
            Err(err) => {
                self.metrics.inc_remote_failures();
                let attempts = err.attempts();
                let source = err.into_source();
                warn!(attempts, error = %source, "Remote inference unavailable");
                Err(ConverseError::Unavailable { attempts, source })
            }
        }
    }

    /// Describe the active model, resolving it first if necessary.
    pub async fn describe_active_model(&self) -> ModelDescription {
        let bundle = self.active_bundle().await;
        ModelDescription {
            model_type: bundle.metadata.model_type.clone(),
            target_names: bundle.metadata.target_names.clone(),
            created_at: bundle.metadata.created_at,
            is_mock: bundle.metadata.is_mock,
        }
    }
}
