//! Versioned model artifact store
//!
//! Trained models are persisted as artifact bundles: one subdirectory per
//! version under a common root, named `model_<timestamp>`, holding the
//! serialized classifier and its metadata. Resolution selects the newest
//! bundle by timestamp token; a missing or empty store is an expected state,
//! reported as [`Resolution::Absent`] rather than an error.

mod mock;
mod store;

pub use mock::{build_mock_bundle, MOCK_SEED, MOCK_VERSION_ID};
pub use store::{ArtifactStore, METADATA_FILE, MODEL_FILE};

use crate::classifier::NearestCentroid;
use crate::models::ArtifactMetadata;
use std::path::PathBuf;
use thiserror::Error;

/// One versioned trained model plus its metadata, loaded into memory.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    /// Timestamp token from the bundle directory name; lexicographic order
    /// is version order.
    pub version_id: String,
    pub model: NearestCentroid,
    pub metadata: ArtifactMetadata,
}

/// Outcome of scanning the artifact root for the latest usable bundle.
#[derive(Debug)]
pub enum Resolution {
    Resolved(ArtifactBundle),
    /// The root is missing, empty, or holds no timestamp-named candidates.
    Absent,
}

/// Errors raised while loading a selected bundle.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The selected bundle directory exists but one of its files is missing,
    /// unreadable, or fails schema validation.
    #[error("artifact bundle at {path} is corrupt")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}
