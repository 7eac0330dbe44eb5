//! Artifact discovery, loading and persistence

use super::{ArtifactBundle, Resolution, ResolveError};
use crate::classifier::NearestCentroid;
use crate::models::ArtifactMetadata;
use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Serialized classifier file inside a bundle directory.
pub const MODEL_FILE: &str = "model.json";

/// Metadata file inside a bundle directory.
pub const METADATA_FILE: &str = "model_info.json";

/// Bundle directories are named `model_<timestamp>`.
const BUNDLE_PREFIX: &str = "model_";

/// Read/write access to one artifact root directory.
///
/// Reads never mutate the store; writes go through [`ArtifactStore::save_bundle`].
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Select and load the newest bundle.
    ///
    /// Candidates are the immediate subdirectories whose names carry a
    /// timestamp-like `model_` suffix; the lexicographically greatest name
    /// wins (last in sorted order under identical timestamps). A store with
    /// no candidates resolves to [`Resolution::Absent`]; a candidate that
    /// fails to load is reported as [`ResolveError::Corrupt`].
    pub fn resolve_latest(&self) -> Result<Resolution, ResolveError> {
        let mut candidates = self.candidate_names();
        candidates.sort();

        let Some(name) = candidates.pop() else {
            debug!(root = %self.root.display(), "No artifact candidates found");
            return Ok(Resolution::Absent);
        };

        let dir = self.root.join(&name);
        let version_id = name
            .strip_prefix(BUNDLE_PREFIX)
            .unwrap_or(name.as_str())
            .to_string();

        match load_bundle(&dir, version_id) {
            Ok(bundle) => {
                info!(
                    version = %bundle.version_id,
                    model_type = %bundle.metadata.model_type,
                    path = %dir.display(),
                    "Loaded model artifact"
                );
                Ok(Resolution::Resolved(bundle))
            }
            Err(source) => Err(ResolveError::Corrupt { path: dir, source }),
        }
    }

    /// Persist a trained model as a new bundle directory named from the
    /// metadata's creation timestamp. Returns the bundle directory path.
    pub fn save_bundle(&self, model: &NearestCentroid, metadata: &ArtifactMetadata) -> Result<PathBuf> {
        let stamp = metadata.created_at.format("%Y%m%dT%H%M%S");
        let dir = self.root.join(format!("{BUNDLE_PREFIX}{stamp}"));
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create bundle directory {}", dir.display()))?;

        let model_json =
            serde_json::to_string_pretty(model).context("failed to serialize model")?;
        let metadata_json =
            serde_json::to_string_pretty(metadata).context("failed to serialize metadata")?;

        write_file(&dir.join(MODEL_FILE), model_json.as_bytes())?;
        write_file(&dir.join(METADATA_FILE), metadata_json.as_bytes())?;

        info!(path = %dir.display(), "Saved model artifact");
        Ok(dir)
    }

    /// Names of bundle-shaped subdirectories, unsorted.
    fn candidate_names(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };

        entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_candidate_name(name))
            .collect()
    }
}

/// A candidate name is `model_<token>` where the token starts with a digit.
fn is_candidate_name(name: &str) -> bool {
    name.strip_prefix(BUNDLE_PREFIX)
        .and_then(|token| token.chars().next())
        .is_some_and(|first| first.is_ascii_digit())
}

fn load_bundle(dir: &Path, version_id: String) -> Result<ArtifactBundle> {
    let model_path = dir.join(MODEL_FILE);
    let raw_model = fs::read_to_string(&model_path)
        .with_context(|| format!("failed to read {}", model_path.display()))?;
    let model: NearestCentroid = serde_json::from_str(&raw_model)
        .with_context(|| format!("failed to parse {}", model_path.display()))?;

    let metadata_path = dir.join(METADATA_FILE);
    let raw_metadata = fs::read_to_string(&metadata_path)
        .with_context(|| format!("failed to read {}", metadata_path.display()))?;
    let metadata: ArtifactMetadata = serde_json::from_str(&raw_metadata)
        .with_context(|| format!("failed to parse {}", metadata_path.display()))?;

    if metadata.target_names.is_empty() {
        bail!("metadata lists no target names");
    }
    if metadata.target_names.len() != model.num_classes() {
        bail!(
            "metadata lists {} target names but the model has {} classes",
            metadata.target_names.len(),
            model.num_classes()
        );
    }

    Ok(ArtifactBundle {
        version_id,
        model,
        metadata,
    })
}

/// Write through a temp file then rename, so partially written files are
/// never visible under their final name.
fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)
        .with_context(|| format!("failed to create {}", temp_path.display()))?;
    file.write_all(contents)
        .with_context(|| format!("failed to write {}", temp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to sync {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("failed to rename {} to {}", temp_path.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_model() -> NearestCentroid {
        let samples = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        let labels = vec![0, 1];
        NearestCentroid::fit(&samples, &labels, 2).unwrap()
    }

    fn sample_metadata() -> ArtifactMetadata {
        ArtifactMetadata {
            model_type: "NearestCentroidClassifier".to_string(),
            target_names: vec!["negative".to_string(), "positive".to_string()],
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            feature_names: None,
            accuracy: Some(0.95),
            is_mock: false,
        }
    }

    fn write_raw_bundle(root: &Path, name: &str, model: &str, metadata: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MODEL_FILE), model).unwrap();
        fs::write(dir.join(METADATA_FILE), metadata).unwrap();
    }

    fn valid_model_json() -> String {
        serde_json::to_string(&sample_model()).unwrap()
    }

    fn valid_metadata_json() -> String {
        serde_json::to_string(&sample_metadata()).unwrap()
    }

    #[test]
    fn test_missing_root_resolves_absent() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path().join("does-not-exist"));
        assert!(matches!(store.resolve_latest(), Ok(Resolution::Absent)));
    }

    #[test]
    fn test_empty_root_resolves_absent() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path());
        assert!(matches!(store.resolve_latest(), Ok(Resolution::Absent)));
    }

    #[test]
    fn test_non_candidate_names_are_ignored() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("model_latest")).unwrap();
        fs::create_dir_all(temp.path().join("checkpoints")).unwrap();
        fs::write(temp.path().join("model_20250101"), b"a file, not a dir").unwrap();

        let store = ArtifactStore::new(temp.path());
        assert!(matches!(store.resolve_latest(), Ok(Resolution::Absent)));
    }

    #[test]
    fn test_resolve_picks_greatest_timestamp() {
        let temp = TempDir::new().unwrap();
        write_raw_bundle(
            temp.path(),
            "model_20250101",
            &valid_model_json(),
            &valid_metadata_json(),
        );
        write_raw_bundle(
            temp.path(),
            "model_20250301",
            &valid_model_json(),
            &valid_metadata_json(),
        );

        let store = ArtifactStore::new(temp.path());
        match store.resolve_latest().unwrap() {
            Resolution::Resolved(bundle) => assert_eq!(bundle.version_id, "20250301"),
            Resolution::Absent => panic!("expected a resolved bundle"),
        }
    }

    #[test]
    fn test_corrupt_when_metadata_missing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("model_20250101");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MODEL_FILE), valid_model_json()).unwrap();

        let store = ArtifactStore::new(temp.path());
        assert!(matches!(
            store.resolve_latest(),
            Err(ResolveError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_corrupt_when_metadata_lacks_required_fields() {
        let temp = TempDir::new().unwrap();
        write_raw_bundle(
            temp.path(),
            "model_20250101",
            &valid_model_json(),
            r#"{"model_type": "NearestCentroidClassifier"}"#,
        );

        let store = ArtifactStore::new(temp.path());
        assert!(matches!(
            store.resolve_latest(),
            Err(ResolveError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_corrupt_when_class_count_mismatches() {
        let mut metadata = sample_metadata();
        metadata.target_names.push("neutral".to_string());

        let temp = TempDir::new().unwrap();
        write_raw_bundle(
            temp.path(),
            "model_20250101",
            &valid_model_json(),
            &serde_json::to_string(&metadata).unwrap(),
        );

        let store = ArtifactStore::new(temp.path());
        assert!(matches!(
            store.resolve_latest(),
            Err(ResolveError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_corrupt_latest_shadows_older_valid_bundle() {
        let temp = TempDir::new().unwrap();
        write_raw_bundle(
            temp.path(),
            "model_20250101",
            &valid_model_json(),
            &valid_metadata_json(),
        );
        write_raw_bundle(temp.path(), "model_20250301", "not json", "not json");

        // Selection is newest-only; a broken latest bundle is corruption,
        // not a reason to fall back to an older version.
        let store = ArtifactStore::new(temp.path());
        assert!(matches!(
            store.resolve_latest(),
            Err(ResolveError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_save_bundle_resolves_back() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path());

        let model = sample_model();
        let metadata = sample_metadata();
        let dir = store.save_bundle(&model, &metadata).unwrap();
        assert_eq!(dir, temp.path().join("model_20250301T120000"));

        match store.resolve_latest().unwrap() {
            Resolution::Resolved(bundle) => {
                assert_eq!(bundle.version_id, "20250301T120000");
                assert_eq!(bundle.model, model);
                assert_eq!(bundle.metadata.target_names, metadata.target_names);
                assert!(!bundle.metadata.is_mock);
            }
            Resolution::Absent => panic!("expected a resolved bundle"),
        }
    }

    #[test]
    fn test_save_bundle_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path());

        let dir = store
            .save_bundle(&sample_model(), &sample_metadata())
            .unwrap();

        let names: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .flatten()
            .map(|e| e.file_name().into_string().unwrap())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{names:?}");
    }
}
