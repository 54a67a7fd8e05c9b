//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration. Environment variables override file values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vectorizer::RocchioParams;

/// Default model file, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "model.cbor";

/// Default number of documents returned by a query.
pub const DEFAULT_TOP: usize = 10;

/// Damping constant `a` of the augmented query term frequency.
pub const DEFAULT_QUERY_DAMPING: f64 = 0.4;

/// Overrides `model_path`.
pub const ENV_MODEL_PATH: &str = "DOCS_FINDER_MODEL_PATH";
/// Overrides `default_top`.
pub const ENV_TOP: &str = "DOCS_FINDER_TOP";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where `save`/`load` read and write the model.
    pub model_path: PathBuf,
    /// Result count used when the caller does not ask for one.
    pub default_top: usize,
    /// `a` in `a + (1 - a) * tf / max_tf` for query vectors.
    pub query_damping: f64,
    /// Relevance feedback weights.
    pub rocchio: RocchioParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            default_top: DEFAULT_TOP,
            query_damping: DEFAULT_QUERY_DAMPING,
            rocchio: RocchioParams::default(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| Error::json(path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DOCS_FINDER_MODEL_PATH` and `DOCS_FINDER_TOP` if they are set.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(path) = std::env::var(ENV_MODEL_PATH) {
            self.model_path = PathBuf::from(path);
        }
        if let Ok(top) = std::env::var(ENV_TOP) {
            self.default_top = top
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_TOP} must be a positive integer, got {top:?}")))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_default_top(mut self, top: usize) -> Self {
        self.default_top = top;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_top == 0 {
            return Err(Error::Config("default_top must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.query_damping) {
            return Err(Error::Config(format!(
                "query_damping must be within [0, 1], got {}",
                self.query_damping
            )));
        }
        let RocchioParams { alpha, beta, gamma } = self.rocchio;
        if [alpha, beta, gamma].iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::Config(format!(
                "rocchio weights must be finite and non-negative, got alpha={alpha} beta={beta} gamma={gamma}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.query_damping, 0.4);
        assert_eq!(config.rocchio, RocchioParams { alpha: 1.0, beta: 0.75, gamma: 0.15 });
    }

    #[test]
    fn partial_rocchio_keeps_other_weights() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"default_top": 3, "rocchio": {"gamma": 0.0}}"#).unwrap();
        assert_eq!(config.default_top, 3);
        assert_eq!(config.rocchio.alpha, 1.0);
        assert_eq!(config.rocchio.gamma, 0.0);
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(EngineConfig::default().with_default_top(0).validate().is_err());

        let mut config = EngineConfig::default();
        config.query_damping = 1.5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = EngineConfig::default();
        config.rocchio.beta = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_path_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"model_path": "elsewhere.cbor"}"#).unwrap();
        let config = EngineConfig::from_path(&path).unwrap();
        assert_eq!(config.model_path, PathBuf::from("elsewhere.cbor"));

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(EngineConfig::from_path(&path), Err(Error::Json { .. })));
    }
}
