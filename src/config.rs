//! Configuration for the essay builder

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EssayError, Result};
use crate::essay::corpus::DocumentFrequencyKind;
use crate::essay::scoring::ScoringMode;
use crate::essay::selector::Cutoff;

/// Number of top sentences skipped before the cutoff weight is read.
pub const DEFAULT_SKIP_TOP: usize = 10;
/// Similarity used for a term the embedding model cannot compare.
pub const DEFAULT_FALLBACK_SIMILARITY: f64 = 0.001;
/// Vocabulary terms sampled to derive the main term.
pub const DEFAULT_MAIN_TERM_SAMPLE: usize = 7;
/// Minimum character length of a sampled vocabulary term.
pub const DEFAULT_MAIN_TERM_MIN_LEN: usize = 4;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EssayConfig {
    /// Scoring mode used by `summarize`
    pub mode: ScoringMode,

    /// Document frequency counting rule
    pub document_frequency: DocumentFrequencyKind,

    /// Anchor term supplied by the caller; skips main term derivation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_term: Option<String>,

    /// Sentence selection
    pub selection: SelectionConfig,

    /// Word-vector model for the semantic mode
    pub embedding: EmbeddingConfig,
}

/// Skip-and-threshold selection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Sentences skipped from the top before the threshold is read (`K`)
    pub skip_top: usize,
    /// Comparison against the threshold weight
    pub cutoff: Cutoff,
}

/// Embedding training and semantic scoring settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Vector dimensionality
    pub dimension: usize,
    /// Non-zero components of a term's random index vector
    pub index_nonzeros: usize,
    /// Context window (terms on each side)
    pub window: usize,
    /// Training passes
    pub epochs: usize,
    /// Vocabulary cap; terms past the cap are out of vocabulary
    pub max_vocabulary: usize,
    /// Training deadline in milliseconds
    pub timeout_ms: u64,
    /// Vocabulary terms sampled for the main term
    pub main_term_sample: usize,
    /// Minimum length (chars) of a sampled term
    pub main_term_min_len: usize,
    /// Per-term similarity when the model cannot compare
    pub fallback_similarity: f64,
    /// Seed mixed into the index vectors
    pub seed: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            skip_top: DEFAULT_SKIP_TOP,
            cutoff: Cutoff::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: 128,
            index_nonzeros: 8,
            window: 5,
            epochs: 2,
            max_vocabulary: 50_000,
            timeout_ms: 10_000,
            main_term_sample: DEFAULT_MAIN_TERM_SAMPLE,
            main_term_min_len: DEFAULT_MAIN_TERM_MIN_LEN,
            fallback_similarity: DEFAULT_FALLBACK_SIMILARITY,
            seed: 42,
        }
    }
}

impl Default for EssayConfig {
    fn default() -> Self {
        Self {
            mode: ScoringMode::Statistical,
            document_frequency: DocumentFrequencyKind::default(),
            main_term: None,
            selection: SelectionConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl EmbeddingConfig {
    /// Get the training timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.dimension == 0 {
            return Err("embedding.dimension must be greater than 0".to_string());
        }
        if self.index_nonzeros == 0 || self.index_nonzeros > self.dimension {
            return Err("embedding.index_nonzeros must be in 1..=dimension".to_string());
        }
        if self.window == 0 {
            return Err("embedding.window must be greater than 0".to_string());
        }
        if self.epochs == 0 {
            return Err("embedding.epochs must be greater than 0".to_string());
        }
        if self.max_vocabulary == 0 {
            return Err("embedding.max_vocabulary must be greater than 0".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("embedding.timeout_ms must be greater than 0".to_string());
        }
        if self.main_term_sample == 0 {
            return Err("embedding.main_term_sample must be greater than 0".to_string());
        }
        if !self.fallback_similarity.is_finite() || self.fallback_similarity < 0.0 {
            return Err("embedding.fallback_similarity must be a finite, non-negative number".to_string());
        }
        Ok(())
    }
}

impl EssayConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.embedding.validate().map_err(EssayError::Config)?;
        if let Some(term) = &self.main_term {
            if term.trim().is_empty() {
                return Err(EssayError::Config("main_term must not be blank".to_string()));
            }
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| EssayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EssayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.selection.skip_top, 10);
        assert_eq!(config.selection.cutoff, Cutoff::AtOrAbove);
        assert_eq!(config.embedding.main_term_sample, 7);
        assert_eq!(config.embedding.fallback_similarity, 0.001);
    }

    #[test]
    fn test_invalid_embedding_values() {
        let mut config = EssayConfig::default();
        config.embedding.dimension = 0;
        assert!(config.validate().is_err());

        let mut config = EssayConfig::default();
        config.embedding.fallback_similarity = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = EssayConfig::default();
        config.embedding.index_nonzeros = config.embedding.dimension + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_main_term_rejected() {
        let config = EssayConfig {
            main_term: Some("  ".to_string()),
            ..EssayConfig::default()
        };
        assert!(matches!(config.validate(), Err(EssayError::Config(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EssayConfig::from_toml(
            r#"
            mode = "semantic"
            main_term = "mammals"

            [selection]
            skip_top = 3
            cutoff = "above"
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, ScoringMode::Semantic);
        assert_eq!(config.selection.skip_top, 3);
        assert_eq!(config.selection.cutoff, Cutoff::Above);
        assert_eq!(config.main_term.as_deref(), Some("mammals"));
        assert_eq!(config.embedding, EmbeddingConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = EssayConfig::default();
        config.document_frequency = DocumentFrequencyKind::Token;
        let toml_str = config.to_toml().unwrap();
        let parsed = EssayConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = EssayConfig::from_toml("mode = 3").unwrap_err();
        assert!(matches!(err, EssayError::Config(_)));
    }
}
