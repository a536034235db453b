//! Embedding-based sentence scoring
//!
//! The semantic mode depends on two capabilities only:
//! - [`EmbeddingBackend::train`] turns the tokenized corpus into a model
//! - [`EmbeddingModel`] answers vector, nearest-term and similarity queries
//!
//! A default backend, [`CooccurrenceBackend`], ships with the crate.

pub mod cooccurrence;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::essay::corpus::{Corpus, Document};
use crate::essay::scoring::SentenceScorer;
use crate::utils::math::vector::{cosine, geometric_aggregate};
use crate::utils::normalizer::{split_sentences, split_words, Segment, Segmentation};

pub use cooccurrence::{CooccurrenceBackend, CooccurrenceModel};

/// Errors raised by an embedding backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// Nothing to learn from
    #[error("Corpus has no vocabulary to train on")]
    EmptyVocabulary,

    /// Training ran past its deadline
    #[error("Embedding training timed out after {0:?}")]
    Timeout(Duration),

    /// Training was cancelled by the caller
    #[error("Embedding training cancelled")]
    Cancelled,

    /// No vocabulary term could serve as main term
    #[error("No main term could be derived")]
    NoMainTerm,

    /// Backend rejected its settings
    #[error("Invalid embedding configuration: {0}")]
    InvalidConfig(String),
}

/// Deadline and cancellation flag for a training run.
#[derive(Debug, Clone)]
pub struct TrainingBudget {
    started: Instant,
    timeout: Duration,
    cancel: Option<Arc<AtomicBool>>,
}

impl TrainingBudget {
    pub fn new(timeout: Duration) -> Self {
        Self { started: Instant::now(), timeout, cancel: None }
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// `Err` once the deadline passed or the flag was raised
    #[inline]
    pub fn check(&self) -> Result<(), EmbeddingError> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(EmbeddingError::Cancelled);
            }
        }
        if self.started.elapsed() > self.timeout {
            return Err(EmbeddingError::Timeout(self.timeout));
        }
        Ok(())
    }
}

/// A trained word-vector model.
pub trait EmbeddingModel: Send + Sync {
    /// Vector length
    fn dimension(&self) -> usize;

    /// Vocabulary in a stable order
    fn vocabulary(&self) -> Vec<&str>;

    /// Vector of a term; `None` when out of vocabulary
    fn vector(&self, term: &str) -> Option<&[f32]>;

    /// Up to `k` vocabulary terms closest to `vector`, best first
    fn nearest(&self, vector: &[f32], k: usize) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .vocabulary()
            .into_iter()
            .filter_map(|term| {
                let sim = cosine(self.vector(term)?, vector)?;
                Some((term.to_string(), sim))
            })
            .collect();
        // stable sort keeps vocabulary order among ties
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }

    /// Cosine similarity of two terms; `None` when either cannot be compared
    fn similarity(&self, term: &str, anchor: &str) -> Option<f64> {
        cosine(self.vector(term)?, self.vector(anchor)?)
    }
}

/// Trains an [`EmbeddingModel`] over tokenized sentences.
pub trait EmbeddingBackend: Send + Sync {
    type Model: EmbeddingModel;

    fn train(&self, sentences: &[Vec<String>], budget: &TrainingBudget) -> Result<Self::Model, EmbeddingError>;
}

/// Every sentence of the corpus as a term list, in corpus order.
pub fn tokenized_sentences(corpus: &Corpus) -> Vec<Vec<String>> {
    corpus
        .documents()
        .iter()
        .flat_map(|doc| split_sentences(doc.raw()))
        .map(split_words)
        .filter(|words| !words.is_empty())
        .collect()
}

/// Derive the anchor term of a model.
///
/// `sample_size` terms with at least `min_len` characters are picked at even
/// intervals across the vocabulary, their vectors combined with
/// [`geometric_aggregate`], and the vocabulary term nearest to the aggregate
/// wins. Without any long enough term the whole vocabulary is sampled.
pub fn derive_main_term<M>(model: &M, sample_size: usize, min_len: usize) -> Option<String>
where
    M: EmbeddingModel + ?Sized,
{
    let vocabulary = model.vocabulary();
    let mut candidates: Vec<&str> = vocabulary
        .iter()
        .copied()
        .filter(|term| term.chars().count() >= min_len)
        .collect();
    if candidates.is_empty() {
        debug!(min_len, "No vocabulary term long enough, sampling the whole vocabulary");
        candidates = vocabulary;
    }
    if candidates.is_empty() || sample_size == 0 {
        return None;
    }

    let picks = sample_size.min(candidates.len());
    let sample: Vec<&[f32]> = (0..picks)
        .map(|i| candidates[i * candidates.len() / picks])
        .filter_map(|term| model.vector(term))
        .filter(|vector| vector.len() == model.dimension())
        .collect();
    let aggregate: Vec<f32> = geometric_aggregate(&sample).into_iter().map(|v| v as f32).collect();

    model
        .nearest(&aggregate, 1)
        .into_iter()
        .next()
        .map(|(term, _)| term)
}

/// Sums the similarity of every sentence term to the main term.
pub struct SemanticScorer<'m, M: ?Sized> {
    model: &'m M,
    main_term: String,
    fallback: f64,
}

impl<'m, M> SemanticScorer<'m, M>
where
    M: EmbeddingModel + ?Sized,
{
    pub fn new(model: &'m M, main_term: impl Into<String>, fallback: f64) -> Self {
        Self { model, main_term: main_term.into(), fallback }
    }

    pub fn main_term(&self) -> &str {
        &self.main_term
    }

    /// Similarity of a term to the main term, `fallback` when the model cannot tell
    #[inline]
    pub fn term_similarity(&self, term: &str) -> f64 {
        self.model
            .similarity(term, &self.main_term)
            .filter(|sim| sim.is_finite())
            .unwrap_or(self.fallback)
    }

    pub fn sentence_score(&self, sentence: &str) -> f64 {
        split_words(sentence)
            .iter()
            .map(|term| self.term_similarity(term))
            .sum()
    }
}

impl<M> SentenceScorer for SemanticScorer<'_, M>
where
    M: EmbeddingModel + ?Sized,
{
    fn score(&self, _document: &Document, _segmentation: &Segmentation<'_>, segment: &Segment<'_>) -> f64 {
        self.sentence_score(segment.text)
    }
}

/// Train a model over the corpus and settle the main term.
///
/// A caller-supplied `seed_term` is used as is, even when it is out of
/// vocabulary (every term then scores the fallback similarity).
pub fn train_with_main_term<B>(
    backend: &B,
    corpus: &Corpus,
    budget: &TrainingBudget,
    seed_term: Option<&str>,
    sample_size: usize,
    min_len: usize,
) -> Result<(B::Model, String), EmbeddingError>
where
    B: EmbeddingBackend + ?Sized,
{
    let sentences = tokenized_sentences(corpus);
    let model = backend.train(&sentences, budget)?;

    let main_term = match seed_term {
        Some(seed) => {
            let seed = seed.trim().to_lowercase();
            if model.vector(&seed).is_none() {
                warn!(main_term = %seed, "Supplied main term is out of vocabulary");
            }
            seed
        }
        None => derive_main_term(&model, sample_size, min_len).ok_or(EmbeddingError::NoMainTerm)?,
    };
    debug!(main_term = %main_term, vocabulary = model.vocabulary().len(), "Main term settled");
    Ok((model, main_term))
}
