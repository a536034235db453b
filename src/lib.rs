//! This crate builds extractive essays: it scores every sentence of a small
//! corpus with a TF-IDF-like measure and keeps the highest-scoring ones.

pub mod config;
pub mod error;
pub mod essay;
pub mod utils;

/// Essay Summarizer
/// The top-level struct of this crate. It runs the whole pipeline over a
/// `Corpus`: sentence splitting, term statistics, scoring, threshold
/// selection and joining of the kept sentences.
///
/// Three scoring modes are supported (see `ScoringMode`):
/// - Statistical: TF-IDF-like weight of every sentence term
/// - Positional: statistical score scaled by the sentence position in its
///   document and in its paragraph
/// - Semantic: similarity of every sentence term to a single main term,
///   computed with a word-vector model trained on the corpus itself
///
/// `EssaySummarizer<B>` is generic over the embedding backend `B` used by the
/// semantic mode. `EssaySummarizer::new` uses the built-in
/// `CooccurrenceBackend`; `with_backend` plugs in any `EmbeddingBackend`.
///
/// Summarizing never fails. When the semantic mode cannot train a model
/// (timeout, cancellation, empty vocabulary) it falls back to statistical
/// scoring and says so in the `EssayReport`.
pub use essay::EssaySummarizer;

/// Essay, Essay Report and Essay Pair
/// - `Essay`: joined summary text, kept sentences and report
/// - `EssayReport`: requested and effective mode, threshold, main term, fallback reason
/// - `EssayPair`: statistical and semantic essays of the same corpus
///
/// # Serialization
/// Supported (serialize only).
pub use essay::{Essay, EssayPair, EssayReport};

/// Corpus
/// Ordered collection of the documents submitted together.
/// Each document keeps its raw text, its normalized text and its term counts.
///
/// Document frequency is answered through the `DocumentFrequency` trait.
/// The default rule counts documents whose normalized text contains the term
/// as a substring; `TokenMembership` counts exact term matches instead.
///
/// `Corpus::from_uploads` decodes raw bytes as UTF-8 and reports the files
/// that could not be decoded instead of failing the whole batch.
pub use essay::corpus::{Corpus, Document, DocumentFrequency, DocumentFrequencyKind, Upload};

/// Term Frequency structure
/// Occurrence counts of every term of a text plus the total term count.
/// Used as base data for TF (Term Frequency) and max TF calculation.
pub use essay::term::TermFrequency;

/// Scoring
/// - `ScoringMode`: plain enum selecting the scorer
/// - `SentenceScorer`: trait implemented by every scorer
/// - `WeightTable`: insertion-ordered sentence → weight map
pub use essay::scoring::{ScoringMode, SentenceScorer, WeightTable};

/// Selection
/// Skip-and-threshold selection over the whole weight table.
pub use essay::selector::{select, Cutoff, Selection};

/// Embedding capability
/// - `EmbeddingBackend`: trains a model over tokenized sentences
/// - `EmbeddingModel`: vector, nearest-term and similarity queries
pub use essay::semantic::{EmbeddingBackend, EmbeddingError, EmbeddingModel, TrainingBudget};

/// Configuration
/// TOML-backed settings with defaults equal to the baseline constants.
pub use config::EssayConfig;

/// Errors
pub use error::{EssayError, Result};
