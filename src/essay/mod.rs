//! Extractive essay pipeline
//!
//! raw documents → [`corpus`] statistics → [`scoring`] → [`selector`] → joined essay

pub mod corpus;
pub mod scoring;
pub mod selector;
pub mod semantic;
pub mod term;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::EssayConfig;
use crate::essay::corpus::Corpus;
use crate::essay::scoring::{weight_table, PositionalScorer, ScoringMode, StatisticalScorer, WeightTable};
use crate::essay::selector::select;
use crate::essay::semantic::{
    train_with_main_term, CooccurrenceBackend, EmbeddingBackend, EmbeddingError, SemanticScorer, TrainingBudget,
};

/// Separator placed between kept sentences.
pub const SENTENCE_JOINER: &str = ". ";

/// Join kept sentences into the essay text.
pub fn join_sentences<S: AsRef<str>>(sentences: &[S]) -> String {
    sentences
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join(SENTENCE_JOINER)
}

/// How an essay came to be.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EssayReport {
    /// mode the caller asked for
    pub requested_mode: ScoringMode,
    /// mode that produced the weights; differs after a semantic fallback
    pub mode: ScoringMode,
    pub documents: usize,
    /// distinct sentences in the weight table
    pub scored_sentences: usize,
    pub threshold: Option<f64>,
    pub main_term: Option<String>,
    /// why the semantic mode fell back to statistical scoring
    pub fallback: Option<String>,
}

/// Extractive summary plus its report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Essay {
    pub text: String,
    /// kept sentences, verbatim and in corpus order
    pub sentences: Vec<String>,
    pub report: EssayReport,
}

/// Statistical and semantic essays of the same corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EssayPair {
    pub statistical: Essay,
    pub semantic: Essay,
}

/// Weight table of a corpus and the mode that produced it.
#[derive(Debug, Clone)]
pub struct Weighing {
    pub table: WeightTable,
    pub mode: ScoringMode,
    pub main_term: Option<String>,
    pub fallback: Option<String>,
}

/// Essay builder.
///
/// `B` is the embedding backend used by the semantic mode.
/// Summarizing never fails: the semantic mode falls back to statistical
/// scoring when training does not produce a usable model, and an empty corpus
/// yields an empty essay.
///
/// # Examples
/// ```
/// use tf_idf_essay::{Corpus, EssayConfig, EssaySummarizer};
///
/// let mut config = EssayConfig::default();
/// config.selection.skip_top = 0;
/// let summarizer = EssaySummarizer::new(config);
/// let corpus = Corpus::new([
///     "Rust is fast and safe. Lunch was fine.",
///     "Python is slow. Lunch was fine.",
/// ]);
/// let essay = summarizer.summarize(&corpus);
/// assert_eq!(essay.text, "Rust is fast and safe");
/// ```
#[derive(Debug, Clone)]
pub struct EssaySummarizer<B = CooccurrenceBackend> {
    config: EssayConfig,
    backend: B,
    cancel: Option<Arc<AtomicBool>>,
}

impl EssaySummarizer<CooccurrenceBackend> {
    /// Summarizer with the built-in co-occurrence embedding backend
    pub fn new(config: EssayConfig) -> Self {
        let backend = CooccurrenceBackend::new(config.embedding.clone());
        Self { config, backend, cancel: None }
    }
}

impl Default for EssaySummarizer<CooccurrenceBackend> {
    fn default() -> Self {
        Self::new(EssayConfig::default())
    }
}

impl<B> EssaySummarizer<B>
where
    B: EmbeddingBackend,
{
    pub fn with_backend(config: EssayConfig, backend: B) -> Self {
        Self { config, backend, cancel: None }
    }

    /// Flag checked during embedding training; raising it aborts the
    /// semantic mode and falls back to statistical scoring.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &EssayConfig {
        &self.config
    }

    /// Score every sentence of the corpus with `mode`.
    pub fn weigh(&self, corpus: &Corpus, mode: ScoringMode) -> Weighing {
        let statistical = || StatisticalScorer::new(corpus, &self.config.document_frequency);
        match mode {
            ScoringMode::Statistical => Weighing {
                table: weight_table(corpus, &statistical()),
                mode,
                main_term: None,
                fallback: None,
            },
            ScoringMode::Positional => Weighing {
                table: weight_table(corpus, &PositionalScorer::new(statistical())),
                mode,
                main_term: None,
                fallback: None,
            },
            ScoringMode::Semantic => match self.weigh_semantic(corpus) {
                Ok((table, main_term)) => Weighing { table, mode, main_term: Some(main_term), fallback: None },
                Err(e) => {
                    warn!(error = %e, "Semantic scoring unavailable, falling back to statistical scoring");
                    Weighing {
                        table: weight_table(corpus, &statistical()),
                        mode: ScoringMode::Statistical,
                        main_term: None,
                        fallback: Some(e.to_string()),
                    }
                }
            },
        }
    }

    fn weigh_semantic(&self, corpus: &Corpus) -> Result<(WeightTable, String), EmbeddingError> {
        let embedding = &self.config.embedding;
        let mut budget = TrainingBudget::new(embedding.timeout());
        if let Some(flag) = &self.cancel {
            budget = budget.with_cancel_flag(flag.clone());
        }
        let (model, main_term) = train_with_main_term(
            &self.backend,
            corpus,
            &budget,
            self.config.main_term.as_deref(),
            embedding.main_term_sample,
            embedding.main_term_min_len,
        )?;
        let scorer = SemanticScorer::new(&model, main_term.as_str(), embedding.fallback_similarity);
        Ok((weight_table(corpus, &scorer), main_term))
    }

    /// Essay with the configured mode
    pub fn summarize(&self, corpus: &Corpus) -> Essay {
        self.summarize_with(corpus, self.config.mode)
    }

    /// Essay with an explicit mode
    pub fn summarize_with(&self, corpus: &Corpus, mode: ScoringMode) -> Essay {
        let weighing = self.weigh(corpus, mode);
        let selection = select(&weighing.table, self.config.selection.skip_top, self.config.selection.cutoff);
        let sentences: Vec<String> = selection.sentences.iter().map(|s| s.to_string()).collect();

        info!(
            requested = %mode,
            mode = %weighing.mode,
            documents = corpus.doc_num(),
            scored = weighing.table.len(),
            kept = sentences.len(),
            "Essay built"
        );
        Essay {
            text: join_sentences(&sentences),
            report: EssayReport {
                requested_mode: mode,
                mode: weighing.mode,
                documents: corpus.doc_num(),
                scored_sentences: weighing.table.len(),
                threshold: selection.threshold,
                main_term: weighing.main_term,
                fallback: weighing.fallback,
            },
            sentences,
        }
    }

    /// Statistical and semantic essays side by side
    pub fn summarize_pair(&self, corpus: &Corpus) -> EssayPair {
        EssayPair {
            statistical: self.summarize_with(corpus, ScoringMode::Statistical),
            semantic: self.summarize_with(corpus, ScoringMode::Semantic),
        }
    }

    /// Essay text of raw documents with the configured mode
    pub fn summarize_texts<I, S>(&self, texts: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.summarize(&Corpus::new(texts)).text
    }
}
