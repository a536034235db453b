use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::EmbeddingConfig;
use crate::essay::semantic::{EmbeddingBackend, EmbeddingError, EmbeddingModel, TrainingBudget};
use crate::utils::math::vector::{add_scaled, normalize};

/// Term positions processed between two budget checks.
const BUDGET_CHECK_INTERVAL: usize = 1024;

/// Reflective random indexing over sentence co-occurrence.
///
/// Every vocabulary term gets a sparse ternary index vector derived from a
/// hash of the term and the seed. The first epoch sums, for every occurrence,
/// the index vectors of the terms inside the context window. Each later epoch
/// feeds the normalized vectors of the previous one back in as index vectors.
///
/// Training is deterministic for a given corpus and configuration.
#[derive(Debug, Clone)]
pub struct CooccurrenceBackend {
    config: EmbeddingConfig,
}

impl CooccurrenceBackend {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Term -> id in first-seen order, capped at `max_vocabulary`
    fn vocabulary(
        &self,
        sentences: &[Vec<String>],
        budget: &TrainingBudget,
    ) -> Result<IndexMap<String, usize>, EmbeddingError> {
        let mut vocabulary = IndexMap::new();
        let mut seen = 0usize;
        'outer: for sentence in sentences {
            for term in sentence {
                if vocabulary.len() >= self.config.max_vocabulary {
                    break 'outer;
                }
                seen += 1;
                if seen % BUDGET_CHECK_INTERVAL == 0 {
                    budget.check()?;
                }
                let next = vocabulary.len();
                vocabulary.entry(term.clone()).or_insert(next);
            }
        }
        Ok(vocabulary)
    }

    /// Sparse `{-1, +1}` vector with `index_nonzeros` distinct positions.
    fn index_vector(&self, term: &str) -> Vec<f32> {
        let dim = self.config.dimension;
        let mut vector = vec![0.0f32; dim];
        let mut placed = 0usize;
        let mut round = 0u64;
        while placed < self.config.index_nonzeros.min(dim) {
            let mut hasher = DefaultHasher::new();
            self.config.seed.hash(&mut hasher);
            term.hash(&mut hasher);
            round.hash(&mut hasher);
            let h = hasher.finish();
            round += 1;

            let slot = (h % dim as u64) as usize;
            if vector[slot] != 0.0 {
                continue;
            }
            vector[slot] = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            placed += 1;
        }
        vector
    }

    /// One pass: context vector of every term from the current index vectors.
    fn epoch(
        &self,
        encoded: &[Vec<usize>],
        index: &[Vec<f32>],
        budget: &TrainingBudget,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let window = self.config.window;
        let mut context = vec![vec![0.0f32; self.config.dimension]; index.len()];
        let mut steps = 0usize;
        for sentence in encoded {
            budget.check()?;
            for (pos, &term) in sentence.iter().enumerate() {
                steps += 1;
                if steps % BUDGET_CHECK_INTERVAL == 0 {
                    budget.check()?;
                }
                let from = pos.saturating_sub(window);
                let to = (pos + window + 1).min(sentence.len());
                for (other_pos, &other) in sentence.iter().enumerate().take(to).skip(from) {
                    if other_pos == pos {
                        continue;
                    }
                    add_scaled(&mut context[term], &index[other], 1.0);
                }
            }
        }
        context.par_iter_mut().for_each(|v| normalize(v.as_mut_slice()));
        Ok(context)
    }
}

impl EmbeddingBackend for CooccurrenceBackend {
    type Model = CooccurrenceModel;

    fn train(&self, sentences: &[Vec<String>], budget: &TrainingBudget) -> Result<Self::Model, EmbeddingError> {
        self.config.validate().map_err(EmbeddingError::InvalidConfig)?;

        let vocabulary = self.vocabulary(sentences, budget)?;
        if vocabulary.is_empty() {
            return Err(EmbeddingError::EmptyVocabulary);
        }

        // out-of-vocabulary terms are dropped from the context
        let encoded: Vec<Vec<usize>> = sentences
            .iter()
            .map(|sentence| sentence.iter().filter_map(|t| vocabulary.get(t).copied()).collect())
            .collect();

        budget.check()?;

        let terms: Vec<&String> = vocabulary.keys().collect();
        let mut index: Vec<Vec<f32>> = terms
            .par_chunks(BUDGET_CHECK_INTERVAL)
            .map(|chunk| {
                budget.check()?;
                Ok(chunk.iter().map(|term| self.index_vector(term)).collect::<Vec<_>>())
            })
            .collect::<Result<Vec<Vec<Vec<f32>>>, EmbeddingError>>()?
            .into_iter()
            .flatten()
            .collect();

        for epoch in 0..self.config.epochs {
            budget.check()?;
            index = self.epoch(&encoded, &index, budget)?;
            debug!(epoch, terms = index.len(), "Embedding epoch done");
        }

        let vectors: IndexMap<String, Vec<f32>> = vocabulary.into_keys().zip(index).collect();
        info!(terms = vectors.len(), dimension = self.config.dimension, "Embedding model trained");
        Ok(CooccurrenceModel { dimension: self.config.dimension, vectors })
    }
}

/// Unit-length term vectors. Terms that never shared a window with another
/// term keep a zero vector and compare with nothing.
#[derive(Debug, Clone)]
pub struct CooccurrenceModel {
    dimension: usize,
    vectors: IndexMap<String, Vec<f32>>,
}

impl CooccurrenceModel {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl EmbeddingModel for CooccurrenceModel {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn vocabulary(&self) -> Vec<&str> {
        self.vectors.keys().map(|k| k.as_str()).collect()
    }

    fn vector(&self, term: &str) -> Option<&[f32]> {
        self.vectors.get(term).map(|v| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::essay::semantic::{derive_main_term, tokenized_sentences};
    use crate::essay::corpus::Corpus;
    use crate::utils::math::vector::norm_sq;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;

    fn small_config() -> EmbeddingConfig {
        EmbeddingConfig {
            dimension: 64,
            index_nonzeros: 4,
            window: 2,
            epochs: 2,
            ..EmbeddingConfig::default()
        }
    }

    fn budget() -> TrainingBudget {
        TrainingBudget::new(Duration::from_secs(60))
    }

    fn sentences(texts: &[&str]) -> Vec<Vec<String>> {
        tokenized_sentences(&Corpus::new(texts.iter().copied()))
    }

    #[test]
    fn index_vectors_are_sparse_and_deterministic() {
        let backend = CooccurrenceBackend::new(small_config());
        let a = backend.index_vector("mammals");
        assert_eq!(a.iter().filter(|x| **x != 0.0).count(), 4);
        assert!(a.iter().all(|x| [0.0, 1.0, -1.0].contains(x)));
        assert_eq!(a, backend.index_vector("mammals"));
        assert_ne!(a, backend.index_vector("fish"));
    }

    #[test]
    fn trained_vectors_are_unit_length() {
        let backend = CooccurrenceBackend::new(small_config());
        let model = backend
            .train(&sentences(&["Cats are mammals. Dogs are mammals too. Birds can fly."]), &budget())
            .unwrap();
        assert_eq!(model.vocabulary(), vec!["cats", "are", "mammals", "dogs", "too", "birds", "can", "fly"]);
        for term in model.vocabulary() {
            let v = model.vector(term).unwrap();
            assert_eq!(v.len(), 64);
            assert!((norm_sq(v) - 1.0).abs() < 1e-4, "{term}");
        }
        assert!(model.vector("whale").is_none());
    }

    #[test]
    fn shared_contexts_are_closer() {
        let backend = CooccurrenceBackend::new(small_config());
        let text = [
            "The cat chased the mouse. The dog chased the ball.",
            "A cat sleeps on the mat. A dog sleeps on the rug.",
            "Stocks fell sharply today. Bonds fell sharply too.",
        ];
        let model = backend.train(&sentences(&text), &budget()).unwrap();
        let pets = model.similarity("cat", "dog").unwrap();
        let finance = model.similarity("cat", "bonds").unwrap();
        assert!(pets > finance, "cat~dog {pets} vs cat~bonds {finance}");
    }

    #[test]
    fn training_is_reproducible() {
        let backend = CooccurrenceBackend::new(small_config());
        let input = sentences(&["Rust is fast and safe. Rust has no garbage collector."]);
        let a = backend.train(&input, &budget()).unwrap();
        let b = backend.train(&input, &budget()).unwrap();
        assert_eq!(a.vector("rust"), b.vector("rust"));
        assert_eq!(derive_main_term(&a, 7, 4), derive_main_term(&b, 7, 4));
    }

    #[test]
    fn vocabulary_cap_is_honored() {
        let config = EmbeddingConfig { max_vocabulary: 3, ..small_config() };
        let model = CooccurrenceBackend::new(config)
            .train(&sentences(&["one two three four five"]), &budget())
            .unwrap();
        assert_eq!(model.len(), 3);
        assert!(model.vector("four").is_none());
    }

    #[test]
    fn long_unpunctuated_document_stops_near_the_deadline() {
        let text: String = (0..300_000).map(|i| format!("w{} ", i % 2_000)).collect();
        let input = sentences(&[text.as_str()]);
        assert_eq!(input.len(), 1);

        let config = EmbeddingConfig { timeout_ms: 25, ..EmbeddingConfig::default() };
        let backend = CooccurrenceBackend::new(config.clone());
        let budget = TrainingBudget::new(config.timeout());
        let started = std::time::Instant::now();
        let result = backend.train(&input, &budget);
        let elapsed = started.elapsed();

        assert_eq!(result.unwrap_err(), EmbeddingError::Timeout(Duration::from_millis(25)));
        assert!(elapsed < Duration::from_millis(1_000), "training overran its budget: {elapsed:?}");
    }

    #[test]
    fn training_errors() {
        let backend = CooccurrenceBackend::new(small_config());
        assert_eq!(backend.train(&[], &budget()).unwrap_err(), EmbeddingError::EmptyVocabulary);

        let cancel = Arc::new(AtomicBool::new(true));
        let cancelled = budget().with_cancel_flag(cancel);
        let input = sentences(&["Some words here."]);
        assert_eq!(backend.train(&input, &cancelled).unwrap_err(), EmbeddingError::Cancelled);

        let invalid = CooccurrenceBackend::new(EmbeddingConfig { dimension: 0, ..small_config() });
        assert!(matches!(invalid.train(&input, &budget()), Err(EmbeddingError::InvalidConfig(_))));
    }
}
