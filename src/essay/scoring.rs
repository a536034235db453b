use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::essay::corpus::{Corpus, Document, DocumentFrequency};
use crate::essay::term::TermFrequency;
use crate::utils::normalizer::{split_words, Segment, Segmentation};

/// Sentence → weight, in the order sentences were first produced.
/// A repeated sentence keeps its first position and takes the latest weight.
pub type WeightTable = IndexMap<String, f64>;

/// Sentence scoring mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// TF-IDF-like score
    #[default]
    Statistical,
    /// TF-IDF-like score scaled by document and paragraph position
    Positional,
    /// Similarity of every term to a single main term
    Semantic,
}

impl std::fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScoringMode::Statistical => "statistical",
            ScoringMode::Positional => "positional",
            ScoringMode::Semantic => "semantic",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "statistical" | "tfidf" => Ok(ScoringMode::Statistical),
            "positional" => Ok(ScoringMode::Positional),
            "semantic" => Ok(ScoringMode::Semantic),
            other => Err(format!("unknown scoring mode '{other}'")),
        }
    }
}

/// Scores one sentence of a document.
pub trait SentenceScorer: Sync {
    fn score(&self, document: &Document, segmentation: &Segmentation<'_>, segment: &Segment<'_>) -> f64;
}

/// Score every sentence of the corpus and collect the weight table.
///
/// Sentences are scored in parallel; insertion still follows document order
/// then sentence order. Non-finite scores are stored as 0.0.
pub fn weight_table<S>(corpus: &Corpus, scorer: &S) -> WeightTable
where
    S: SentenceScorer + ?Sized,
{
    let segmentations: Vec<Segmentation<'_>> = corpus
        .documents()
        .iter()
        .map(|doc| Segmentation::new(doc.raw()))
        .collect();

    let jobs: Vec<(usize, &Segment<'_>)> = segmentations
        .iter()
        .enumerate()
        .flat_map(|(doc_idx, seg)| seg.segments.iter().map(move |s| (doc_idx, s)))
        .collect();

    let scores: Vec<f64> = jobs
        .par_iter()
        .map(|&(doc_idx, segment)| {
            let score = scorer.score(&corpus.documents()[doc_idx], &segmentations[doc_idx], segment);
            if score.is_finite() { score } else { 0.0 }
        })
        .collect();

    let mut table = WeightTable::with_capacity(jobs.len());
    for ((_, segment), score) in jobs.iter().zip(scores) {
        table.insert(segment.text.to_string(), score);
    }
    debug!(sentences = jobs.len(), entries = table.len(), "Weight table built");
    table
}

/// TF-IDF-like scorer.
///
/// ```text
/// weight(t, D) = 0.5 * (1 + tf(t, D) / maxTf(D)) * ln(|Corpus| / max(df(t), 1))
/// score(S, D)  = Σ_{t in words(S)} tf(t, S) * weight(t, D)
/// ```
#[derive(Debug, Clone)]
pub struct StatisticalScorer {
    doc_num: usize,
    /// document frequency of every term that occurs in a sentence
    df_cache: HashMap<String, usize>,
}

impl StatisticalScorer {
    /// Precompute document frequencies for every sentence term of the corpus.
    pub fn new<F>(corpus: &Corpus, rule: &F) -> Self
    where
        F: DocumentFrequency + ?Sized,
    {
        let terms: IndexSet<String> = corpus
            .documents()
            .iter()
            .flat_map(|doc| Segmentation::new(doc.raw()).segments.into_iter().map(|s| s.text))
            .flat_map(split_words)
            .collect();
        let terms: Vec<String> = terms.into_iter().collect();

        let df_cache: HashMap<String, usize> = terms
            .into_par_iter()
            .map(|term| {
                let df = rule.document_frequency(corpus, &term);
                (term, df)
            })
            .collect();

        Self { doc_num: corpus.doc_num(), df_cache }
    }

    /// Document frequency of a term. Terms never seen in a sentence read 0.
    #[inline]
    pub fn document_frequency(&self, term: &str) -> usize {
        self.df_cache.get(term).copied().unwrap_or(0)
    }

    /// `ln(|Corpus| / max(df, 1))`, 0.0 for an empty corpus.
    #[inline]
    pub fn rarity(&self, term: &str) -> f64 {
        if self.doc_num == 0 {
            return 0.0;
        }
        let df = self.document_frequency(term).max(1);
        (self.doc_num as f64 / df as f64).ln()
    }

    /// `w(t, D)`
    #[inline]
    pub fn term_weight(&self, term: &str, document: &TermFrequency) -> f64 {
        let max_tf = document.max_tf();
        let ratio = if max_tf > 0.0 { document.tf(term) / max_tf } else { 0.0 };
        0.5 * (1.0 + ratio) * self.rarity(term)
    }

    /// `Score(S)` for a sentence of `document`
    pub fn sentence_score(&self, sentence: &str, document: &TermFrequency) -> f64 {
        let words = split_words(sentence);
        let sentence_terms = TermFrequency::from(words.as_slice());
        words
            .iter()
            .map(|term| sentence_terms.tf(term) * self.term_weight(term, document))
            .sum()
    }
}

impl SentenceScorer for StatisticalScorer {
    fn score(&self, document: &Document, _segmentation: &Segmentation<'_>, segment: &Segment<'_>) -> f64 {
        self.sentence_score(segment.text, document.terms())
    }
}

/// `1 - ordinal / len`: 1.0 for the first sentence, `1/len` for the last.
#[inline]
pub fn position_factor(ordinal: usize, len: usize) -> f64 {
    if len == 0 {
        return 1.0;
    }
    1.0 - ordinal as f64 / len as f64
}

/// Statistical score scaled by the sentence position in its document and in
/// its paragraph (ordinal-index form).
#[derive(Debug, Clone)]
pub struct PositionalScorer {
    inner: StatisticalScorer,
}

impl PositionalScorer {
    pub fn new(inner: StatisticalScorer) -> Self {
        Self { inner }
    }
}

impl SentenceScorer for PositionalScorer {
    fn score(&self, document: &Document, segmentation: &Segmentation<'_>, segment: &Segment<'_>) -> f64 {
        let base = self.inner.score(document, segmentation, segment);
        let in_document = position_factor(segment.ordinal, segmentation.len());
        let in_paragraph = position_factor(segment.paragraph_ordinal, segmentation.paragraph_len(segment));
        base * in_document * in_paragraph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::essay::corpus::DocumentFrequencyKind;
    use crate::essay::selector::{select, Cutoff};

    fn animals() -> Corpus {
        Corpus::new([
            "Cats are mammals. Dogs are mammals too. Birds can fly.",
            "Whales are mammals. Sharks are fish.",
            "Penguins cannot fly. Birds lay eggs.",
        ])
    }

    #[test]
    fn rarity_is_guarded_for_absent_terms() {
        let corpus = animals();
        let scorer = StatisticalScorer::new(&corpus, &DocumentFrequencyKind::Substring);
        assert_eq!(scorer.document_frequency("unicorn"), 0);
        let rarity = scorer.rarity("unicorn");
        assert!(rarity.is_finite());
        assert!((rarity - 3.0f64.ln()).abs() < 1e-12);

        let empty = StatisticalScorer::new(&Corpus::default(), &DocumentFrequencyKind::Substring);
        assert_eq!(empty.rarity("anything"), 0.0);
    }

    #[test]
    fn term_weight_follows_formula() {
        let corpus = animals();
        let scorer = StatisticalScorer::new(&corpus, &DocumentFrequencyKind::Substring);
        let doc = corpus.documents()[0].terms();
        // "mammals": tf = 2/10, maxTf = 2/10 (ties with "are"), df = 2
        let expected = 0.5 * (1.0 + 1.0) * (3.0f64 / 2.0).ln();
        assert!((scorer.term_weight("mammals", doc) - expected).abs() < 1e-12);
        // "cats": tf = 1/10, df = 1
        let expected = 0.5 * (1.0 + 0.5) * 3.0f64.ln();
        assert!((scorer.term_weight("cats", doc) - expected).abs() < 1e-12);
    }

    #[test]
    fn sentence_score_sums_over_words() {
        let corpus = animals();
        let scorer = StatisticalScorer::new(&corpus, &DocumentFrequencyKind::Substring);
        let doc = corpus.documents()[0].terms();
        let score = scorer.sentence_score("Cats are mammals", doc);
        let expected: f64 = ["cats", "are", "mammals"]
            .iter()
            .map(|t| (1.0 / 3.0) * scorer.term_weight(t, doc))
            .sum();
        assert!((score - expected).abs() < 1e-12);
        assert_eq!(scorer.sentence_score(" ,; ", doc), 0.0);
    }

    #[test]
    fn table_is_in_document_order() {
        let corpus = animals();
        let scorer = StatisticalScorer::new(&corpus, &DocumentFrequencyKind::Substring);
        let table = weight_table(&corpus, &scorer);
        let keys: Vec<&str> = table.keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "Cats are mammals",
                " Dogs are mammals too",
                " Birds can fly",
                "Whales are mammals",
                " Sharks are fish",
                "Penguins cannot fly",
                " Birds lay eggs",
            ]
        );
        assert!(table.values().all(|w| w.is_finite() && *w >= 0.0));
    }

    #[test]
    fn single_document_corpus_has_zero_rarity() {
        let corpus = Corpus::new(["Cats are mammals. Dogs are mammals too. Birds can fly."]);
        let scorer = StatisticalScorer::new(&corpus, &DocumentFrequencyKind::Substring);
        let table = weight_table(&corpus, &scorer);
        assert_eq!(table.len(), 3);
        assert!(table.values().all(|w| *w == 0.0));
        // every weight ties, so even skip_top = 0 keeps the whole table
        assert_eq!(select(&table, 0, Cutoff::AtOrAbove).sentences.len(), 3);
    }

    #[test]
    fn duplicate_sentences_keep_first_position_and_last_weight() {
        let corpus = Corpus::new(["Shared line. Alpha beta gamma.", "Other words. Shared line."]);
        let scorer = StatisticalScorer::new(&corpus, &DocumentFrequencyKind::Substring);
        let table = weight_table(&corpus, &scorer);
        assert_eq!(scorer.document_frequency("shared"), 2);
        // "Shared line" (doc 0) and " Shared line" (doc 1) differ by the leading space.
        assert_eq!(table.len(), 4);

        let corpus = Corpus::new(["Same text. Unique one.", "Same text. Unique two."]);
        let scorer = StatisticalScorer::new(&corpus, &DocumentFrequencyKind::Substring);
        let table = weight_table(&corpus, &scorer);
        let keys: Vec<&str> = table.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["Same text", " Unique one", " Unique two"]);
        let last = scorer.sentence_score("Same text", corpus.documents()[1].terms());
        assert_eq!(table["Same text"], last);
    }

    /// Scores by sentence ordinal, some of them non-finite
    struct Unstable;

    impl SentenceScorer for Unstable {
        fn score(&self, _document: &Document, _segmentation: &Segmentation<'_>, segment: &Segment<'_>) -> f64 {
            match segment.ordinal {
                0 => f64::NAN,
                1 => 0.5,
                2 => f64::INFINITY,
                3 => f64::NEG_INFINITY,
                _ => 0.25,
            }
        }
    }

    #[test]
    fn non_finite_scores_are_stored_as_zero() {
        let corpus = Corpus::new(["First. Second. Third. Fourth. Fifth."]);
        let table = weight_table(&corpus, &Unstable);
        let weights: Vec<f64> = table.values().copied().collect();
        assert_eq!(weights, vec![0.0, 0.5, 0.0, 0.0, 0.25]);

        let selection = select(&table, 1, Cutoff::AtOrAbove);
        assert_eq!(selection.sentences, vec![" Second", " Fifth"]);
        let all = select(&table, 2, Cutoff::Above);
        assert_eq!(all.sentences, vec![" Second", " Fifth"]);
    }

    #[test]
    fn position_factor_prefers_early_sentences() {
        assert_eq!(position_factor(0, 4), 1.0);
        assert_eq!(position_factor(3, 4), 0.25);
        assert_eq!(position_factor(0, 0), 1.0);
    }

    #[test]
    fn positional_scores_scale_statistical_scores() {
        let corpus = Corpus::new([
            "Rust compiles fast. Rust is safe.\n\nGo is simple. Rust is fun.",
            "Python is slow. Go compiles fast.",
        ]);
        let statistical = StatisticalScorer::new(&corpus, &DocumentFrequencyKind::Substring);
        let plain = weight_table(&corpus, &statistical);
        let positional = weight_table(&corpus, &PositionalScorer::new(statistical.clone()));

        assert_eq!(plain.len(), positional.len());
        // document 0: 4 sentences, paragraphs of 2 and 2
        let factors = [1.0 * 1.0, 0.75 * 0.5, 0.5 * 1.0, 0.25 * 0.5];
        for ((key, base), factor) in plain.iter().take(4).zip(factors) {
            assert!((positional[key] - base * factor).abs() < 1e-12, "{key}");
        }
    }
}
