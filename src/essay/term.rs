use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::utils::normalizer::split_words;

/// TermFrequency struct
/// Manages the occurrence counts of the terms of one text
/// (a whole document or a single sentence).
///
/// Terms keep the order of their first occurrence.
///
/// # Examples
/// ```
/// use tf_idf_essay::essay::term::TermFrequency;
/// let freq = TermFrequency::from_text("Dogs are mammals. Dogs bark.");
///
/// assert_eq!(freq.term_count("dogs"), 2);
/// assert_eq!(freq.term_sum(), 5);
/// assert_eq!(freq.tf("dogs"), 0.4);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TermFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    term_count: IndexMap<String, u64>,
    total_term_count: u64,
}

/// Implementation for adding terms
impl TermFrequency {
    /// Create a new TermFrequency
    pub fn new() -> Self {
        TermFrequency {
            term_count: IndexMap::new(),
            total_term_count: 0,
        }
    }

    /// Count the terms of a raw text (normalized through `split_words`)
    pub fn from_text(text: &str) -> Self {
        let words = split_words(text);
        Self::from(words.as_slice())
    }

    /// Add a term
    ///
    /// # Arguments
    /// * `term` - term to add
    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        let count = self.term_count.entry(term.to_string()).or_insert(0);
        *count += 1;
        self.total_term_count += 1;
        self
    }

    /// Add multiple terms
    ///
    /// # Arguments
    /// * `terms` - Slice of terms to add
    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where T: AsRef<str>
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }
}

impl<T> From<&[T]> for TermFrequency
where
    T: AsRef<str>,
{
    fn from(terms: &[T]) -> Self {
        let mut tf = TermFrequency::new();
        tf.add_terms(terms);
        tf
    }
}

/// Implementation for retrieving statistics
impl TermFrequency {
    /// Iterator over all terms and their counts, in first-occurrence order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item=(&str, u64)> {
        self.term_count.iter().map(|(term, &count)| (term.as_str(), count))
    }

    /// Total count of all terms (the word count of the text)
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    /// Number of distinct terms
    #[inline]
    pub fn term_num(&self) -> usize {
        self.term_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_term_count == 0
    }

    /// Occurrence count of a term, 0 when absent
    #[inline]
    pub fn term_count(&self, term: &str) -> u64 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    #[inline]
    pub fn contains_term(&self, term: &str) -> bool {
        self.term_count.contains_key(term)
    }

    /// Count of the most frequent term, 0 for an empty text
    #[inline]
    pub fn most_frequent_term_count(&self) -> u64 {
        self.term_count.values().max().copied().unwrap_or(0)
    }

    /// Normalized term frequency `count / total`
    ///
    /// # Returns
    /// * `f64` - in `[0, 1]`; 0.0 when the term is absent or the text is empty
    #[inline]
    pub fn tf(&self, term: &str) -> f64 {
        if self.total_term_count == 0 {
            return 0.0;
        }
        self.term_count(term) as f64 / self.total_term_count as f64
    }

    /// Largest normalized term frequency of the text, 0.0 for an empty text
    #[inline]
    pub fn max_tf(&self) -> f64 {
        if self.total_term_count == 0 {
            return 0.0;
        }
        self.most_frequent_term_count() as f64 / self.total_term_count as f64
    }
}

/// `count(term in words(text)) / |words(text)|`, 0.0 when undefined
pub fn term_frequency(term: &str, text: &str) -> f64 {
    TermFrequency::from_text(text).tf(term)
}

/// Maximum normalized term frequency of a text
pub fn max_term_frequency(text: &str) -> f64 {
    TermFrequency::from_text(text).max_tf()
}
