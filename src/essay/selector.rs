use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::essay::scoring::WeightTable;
use crate::utils::sort::nth_largest;

/// Comparison of a sentence weight against the threshold weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cutoff {
    /// `weight > threshold`.
    /// When nothing is strictly above (every candidate ties with the
    /// threshold) the threshold tier itself is kept.
    Above,
    /// `weight >= threshold`
    #[default]
    AtOrAbove,
}

impl Cutoff {
    #[inline]
    fn passes(self, weight: f64, threshold: f64) -> bool {
        match self {
            Cutoff::Above => weight > threshold,
            Cutoff::AtOrAbove => weight >= threshold,
        }
    }
}

/// Result of [`select`]
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'t> {
    /// kept sentences, in weight table order
    pub sentences: Vec<&'t str>,
    /// `(K+1)`-th largest weight; `None` when the table had `K` entries or fewer
    pub threshold: Option<f64>,
}

/// Skip-and-threshold selection over the whole weight table.
///
/// Weights are ranked descending; the `(skip_top + 1)`-th largest becomes the
/// threshold and every sentence passing `cutoff` is kept. A table with
/// `skip_top` entries or fewer is returned whole. The result always follows
/// the table order, and is non-empty whenever the table is.
///
/// Ties at the threshold are all kept. A one-document corpus scored
/// statistically has every weight at 0.0 (`ln(1/1)`), so even `skip_top = 0`
/// keeps every sentence.
pub fn select(table: &WeightTable, skip_top: usize, cutoff: Cutoff) -> Selection<'_> {
    let weights: Vec<f64> = table.values().copied().collect();
    let Some(threshold) = nth_largest(&weights, skip_top) else {
        debug!(entries = table.len(), skip_top, "Table within skip range, keeping all sentences");
        return Selection {
            sentences: table.keys().map(|k| k.as_str()).collect(),
            threshold: None,
        };
    };

    let keep = |cutoff: Cutoff| {
        table
            .iter()
            .filter(|(_, w)| cutoff.passes(**w, threshold))
            .map(|(k, _)| k.as_str())
            .collect::<Vec<&str>>()
    };

    let mut sentences = keep(cutoff);
    if sentences.is_empty() {
        debug!(threshold, "No weight strictly above threshold, keeping the threshold tier");
        sentences = keep(Cutoff::AtOrAbove);
    }
    debug!(entries = table.len(), kept = sentences.len(), threshold, "Sentences selected");
    Selection { sentences, threshold: Some(threshold) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::normalizer::split_sentences;

    fn table(entries: &[(&str, f64)]) -> WeightTable {
        entries.iter().map(|(k, w)| (k.to_string(), *w)).collect()
    }

    #[test]
    fn small_table_is_returned_whole_in_order() {
        let t = table(&[("c", 0.1), ("a", 0.9), ("b", 0.5)]);
        let sel = select(&t, 10, Cutoff::AtOrAbove);
        assert_eq!(sel.sentences, vec!["c", "a", "b"]);
        assert_eq!(sel.threshold, None);

        let sel = select(&t, 3, Cutoff::Above);
        assert_eq!(sel.sentences, vec!["c", "a", "b"]);
    }

    #[test]
    fn empty_table_selects_nothing() {
        let empty = WeightTable::new();
        let sel = select(&empty, 0, Cutoff::AtOrAbove);
        assert!(sel.sentences.is_empty());
    }

    #[test]
    fn skip_zero_keeps_only_the_top_sentence() {
        let t = table(&[
            ("Cats are mammals", 0.2),
            (" Dogs are mammals too", 0.7),
            (" Birds can fly", 0.4),
        ]);
        let sel = select(&t, 0, Cutoff::AtOrAbove);
        assert_eq!(sel.sentences, vec![" Dogs are mammals too"]);
        assert_eq!(sel.threshold, Some(0.7));
        // strict comparison has nothing above the maximum and keeps its tier
        assert_eq!(select(&t, 0, Cutoff::Above).sentences, vec![" Dogs are mammals too"]);
    }

    #[test]
    fn threshold_boundary_ties() {
        // threshold (K = 2) is the third largest weight, 0.5, shared by two sentences
        let t = table(&[("a", 0.9), ("b", 0.5), ("c", 0.8), ("d", 0.5), ("e", 0.1)]);

        let inclusive = select(&t, 2, Cutoff::AtOrAbove);
        assert_eq!(inclusive.threshold, Some(0.5));
        assert_eq!(inclusive.sentences, vec!["a", "b", "c", "d"]);

        let strict = select(&t, 2, Cutoff::Above);
        assert_eq!(strict.sentences, vec!["a", "c"]);
    }

    #[test]
    fn all_equal_weights() {
        // "A. B. C." scores every sentence the same
        let t = table(&[("A", 0.0), (" B", 0.0), (" C", 0.0)]);
        assert_eq!(select(&t, 0, Cutoff::AtOrAbove).sentences, vec!["A", " B", " C"]);
        assert_eq!(select(&t, 0, Cutoff::Above).sentences, vec!["A", " B", " C"]);
        assert_eq!(select(&t, 1, Cutoff::Above).sentences, vec!["A", " B", " C"]);
    }

    #[test]
    fn never_more_than_table_and_never_empty() {
        let weights = [0.3, 0.1, 0.3, 0.9, 0.0, 0.3, 0.7];
        let t: WeightTable = weights.iter().enumerate().map(|(i, w)| (format!("s{i}"), *w)).collect();
        for k in 0..10 {
            for cutoff in [Cutoff::Above, Cutoff::AtOrAbove] {
                let sel = select(&t, k, cutoff);
                assert!(!sel.sentences.is_empty());
                assert!(sel.sentences.len() <= t.len());
                if k >= t.len() {
                    assert_eq!(sel.sentences.len(), t.len());
                }
            }
        }
    }

    #[test]
    fn joined_selection_resplits_into_ordered_subsequence() {
        let t = table(&[
            ("First point", 0.9),
            (" filler", 0.1),
            (" Second point", 0.8),
            (" more filler", 0.2),
            (" Third point", 0.7),
        ]);
        let sel = select(&t, 2, Cutoff::AtOrAbove);
        let joined = sel.sentences.join(". ");
        let resplit: Vec<&str> = split_sentences(&joined).into_iter().map(str::trim).collect();

        let original: Vec<&str> = t.keys().map(|k| k.trim()).collect();
        let mut cursor = original.iter();
        for sentence in &resplit {
            assert!(cursor.any(|o| o == sentence), "{sentence} out of order");
        }
        assert_eq!(resplit, vec!["First point", "Second point", "Third point"]);
    }
}
