/**
This module holds the true positive, false positive and false negative tallies of a scoring
call. The tallies are kept for every class plus one synthetic "named entity" class, stored at
index `class_size`, which pools every class except the unnamed entity.
*/
use ndarray::{s, Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Per-class tallies of a scoring call.
///
/// The counts follow the *gold-fp / predicted-fn* convention: a mismatch between a gold class
/// `t` and a predicted class `p` increments the false positives of `t` and the false negatives
/// of `p`. This is not the textbook attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    class_size: usize,
    true_positives: Array1<usize>,
    false_positives: Array1<usize>,
    false_negatives: Array1<usize>,
}

impl ConfusionCounts {
    /// Zeroed counts for `class_size` classes and the aggregate slot.
    pub fn new(class_size: usize) -> Self {
        Self {
            class_size,
            true_positives: Array1::zeros(class_size + 1),
            false_positives: Array1::zeros(class_size + 1),
            false_negatives: Array1::zeros(class_size + 1),
        }
    }

    /// Records one token whose gold class is `gold` and whose predicted class is `predicted`.
    #[inline(always)]
    pub(crate) fn record(&mut self, gold: usize, predicted: usize) {
        if gold == predicted {
            self.true_positives[gold] += 1;
        } else {
            self.false_positives[gold] += 1;
            self.false_negatives[predicted] += 1;
        }
    }

    /// Adds the counts of `other` into `self`. Both must have the same class size.
    pub(crate) fn merge(mut self, other: Self) -> Self {
        debug_assert_eq!(self.class_size, other.class_size);
        self.true_positives += &other.true_positives;
        self.false_positives += &other.false_positives;
        self.false_negatives += &other.false_negatives;
        self
    }

    /// Fills the aggregate slot with the sum of every class except `unnamed_entity`.
    pub(crate) fn with_named_entity_aggregate(mut self, unnamed_entity: usize) -> Self {
        let class_size = self.class_size;
        for counts in [
            &mut self.true_positives,
            &mut self.false_positives,
            &mut self.false_negatives,
        ] {
            let pooled: usize = counts
                .slice(s![..class_size])
                .indexed_iter()
                .filter(|(class, _)| *class != unnamed_entity)
                .map(|(_, count)| *count)
                .sum();
            counts[class_size] += pooled;
        }
        self
    }

    /// Number of real classes, excluding the aggregate slot.
    pub fn class_size(&self) -> usize {
        self.class_size
    }

    pub fn true_positives(&self) -> ArrayView1<usize> {
        self.true_positives.view()
    }

    pub fn false_positives(&self) -> ArrayView1<usize> {
        self.false_positives.view()
    }

    pub fn false_negatives(&self) -> ArrayView1<usize> {
        self.false_negatives.view()
    }

    /// `(tp, fp, fn)` of the aggregate named-entity class.
    pub fn named_entity(&self) -> (usize, usize, usize) {
        let i = self.class_size;
        (
            self.true_positives[i],
            self.false_positives[i],
            self.false_negatives[i],
        )
    }

    /// Iterates over the `(tp, fp, fn)` triples, the aggregate last.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.true_positives
            .iter()
            .zip(self.false_positives.iter())
            .zip(self.false_negatives.iter())
            .map(|((tp, fp), fn_)| (*tp, *fp, *fn_))
    }
}
