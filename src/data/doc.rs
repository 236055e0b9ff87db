use serde::{Deserialize, Serialize};

/// A bag-of-words document and its sampler state.
///
/// `words` is fixed at creation; `z`, `weights` and the per-document topic
/// counts are allocated when the owning model initialises the document and
/// are mutated by the sampler. Word ids at or beyond the effective
/// vocabulary size are out-of-vocabulary and never sampled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Document {
    /// Word ids, immutable after creation
    pub(crate) words: Vec<usize>,
    /// Topic assignment per position, in `[0, K)`
    pub(crate) z: Vec<usize>,
    /// Per-position term weights; empty under uniform weighting
    pub(crate) weights: Vec<f64>,
    /// Topic-count vector of length K: `ndk[k] = Σ_{i: z[i]=k} weight(i)`
    pub(crate) ndk: Vec<f64>,
    /// Total weight of in-vocabulary positions
    pub(crate) weight_sum: f64,
}

impl Document {
    pub(crate) fn from_ids(words: Vec<usize>) -> Self {
        Document {
            words,
            z: Vec::new(),
            weights: Vec::new(),
            ndk: Vec::new(),
            weight_sum: 0.0,
        }
    }

    /// Number of token positions, including out-of-vocabulary ones
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word ids in order
    #[must_use]
    pub fn words(&self) -> &[usize] {
        &self.words
    }

    /// Topic assignments in order; empty until the model initialises the
    /// document
    #[must_use]
    pub fn z(&self) -> &[usize] {
        &self.z
    }

    /// Per-position term weights; empty under uniform weighting
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Per-document topic counts (K entries)
    #[must_use]
    pub fn topic_counts(&self) -> &[f64] {
        &self.ndk
    }

    /// Total weight of in-vocabulary positions; the token count under
    /// uniform weighting
    #[must_use]
    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    /// Weight of position `i`: the stored weight, or 1 under uniform mode
    #[inline]
    pub(crate) fn weight_at(&self, i: usize) -> f64 {
        if self.weights.is_empty() {
            1.0
        } else {
            self.weights[i]
        }
    }
}
