//! Global and thread-local sufficient statistics
use serde::{Deserialize, Serialize};

/// The sufficient statistics of a collapsed LDA state.
///
/// Holds the topic totals `nk` (length K) and the topic-by-word counts
/// `nkv` (K×V). The word table is stored word-major so the K counts of a
/// single word are contiguous, which is the access pattern of the sampler's
/// conditional. A scratch buffer for the cumulative conditional rides along
/// but is never serialized.
///
/// The same type serves as the global state and as the per-worker shadow
/// copies during a parallel epoch; [`ModelState::merge_locals`] reconciles
/// the copies at each epoch boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ModelState {
    k: usize,
    /// Topic totals, length K
    nk: Vec<f64>,
    /// Topic-by-word counts, word-major: `nkv[v * k + t]`
    nkv: Vec<f64>,
    /// Cumulative conditional scratch, length K
    #[serde(skip)]
    scratch: Vec<f64>,
}

impl ModelState {
    /// A zeroed state for `k` topics over `v` words
    #[must_use]
    pub fn new(k: usize, v: usize) -> Self {
        ModelState {
            k,
            nk: vec![0.0; k],
            nkv: vec![0.0; k * v],
            scratch: vec![0.0; k],
        }
    }

    /// Number of topics
    #[must_use]
    pub fn num_topics(&self) -> usize {
        self.k
    }

    /// Number of words covered by the table
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        if self.k == 0 {
            0
        } else {
            self.nkv.len() / self.k
        }
    }

    /// Topic totals
    #[must_use]
    pub fn topic_totals(&self) -> &[f64] {
        &self.nk
    }

    /// Count of word `v` under topic `t`
    #[must_use]
    pub fn count(&self, t: usize, v: usize) -> f64 {
        self.nkv[v * self.k + t]
    }

    /// The K counts of word `v`, one per topic
    #[must_use]
    pub fn word_counts(&self, v: usize) -> &[f64] {
        &self.nkv[v * self.k..(v + 1) * self.k]
    }

    /// The cumulative conditional written by the last `z_likelihoods` call
    #[must_use]
    pub fn conditional(&self) -> &[f64] {
        &self.scratch
    }

    /// Apply a signed weight to the counters for `(t, v)`
    #[inline]
    pub(crate) fn add(&mut self, t: usize, v: usize, weight: f64) {
        debug_assert!(t < self.k);
        debug_assert!(v * self.k + t < self.nkv.len());
        self.nk[t] += weight;
        self.nkv[v * self.k + t] += weight;
    }

    /// Split borrows for the conditional computation: topic totals, the
    /// word column for `v`, and the scratch buffer.
    ///
    /// The scratch is resized lazily because deserialized states arrive
    /// without one.
    pub(crate) fn conditional_parts(
        &mut self,
        v: usize,
    ) -> (&[f64], &[f64], &mut [f64]) {
        if self.scratch.len() != self.k {
            self.scratch.resize(self.k, 0.0);
        }
        (
            &self.nk,
            &self.nkv[v * self.k..(v + 1) * self.k],
            &mut self.scratch,
        )
    }

    /// Fold per-worker states into `self` and copy the result back out.
    ///
    /// `self` must be the pre-epoch global state: worker 0's state replaces
    /// it wholesale and every other worker contributes only its delta
    /// against the pre-epoch baseline. With `clamp`, counts are floored at
    /// zero afterwards to absorb floating-point drift under non-uniform
    /// weighting. Finally every local is overwritten with the new global.
    pub(crate) fn merge_locals(&mut self, locals: &mut [Self], clamp: bool) {
        let snapshot = self.clone();
        self.clone_from(&locals[0]);
        for local in &locals[1..] {
            for (g, (l, s)) in self
                .nk
                .iter_mut()
                .zip(local.nk.iter().zip(snapshot.nk.iter()))
            {
                *g += l - s;
            }
            for (g, (l, s)) in self
                .nkv
                .iter_mut()
                .zip(local.nkv.iter().zip(snapshot.nkv.iter()))
            {
                *g += l - s;
            }
        }
        if clamp {
            for x in self.nk.iter_mut().chain(self.nkv.iter_mut()) {
                *x = x.max(0.0);
            }
        }
        for local in locals.iter_mut() {
            local.clone_from(self);
        }
    }
}
