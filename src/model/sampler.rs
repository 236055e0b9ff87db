//! The collapsed Gibbs update
use rand::Rng;
use std::fmt;

use crate::data::Document;
use crate::misc::draw_from_cumulative;
use crate::state::ModelState;

/// A numerical failure inside a sampling worker.
///
/// The epoch that raised it is discarded: outstanding workers are drained,
/// no merge is applied, and the global state is left as it was at the last
/// epoch boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingError {
    /// The model has not been prepared
    NotPrepared,
    /// The cumulative conditional for a word ended on a non-finite total
    NonFiniteConditional {
        /// The word id being sampled
        vid: usize,
        /// The offending total mass
        total: f64,
    },
    /// The cumulative conditional for a word carried no mass
    EmptyConditional {
        /// The word id being sampled
        vid: usize,
    },
}

impl std::error::Error for TrainingError {}

impl fmt::Display for TrainingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPrepared => {
                write!(f, "the model must be prepared before sampling")
            }
            Self::NonFiniteConditional { vid, total } => write!(
                f,
                "conditional for word {} summed to the non-finite value {}",
                vid, total
            ),
            Self::EmptyConditional { vid } => {
                write!(f, "conditional for word {} carried no mass", vid)
            }
        }
    }
}

/// The collapsed Gibbs machinery with its two override points.
///
/// The provided [`sample_document`](GibbsSampler::sample_document) walks a
/// document token by token: decrement the three count tables, build the
/// cumulative conditional, draw the new topic by lower-bound search, and
/// increment the tables at the new assignment. Derived models change the
/// sampler by overriding [`z_likelihoods`](GibbsSampler::z_likelihoods)
/// (and, when they maintain extra global quantities,
/// [`update_global`](GibbsSampler::update_global)) while leaving the update
/// structure intact.
pub trait GibbsSampler {
    /// Number of topics, K
    fn num_topics(&self) -> usize;

    /// Effective vocabulary size; word ids at or beyond it are skipped
    fn vocab_bound(&self) -> usize;

    /// Write the unnormalised cumulative conditional for `vid` into the
    /// state's scratch buffer.
    ///
    /// The contract: after the call, `state.conditional()` is a K-length
    /// non-decreasing array whose differences are proportional to the true
    /// conditional `p(z = k | rest)`.
    fn z_likelihoods(&self, state: &mut ModelState, doc: &Document, vid: usize);

    /// Hook run after workers join and before the merge; the base model
    /// does nothing here.
    fn update_global(&mut self, _locals: &mut [ModelState]) {}

    /// Resample every in-vocabulary token of `doc` against `state`.
    fn sample_document<R: Rng>(
        &self,
        doc: &mut Document,
        state: &mut ModelState,
        rng: &mut R,
    ) -> Result<(), TrainingError> {
        let bound = self.vocab_bound();
        for pid in 0..doc.words.len() {
            let vid = doc.words[pid];
            if vid >= bound {
                continue;
            }
            let weight = doc.weight_at(pid);
            let old = doc.z[pid];

            add_word(doc, state, old, vid, -weight);
            self.z_likelihoods(state, doc, vid);
            let new = match draw_topic(state.conditional(), vid, rng) {
                Ok(t) => t,
                Err(e) => {
                    // reinstate the token so counts stay consistent
                    add_word(doc, state, old, vid, weight);
                    return Err(e);
                }
            };
            doc.z[pid] = new;
            add_word(doc, state, new, vid, weight);
        }
        Ok(())
    }
}

/// Apply a signed weight to all three count tables for one token.
#[inline]
pub(crate) fn add_word(
    doc: &mut Document,
    state: &mut ModelState,
    tid: usize,
    vid: usize,
    weight: f64,
) {
    debug_assert!(tid < doc.ndk.len());
    doc.ndk[tid] += weight;
    state.add(tid, vid, weight);
}

/// Draw a topic from the cumulative conditional, classifying failures.
#[inline]
fn draw_topic<R: Rng>(
    cws: &[f64],
    vid: usize,
    rng: &mut R,
) -> Result<usize, TrainingError> {
    let total = cws.last().copied().unwrap_or(0.0);
    if !total.is_finite() {
        return Err(TrainingError::NonFiniteConditional { vid, total });
    }
    draw_from_cumulative(cws, rng)
        .ok_or(TrainingError::EmptyConditional { vid })
}
