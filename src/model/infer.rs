//! Held-out document scoring
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;

use crate::data::Document;
use crate::model::sampler::{GibbsSampler, TrainingError};
use crate::model::LdaModel;

impl LdaModel {
    /// Score a held-out set by co-sampling it against a shared copy of the
    /// trained state.
    ///
    /// The global tables are cloned into a temporary state, every document
    /// is initialised against it, and `max_iter` epochs run with the same
    /// stripe scheduler and merge as training, writing only to the
    /// temporary. Returns the single score
    /// `LL_docs(H) + [LLRest(tmp) − LLRest(global)]`.
    ///
    /// `tolerance` is accepted for interface stability but no early
    /// termination is applied. `num_workers` as in
    /// [`train`](LdaModel::train).
    ///
    /// # Errors
    /// [`TrainingError`] on an unprepared model or a numerical failure
    /// inside a worker.
    pub fn infer_together(
        &self,
        docs: &mut [Document],
        max_iter: usize,
        _tolerance: f64,
        num_workers: usize,
    ) -> Result<f64, TrainingError> {
        if !self.is_prepared() {
            return Err(TrainingError::NotPrepared);
        }
        let workers = if num_workers == 0 {
            rayon::current_num_threads().max(1)
        } else {
            num_workers
        };
        // a private stream, decorrelated from training draws
        let mut rng = Xoshiro256Plus::seed_from_u64(self.infer_seed());

        let mut tmp = self.global_state().clone();
        for doc in docs.iter_mut() {
            self.init_doc_state(doc, &mut tmp, &mut rng);
        }

        let mut locals = vec![tmp.clone(); workers];
        let mut rngs: Vec<Xoshiro256Plus> = (0..workers)
            .map(|_| Xoshiro256Plus::seed_from_u64(rng.gen()))
            .collect();

        log::debug!(
            "joint inference over {} documents, {} epochs, {} workers",
            docs.len(),
            max_iter,
            workers
        );
        let clamp = !self.term_weight().is_uniform();
        for _ in 0..max_iter {
            self.sample_epoch(docs, &mut locals, &mut rngs)?;
            tmp.merge_locals(&mut locals, clamp);
        }

        let ll = self.ll_docs(docs.iter()) + self.ll_rest(&tmp)
            - self.ll_rest(self.global_state());
        Ok(ll)
    }

    /// Score held-out documents independently.
    ///
    /// Each document clones the trained state privately, is initialised,
    /// and runs `max_iter` sequential sampling passes; documents fan out
    /// across the thread pool. Returns one score per document,
    /// `LL_doc + [LLRest(tmp) − LLRest(global)]`.
    ///
    /// `tolerance` is accepted for interface stability but unused.
    ///
    /// # Errors
    /// [`TrainingError`] on an unprepared model or a numerical failure in
    /// any document's sampler.
    pub fn infer_separate(
        &self,
        docs: &mut [Document],
        max_iter: usize,
        _tolerance: f64,
    ) -> Result<Vec<f64>, TrainingError> {
        if !self.is_prepared() {
            return Err(TrainingError::NotPrepared);
        }
        let global_ll_rest = self.ll_rest(self.global_state());

        let mut seed_rng = Xoshiro256Plus::seed_from_u64(self.infer_seed());
        let seeds: Vec<u64> =
            docs.iter().map(|_| seed_rng.gen()).collect();

        log::debug!(
            "separate inference over {} documents, {} passes each",
            docs.len(),
            max_iter
        );
        let results: Vec<Result<f64, TrainingError>> = docs
            .par_iter_mut()
            .zip_eq(seeds.into_par_iter())
            .map(|(doc, seed)| {
                let mut rng = Xoshiro256Plus::seed_from_u64(seed);
                let mut tmp = self.global_state().clone();
                self.init_doc_state(doc, &mut tmp, &mut rng);
                for _ in 0..max_iter {
                    self.sample_document(doc, &mut tmp, &mut rng)?;
                }
                Ok(self.ll_doc(doc) + self.ll_rest(&tmp) - global_ll_rest)
            })
            .collect();
        results.into_iter().collect()
    }

    fn infer_seed(&self) -> u64 {
        // keep inference reproducible without advancing the training stream
        self.seed().wrapping_add(1)
    }
}
