//! The LDA model: orchestration, epoch schedule, and observable outputs
mod infer;
mod likelihood;
mod optimize;
mod sampler;

pub use self::sampler::{GibbsSampler, TrainingError};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::consts::STRIPES_PER_WORKER;
use crate::data::{Document, Vocabulary};
use crate::misc::prefix_sum;
use crate::model::sampler::add_word;
use crate::state::ModelState;
use crate::weights::{token_weights, vocab_weights, TermWeight};

/// An invalid construction parameter; the model is never built.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// K must be positive
    ZeroTopics,
    /// α must be positive and finite
    NonPositiveAlpha {
        /// The offending value
        alpha: f64,
    },
    /// η must be positive and finite
    NonPositiveEta {
        /// The offending value
        eta: f64,
    },
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroTopics => {
                write!(f, "the number of topics must be positive")
            }
            Self::NonPositiveAlpha { alpha } => {
                write!(f, "alpha was {} but must be positive and finite", alpha)
            }
            Self::NonPositiveEta { eta } => {
                write!(f, "eta was {} but must be positive and finite", eta)
            }
        }
    }
}

/// A recoverable misuse of the model surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Documents cannot be added once the model is prepared
    AlreadyPrepared,
    /// The operation requires a prepared model
    NotPrepared,
    /// A per-topic query used an out-of-range topic index
    TopicIndexOutOfBounds {
        /// The requested topic
        tid: usize,
        /// The number of topics
        k: usize,
    },
}

impl std::error::Error for ModelError {}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyPrepared => {
                write!(f, "the model is already prepared")
            }
            Self::NotPrepared => {
                write!(f, "the model has not been prepared")
            }
            Self::TopicIndexOutOfBounds { tid, k } => write!(
                f,
                "topic index {} is out of bounds for a model with {} topics",
                tid, k
            ),
        }
    }
}

/// A latent Dirichlet allocation topic model trained by parallel collapsed
/// Gibbs sampling.
///
/// Documents are added as token slices, interned into the model's
/// vocabulary, then frozen by [`prepare`](LdaModel::prepare), which assigns
/// every token a uniformly random topic and builds the count tables.
/// [`train`](LdaModel::train) runs epochs of the distributed sampler;
/// held-out documents are scored with
/// [`infer_together`](LdaModel::infer_together) or
/// [`infer_separate`](LdaModel::infer_separate).
///
/// # Example
///
/// ```
/// use ldagibbs::prelude::*;
///
/// let mut model = LdaModel::new(2, 0.1, 0.01, TermWeight::Uniform, 7)
///     .unwrap()
///     .with_burn_in(5)
///     .with_optim_interval(10);
///
/// model.add_doc(&["a", "b", "a"]).unwrap();
/// model.add_doc(&["b", "c", "b"]).unwrap();
/// model.prepare().unwrap();
/// model.train(20, 1).unwrap();
///
/// // the per-document mixture is a probability vector
/// let theta = model.topics_by_doc(&model.docs()[0]);
/// assert!((theta.iter().sum::<f64>() - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LdaModel {
    k: usize,
    /// The initial symmetric concentration α₀
    alpha0: f64,
    /// The per-topic concentration vector, mutated by the optimiser
    alphas: Vec<f64>,
    eta: f64,
    term_weight: TermWeight,
    optim_interval: usize,
    burn_in: usize,
    seed: u64,
    rng: Xoshiro256Plus,
    vocab: Vocabulary,
    /// Per-vocabulary term weights; empty under uniform weighting
    vocab_weights: Vec<f64>,
    docs: Vec<Document>,
    global: ModelState,
    prepared: bool,
    iterated: usize,
}

impl LdaModel {
    /// Create an empty model.
    ///
    /// `alpha` seeds a symmetric document-topic concentration vector which
    /// the optimiser may later make asymmetric; `eta` is the scalar
    /// topic-word concentration and stays fixed.
    ///
    /// # Errors
    /// [`ConfigError`] when `k` is zero or either concentration is not a
    /// positive finite number.
    pub fn new(
        k: usize,
        alpha: f64,
        eta: f64,
        term_weight: TermWeight,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        if k == 0 {
            return Err(ConfigError::ZeroTopics);
        }
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(ConfigError::NonPositiveAlpha { alpha });
        }
        if !eta.is_finite() || eta <= 0.0 {
            return Err(ConfigError::NonPositiveEta { eta });
        }
        Ok(LdaModel {
            k,
            alpha0: alpha,
            alphas: vec![alpha; k],
            eta,
            term_weight,
            optim_interval: 10,
            burn_in: 0,
            seed,
            rng: Xoshiro256Plus::seed_from_u64(seed),
            vocab: Vocabulary::new(),
            vocab_weights: Vec::new(),
            docs: Vec::new(),
            global: ModelState::new(k, 0),
            prepared: false,
            iterated: 0,
        })
    }

    /// Epochs between optimiser calls; 0 disables the optimiser
    #[must_use]
    pub fn with_optim_interval(mut self, optim_interval: usize) -> Self {
        self.optim_interval = optim_interval;
        self
    }

    /// Epochs before the optimiser may first run
    #[must_use]
    pub fn with_burn_in(mut self, burn_in: usize) -> Self {
        self.burn_in = burn_in;
        self
    }

    /// Add a document before preparation, returning its index.
    ///
    /// # Errors
    /// [`ModelError::AlreadyPrepared`] once [`prepare`](LdaModel::prepare)
    /// has run.
    pub fn add_doc(&mut self, tokens: &[&str]) -> Result<usize, ModelError> {
        if self.prepared {
            return Err(ModelError::AlreadyPrepared);
        }
        let ids = self.vocab.add_doc_tokens(tokens);
        self.docs.push(Document::from_ids(ids));
        Ok(self.docs.len() - 1)
    }

    /// Build a held-out document against the frozen vocabulary.
    ///
    /// Unknown tokens map to the out-of-vocabulary sentinel and are skipped
    /// by the sampler. The document carries no state until an inference
    /// call initialises it.
    #[must_use]
    pub fn make_doc(&self, tokens: &[&str]) -> Document {
        Document::from_ids(self.vocab.map_tokens(tokens))
    }

    /// Freeze the vocabulary, compute term weights, and give every token a
    /// uniformly random initial topic.
    ///
    /// # Errors
    /// [`ModelError::AlreadyPrepared`] on a second call.
    pub fn prepare(&mut self) -> Result<(), ModelError> {
        if self.prepared {
            return Err(ModelError::AlreadyPrepared);
        }
        let v = self.vocab.len();
        self.vocab_weights =
            vocab_weights(self.term_weight, &self.vocab, self.docs.len());

        let mut global = ModelState::new(self.k, v);
        let mut rng = self.rng.clone();
        let mut docs = std::mem::take(&mut self.docs);
        for doc in docs.iter_mut() {
            self.init_doc_state(doc, &mut global, &mut rng);
        }
        self.docs = docs;
        self.global = global;
        self.rng = rng;
        self.prepared = true;

        log::debug!(
            "prepared model: {} documents, {} terms, k = {}",
            self.docs.len(),
            v,
            self.k
        );
        Ok(())
    }

    /// Run `iterations` training epochs.
    ///
    /// `num_workers` bounds the parallel samplers; 0 means one per
    /// available thread. Worker generators are seeded from the model
    /// generator, so a fixed seed and worker count reproduce the same
    /// trajectory.
    ///
    /// # Errors
    /// [`TrainingError`] on a numerical failure inside a worker; the epoch
    /// is discarded and the global state stays at the last merge boundary.
    pub fn train(
        &mut self,
        iterations: usize,
        num_workers: usize,
    ) -> Result<(), TrainingError> {
        if !self.prepared {
            return Err(TrainingError::NotPrepared);
        }
        let workers = if num_workers == 0 {
            rayon::current_num_threads().max(1)
        } else {
            num_workers
        };
        let mut locals = vec![self.global.clone(); workers];
        let mut rngs: Vec<Xoshiro256Plus> = (0..workers)
            .map(|_| Xoshiro256Plus::seed_from_u64(self.rng.gen()))
            .collect();

        log::debug!(
            "training {} epochs over {} documents with {} workers",
            iterations,
            self.docs.len(),
            workers
        );
        for _ in 0..iterations {
            self.train_once(&mut locals, &mut rngs)?;
        }
        Ok(())
    }

    /// One epoch: parallel sampling, the global hook, the merge, and the
    /// optimiser when due.
    fn train_once(
        &mut self,
        locals: &mut [ModelState],
        rngs: &mut [Xoshiro256Plus],
    ) -> Result<(), TrainingError> {
        let mut docs = std::mem::take(&mut self.docs);
        let result = self.sample_epoch(&mut docs, locals, rngs);
        self.docs = docs;
        result?;

        self.update_global(locals);
        self.global
            .merge_locals(locals, !self.term_weight.is_uniform());

        if self.iterated >= self.burn_in
            && self.optim_interval != 0
            && (self.iterated + 1) % self.optim_interval == 0
            && !self.docs.is_empty()
        {
            self.optimize_alpha();
            log::debug!(
                "optimised alpha after epoch {}: sum = {:.5}",
                self.iterated + 1,
                self.alphas.iter().sum::<f64>()
            );
        }
        self.iterated += 1;
        Ok(())
    }

    /// Sample every document exactly once.
    ///
    /// The document index space splits into `min(8W, D)` interleaved
    /// stripes; worker `w` owns stripes `w, w + W, …` and visits each
    /// stripe's documents in an order shuffled by its own generator. Write
    /// sets are disjoint, so workers run lock-free against their local
    /// states. All workers are drained before any error is surfaced.
    pub(crate) fn sample_epoch(
        &self,
        docs: &mut [Document],
        locals: &mut [ModelState],
        rngs: &mut [Xoshiro256Plus],
    ) -> Result<(), TrainingError> {
        if docs.is_empty() {
            return Ok(());
        }
        let workers = locals.len();
        let chunks = (STRIPES_PER_WORKER * workers).min(docs.len());

        let mut stripes: Vec<Vec<&mut Document>> =
            (0..chunks).map(|_| Vec::new()).collect();
        for row in docs.chunks_mut(chunks) {
            for (s, doc) in row.iter_mut().enumerate() {
                stripes[s].push(doc);
            }
        }
        let mut bins: Vec<Vec<Vec<&mut Document>>> =
            (0..workers).map(|_| Vec::new()).collect();
        for (s, stripe) in stripes.into_iter().enumerate() {
            bins[s % workers].push(stripe);
        }

        let results: Vec<Result<(), TrainingError>> = locals
            .par_iter_mut()
            .zip_eq(rngs.par_iter_mut())
            .zip_eq(bins.into_par_iter())
            .map(|((local, rng), bin)| {
                for mut stripe in bin {
                    stripe.shuffle(rng);
                    for doc in stripe {
                        self.sample_document(doc, local, rng)?;
                    }
                }
                Ok(())
            })
            .collect();
        results.into_iter().collect()
    }

    /// Allocate a document's sampler state and play its tokens into
    /// `state` under uniformly random assignments.
    pub(crate) fn init_doc_state<R: Rng>(
        &self,
        doc: &mut Document,
        state: &mut ModelState,
        rng: &mut R,
    ) {
        let bound = self.vocab.len();
        doc.z = vec![0; doc.words.len()];
        doc.ndk = vec![0.0; self.k];
        doc.weights = token_weights(
            self.term_weight,
            &self.vocab_weights,
            &doc.words,
            bound,
        );
        doc.weight_sum = 0.0;
        for i in 0..doc.words.len() {
            let vid = doc.words[i];
            if vid >= bound {
                continue;
            }
            let tid = rng.gen_range(0..self.k);
            doc.z[i] = tid;
            let weight = doc.weight_at(i);
            add_word(doc, state, tid, vid, weight);
            doc.weight_sum += weight;
        }
    }

    /// Number of topics
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// The initial symmetric concentration α₀
    #[must_use]
    pub fn alpha0(&self) -> f64 {
        self.alpha0
    }

    /// The live per-topic concentration vector
    #[must_use]
    pub fn alphas(&self) -> &[f64] {
        &self.alphas
    }

    /// The topic-word concentration η
    #[must_use]
    pub fn eta(&self) -> f64 {
        self.eta
    }

    /// The term-weighting scheme fixed at construction
    #[must_use]
    pub fn term_weight(&self) -> TermWeight {
        self.term_weight
    }

    #[must_use]
    pub fn optim_interval(&self) -> usize {
        self.optim_interval
    }

    #[must_use]
    pub fn burn_in(&self) -> usize {
        self.burn_in
    }

    /// Epochs run so far
    #[must_use]
    pub fn iterations_run(&self) -> usize {
        self.iterated
    }

    /// The seed the model was constructed with
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    /// Total token positions across the corpus, including OOV ones
    #[must_use]
    pub fn num_words(&self) -> usize {
        self.docs.iter().map(Document::len).sum()
    }

    /// The interning vocabulary
    #[must_use]
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// The training documents
    #[must_use]
    pub fn docs(&self) -> &[Document] {
        &self.docs
    }

    /// The global sufficient statistics
    #[must_use]
    pub fn global_state(&self) -> &ModelState {
        &self.global
    }

    /// Raw token counts per topic, from the assignments alone.
    ///
    /// Weighting never enters here; every in-vocabulary token counts 1.
    #[must_use]
    pub fn count_by_topic(&self) -> Vec<usize> {
        let bound = self.vocab.len();
        let mut counts = vec![0; self.k];
        for doc in &self.docs {
            for (&vid, &tid) in doc.words.iter().zip(doc.z.iter()) {
                if vid < bound {
                    counts[tid] += 1;
                }
            }
        }
        counts
    }

    /// The posterior topic mixture of `doc`:
    /// `(ndk[k] + α[k]) / (|doc| + Σα)`
    #[must_use]
    pub fn topics_by_doc(&self, doc: &Document) -> Vec<f64> {
        let s_alpha: f64 = self.alphas.iter().sum();
        let denom = doc.weight_sum() + s_alpha;
        (0..self.k)
            .map(|t| {
                let ndk = doc.topic_counts().get(t).copied().unwrap_or(0.0);
                (ndk + self.alphas[t]) / denom
            })
            .collect()
    }

    /// The word distribution of topic `tid`:
    /// `(nkv[k,v] + η) / (nk[k] + V·η)`
    ///
    /// # Errors
    /// [`ModelError`] when `tid ≥ K` or the model is unprepared.
    pub fn words_by_topic(&self, tid: usize) -> Result<Vec<f64>, ModelError> {
        if tid >= self.k {
            return Err(ModelError::TopicIndexOutOfBounds { tid, k: self.k });
        }
        if !self.prepared {
            return Err(ModelError::NotPrepared);
        }
        let v = self.vocab.len();
        let denom = self.global.topic_totals()[tid] + v as f64 * self.eta;
        Ok((0..v)
            .map(|w| (self.global.count(tid, w) + self.eta) / denom)
            .collect())
    }

    /// The `n` most probable terms of topic `tid` with their probabilities.
    ///
    /// # Errors
    /// [`ModelError`] when `tid ≥ K` or the model is unprepared.
    pub fn top_words_of_topic(
        &self,
        tid: usize,
        n: usize,
    ) -> Result<Vec<(&str, f64)>, ModelError> {
        let probs = self.words_by_topic(tid)?;
        let mut ranked: Vec<(usize, f64)> =
            probs.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(n);
        Ok(ranked
            .into_iter()
            .map(|(v, p)| (self.vocab.token(v).unwrap_or(""), p))
            .collect())
    }

    pub(crate) fn is_prepared(&self) -> bool {
        self.prepared
    }
}

impl GibbsSampler for LdaModel {
    fn num_topics(&self) -> usize {
        self.k
    }

    fn vocab_bound(&self) -> usize {
        self.vocab.len()
    }

    /// The standard collapsed conditional,
    /// `p[k] ∝ (ndk[k] + α[k]) · (nkv[k,v] + η) / (nk[k] + V·η)`,
    /// accumulated in place into its prefix sum.
    fn z_likelihoods(
        &self,
        state: &mut ModelState,
        doc: &Document,
        vid: usize,
    ) {
        let veta = self.vocab.len() as f64 * self.eta;
        let (nk, col, scratch) = state.conditional_parts(vid);
        for t in 0..self.k {
            scratch[t] = (doc.topic_counts()[t] + self.alphas[t])
                * (col[t] + self.eta)
                / (nk[t] + veta);
        }
        prefix_sum(scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1E-9;

    fn tiny_model(tw: TermWeight, seed: u64) -> LdaModel {
        let mut model = LdaModel::new(2, 0.1, 0.01, tw, seed).unwrap();
        model.add_doc(&["a", "b", "a"]).unwrap();
        model.add_doc(&["b", "c", "b"]).unwrap();
        model.prepare().unwrap();
        model
    }

    #[test]
    fn zero_topics_is_a_config_error() {
        let err =
            LdaModel::new(0, 0.1, 0.01, TermWeight::Uniform, 0).unwrap_err();
        assert_eq!(err, ConfigError::ZeroTopics);
    }

    #[test]
    fn non_positive_concentrations_are_config_errors() {
        let err =
            LdaModel::new(2, 0.0, 0.01, TermWeight::Uniform, 0).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveAlpha { .. }));

        let err =
            LdaModel::new(2, 0.1, -1.0, TermWeight::Uniform, 0).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveEta { .. }));

        let err = LdaModel::new(2, f64::NAN, 0.01, TermWeight::Uniform, 0)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveAlpha { .. }));
    }

    #[test]
    fn add_doc_after_prepare_is_a_shape_error() {
        let mut model = tiny_model(TermWeight::Uniform, 1);
        let err = model.add_doc(&["d"]).unwrap_err();
        assert_eq!(err, ModelError::AlreadyPrepared);
    }

    #[test]
    fn prepare_twice_is_a_shape_error() {
        let mut model = tiny_model(TermWeight::Uniform, 1);
        assert_eq!(model.prepare().unwrap_err(), ModelError::AlreadyPrepared);
    }

    #[test]
    fn train_before_prepare_is_a_training_error() {
        let mut model =
            LdaModel::new(2, 0.1, 0.01, TermWeight::Uniform, 1).unwrap();
        assert_eq!(
            model.train(1, 1).unwrap_err(),
            TrainingError::NotPrepared
        );
    }

    #[test]
    fn out_of_range_topic_queries_error() {
        let model = tiny_model(TermWeight::Uniform, 1);
        let err = model.words_by_topic(2).unwrap_err();
        assert_eq!(err, ModelError::TopicIndexOutOfBounds { tid: 2, k: 2 });
        assert!(model.top_words_of_topic(9, 3).is_err());
    }

    #[test]
    fn prepare_builds_consistent_counts() {
        let model = tiny_model(TermWeight::Uniform, 42);

        // every z in range, ndk consistent with z
        for doc in model.docs() {
            assert!(doc.z().iter().all(|&t| t < model.k()));
            let mut ndk = vec![0.0; model.k()];
            for (&vid, &tid) in doc.words().iter().zip(doc.z().iter()) {
                if vid < model.vocab().len() {
                    ndk[tid] += 1.0;
                }
            }
            for t in 0..model.k() {
                assert::close(doc.topic_counts()[t], ndk[t], TOL);
            }
            assert::close(
                doc.topic_counts().iter().sum::<f64>(),
                doc.weight_sum(),
                TOL,
            );
        }

        // global consistency: nk == Σ_d ndk == Σ_v nkv
        let global = model.global_state();
        for t in 0..model.k() {
            let from_docs: f64 =
                model.docs().iter().map(|d| d.topic_counts()[t]).sum();
            let from_words: f64 = (0..model.vocab().len())
                .map(|v| global.count(t, v))
                .sum();
            assert::close(global.topic_totals()[t], from_docs, TOL);
            assert::close(global.topic_totals()[t], from_words, TOL);
        }
    }

    #[test]
    fn single_worker_training_is_deterministic() {
        let mut a = tiny_model(TermWeight::Uniform, 9);
        let mut b = tiny_model(TermWeight::Uniform, 9);
        a.train(25, 1).unwrap();
        b.train(25, 1).unwrap();

        for (da, db) in a.docs().iter().zip(b.docs().iter()) {
            assert_eq!(da.z(), db.z());
        }
        assert::close(a.log_likelihood(), b.log_likelihood(), TOL);
    }

    #[test]
    fn training_advances_the_epoch_counter() {
        let mut model = tiny_model(TermWeight::Uniform, 5);
        assert_eq!(model.iterations_run(), 0);
        model.train(7, 1).unwrap();
        assert_eq!(model.iterations_run(), 7);
    }

    #[test]
    fn count_by_topic_counts_raw_tokens() {
        let mut model = tiny_model(TermWeight::Idf, 3);
        model.train(10, 1).unwrap();
        let counts = model.count_by_topic();
        assert_eq!(counts.iter().sum::<usize>(), 6);
    }

    #[test]
    fn topics_by_doc_is_a_probability_vector() {
        let mut model = tiny_model(TermWeight::Uniform, 8);
        model.train(10, 1).unwrap();
        for doc in model.docs() {
            let theta = model.topics_by_doc(doc);
            assert_eq!(theta.len(), 2);
            assert!(theta.iter().all(|&p| p > 0.0));
            assert::close(theta.iter().sum::<f64>(), 1.0, TOL);
        }
    }

    #[test]
    fn words_by_topic_is_a_probability_vector() {
        let mut model = tiny_model(TermWeight::Uniform, 8);
        model.train(10, 1).unwrap();
        for t in 0..model.k() {
            let phi = model.words_by_topic(t).unwrap();
            assert_eq!(phi.len(), 3);
            assert!(phi.iter().all(|&p| p > 0.0));
            assert::close(phi.iter().sum::<f64>(), 1.0, TOL);
        }
    }

    #[test]
    fn top_words_rank_by_probability() {
        let mut model = tiny_model(TermWeight::Uniform, 8);
        model.train(10, 1).unwrap();
        let top = model.top_words_of_topic(0, 3).unwrap();
        assert_eq!(top.len(), 3);
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn make_doc_maps_through_the_frozen_vocabulary() {
        let model = tiny_model(TermWeight::Uniform, 2);
        let doc = model.make_doc(&["a", "z", "c"]);
        assert_eq!(doc.words(), &[0, 3, 2]);
    }
}
