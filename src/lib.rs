//! Latent Dirichlet Allocation by parallel collapsed Gibbs sampling
//!
//! This crate trains LDA topic models with the collapsed Gibbs sampler of
//! Blei, Ng & Jordan (2003): the topic mixtures θ and word distributions φ
//! are integrated out analytically, and only the per-token topic assignments
//! are sampled. Training epochs run on a worker pool using the approximate
//! distributed scheme of Newman, Asuncion, Smyth & Welling (2009): workers
//! sample against thread-local copies of the sufficient statistics, and a
//! merge step folds the per-worker deltas back into the global state at
//! every epoch boundary.
//!
//! Sufficient statistics may be re-weighted per token with the IDF or PMI
//! schemes of Wilson & Chew (2010), and the document-topic concentration
//! vector α can be optimised with Minka's fixed-point iteration.
//!
//! # Example
//!
//! ```
//! use ldagibbs::prelude::*;
//!
//! let mut model = LdaModel::new(2, 0.1, 0.01, TermWeight::Uniform, 1337).unwrap();
//! model.add_doc(&["wine", "grape", "wine", "cellar"]).unwrap();
//! model.add_doc(&["ale", "hops", "ale", "barley"]).unwrap();
//! model.add_doc(&["wine", "cellar", "grape"]).unwrap();
//!
//! model.prepare().unwrap();
//! model.train(50, 1).unwrap();
//!
//! let ll = model.log_likelihood();
//! assert!(ll.is_finite());
//!
//! // Per-topic word distributions sum to one.
//! let words = model.words_by_topic(0).unwrap();
//! assert!((words.iter().sum::<f64>() - 1.0).abs() < 1e-9);
//! ```

pub mod consts;
pub mod data;
pub mod misc;
pub mod model;
pub mod prelude;
pub mod state;
pub mod weights;
