//! Re-imports for convenience
//!
//! ```rust
//! use ldagibbs::prelude::*;
//! ```
#[doc(no_inline)]
pub use crate::data::{Document, Vocabulary};
#[doc(no_inline)]
pub use crate::model::{
    ConfigError, GibbsSampler, LdaModel, ModelError, TrainingError,
};
#[doc(no_inline)]
pub use crate::state::ModelState;
#[doc(no_inline)]
pub use crate::weights::TermWeight;
