//! Term-weighting schemes
//!
//! Under non-uniform weighting every increment and decrement of the
//! sufficient statistics uses a per-token weight instead of a unit count,
//! following Wilson & Chew (2010).
use serde::{Deserialize, Serialize};

use crate::data::Vocabulary;

/// How tokens are weighted in the sufficient statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermWeight {
    /// Every token counts 1
    #[default]
    Uniform,
    /// `ln(D / df)` per term: rare terms carry more mass
    Idf,
    /// Document-local pointwise mutual information, floored at zero
    Pmi,
}

impl TermWeight {
    #[must_use]
    pub fn is_uniform(self) -> bool {
        self == TermWeight::Uniform
    }
}

/// Per-vocabulary weights; empty under uniform weighting.
///
/// IDF stores the final per-term weight. PMI stores the collection
/// probability `cf[v] / Σ cf`, the baseline the per-token weights divide by.
pub(crate) fn vocab_weights(
    tw: TermWeight,
    vocab: &Vocabulary,
    num_docs: usize,
) -> Vec<f64> {
    match tw {
        TermWeight::Uniform => Vec::new(),
        TermWeight::Idf => {
            let d = num_docs as f64;
            vocab
                .df()
                .iter()
                .map(|&df| (d / f64::from(df)).ln())
                .collect()
        }
        TermWeight::Pmi => {
            let total: u64 = vocab.cf().iter().map(|&cf| u64::from(cf)).sum();
            vocab
                .cf()
                .iter()
                .map(|&cf| f64::from(cf) / total as f64)
                .collect()
        }
    }
}

/// Per-position weights for one document; empty under uniform weighting.
///
/// Out-of-vocabulary positions keep weight 1; the sampler never touches
/// them.
pub(crate) fn token_weights(
    tw: TermWeight,
    vw: &[f64],
    words: &[usize],
    bound: usize,
) -> Vec<f64> {
    match tw {
        TermWeight::Uniform => Vec::new(),
        TermWeight::Idf => words
            .iter()
            .map(|&v| if v < bound { vw[v] } else { 1.0 })
            .collect(),
        TermWeight::Pmi => {
            let mut tf = vec![0_u32; bound];
            for &v in words {
                if v < bound {
                    tf[v] += 1;
                }
            }
            let len = words.len() as f64;
            words
                .iter()
                .map(|&v| {
                    if v < bound {
                        (f64::from(tf[v]) / (vw[v] * len)).ln().max(0.0)
                    } else {
                        1.0
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1E-12;

    fn two_doc_vocab() -> Vocabulary {
        let mut vocab = Vocabulary::new();
        vocab.add_doc_tokens(&["a", "b", "a"]);
        vocab.add_doc_tokens(&["b", "c", "b"]);
        vocab
    }

    #[test]
    fn uniform_mode_stores_nothing() {
        let vocab = two_doc_vocab();
        assert!(vocab_weights(TermWeight::Uniform, &vocab, 2).is_empty());
        assert!(token_weights(TermWeight::Uniform, &[], &[0, 1], 3).is_empty());
    }

    #[test]
    fn idf_weight_is_log_d_over_df() {
        let vocab = two_doc_vocab();
        let vw = vocab_weights(TermWeight::Idf, &vocab, 2);

        // "a": df = 1 -> ln(2); "b": df = 2 -> ln(1) = 0; "c": df = 1
        assert::close(vw[0], 2.0_f64.ln(), TOL);
        assert::close(vw[1], 0.0, TOL);
        assert::close(vw[2], 2.0_f64.ln(), TOL);

        let words = vec![0, 1, 0];
        let w = token_weights(TermWeight::Idf, &vw, &words, 3);
        assert::close(w[0], vw[0], TOL);
        assert::close(w[1], vw[1], TOL);
        assert::close(w[2], vw[0], TOL);
    }

    #[test]
    fn pmi_baseline_is_collection_probability() {
        let vocab = two_doc_vocab();
        let vw = vocab_weights(TermWeight::Pmi, &vocab, 2);

        // cf = [2, 3, 1], total 6
        assert::close(vw[0], 2.0 / 6.0, TOL);
        assert::close(vw[1], 3.0 / 6.0, TOL);
        assert::close(vw[2], 1.0 / 6.0, TOL);
    }

    #[test]
    fn pmi_token_weights_are_non_negative_and_document_local() {
        let vocab = two_doc_vocab();
        let vw = vocab_weights(TermWeight::Pmi, &vocab, 2);

        // doc "a a a": tf[a]/ (p(a) * 3) = 3 / (1/3 * 3) = 3 -> ln(3)
        let w = token_weights(TermWeight::Pmi, &vw, &[0, 0, 0], 3);
        assert::close(w[0], 3.0_f64.ln(), TOL);

        // a term at exactly its collection rate gets weight 0, not negative
        // doc "a b c" has tf 1 each; "b" with p = 1/2: ln(1/(0.5*3)) < 0
        let w = token_weights(TermWeight::Pmi, &vw, &[0, 1, 2], 3);
        assert!(w.iter().all(|&x| x >= 0.0));
        assert_eq!(w[1], 0.0);
    }

    #[test]
    fn oov_positions_keep_unit_weight() {
        let vocab = two_doc_vocab();
        let vw = vocab_weights(TermWeight::Idf, &vocab, 2);
        let w = token_weights(TermWeight::Idf, &vw, &[0, 3], 3);
        assert_eq!(w[1], 1.0);

        let vw = vocab_weights(TermWeight::Pmi, &vocab, 2);
        let w = token_weights(TermWeight::Pmi, &vw, &[0, 3], 3);
        assert_eq!(w[1], 1.0);
    }
}
