//! Minka fixed-point updates for the document-topic concentration
use crate::consts::{MIN_ALPHA, OPTIM_FIXED_POINT_ITERS};
use crate::misc::digamma_sum;
use crate::model::LdaModel;

impl LdaModel {
    /// One optimiser call: ten fixed-point sub-iterations on α.
    ///
    /// Each sub-iteration rescales `α[k]` by the ratio of digamma sums
    ///
    /// ```text
    /// α[k] ← α[k] · Σ_d [ψ(ndk_d[k] + α[k]) − ψ(α[k])]
    ///              / Σ_d [ψ(|d| + Σα) − ψ(Σα)]
    /// ```
    ///
    /// floored at `MIN_ALPHA`. Document lengths are weight sums, so the
    /// update is weighting-aware. η is never optimised.
    pub(crate) fn optimize_alpha(&mut self) {
        let num_docs = self.docs.len();
        for _ in 0..OPTIM_FIXED_POINT_ITERS {
            let s_alpha: f64 = self.alphas.iter().sum();
            let denom = digamma_sum(
                |i| self.docs[i].weight_sum(),
                num_docs,
                s_alpha,
            );
            for t in 0..self.k {
                let alpha_t = self.alphas[t];
                let numer = digamma_sum(
                    |i| self.docs[i].topic_counts()[t],
                    num_docs,
                    alpha_t,
                );
                self.alphas[t] = (alpha_t * numer / denom).max(MIN_ALPHA);
            }
        }
    }
}
