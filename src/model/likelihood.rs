//! The collapsed log-likelihood
use special::Gamma;

use crate::data::Document;
use crate::model::LdaModel;
use crate::state::ModelState;

impl LdaModel {
    /// The document term for one document:
    /// `Σ_k [lnΓ(ndk+αk) − lnΓ(αk)] − [lnΓ(|d|+Σα) − lnΓ(Σα)]`
    pub(crate) fn ll_doc(&self, doc: &Document) -> f64 {
        let s_alpha: f64 = self.alphas().iter().sum();
        let mut ll = -((doc.weight_sum() + s_alpha).ln_gamma().0
            - s_alpha.ln_gamma().0);
        for t in 0..self.k() {
            ll += (doc.topic_counts()[t] + self.alphas()[t]).ln_gamma().0
                - self.alphas()[t].ln_gamma().0;
        }
        ll
    }

    pub(crate) fn ll_docs<'a, I>(&self, docs: I) -> f64
    where
        I: IntoIterator<Item = &'a Document>,
    {
        docs.into_iter().map(|doc| self.ll_doc(doc)).sum()
    }

    /// The topic-word term over a state's count tables.
    ///
    /// Words with a zero count contribute `lnΓ(η) − lnΓ(η) = 0` and are
    /// skipped.
    pub(crate) fn ll_rest(&self, state: &ModelState) -> f64 {
        let v = state.vocab_size();
        let k = self.k();
        let eta = self.eta();
        let veta = v as f64 * eta;
        let lg_eta = eta.ln_gamma().0;

        let mut ll = veta.ln_gamma().0 * k as f64;
        for t in 0..k {
            ll -= (state.topic_totals()[t] + veta).ln_gamma().0;
        }
        for w in 0..v {
            for &count in state.word_counts(w) {
                if count > 0.0 {
                    ll += (count + eta).ln_gamma().0 - lg_eta;
                }
            }
        }
        ll
    }

    /// The collapsed log-likelihood of the training corpus under the
    /// current state; 0 before [`prepare`](LdaModel::prepare).
    #[must_use]
    pub fn log_likelihood(&self) -> f64 {
        if !self.is_prepared() {
            return 0.0;
        }
        self.ll_docs(self.docs()) + self.ll_rest(self.global_state())
    }

    /// `exp(−LL / N)` where N is the corpus weight sum
    #[must_use]
    pub fn perplexity(&self) -> f64 {
        let n: f64 = self.docs().iter().map(Document::weight_sum).sum();
        if n <= 0.0 {
            return f64::INFINITY;
        }
        (-self.log_likelihood() / n).exp()
    }
}
