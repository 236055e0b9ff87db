use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// An interning vocabulary with per-term corpus frequencies.
///
/// Tokens are mapped to dense ids `0..V` in first-seen order. The vocabulary
/// tracks, for every term, the number of documents containing it (document
/// frequency) and its total number of occurrences (collection frequency);
/// both feed the IDF and PMI term-weighting schemes.
///
/// # Example
/// ```rust
/// use ldagibbs::data::Vocabulary;
///
/// let mut vocab = Vocabulary::new();
/// let ids = vocab.add_doc_tokens(&["to", "be", "or", "not", "to", "be"]);
///
/// assert_eq!(ids, vec![0, 1, 2, 3, 0, 1]);
/// assert_eq!(vocab.len(), 4);
/// assert_eq!(vocab.cf()[0], 2); // "to" occurs twice
/// assert_eq!(vocab.df()[0], 1); // ... in one document
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Vocabulary {
    /// Distinct tokens in id order
    tokens: Vec<String>,
    /// Reverse map from token to id
    index: HashMap<String, usize>,
    /// Per-term document frequency
    df: Vec<u32>,
    /// Per-term collection frequency
    cf: Vec<u32>,
}

impl Vocabulary {
    /// An empty vocabulary
    #[must_use]
    pub fn new() -> Self {
        Vocabulary {
            tokens: Vec::new(),
            index: HashMap::new(),
            df: Vec::new(),
            cf: Vec::new(),
        }
    }

    /// Number of distinct terms, V
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The token for id `v`, if in range
    #[must_use]
    pub fn token(&self, v: usize) -> Option<&str> {
        self.tokens.get(v).map(String::as_str)
    }

    /// The id for `token`, if interned
    #[must_use]
    pub fn id(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// Per-term document frequencies
    #[must_use]
    pub fn df(&self) -> &[u32] {
        &self.df
    }

    /// Per-term collection frequencies
    #[must_use]
    pub fn cf(&self) -> &[u32] {
        &self.cf
    }

    /// Intern one document's tokens, returning their ids
    ///
    /// Updates collection frequency per occurrence and document frequency
    /// once per distinct term.
    pub fn add_doc_tokens(&mut self, tokens: &[&str]) -> Vec<usize> {
        let ids: Vec<usize> = tokens.iter().map(|t| self.intern(t)).collect();
        for &v in ids.iter().collect::<HashSet<_>>() {
            self.df[v] += 1;
        }
        ids
    }

    /// Map tokens through the vocabulary without growing it
    ///
    /// Unknown tokens map to the out-of-vocabulary sentinel `V`, which the
    /// sampler skips.
    #[must_use]
    pub fn map_tokens(&self, tokens: &[&str]) -> Vec<usize> {
        let oov = self.len();
        tokens
            .iter()
            .map(|t| self.id(t).unwrap_or(oov))
            .collect()
    }

    fn intern(&mut self, token: &str) -> usize {
        if let Some(&v) = self.index.get(token) {
            self.cf[v] += 1;
            v
        } else {
            let v = self.tokens.len();
            self.tokens.push(token.to_owned());
            self.index.insert(token.to_owned(), v);
            self.df.push(0);
            self.cf.push(1);
            v
        }
    }
}
