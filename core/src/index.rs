use crate::corpus::{Corpus, DocId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Term → posting list over the whole corpus. Terms iterate in sorted
/// order; each posting list keeps first-seen membership order (corpus
/// order), which is not numeric order.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Vec<DocId>>,
}

impl InvertedIndex {
    /// Build the index from a loaded corpus. Duplicate occurrences of a
    /// term within one document collapse to a single membership.
    pub fn build(corpus: &Corpus) -> Self {
        let mut postings: BTreeMap<String, Vec<DocId>> = BTreeMap::new();
        for doc in &corpus.docs {
            let mut seen: HashSet<&str> = HashSet::new();
            for term in &doc.terms {
                if seen.insert(term) {
                    postings.entry(term.clone()).or_default().push(doc.id.clone());
                }
            }
        }
        tracing::info!(
            terms = postings.len(),
            docs = corpus.total_docs(),
            "inverted index built"
        );
        Self { postings }
    }

    /// Posting list for `term`; a term absent from the index has an
    /// implicitly empty posting list.
    pub fn postings(&self, term: &str) -> &[DocId] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every document id appearing anywhere in the index.
    pub fn universe(&self) -> BTreeSet<DocId> {
        self.postings.values().flatten().cloned().collect()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }
}
