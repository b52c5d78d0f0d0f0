use crate::corpus::{doc_order_key, Corpus, DocId};
use std::collections::{BTreeMap, HashMap};

/// Raw per-corpus counts: term → per-document occurrence counts, plus
/// document lengths and the document-id column set in numeric order.
#[derive(Debug, Default)]
pub struct CorpusStats {
    term_doc_counts: BTreeMap<String, HashMap<DocId, u32>>,
    doc_lengths: HashMap<DocId, usize>,
    doc_ids: Vec<DocId>,
    total_docs: usize,
}

/// Derived TF, IDF and TF-IDF tables. Sparse in memory: a missing cell
/// is zero. `doc_ids` is the dense column set the tables are persisted
/// against.
#[derive(Debug)]
pub struct Weights {
    pub tf: BTreeMap<String, HashMap<DocId, f64>>,
    pub idf: BTreeMap<String, f64>,
    pub tfidf: BTreeMap<String, HashMap<DocId, f64>>,
    pub doc_ids: Vec<DocId>,
}

impl CorpusStats {
    pub fn build(corpus: &Corpus) -> Self {
        let mut term_doc_counts: BTreeMap<String, HashMap<DocId, u32>> = BTreeMap::new();
        let mut doc_lengths: HashMap<DocId, usize> = HashMap::new();
        let mut doc_ids: Vec<DocId> = Vec::new();

        for doc in &corpus.docs {
            doc_lengths.insert(doc.id.clone(), doc.len);
            doc_ids.push(doc.id.clone());
            for (term, count) in &doc.counts {
                term_doc_counts
                    .entry(term.clone())
                    .or_default()
                    .insert(doc.id.clone(), *count);
            }
        }
        doc_ids.sort_by_key(|id| doc_order_key(id));

        tracing::info!(
            terms = term_doc_counts.len(),
            docs = doc_ids.len(),
            "corpus statistics collected"
        );
        Self {
            term_doc_counts,
            doc_lengths,
            doc_ids,
            total_docs: corpus.total_docs(),
        }
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.term_doc_counts.get(term).map_or(0, HashMap::len)
    }

    pub fn total_docs(&self) -> usize {
        self.total_docs
    }

    pub fn doc_ids(&self) -> &[DocId] {
        &self.doc_ids
    }

    /// `idf(t) = ln(N / df(t))`, defined only for terms observed in the
    /// corpus. The term universe is built from observed terms, so every
    /// entry here has `df ≥ 1`.
    pub fn idf(&self) -> BTreeMap<String, f64> {
        self.term_doc_counts
            .iter()
            .map(|(term, docs)| {
                let idf = (self.total_docs as f64 / docs.len() as f64).ln();
                (term.clone(), idf)
            })
            .collect()
    }

    /// Derive the TF, IDF and TF-IDF tables in one pass.
    /// `tf(t, d) = count(t, d) / length(d)`; a zero-length document is
    /// guarded and contributes no nonzero cell to any row.
    pub fn weights(&self) -> Weights {
        let idf = self.idf();
        let mut tf: BTreeMap<String, HashMap<DocId, f64>> = BTreeMap::new();
        let mut tfidf: BTreeMap<String, HashMap<DocId, f64>> = BTreeMap::new();

        for (term, docs) in &self.term_doc_counts {
            let term_idf = idf[term];
            for (doc_id, count) in docs {
                let len = self.doc_lengths.get(doc_id).copied().unwrap_or(0);
                if len == 0 {
                    continue;
                }
                let tf_value = f64::from(*count) / len as f64;
                tf.entry(term.clone())
                    .or_default()
                    .insert(doc_id.clone(), tf_value);
                tfidf
                    .entry(term.clone())
                    .or_default()
                    .insert(doc_id.clone(), tf_value * term_idf);
            }
        }

        Weights {
            tf,
            idf,
            tfidf,
            doc_ids: self.doc_ids.clone(),
        }
    }
}
