//! Ranked vector-space search: cosine similarity between a TF-IDF
//! weighted query vector and the per-document TF-IDF vectors.

use crate::analyzer::Analyzer;
use crate::corpus::DocId;
use crate::error::Result;
use crate::persist::{self, DataPaths};
use std::collections::{BTreeMap, HashMap};

/// Everything the vector search needs at query time, loaded once from
/// the persisted tables and immutable afterwards. Concurrent queries
/// against one loaded instance are safe.
pub struct VectorIndex {
    idf: BTreeMap<String, f64>,
    doc_vectors: Vec<(DocId, HashMap<String, f64>)>,
    urls: HashMap<DocId, String>,
}

impl VectorIndex {
    pub fn load(paths: &DataPaths) -> Result<Self> {
        let idf = persist::load_idf(paths)?;
        let doc_vectors = persist::load_doc_vectors(paths)?;
        let urls = persist::load_url_map(paths)?;
        tracing::info!(
            terms = idf.len(),
            docs = doc_vectors.len(),
            "vector index loaded"
        );
        Ok(Self {
            idf,
            doc_vectors,
            urls,
        })
    }

    /// Rank every document with a TF-IDF row against the query. Results
    /// are filtered to strictly positive similarity and sorted by
    /// descending score; ties keep document scan order (the numeric
    /// column order of the TF-IDF table).
    pub fn search(&self, query: &str, analyzer: &dyn Analyzer) -> Vec<(DocId, f64)> {
        let query_vec = query_vector(query, analyzer, &self.idf);
        if query_vec.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<(DocId, f64)> = Vec::new();
        for (doc_id, doc_vec) in &self.doc_vectors {
            let score = cosine(&query_vec, doc_vec);
            if score > 0.0 {
                hits.push((doc_id.clone(), score));
            }
        }
        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        hits
    }

    pub fn url(&self, doc_id: &str) -> Option<&str> {
        self.urls.get(doc_id).map(String::as_str)
    }

    pub fn doc_count(&self) -> usize {
        self.doc_vectors.len()
    }
}

/// Build the ephemeral query vector: `tf = count / query_length` over the
/// analyzed query, weighted by the corpus IDF. Query terms with no IDF
/// entry never occurred in the corpus and are dropped from the vector
/// rather than contributing zero.
pub fn query_vector(
    query: &str,
    analyzer: &dyn Analyzer,
    idf: &BTreeMap<String, f64>,
) -> HashMap<String, f64> {
    let terms = analyzer.analyze(query);
    if terms.is_empty() {
        return HashMap::new();
    }
    let query_len = terms.len() as f64;

    let mut counts: HashMap<&str, u32> = HashMap::new();
    for term in &terms {
        *counts.entry(term).or_insert(0) += 1;
    }

    let mut vector = HashMap::new();
    for (term, count) in counts {
        if let Some(term_idf) = idf.get(term) {
            vector.insert(term.to_string(), f64::from(count) / query_len * term_idf);
        }
    }
    vector
}

/// Cosine similarity between two sparse weight vectors. The dot product
/// sums over the query's term set; each norm is Euclidean over the
/// vector's own term set. Either norm zero means similarity zero.
pub fn cosine(query: &HashMap<String, f64>, doc: &HashMap<String, f64>) -> f64 {
    let dot: f64 = query
        .iter()
        .map(|(term, weight)| weight * doc.get(term).copied().unwrap_or(0.0))
        .sum();
    let query_norm = norm(query);
    let doc_norm = norm(doc);
    if query_norm == 0.0 || doc_norm == 0.0 {
        return 0.0;
    }
    dot / (query_norm * doc_norm)
}

fn norm(vector: &HashMap<String, f64>) -> f64 {
    vector.values().map(|w| w * w).sum::<f64>().sqrt()
}
