use crate::analyzer::Analyzer;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub type DocId = String;

/// One normalized document. Built once from the on-disk corpus and never
/// mutated; a corpus change requires a full rebuild.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub terms: Vec<String>,
    pub counts: HashMap<String, u32>,
    pub len: usize,
}

impl Document {
    pub fn new(id: impl Into<DocId>, terms: Vec<String>) -> Self {
        let mut counts: HashMap<String, u32> = HashMap::new();
        for term in &terms {
            *counts.entry(term.clone()).or_insert(0) += 1;
        }
        let len = terms.len();
        Self {
            id: id.into(),
            terms,
            counts,
            len,
        }
    }
}

/// The fixed document set the index and the statistics tables are built
/// over. Documents are kept in sorted-filename order so repeated builds
/// are byte-identical regardless of filesystem enumeration order.
#[derive(Debug, Default)]
pub struct Corpus {
    pub docs: Vec<Document>,
}

impl Corpus {
    /// Load every `.txt` file under `dir`, extracting each document id from
    /// its file name and its terms through `analyzer`. Any malformed file
    /// name or unreadable file aborts the whole load.
    pub fn load(dir: &Path, analyzer: &dyn Analyzer) -> Result<Corpus> {
        let mut docs = Vec::new();
        for path in list_text_files(dir)? {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| Error::MalformedFilename {
                    name: path.display().to_string(),
                })?;
            let id = doc_id_from_filename(name)?;
            let text = fs::read_to_string(&path)?;
            docs.push(Document::new(id, analyzer.analyze(&text)));
        }
        tracing::debug!(docs = docs.len(), dir = %dir.display(), "corpus loaded");
        Ok(Corpus { docs })
    }

    pub fn total_docs(&self) -> usize {
        self.docs.len()
    }
}

/// Flat listing of the `.txt` files in `dir`, sorted by file name.
pub fn list_text_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("txt") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Document ids are encoded as the third underscore-delimited segment of
/// the file name, before the extension: `processed_page_<id>.txt`. The
/// segment must be a decimal number.
pub fn doc_id_from_filename(name: &str) -> Result<DocId> {
    let malformed = || Error::MalformedFilename {
        name: name.to_string(),
    };
    let segment = name.split('_').nth(2).ok_or_else(malformed)?;
    let id = segment.split('.').next().ok_or_else(malformed)?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed());
    }
    Ok(id.to_string())
}

/// Sort key for the numeric document-id order used by the persisted
/// column sets and query results.
pub fn doc_order_key(id: &str) -> u64 {
    id.parse().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_processed_page_name() {
        assert_eq!(doc_id_from_filename("processed_page_17.txt").unwrap(), "17");
        assert_eq!(doc_id_from_filename("processed_page_3.txt").unwrap(), "3");
    }

    #[test]
    fn rejects_names_without_an_id_segment() {
        assert!(doc_id_from_filename("page_1.txt").is_err());
        assert!(doc_id_from_filename("notes.txt").is_err());
        assert!(doc_id_from_filename("processed_page_.txt").is_err());
        assert!(doc_id_from_filename("processed_page_abc.txt").is_err());
    }

    #[test]
    fn numeric_order_differs_from_lexicographic() {
        let mut ids = vec!["10".to_string(), "2".to_string(), "1".to_string()];
        ids.sort_by_key(|id| doc_order_key(id));
        assert_eq!(ids, vec!["1", "2", "10"]);
    }

    #[test]
    fn document_counts_and_length() {
        let doc = Document::new("1", vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(doc.len, 3);
        assert_eq!(doc.counts["a"], 2);
        assert_eq!(doc.counts["b"], 1);
    }
}
