//! On-disk layout and the file-format contracts shared by the build and
//! query sides. All writes are full overwrites except the doc-id→URL map,
//! which is append-only.

use crate::corpus::DocId;
use crate::error::{Error, Result};
use crate::index::InvertedIndex;
use crate::stats::Weights;
use std::collections::{BTreeMap, HashMap};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
    pub fn pages_dir(&self) -> PathBuf {
        self.root.join("pages")
    }
    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed_pages")
    }
    pub fn index_file(&self) -> PathBuf {
        self.root.join("inverted_index.json")
    }
    pub fn tf_file(&self) -> PathBuf {
        self.root.join("tf.csv")
    }
    pub fn idf_file(&self) -> PathBuf {
        self.root.join("idf.csv")
    }
    pub fn tfidf_file(&self) -> PathBuf {
        self.root.join("tfidf.csv")
    }
    pub fn url_map_file(&self) -> PathBuf {
        self.root.join("index.txt")
    }
}

/// Write the inverted index as one JSON object, term → posting list,
/// sorted by term key.
pub fn save_index(paths: &DataPaths, index: &InvertedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = BufWriter::new(File::create(paths.index_file())?);
    serde_json::to_writer_pretty(&mut f, index)?;
    f.flush()?;
    Ok(())
}

pub fn load_index(paths: &DataPaths) -> Result<InvertedIndex> {
    let path = paths.index_file();
    if !path.exists() {
        return Err(Error::MissingIndex { path });
    }
    let f = BufReader::new(File::open(&path)?);
    let index = serde_json::from_reader(f)?;
    Ok(index)
}

/// Persist the TF, IDF and TF-IDF tables. The TF and TF-IDF tables are
/// dense over the numeric-sorted doc-id column set with `%.6f` cells;
/// rows are term-sorted.
pub fn save_weights(paths: &DataPaths, weights: &Weights) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_weight_table(&paths.tf_file(), &weights.tf, &weights.doc_ids)?;
    write_weight_table(&paths.tfidf_file(), &weights.tfidf, &weights.doc_ids)?;
    write_idf(&paths.idf_file(), &weights.idf)?;
    Ok(())
}

fn write_weight_table(
    path: &Path,
    table: &BTreeMap<String, HashMap<DocId, f64>>,
    doc_ids: &[DocId],
) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    write!(f, "Term")?;
    for id in doc_ids {
        write!(f, ",{id}")?;
    }
    writeln!(f)?;
    for (term, row) in table {
        write!(f, "{term}")?;
        for id in doc_ids {
            let weight = row.get(id).copied().unwrap_or(0.0);
            write!(f, ",{weight:.6}")?;
        }
        writeln!(f)?;
    }
    f.flush()?;
    Ok(())
}

fn write_idf(path: &Path, idf: &BTreeMap<String, f64>) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    writeln!(f, "Term,IDF")?;
    for (term, weight) in idf {
        writeln!(f, "{term},{weight:.6}")?;
    }
    f.flush()?;
    Ok(())
}

pub fn load_idf(paths: &DataPaths) -> Result<BTreeMap<String, f64>> {
    let path = paths.idf_file();
    if !path.exists() {
        return Err(Error::MissingStats { path });
    }
    let file_name = display_name(&path);
    let mut idf = BTreeMap::new();
    for (line_no, line) in BufReader::new(File::open(&path)?).lines().enumerate() {
        let line = line?;
        if line_no == 0 {
            continue;
        }
        let (term, weight) = line.split_once(',').ok_or_else(|| Error::ParseRow {
            file: file_name.clone(),
            line: line_no + 1,
            reason: "expected `term,idf`".into(),
        })?;
        let weight: f64 = weight.parse().map_err(|_| Error::ParseRow {
            file: file_name.clone(),
            line: line_no + 1,
            reason: format!("bad idf value {weight:?}"),
        })?;
        idf.insert(term.to_string(), weight);
    }
    Ok(idf)
}

/// Read the TF-IDF table back as sparse per-document vectors, keeping
/// only strictly positive cells. Documents come back in column order.
pub fn load_doc_vectors(paths: &DataPaths) -> Result<Vec<(DocId, HashMap<String, f64>)>> {
    let path = paths.tfidf_file();
    if !path.exists() {
        return Err(Error::MissingStats { path });
    }
    let file_name = display_name(&path);
    let mut lines = BufReader::new(File::open(&path)?).lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => return Ok(Vec::new()),
    };
    let mut docs: Vec<(DocId, HashMap<String, f64>)> = header
        .split(',')
        .skip(1)
        .map(|id| (id.to_string(), HashMap::new()))
        .collect();

    for (line_no, line) in lines.enumerate() {
        let line = line?;
        let mut fields = line.split(',');
        let term = fields.next().unwrap_or_default();
        let mut cells = 0;
        for (slot, cell) in fields.enumerate() {
            let weight: f64 = cell.parse().map_err(|_| Error::ParseRow {
                file: file_name.clone(),
                line: line_no + 2,
                reason: format!("bad weight {cell:?}"),
            })?;
            if slot >= docs.len() {
                return Err(Error::ParseRow {
                    file: file_name.clone(),
                    line: line_no + 2,
                    reason: "more cells than document columns".into(),
                });
            }
            if weight > 0.0 {
                docs[slot].1.insert(term.to_string(), weight);
            }
            cells += 1;
        }
        if cells != docs.len() {
            return Err(Error::ParseRow {
                file: file_name.clone(),
                line: line_no + 2,
                reason: format!("expected {} cells, found {cells}", docs.len()),
            });
        }
    }
    Ok(docs)
}

/// Append one accepted document to the doc-id→URL map.
pub fn append_url(paths: &DataPaths, doc_id: &str, url: &str) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths.url_map_file())?;
    writeln!(f, "{doc_id}\t{url}")?;
    Ok(())
}

pub fn load_url_map(paths: &DataPaths) -> Result<HashMap<DocId, String>> {
    let path = paths.url_map_file();
    if !path.exists() {
        return Err(Error::MissingStats { path });
    }
    let file_name = display_name(&path);
    let mut map = HashMap::new();
    for (line_no, line) in BufReader::new(File::open(&path)?).lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let (doc_id, url) = line.split_once('\t').ok_or_else(|| Error::ParseRow {
            file: file_name.clone(),
            line: line_no + 1,
            reason: "expected `doc_id<TAB>url`".into(),
        })?;
        map.insert(doc_id.to_string(), url.to_string());
    }
    Ok(map)
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Corpus, Document};
    use crate::stats::CorpusStats;
    use std::fs;
    use tempfile::tempdir;

    fn corpus() -> Corpus {
        Corpus {
            docs: vec![
                Document::new("1", vec!["кот".into(), "пес".into()]),
                Document::new("2", vec!["пес".into()]),
            ],
        }
    }

    #[test]
    fn index_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        let index = InvertedIndex::build(&corpus());
        save_index(&paths, &index).unwrap();

        let loaded = load_index(&paths).unwrap();
        assert_eq!(loaded.postings("кот"), ["1"]);
        assert_eq!(loaded.postings("пес"), ["1", "2"]);
    }

    #[test]
    fn missing_index_is_a_typed_error() {
        let dir = tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        assert!(matches!(
            load_index(&paths),
            Err(Error::MissingIndex { .. })
        ));
        assert!(matches!(load_idf(&paths), Err(Error::MissingStats { .. })));
    }

    #[test]
    fn weight_tables_are_dense_with_six_decimals() {
        let dir = tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        let weights = CorpusStats::build(&corpus()).weights();
        save_weights(&paths, &weights).unwrap();

        let tfidf = fs::read_to_string(paths.tfidf_file()).unwrap();
        let mut lines = tfidf.lines();
        assert_eq!(lines.next().unwrap(), "Term,1,2");
        // "кот" is absent from doc 2: the dense cell is written as zero.
        let kot = lines.find(|l| l.starts_with("кот,")).unwrap();
        assert!(kot.ends_with(",0.000000"));
        for line in tfidf.lines().skip(1) {
            assert_eq!(line.split(',').count(), 3);
        }
    }

    #[test]
    fn idf_file_lists_defined_terms_in_order() {
        let dir = tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        let weights = CorpusStats::build(&corpus()).weights();
        save_weights(&paths, &weights).unwrap();

        let idf = fs::read_to_string(paths.idf_file()).unwrap();
        let lines: Vec<&str> = idf.lines().collect();
        assert_eq!(lines[0], "Term,IDF");
        assert!(lines[1].starts_with("кот,"));
        assert!(lines[2].starts_with("пес,"));

        let loaded = load_idf(&paths).unwrap();
        assert!((loaded["кот"] - 2f64.ln()).abs() < 1e-6);
        assert!(loaded["пес"].abs() < 1e-6);
    }

    #[test]
    fn doc_vectors_keep_only_positive_cells_in_column_order() {
        let dir = tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        let weights = CorpusStats::build(&corpus()).weights();
        save_weights(&paths, &weights).unwrap();

        let docs = load_doc_vectors(&paths).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].0, "1");
        assert_eq!(docs[1].0, "2");
        // "пес" occurs everywhere, so its tf-idf weight is zero and no
        // vector keeps it.
        assert!(docs[0].1.contains_key("кот"));
        assert!(!docs[0].1.contains_key("пес"));
        assert!(docs[1].1.is_empty());
    }

    #[test]
    fn rebuild_writes_identical_bytes() {
        let dir = tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        let weights = CorpusStats::build(&corpus()).weights();

        save_weights(&paths, &weights).unwrap();
        let first = fs::read(paths.tfidf_file()).unwrap();
        save_weights(&paths, &CorpusStats::build(&corpus()).weights()).unwrap();
        let second = fs::read(paths.tfidf_file()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn url_map_appends_and_loads() {
        let dir = tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        append_url(&paths, "1", "https://example.ru/a").unwrap();
        append_url(&paths, "2", "https://example.ru/b").unwrap();

        let map = load_url_map(&paths).unwrap();
        assert_eq!(map["1"], "https://example.ru/a");
        assert_eq!(map["2"], "https://example.ru/b");
    }
}
