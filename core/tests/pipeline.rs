use poisk_core::analyzer::RussianAnalyzer;
use poisk_core::persist::{self, DataPaths};
use poisk_core::stats::CorpusStats;
use poisk_core::{boolean, Corpus, Error, InvertedIndex};
use poisk_core::vector::VectorIndex;
use std::fs;
use tempfile::tempdir;

fn write_corpus(paths: &DataPaths, docs: &[(&str, &str)]) {
    let dir = paths.processed_dir();
    fs::create_dir_all(&dir).unwrap();
    for (id, text) in docs {
        fs::write(dir.join(format!("processed_page_{id}.txt")), text).unwrap();
    }
}

#[test]
fn builds_and_queries_end_to_end() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::new(dir.path());
    let analyzer = RussianAnalyzer::new();

    // Boolean terms are case-folded but not stemmed, so the corpus words
    // here are chosen to be fixed points of the stemmer.
    write_corpus(
        &paths,
        &[
            ("1", "цветок цветок цветок снег снег снег снег лес лес лес"),
            ("2", "снег снег снег"),
            ("3", "лес лес мост"),
        ],
    );
    persist::append_url(&paths, "1", "https://example.ru/1").unwrap();
    persist::append_url(&paths, "2", "https://example.ru/2").unwrap();
    persist::append_url(&paths, "3", "https://example.ru/3").unwrap();

    let corpus = Corpus::load(&paths.processed_dir(), &analyzer).unwrap();
    assert_eq!(corpus.total_docs(), 3);

    persist::save_index(&paths, &InvertedIndex::build(&corpus)).unwrap();
    persist::save_weights(&paths, &CorpusStats::build(&corpus).weights()).unwrap();

    // Boolean search over the reloaded index.
    let index = persist::load_index(&paths).unwrap();
    assert_eq!(boolean::search("цветок", &index), ["1"]);
    assert_eq!(boolean::search("снег AND лес", &index), ["1"]);
    assert_eq!(boolean::search("снег ИЛИ лес", &index), ["1", "2", "3"]);
    assert_eq!(boolean::search("НЕ снег", &index), ["3"]);
    assert!(boolean::search("динозавр", &index).is_empty());

    // Vector search over the reloaded tables.
    let vectors = VectorIndex::load(&paths).unwrap();
    let hits = vectors.search("цветок", &analyzer);
    assert!(!hits.is_empty());
    assert_eq!(hits[0].0, "1");
    assert!(hits[0].1 > 0.0);
    assert!(hits.iter().all(|(id, _)| id == "1"));
    assert_eq!(vectors.url("1"), Some("https://example.ru/1"));

    // A multi-term query still ranks the only document holding every
    // term above the partial matches.
    let hits = vectors.search("цветок лес", &analyzer);
    assert_eq!(hits[0].0, "1");
}

#[test]
fn rebuild_from_the_same_corpus_is_byte_identical() {
    let dir_a = tempdir().unwrap();
    let dir_b = tempdir().unwrap();
    let paths_a = DataPaths::new(dir_a.path());
    let paths_b = DataPaths::new(dir_b.path());
    let analyzer = RussianAnalyzer::new();

    let docs = [("1", "кот пес"), ("2", "пес"), ("3", "кот птица")];
    write_corpus(&paths_a, &docs);
    // Write in reverse so the filesystem sees a different creation order.
    let mut reversed = docs;
    reversed.reverse();
    write_corpus(&paths_b, &reversed);

    for paths in [&paths_a, &paths_b] {
        let corpus = Corpus::load(&paths.processed_dir(), &analyzer).unwrap();
        persist::save_index(paths, &InvertedIndex::build(&corpus)).unwrap();
        persist::save_weights(paths, &CorpusStats::build(&corpus).weights()).unwrap();
    }

    for file in ["inverted_index.json", "tf.csv", "idf.csv", "tfidf.csv"] {
        let a = fs::read(dir_a.path().join(file)).unwrap();
        let b = fs::read(dir_b.path().join(file)).unwrap();
        assert_eq!(a, b, "{file} differs between rebuilds");
    }
}

#[test]
fn malformed_filename_aborts_the_build() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::new(dir.path());
    let analyzer = RussianAnalyzer::new();

    write_corpus(&paths, &[("1", "кот")]);
    fs::write(paths.processed_dir().join("stray.txt"), "пес").unwrap();

    let err = Corpus::load(&paths.processed_dir(), &analyzer).unwrap_err();
    assert!(matches!(err, Error::MalformedFilename { .. }));
}

#[test]
fn query_time_missing_files_are_fatal_and_named() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::new(dir.path());
    assert!(matches!(
        persist::load_index(&paths),
        Err(Error::MissingIndex { .. })
    ));
    assert!(matches!(
        VectorIndex::load(&paths),
        Err(Error::MissingStats { .. })
    ));
}
