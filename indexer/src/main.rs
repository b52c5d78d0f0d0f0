use anyhow::Result;
use clap::{Parser, Subcommand};
use poisk_core::analyzer::{Analyzer, RussianAnalyzer};
use poisk_core::corpus::{self, Corpus};
use poisk_core::persist::{self, DataPaths};
use poisk_core::stats::CorpusStats;
use poisk_core::InvertedIndex;
use std::fs;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the inverted index and TF-IDF tables", long_about = None)]
struct Cli {
    /// Data directory holding pages/, processed_pages/ and the build outputs
    #[arg(long, default_value = ".")]
    data: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize raw pages into processed_pages/
    Normalize,
    /// Build the inverted index from the processed pages
    Index,
    /// Build the TF, IDF and TF-IDF tables from the processed pages
    Stats,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let paths = DataPaths::new(&cli.data);
    let analyzer = RussianAnalyzer::new();

    match cli.command {
        Commands::Normalize => normalize(&paths, &analyzer),
        Commands::Index => build_index(&paths, &analyzer),
        Commands::Stats => build_stats(&paths, &analyzer),
    }
}

fn normalize(paths: &DataPaths, analyzer: &dyn Analyzer) -> Result<()> {
    let out_dir = paths.processed_dir();
    fs::create_dir_all(&out_dir)?;

    let mut processed = 0usize;
    for path in corpus::list_text_files(&paths.pages_dir())? {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let text = fs::read_to_string(&path)?;
        let terms = analyzer.analyze(&text);
        fs::write(out_dir.join(format!("processed_{name}")), terms.join(" "))?;
        processed += 1;
        tracing::info!(file = name, terms = terms.len(), "page normalized");
    }
    tracing::info!(processed, out = %out_dir.display(), "normalization complete");
    Ok(())
}

fn build_index(paths: &DataPaths, analyzer: &dyn Analyzer) -> Result<()> {
    let corpus = Corpus::load(&paths.processed_dir(), analyzer)?;
    let index = InvertedIndex::build(&corpus);
    persist::save_index(paths, &index)?;
    tracing::info!(
        terms = index.term_count(),
        docs = corpus.total_docs(),
        out = %paths.index_file().display(),
        "index build complete"
    );
    Ok(())
}

fn build_stats(paths: &DataPaths, analyzer: &dyn Analyzer) -> Result<()> {
    let corpus = Corpus::load(&paths.processed_dir(), analyzer)?;
    let stats = CorpusStats::build(&corpus);
    let weights = stats.weights();
    persist::save_weights(paths, &weights)?;
    tracing::info!(
        terms = weights.idf.len(),
        docs = weights.doc_ids.len(),
        out = %paths.root.display(),
        "tf, idf and tfidf tables written"
    );
    Ok(())
}
