use anyhow::Result;
use clap::{Parser, Subcommand};
use poisk_core::analyzer::RussianAnalyzer;
use poisk_core::boolean;
use poisk_core::persist::{self, DataPaths};
use poisk_core::vector::VectorIndex;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Query the built index interactively", long_about = None)]
struct Cli {
    /// Data directory the indexer wrote its outputs into
    #[arg(long, default_value = ".")]
    data: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exact boolean search over the inverted index
    Boolean,
    /// Ranked cosine-similarity search over the TF-IDF tables
    Vector,
}

const EXIT_KEYWORD: &str = "exit";

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let paths = DataPaths::new(&cli.data);

    match cli.command {
        Commands::Boolean => run_boolean(&paths),
        Commands::Vector => run_vector(&paths),
    }
}

/// Read queries line by line until EOF or the exit keyword.
fn prompt_lines(mut handle: impl FnMut(&str)) -> Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.eq_ignore_ascii_case(EXIT_KEYWORD) {
            break;
        }
        handle(query);
    }
    Ok(())
}

fn run_boolean(paths: &DataPaths) -> Result<()> {
    let index = persist::load_index(paths)?;
    tracing::info!(terms = index.term_count(), "inverted index loaded");
    println!("Boolean search; operators И/AND, ИЛИ/OR, НЕ/NOT; '{EXIT_KEYWORD}' to quit.");

    prompt_lines(|query| {
        let ids = boolean::search(query, &index);
        if ids.is_empty() {
            println!("no results found");
        } else {
            println!("Found in documents: {}", ids.join(", "));
        }
    })
}

fn run_vector(paths: &DataPaths) -> Result<()> {
    let index = VectorIndex::load(paths)?;
    let analyzer = RussianAnalyzer::new();
    tracing::info!(docs = index.doc_count(), "tf-idf tables loaded");
    println!("Vector search; '{EXIT_KEYWORD}' to quit.");

    prompt_lines(|query| {
        let hits = index.search(query, &analyzer);
        if hits.is_empty() {
            println!("no results found");
            return;
        }
        println!("Score    | Doc | URL");
        println!("---------------------------");
        for (doc_id, score) in hits {
            let url = index.url(&doc_id).unwrap_or("-");
            println!("{score:.6} | {doc_id:>3} | {url}");
        }
    })
}
