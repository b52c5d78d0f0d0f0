use anyhow::{anyhow, Result};
use clap::Parser;
use poisk_core::persist::{self, DataPaths};
use reqwest::{header, Client, StatusCode};
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Crawl seed pages into a Russian-text corpus")]
struct Cli {
    /// Seed URLs to start from
    #[arg(required = true)]
    seeds: Vec<String>,
    /// Data directory for pages/ and the doc-id→URL map
    #[arg(long, default_value = ".")]
    data: String,
    /// Stop after this many accepted pages
    #[arg(long, default_value_t = 100)]
    max_pages: usize,
    /// Minimum number of whitespace-separated words for a page to be kept
    #[arg(long, default_value_t = 1000)]
    min_words: usize,
    /// Request timeout seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    /// User-Agent string for robots.txt and page requests
    #[arg(long, default_value = "poisk-crawler/0.1 (+https://example.com/bot)")]
    user_agent: String,
}

/// Transport-level failures, distinguished so each can be logged (or
/// retried) on its own rather than swallowed by a catch-all.
#[derive(Debug, Error)]
enum FetchError {
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),
    #[error("http status {0}")]
    Status(StatusCode),
    #[error("content type {0:?} is not html")]
    NotHtml(String),
    #[error("body exceeds {0} bytes")]
    TooLarge(usize),
}

/// A page that fetched and parsed fine but fails the corpus filters.
#[derive(Debug)]
enum Rejection {
    TooFewWords(usize),
    NotRussian,
}

struct Fetched {
    text: String,
    links: Vec<Url>,
}

#[derive(Debug, Clone, Default)]
struct HostRules {
    disallows: Vec<String>,
    crawl_delay: Option<Duration>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();
    let paths = DataPaths::new(&args.data);
    fs::create_dir_all(paths.pages_dir())?;

    let client = Client::builder()
        .user_agent(args.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;

    let mut frontier: VecDeque<Url> = VecDeque::new();
    for seed in &args.seeds {
        let url = Url::parse(seed)
            .or_else(|_| Url::parse(&format!("https://{seed}")))
            .map_err(|_| anyhow!("invalid seed url {seed:?}"))?;
        frontier.push_back(url);
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut robots: HashMap<String, HostRules> = HashMap::new();
    let mut accepted = 0usize;

    while accepted < args.max_pages {
        let Some(url) = frontier.pop_front() else {
            break;
        };
        if !visited.insert(url.to_string()) {
            continue;
        }

        let rules = host_rules(&client, &mut robots, &url).await;
        if !allowed(&rules, url.path()) {
            tracing::debug!(%url, "disallowed by robots.txt");
            continue;
        }
        if let Some(delay) = rules.crawl_delay {
            sleep(delay).await;
        }

        let Fetched { text, links } = match fetch(&client, &url).await {
            Ok(fetched) => fetched,
            Err(err) => {
                tracing::warn!(%url, %err, "fetch failed");
                continue;
            }
        };
        // Links are followed even from rejected pages; only the page
        // text itself is filtered.
        frontier.extend(links);

        match accept(&text, args.min_words) {
            Ok(()) => {
                accepted += 1;
                let page = paths.pages_dir().join(format!("page_{accepted}.txt"));
                fs::write(&page, &text)?;
                persist::append_url(&paths, &accepted.to_string(), url.as_str())?;
                tracing::info!(%url, page = %page.display(), "page accepted");
            }
            Err(Rejection::TooFewWords(words)) => {
                tracing::debug!(%url, words, "rejected: too short");
            }
            Err(Rejection::NotRussian) => {
                tracing::debug!(%url, "rejected: not enough cyrillic text");
            }
        }
    }

    tracing::info!(accepted, visited = visited.len(), "crawl finished");
    Ok(())
}

async fn fetch(client: &Client, url: &Url) -> std::result::Result<Fetched, FetchError> {
    let resp = client.get(url.clone()).send().await?;
    if !resp.status().is_success() {
        return Err(FetchError::Status(resp.status()));
    }
    if let Some(ct) = resp.headers().get(header::CONTENT_TYPE) {
        let value = ct.to_str().unwrap_or("").to_string();
        if !value.starts_with("text/html") {
            return Err(FetchError::NotHtml(value));
        }
    }
    let bytes = resp.bytes().await?;
    if bytes.len() > MAX_BODY_BYTES {
        return Err(FetchError::TooLarge(MAX_BODY_BYTES));
    }
    let html = String::from_utf8_lossy(&bytes).to_string();
    let doc = Html::parse_document(&html);
    Ok(Fetched {
        text: page_text(&doc),
        links: page_links(&doc, url),
    })
}

/// Visible page text: every text node outside script/style/noscript
/// subtrees, whitespace-trimmed and space-joined.
fn page_text(doc: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in doc.root_element().descendants() {
        if let Some(text) = node.value().as_text() {
            let skipped = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .map_or(false, |e| matches!(e.name(), "script" | "style" | "noscript"))
            });
            let trimmed = text.trim();
            if !skipped && !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
    }
    parts.join(" ")
}

/// Outgoing http(s) links with query and fragment stripped.
fn page_links(doc: &Html, base: &Url) -> Vec<Url> {
    let sel = Selector::parse("a[href]").expect("valid selector");
    let mut links = Vec::new();
    for a in doc.select(&sel) {
        if let Some(href) = a.value().attr("href") {
            if let Ok(mut url) = base.join(href) {
                if matches!(url.scheme(), "http" | "https") {
                    url.set_query(None);
                    url.set_fragment(None);
                    links.push(url);
                }
            }
        }
    }
    links
}

fn accept(text: &str, min_words: usize) -> std::result::Result<(), Rejection> {
    let words = text.split_whitespace().count();
    if words < min_words {
        return Err(Rejection::TooFewWords(words));
    }
    if !is_russian(text) {
        return Err(Rejection::NotRussian);
    }
    Ok(())
}

/// More than half of all characters must be Cyrillic letters.
fn is_russian(text: &str) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return false;
    }
    let cyrillic = text
        .chars()
        .filter(|c| matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё'))
        .count();
    cyrillic * 2 > total
}

async fn host_rules(
    client: &Client,
    cache: &mut HashMap<String, HostRules>,
    url: &Url,
) -> HostRules {
    let Some(host) = url.host_str() else {
        return HostRules::default();
    };
    if let Some(rules) = cache.get(host) {
        return rules.clone();
    }
    let robots_url = format!("{}://{}/robots.txt", url.scheme(), host);
    let txt = match client.get(&robots_url).send().await {
        Ok(resp) if resp.status().is_success() => resp.text().await.unwrap_or_default(),
        _ => String::new(),
    };
    let rules = parse_rules(&txt);
    cache.insert(host.to_string(), rules.clone());
    rules
}

/// Minimal robots.txt parser for the `*` group: disallow prefixes and
/// crawl-delay only.
fn parse_rules(txt: &str) -> HostRules {
    let mut active = false;
    let mut rules = HostRules::default();
    for line in txt.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "user-agent" => active = value == "*",
            "disallow" if active && !value.is_empty() => rules.disallows.push(value.to_string()),
            "crawl-delay" if active => {
                if let Ok(secs) = value.parse::<f64>() {
                    rules.crawl_delay = Some(Duration::from_millis((secs * 1000.0) as u64));
                }
            }
            _ => {}
        }
    }
    rules
}

fn allowed(rules: &HostRules, path: &str) -> bool {
    !rules.disallows.iter().any(|d| path.starts_with(d))
}
