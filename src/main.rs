// Schema discovery command line
//
// Crawls a site from a seed URL and writes one schema.org JSON-LD document
// per page into a mirrored directory layout.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use schemascrape::{
    DiscoveryConfig, SCHEMA_ORG_VOCABULARY_URL, SchemaDiscoveryEngine, Taxonomy,
    default_cache_path, save_document, save_report, synthesizer_from_env,
};

#[derive(Debug, Parser)]
#[command(name = "schemascrape", version, about = "Discover and normalize schema.org data across a site")]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(short, long)]
    url: String,

    /// Directory that receives the schema documents and report.json
    #[arg(short, long, default_value = "schema-output")]
    output: PathBuf,

    #[arg(long)]
    max_pages: Option<usize>,

    #[arg(long)]
    max_depth: Option<u8>,

    /// JSON config file with optional crawl, synthesis and resolution sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Taxonomy snapshot (native or schema.org JSON-LD); built-in core types otherwise
    #[arg(short, long, conflicts_with = "taxonomy_url")]
    taxonomy: Option<PathBuf>,

    /// Fetch the schema.org vocabulary (latest release when no URL is given)
    #[arg(long, num_args = 0..=1, default_missing_value = SCHEMA_ORG_VOCABULARY_URL)]
    taxonomy_url: Option<String>,

    /// Cache file for the fetched vocabulary; the user cache directory otherwise
    #[arg(long, requires = "taxonomy_url")]
    taxonomy_cache: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = DiscoveryConfig::load(cli.config.as_deref(), &cli.url)?;
    if cli.max_pages.is_some() || cli.max_depth.is_some() {
        let mut policy = config.crawl_policy().clone();
        if let Some(pages) = cli.max_pages {
            policy.max_pages = pages;
        }
        if let Some(depth) = cli.max_depth {
            policy.max_depth = depth;
        }
        config = DiscoveryConfig::builder()
            .seed_url(config.seed_url())
            .crawl_policy(policy)
            .synthesis_options(config.synthesis().clone())
            .resolution_options(*config.resolution())
            .build()?;
    }

    let taxonomy = match (&cli.taxonomy, &cli.taxonomy_url) {
        (Some(path), _) => Taxonomy::load(path)?,
        (None, Some(url)) => {
            let cache = cli.taxonomy_cache.clone().or_else(default_cache_path);
            Taxonomy::fetch_cached(url, cache.as_deref(), config.request_timeout()).await?
        }
        (None, None) => Taxonomy::core()?,
    };

    let synthesizer = synthesizer_from_env(config.synthesis());
    let engine = SchemaDiscoveryEngine::with_http(config, Arc::new(taxonomy), synthesizer)
        .context("Failed to start discovery session")?;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, finishing with pages processed so far");
            ctrl_c_token.cancel();
        }
    });

    let report = engine.run(cancel).await.context("Discovery session failed")?;

    let mut saved = 0usize;
    for document in report.non_empty_documents() {
        match save_document(document, &cli.output).await {
            Ok(_) => saved += 1,
            Err(e) => log::error!("Failed to save schema for {}: {e:#}", document.page_url),
        }
    }
    let report_path = save_report(&report, &cli.output).await?;

    println!(
        "Crawled {} pages{}: {} documents saved to {}",
        report.pages.len(),
        if report.cancelled { " (cancelled)" } else { "" },
        saved,
        cli.output.display()
    );
    println!(
        "{} errors, {} warnings (details in {})",
        report.error_count(),
        report.warning_count(),
        report_path.display()
    );
    for issue in report.issues.iter().filter(|i| i.is_error()).take(20) {
        println!("  {issue}");
    }

    Ok(())
}
