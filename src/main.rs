mod config;
mod crawl;
mod db;
mod export;
mod fetch;
mod listing;
mod parser;
mod record;
mod sink;

use std::time::Instant;

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use rusqlite::Connection;
use tracing::warn;

use crate::config::Settings;
use crate::sink::{Ingest, JsonSink, RecordSink, SqliteSink};

#[derive(Parser)]
#[command(name = "breed_scraper", about = "AKC dog breed scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the A–Z breed listing and populate the page queue
    Init {
        /// Also save the collected links as JSON in the output directory
        #[arg(long)]
        json: bool,
    },
    /// Fetch unvisited breed pages
    Scrape {
        /// Max pages to fetch (default: all unvisited)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Extract and validate fetched pages into breed records
    Process {
        /// Max pages to process (default: all unprocessed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Write records to a JSON file instead of the database
        #[arg(long)]
        json: bool,
    },
    /// Scrape + process in one go
    Run {
        /// Max pages to scrape+process
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Dump stored breeds to a JSON file
    Export,
    /// Show scraping statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;

    let result = match cli.command {
        Commands::Init { json } => {
            let fetcher = fetch::Fetcher::new(&settings)?;
            let links = listing::collect_breed_links(&fetcher, &settings).await?;
            let inserted = db::insert_pages(&conn, &links)?;
            println!("Inserted {} new breed URLs ({} total found)", inserted, links.len());
            if json {
                let path = export::write_json(&settings.output_dir, "breed_links", &links)?;
                println!("Links saved to {}", path.display());
            }
            Ok(())
        }
        Commands::Scrape { limit } => {
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first or all pages are scraped.");
                return Ok(());
            }
            println!("Scraping {} pages...", pages.len());
            let fetcher = fetch::Fetcher::new(&settings)?;
            let stats = crawl::scrape_pages(&conn, &fetcher, pages).await?;
            println!(
                "Done: {} scraped ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Process { limit, json } => {
            let pages = db::fetch_unprocessed(&conn, limit)?;
            if pages.is_empty() {
                println!("No unprocessed pages. Run 'scrape' first.");
                return Ok(());
            }
            println!("Processing {} pages...", pages.len());
            if json {
                let mut sink = JsonSink::new(&settings.output_dir);
                process_pages(&conn, &pages, &mut sink)?.print();
                if !sink.is_empty() {
                    println!("{} records saved to {}", sink.len(), sink.path().display());
                }
            } else {
                let mut sink = SqliteSink::new(&conn);
                process_pages(&conn, &pages, &mut sink)?.print();
            }
            Ok(())
        }
        Commands::Run { limit } => {
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first.");
                return Ok(());
            }

            // Phase 1: fetch
            let t_scrape = Instant::now();
            println!("Pipeline: scraping {} pages...", pages.len());
            let fetcher = fetch::Fetcher::new(&settings)?;
            let stats = crawl::scrape_pages(&conn, &fetcher, pages).await?;
            println!(
                "Scraped {} pages ({} ok, {} errors) in {:.1}s",
                stats.total,
                stats.ok,
                stats.errors,
                t_scrape.elapsed().as_secs_f64()
            );

            // Phase 2: extract + store
            let t_process = Instant::now();
            let unprocessed = db::fetch_unprocessed(&conn, None)?;
            if unprocessed.is_empty() {
                println!("Nothing to process (all fetched pages had errors).");
                return Ok(());
            }
            println!("Processing {} pages...", unprocessed.len());
            let mut sink = SqliteSink::new(&conn);
            let counts = process_pages(&conn, &unprocessed, &mut sink)?;
            println!("Processed in {:.1}s", t_process.elapsed().as_secs_f64());
            counts.print();
            Ok(())
        }
        Commands::Export => {
            let breeds = db::fetch_breeds(&conn)?;
            if breeds.is_empty() {
                println!("No breeds stored yet.");
                return Ok(());
            }
            let path = export::write_json(&settings.output_dir, "dog_breeds", &breeds)?;
            println!("Exported {} breeds to {}", breeds.len(), path.display());
            Ok(())
        }
        Commands::Stats => {
            let s = db::get_stats(&conn)?;
            println!("Pages:     {}", s.pages);
            println!("Visited:   {}", s.visited);
            println!("Unvisited: {}", s.unvisited);
            println!("Fetched:   {}", s.fetched);
            println!("Errors:    {}", s.errors);
            println!("Processed: {}", s.processed);
            println!("Breeds:    {}", s.breeds);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

#[derive(Default)]
struct ProcessCounts {
    stored: usize,
    duplicates: usize,
    incomplete: usize,
    not_found: usize,
    failed: usize,
}

impl ProcessCounts {
    fn print(&self) {
        println!(
            "Stored {} breeds ({} with missing fields), {} duplicates skipped, {} pages without breed data, {} failed.",
            self.stored, self.incomplete, self.duplicates, self.not_found, self.failed,
        );
    }
}

/// Extract in parallel per chunk, then persist the chunk on this thread.
/// A chunk's pages are marked processed only once the sink has committed it.
fn process_pages(
    conn: &Connection,
    pages: &[db::StoredPage],
    sink: &mut dyn RecordSink,
) -> anyhow::Result<ProcessCounts> {
    let pb = crawl::progress_bar(pages.len())?;
    let mut counts = ProcessCounts::default();

    for chunk in pages.chunks(200) {
        let results: Vec<_> = chunk.par_iter().map(parser::process_page).collect();

        for (page, result) in chunk.iter().zip(results) {
            match result {
                Ok(Some(record)) => match sink::ingest(sink, &record)? {
                    Ingest::Stored => {
                        counts.stored += 1;
                        if !record.is_complete() {
                            counts.incomplete += 1;
                        }
                    }
                    Ingest::Duplicate => counts.duplicates += 1,
                },
                Ok(None) => {
                    warn!("No breed data on {}", page.url);
                    counts.not_found += 1;
                }
                Err(e) => {
                    warn!("Failed to extract {}: {}", page.breed_key, e);
                    counts.failed += 1;
                }
            }
        }

        sink.commit()?;
        let ids: Vec<i64> = chunk.iter().map(|p| p.page_data_id).collect();
        db::mark_processed(conn, &ids)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──
