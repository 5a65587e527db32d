use std::time::Instant;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::{self, FetchRow, PendingPage};
use crate::fetch::Fetcher;

pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

pub fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

/// Fetch pages one at a time, pausing between requests, saving each result
/// as it arrives. Failed pages are stored with their error and marked visited.
pub async fn scrape_pages(
    conn: &Connection,
    fetcher: &Fetcher,
    pages: Vec<PendingPage>,
) -> Result<ScrapeStats> {
    let total = pages.len();
    let pb = progress_bar(total)?;
    let mut ok = 0usize;
    let mut errors = 0usize;

    for (i, page) in pages.into_iter().enumerate() {
        if i > 0 {
            fetcher.pause().await;
        }
        let row = fetch_one(fetcher, page).await;
        if row.error.is_some() {
            errors += 1;
        } else {
            ok += 1;
        }
        db::save_page(conn, &row)?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Scraped {} pages ({} ok, {} errors)", total, ok, errors);
    Ok(ScrapeStats { total, ok, errors })
}

async fn fetch_one(fetcher: &Fetcher, page: PendingPage) -> FetchRow {
    let start = Instant::now();
    let result = fetcher.get(&page.url).await;
    let latency_ms = Some(start.elapsed().as_millis() as i64);

    match result {
        Ok(fetched) => FetchRow {
            page_id: page.id,
            url: page.url,
            breed_key: page.breed_key,
            html: Some(fetched.body),
            status: Some(i32::from(fetched.status)),
            error: None,
            latency_ms,
        },
        Err(e) => {
            warn!("Fetch failed for {}: {:#}", page.breed_key, e);
            FetchRow {
                page_id: page.id,
                url: page.url,
                breed_key: page.breed_key,
                html: None,
                status: None,
                error: Some(format!("{:#}", e)),
                latency_ms,
            }
        }
    }
}
