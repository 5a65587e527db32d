use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::Result;
use reqwest::Url;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Settings;
use crate::fetch::Fetcher;

static CARD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".breed-card-type-grid .grid-col").unwrap());
static CARD_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreedLink {
    pub name: String,
    pub url: String,
    /// URL path segment, e.g. `affenpinscher`.
    pub key: String,
}

/// One page of a letter listing.
pub struct ListingPage {
    /// Cards on the page, including ones without a usable link.
    pub cards: usize,
    pub links: Vec<BreedLink>,
}

/// `https://www.akc.org/dog-breeds/affenpinscher/` → `affenpinscher`.
pub fn breed_key_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let key = path.trim_end_matches('/').rsplit('/').next()?;
    if key.is_empty() || key.contains(':') {
        None
    } else {
        Some(key.to_string())
    }
}

pub fn letter_page_url(base: &str, letter: char, page: u32) -> String {
    if page > 1 {
        format!("{}page/{}/?letter={}", base, page, letter)
    } else {
        format!("{}?letter={}", base, letter)
    }
}

pub fn parse_listing(html: &str, base: &Url) -> ListingPage {
    let doc = Html::parse_document(html);
    let mut cards = 0;
    let mut links = Vec::new();

    for card in doc.select(&CARD) {
        cards += 1;
        let Some(a) = card.select(&CARD_LINK).next() else {
            continue;
        };
        let Some(url) = a.value().attr("href").and_then(|h| base.join(h).ok()) else {
            continue;
        };
        let url = url.to_string();
        let Some(key) = breed_key_from_url(&url) else {
            continue;
        };
        let name = a.text().collect::<String>().trim().to_string();
        links.push(BreedLink { name, url, key });
    }

    ListingPage { cards, links }
}

/// What to do after fetching a listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The page was full; there may be another one.
    NextPage,
    /// The page had no cards; fetch it again.
    Retry,
    /// Last page of the letter, or still empty after every retry.
    Done,
}

/// Decide the next step from the card count and the empty-page retries
/// already spent on this page.
pub fn advance(cards: usize, retries: u32, page_size: usize, max_retries: u32) -> Advance {
    if cards == 0 {
        if retries < max_retries {
            Advance::Retry
        } else {
            Advance::Done
        }
    } else if cards >= page_size {
        Advance::NextPage
    } else {
        Advance::Done
    }
}

/// Walk every letter A–Z page by page and collect unique breed links.
pub async fn collect_breed_links(fetcher: &Fetcher, settings: &Settings) -> Result<Vec<BreedLink>> {
    let base = Url::parse(&settings.base_url)?;
    let mut seen = HashSet::new();
    let mut breeds = Vec::new();

    for letter in 'A'..='Z' {
        let mut page = 1;
        let mut retries = 0;

        loop {
            let url = letter_page_url(&settings.base_url, letter, page);
            info!("Listing letter {} page {}", letter, page);

            let html = match fetcher.get_text(&url).await {
                Ok(h) => h,
                Err(e) => {
                    warn!("Giving up on letter {} at page {}: {:#}", letter, page, e);
                    break;
                }
            };

            let listing = parse_listing(&html, &base);
            let step = advance(listing.cards, retries, settings.page_size, settings.max_retries);
            if listing.cards == 0 {
                if step == Advance::Retry {
                    retries += 1;
                    warn!(
                        "No breeds found on {} (attempt {}/{}), retrying",
                        url, retries, settings.max_retries
                    );
                    tokio::time::sleep(fetcher.retry_delay()).await;
                    continue;
                }
                warn!(
                    "No breeds for letter {} page {} after {} retries",
                    letter, page, settings.max_retries
                );
                break;
            }
            retries = 0;

            for link in listing.links {
                if seen.insert(link.url.clone()) {
                    breeds.push(link);
                }
            }

            fetcher.pause().await;
            if step == Advance::Done {
                break;
            }
            page += 1;
        }
    }

    info!("Collected {} breed links", breeds.len());
    Ok(breeds)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BASE: &str = "https://www.akc.org/dog-breeds/";

    #[test]
    fn key_from_url() {
        assert_eq!(
            breed_key_from_url("https://www.akc.org/dog-breeds/affenpinscher/").as_deref(),
            Some("affenpinscher")
        );
        assert_eq!(
            breed_key_from_url("https://www.akc.org/dog-breeds/afghan-hound").as_deref(),
            Some("afghan-hound")
        );
        assert_eq!(
            breed_key_from_url("https://www.akc.org/dog-breeds/akita/?ref=grid").as_deref(),
            Some("akita")
        );
        assert_eq!(breed_key_from_url("https://"), None);
    }

    #[test]
    fn page_urls() {
        assert_eq!(letter_page_url(BASE, 'A', 1), "https://www.akc.org/dog-breeds/?letter=A");
        assert_eq!(
            letter_page_url(BASE, 'B', 3),
            "https://www.akc.org/dog-breeds/page/3/?letter=B"
        );
    }

    #[test]
    fn cards_with_relative_and_missing_links() {
        let html = r#"
            <div class="breed-card-type-grid">
              <div class="grid-col"><a href="https://www.akc.org/dog-breeds/affenpinscher/"> Affenpinscher </a></div>
              <div class="grid-col"><a href="/dog-breeds/afghan-hound/">Afghan Hound</a></div>
              <div class="grid-col"><span>Ad slot</span></div>
            </div>"#;
        let base = Url::parse(BASE).unwrap();
        let page = parse_listing(html, &base);
        assert_eq!(page.cards, 3);
        assert_eq!(page.links.len(), 2);
        assert_eq!(page.links[0].name, "Affenpinscher");
        assert_eq!(page.links[1].url, "https://www.akc.org/dog-breeds/afghan-hound/");
        assert_eq!(page.links[1].key, "afghan-hound");
    }

    #[test]
    fn no_grid_no_cards() {
        let base = Url::parse(BASE).unwrap();
        let page = parse_listing("<html><body>Nothing here</body></html>", &base);
        assert_eq!(page.cards, 0);
        assert!(page.links.is_empty());
    }

    #[test]
    fn full_page_means_another() {
        assert_eq!(advance(12, 0, 12, 3), Advance::NextPage);
        assert_eq!(advance(11, 0, 12, 3), Advance::Done);
        assert_eq!(advance(1, 2, 12, 3), Advance::Done);
    }

    #[test]
    fn empty_page_retried_then_abandoned() {
        assert_eq!(advance(0, 0, 12, 3), Advance::Retry);
        assert_eq!(advance(0, 2, 12, 3), Advance::Retry);
        assert_eq!(advance(0, 3, 12, 3), Advance::Done);
        assert_eq!(advance(0, 0, 12, 0), Advance::Done);
    }

    fn grid(keys: &[&str]) -> String {
        let cards: String = keys
            .iter()
            .map(|k| format!(r#"<div class="grid-col"><a href="/dog-breeds/{k}/">{k}</a></div>"#))
            .collect();
        format!(r#"<html><body><div class="breed-card-type-grid">{}</div></body></html>"#, cards)
    }

    fn serve(url_path: &str, letter: &str, body: String) -> Mock {
        Mock::given(method("GET"))
            .and(path(url_path))
            .and(query_param("letter", letter))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
    }

    #[tokio::test]
    async fn walks_pages_retries_empty_and_dedups() {
        let server = MockServer::start().await;

        // A: full first page, short second page repeating one breed
        serve("/dog-breeds/", "A", grid(&["affenpinscher", "akita", "azawakh"]))
            .expect(1)
            .mount(&server)
            .await;
        serve("/dog-breeds/page/2/", "A", grid(&["akita"]))
            .expect(1)
            .mount(&server)
            .await;
        // B: empty once, then a short page
        serve("/dog-breeds/", "B", grid(&[]))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        serve("/dog-breeds/", "B", grid(&["beagle"]))
            .expect(1)
            .mount(&server)
            .await;
        // C: always empty, abandoned after the initial fetch plus one retry
        serve("/dog-breeds/", "C", grid(&[]))
            .expect(2)
            .mount(&server)
            .await;
        // every other letter 404s and is skipped

        let mut settings = Settings::for_tests(&format!("{}/dog-breeds/", server.uri()), 1);
        settings.page_size = 3;
        let fetcher = Fetcher::new(&settings).unwrap();

        let links = collect_breed_links(&fetcher, &settings).await.unwrap();
        let keys: Vec<&str> = links.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, ["affenpinscher", "akita", "azawakh", "beagle"]);
    }
}
