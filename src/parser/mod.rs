pub mod embedded;
pub mod labeled;
pub mod normalize;
pub mod raw;

use std::sync::LazyLock;

use scraper::{Html, Selector};
use thiserror::Error;
use tracing::debug;

use crate::db::StoredPage;
use crate::record::BreedRecord;
use raw::RawRecord;

static BREED_PAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"div[data-js-component="breedPage"]"#).unwrap());

const PROPS_ATTR: &str = "data-js-props";

/// One fetched page.
pub struct RawPage<'a> {
    pub url: &'a str,
    pub html: &'a str,
}

/// Payload is there but cannot be read. Absent data is not an error.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("breed payload is not valid JSON: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("breed container has no data-js-props attribute")]
    MissingProps,
}

/// Which of the two known layouts a page uses.
pub enum PageShape {
    /// JSON payload in the breed container's props attribute.
    Embedded(String),
    /// Rating and vital-stat blocks in the DOM.
    Labeled,
}

impl PageShape {
    pub fn detect(doc: &Html) -> Result<Option<PageShape>, ExtractError> {
        if let Some(container) = doc.select(&BREED_PAGE).next() {
            let props = container
                .value()
                .attr(PROPS_ATTR)
                .ok_or(ExtractError::MissingProps)?;
            return Ok(Some(PageShape::Embedded(props.to_string())));
        }
        if labeled::is_present(doc) {
            return Ok(Some(PageShape::Labeled));
        }
        Ok(None)
    }
}

/// Extract the raw breed record from a page. `Ok(None)` means the page has
/// neither layout.
pub fn extract(page: &RawPage, breed_key: &str) -> Result<Option<RawRecord>, ExtractError> {
    let doc = Html::parse_document(page.html);
    let raw = match PageShape::detect(&doc)? {
        Some(PageShape::Embedded(props)) => embedded::extract(&props, breed_key)?,
        Some(PageShape::Labeled) => labeled::extract(&doc),
        None => {
            debug!(url = page.url, "no breed container on page");
            return Ok(None);
        }
    };
    Ok(Some(raw))
}

/// Two-step pipeline: page → raw record → validated record.
pub fn process_page(page: &StoredPage) -> Result<Option<BreedRecord>, ExtractError> {
    let raw_page = RawPage {
        url: &page.url,
        html: &page.html,
    };
    let raw = extract(&raw_page, &page.breed_key)?;
    Ok(raw.map(|r| normalize::normalize(&r, &page.breed_key)))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Trait, UNKNOWN_CATEGORY};

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn stored(name: &str, key: &str) -> StoredPage {
        StoredPage {
            page_data_id: 1,
            url: format!("https://www.akc.org/dog-breeds/{}/", key),
            breed_key: key.to_string(),
            html: fixture(name),
        }
    }

    #[test]
    fn affenpinscher_embedded() {
        let r = process_page(&stored("affenpinscher", "affenpinscher"))
            .unwrap()
            .unwrap();
        assert_eq!(r.name, "Affenpinscher");
        assert_eq!(r.breed_group.as_deref(), Some("Toy Group"));
        assert_eq!(r.year_recognized, Some(1936));
        assert_eq!(r.popularity, Some(148));
        assert_eq!(r.temperament.as_deref(), Some("Confident, Famously Funny, Fearless"));
        assert_eq!(r.traits.get(Trait::Adaptability), Some(5));
        assert_eq!(r.traits.get(Trait::WatchdogProtectiveNature), Some(3));
        // 6 in the fixture is out of range
        assert_eq!(r.traits.get(Trait::DroolingLevel), None);
        assert_eq!(r.coat_type, "Wiry");
        assert_eq!(r.coat_length, "Short");
        assert_eq!(
            r.grooming.as_deref(),
            Some("The Affen's harsh coat needs brushing once or twice a week.")
        );
        assert!(r.exercise.is_none());
    }

    #[test]
    fn missing_traits_section() {
        let r = process_page(&stored("affenpinscher_no_traits", "affenpinscher"))
            .unwrap()
            .unwrap();
        assert_eq!(r.name, "Affenpinscher");
        assert!(r.traits.all_absent());
        assert!(r.temperament.is_none());
        assert_eq!(r.coat_type, UNKNOWN_CATEGORY);
        assert_eq!(r.coat_length, UNKNOWN_CATEGORY);
    }

    #[test]
    fn labeled_page() {
        let r = process_page(&stored("beagle_labeled", "beagle")).unwrap().unwrap();
        assert_eq!(r.name, "Beagle");
        assert_eq!(r.life_expectancy.as_deref(), Some("10-15 years"));
        assert_eq!(r.traits.get(Trait::GoodWithYoungChildren), Some(5));
        assert_eq!(r.traits.get(Trait::WatchdogProtectiveNature), Some(2));
        assert_eq!(r.traits.get(Trait::DroolingLevel), None);
        assert_eq!(
            r.description.as_deref(),
            Some("Merry, friendly and curious, the Beagle is a popular hound.")
        );
        assert_eq!(r.coat_type, "Smooth");
        // coat length item has no selection
        assert_eq!(r.coat_length, UNKNOWN_CATEGORY);
    }

    #[test]
    fn page_without_any_container_is_not_found() {
        let page = RawPage {
            url: "https://www.akc.org/dog-breeds/nope/",
            html: "<html><body><h1>Page not found</h1></body></html>",
        };
        assert!(extract(&page, "nope").unwrap().is_none());
    }

    #[test]
    fn container_without_props_is_an_error() {
        let page = RawPage {
            url: "https://www.akc.org/dog-breeds/pug/",
            html: r#"<div data-js-component="breedPage"></div>"#,
        };
        assert!(matches!(extract(&page, "pug"), Err(ExtractError::MissingProps)));
    }

    #[test]
    fn broken_json_is_an_error() {
        let page = RawPage {
            url: "https://www.akc.org/dog-breeds/pug/",
            html: r#"<div data-js-component="breedPage" data-js-props="{&quot;settings&quot;:"></div>"#,
        };
        assert!(matches!(
            extract(&page, "pug"),
            Err(ExtractError::MalformedPayload(_))
        ));
    }

    #[test]
    fn resolved_name_is_stable() {
        let page = stored("affenpinscher", "affenpinscher");
        let a = process_page(&page).unwrap().unwrap();
        let b = process_page(&page).unwrap().unwrap();
        assert_eq!(a.name, b.name);
        assert_eq!(a, b);
    }
}
