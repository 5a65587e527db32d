use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::raw::RawRecord;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static RATING_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.breed-characteristics-ratings-item").unwrap());
static RATING_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".breed-characteristics-ratings-name").unwrap());
static FULL_STAR: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".icon-full-star").unwrap());
static SELECTED_CHOICE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        ".breed-characteristics-ratings-choice--selected, .breed-trait-score__choice--selected",
    )
    .unwrap()
});
static VITAL_STAT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.vital-stat").unwrap());
static VITAL_KEY: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".vital-stat-key").unwrap());
static VITAL_VALUE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".vital-stat-value").unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static HERO_FOOTER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.breed-hero__footer").unwrap());
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.breed-description").unwrap());

/// True when the page has at least one rating or vital-stat block.
pub fn is_present(doc: &Html) -> bool {
    doc.select(&RATING_ITEM).next().is_some() || doc.select(&VITAL_STAT).next().is_some()
}

/// Build a raw record from the discrete rating / vital-stat blocks.
/// A block without a label (or a vital stat without a value) is skipped on
/// its own.
pub fn extract(doc: &Html) -> RawRecord {
    let mut raw = RawRecord {
        name: doc.select(&TITLE).next().and_then(element_text),
        description: doc
            .select(&HERO_FOOTER)
            .next()
            .or_else(|| doc.select(&DESCRIPTION).next())
            .and_then(element_text),
        ..Default::default()
    };

    for item in doc.select(&RATING_ITEM) {
        let Some(label) = item.select(&RATING_NAME).next().and_then(element_text) else {
            debug!("rating block without a label, skipping");
            continue;
        };
        let key = normalize_label(&label);
        // Coat items pick a category instead of showing stars.
        if key == "coat_type" {
            raw.coat_type = selected_choice(item);
        } else if key == "coat_length" {
            raw.coat_length = selected_choice(item);
        } else {
            // Stars are icons, not a number; zero full stars is still a score.
            let stars = item.select(&FULL_STAR).count();
            raw.traits.insert(key, stars.to_string());
        }
    }

    for stat in doc.select(&VITAL_STAT) {
        let key = stat.select(&VITAL_KEY).next().and_then(element_text);
        let value = stat.select(&VITAL_VALUE).next().and_then(element_text);
        match (key, value) {
            (Some(k), Some(v)) => {
                raw.vital_stats.insert(normalize_label(&k), v);
            }
            _ => debug!("incomplete vital-stat block, skipping"),
        }
    }

    let stats = &raw.vital_stats;
    let stat = |k: &str| stats.get(k).cloned();
    let life_expectancy = stat("life_expectancy");
    let temperament = stat("temperament");
    let breed_group = stat("group").or_else(|| stat("breed_group"));
    let origin = stat("origin");

    RawRecord {
        life_expectancy,
        temperament,
        breed_group,
        origin,
        ..raw
    }
}

/// Lower-case the label and join its words with `_`:
/// "Good With Young Children" → "good_with_young_children".
pub fn normalize_label(label: &str) -> String {
    WHITESPACE_RE
        .replace_all(label.trim(), "_")
        .to_lowercase()
}

fn selected_choice(item: ElementRef) -> Option<String> {
    item.select(&SELECTED_CHOICE).next().and_then(element_text)
}

fn element_text(el: ElementRef) -> Option<String> {
    let joined = el.text().collect::<String>();
    let collapsed = WHITESPACE_RE.replace_all(joined.trim(), " ").to_string();
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(label: &str, full: usize, empty: usize) -> String {
        format!(
            r#"<div class="breed-characteristics-ratings-item">
                 <h4 class="breed-characteristics-ratings-name">{}</h4>
                 {}{}
               </div>"#,
            label,
            r#"<span class="icon-full-star"></span>"#.repeat(full),
            r#"<span class="icon-empty-star"></span>"#.repeat(empty),
        )
    }

    #[test]
    fn labels_are_lowercased_and_joined() {
        assert_eq!(normalize_label("  Good With\n Young Children "), "good_with_young_children");
        assert_eq!(normalize_label("Watchdog/Protective Nature"), "watchdog/protective_nature");
    }

    #[test]
    fn counts_full_stars() {
        let html = format!(
            "<html><body><h1>Akita</h1>{}{}</body></html>",
            rating("Energy Level", 4, 1),
            rating("Drooling Level", 0, 5)
        );
        let raw = extract(&Html::parse_document(&html));
        assert_eq!(raw.name.as_deref(), Some("Akita"));
        assert_eq!(raw.traits.get("energy_level").map(String::as_str), Some("4"));
        // zero is a score, not a missing block
        assert_eq!(raw.traits.get("drooling_level").map(String::as_str), Some("0"));
    }

    #[test]
    fn coat_items_read_selected_choice() {
        let html = r#"
            <div class="breed-characteristics-ratings-item">
              <h4 class="breed-characteristics-ratings-name">Coat Type</h4>
              <div class="breed-characteristics-ratings-choice">Wiry</div>
              <div class="breed-characteristics-ratings-choice breed-characteristics-ratings-choice--selected"> Smooth </div>
            </div>
            <div class="breed-characteristics-ratings-item">
              <h4 class="breed-characteristics-ratings-name">Coat Length</h4>
              <div class="breed-characteristics-ratings-choice">Short</div>
            </div>"#;
        let raw = extract(&Html::parse_document(html));
        assert_eq!(raw.coat_type.as_deref(), Some("Smooth"));
        // nothing selected
        assert_eq!(raw.coat_length, None);
        assert!(raw.traits.is_empty());
    }

    #[test]
    fn unlabeled_block_skipped_alone() {
        let html = format!(
            r#"<div class="breed-characteristics-ratings-item"><span class="icon-full-star"></span></div>{}"#,
            rating("Shedding Level", 3, 2)
        );
        let raw = extract(&Html::parse_document(&html));
        assert_eq!(raw.traits.len(), 1);
        assert_eq!(raw.traits.get("shedding_level").map(String::as_str), Some("3"));
    }

    #[test]
    fn vital_stats_fill_identity_fields() {
        let html = r#"
            <div class="vital-stat"><div class="vital-stat-key">Life Expectancy</div><div class="vital-stat-value">11-13 years</div></div>
            <div class="vital-stat"><div class="vital-stat-key">Height</div></div>
            <div class="vital-stat"><div class="vital-stat-key">Group</div><div class="vital-stat-value"> Toy  Group </div></div>"#;
        let raw = extract(&Html::parse_document(html));
        assert_eq!(raw.life_expectancy.as_deref(), Some("11-13 years"));
        assert_eq!(raw.breed_group.as_deref(), Some("Toy Group"));
        assert!(!raw.vital_stats.contains_key("height"));
    }

    #[test]
    fn description_falls_back_to_secondary_container() {
        let html = r#"<div class="vital-stat"></div><div class="breed-description"><p>Small but bold.</p></div>"#;
        let doc = Html::parse_document(html);
        assert!(is_present(&doc));
        assert_eq!(extract(&doc).description.as_deref(), Some("Small but bold."));
    }

    #[test]
    fn plain_page_has_no_blocks() {
        let doc = Html::parse_document("<html><body><h1>Dogs</h1></body></html>");
        assert!(!is_present(&doc));
    }
}
