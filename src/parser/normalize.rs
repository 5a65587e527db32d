use scraper::Html;
use tracing::warn;

use super::raw::RawRecord;
use crate::record::{BreedRecord, Trait, TraitScores, UNKNOWN_CATEGORY};

/// Validate a raw record into a [`BreedRecord`]. Never fails: anything
/// malformed becomes absent, except coat categories, which fall back to
/// [`UNKNOWN_CATEGORY`].
pub fn normalize(raw: &RawRecord, breed_key_fallback: &str) -> BreedRecord {
    let name = clean_text(raw.name.as_deref()).unwrap_or_else(|| breed_key_fallback.to_string());

    let mut scores = [None; 14];
    for (slot, t) in scores.iter_mut().zip(Trait::ALL) {
        *slot = trait_score(raw, t, &name);
    }

    BreedRecord {
        breed_group: clean_text(raw.breed_group.as_deref()),
        origin: clean_text(raw.origin.as_deref()),
        temperament: clean_text(raw.temperament.as_deref()),
        life_expectancy: clean_text(raw.life_expectancy.as_deref()),
        year_recognized: parse_int(raw.year_recognized.as_deref()),
        popularity: parse_int(raw.popularity.as_deref()),

        description: strip_html(raw.description.as_deref()),
        grooming: strip_html(raw.grooming.as_deref()),
        exercise: strip_html(raw.exercise.as_deref()),
        nutrition: strip_html(raw.nutrition.as_deref()),
        health: strip_html(raw.health.as_deref()),
        training: strip_html(raw.training.as_deref()),

        traits: TraitScores::new(scores),

        coat_type: category(raw.coat_type.as_deref()),
        coat_length: category(raw.coat_length.as_deref()),

        name,
    }
}

fn trait_score(raw: &RawRecord, t: Trait, breed: &str) -> Option<u8> {
    let value = t.source_keys().iter().find_map(|k| raw.traits.get(*k))?;
    let score = parse_score(value);
    if score.is_none() {
        warn!(breed, trait_name = t.column(), value = %value, "discarding invalid trait score");
    }
    score
}

/// Integer in 1..=5, otherwise `None`. Never clamps.
pub fn parse_score(value: &str) -> Option<u8> {
    match value.trim().parse::<i64>() {
        Ok(n @ 1..=5) => Some(n as u8),
        _ => None,
    }
}

/// Remove markup and decode entities. Empty text becomes `None`.
///
/// Decoding can surface new markup (`&lt;p&gt;` → `<p>`), so the text is
/// stripped again until it stops changing.
pub fn strip_html(content: Option<&str>) -> Option<String> {
    let mut text = content?.to_string();
    while text.contains('<') || text.contains('&') {
        let fragment = Html::parse_fragment(&text);
        let stripped = fragment.root_element().text().collect::<String>();
        if stripped == text {
            break;
        }
        text = stripped;
    }
    clean_text(Some(&text))
}

fn clean_text(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_int(value: Option<&str>) -> Option<i32> {
    value?.trim().parse().ok()
}

fn category(value: Option<&str>) -> String {
    clean_text(value).unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
}

// ── Tests ──
