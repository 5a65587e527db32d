use serde_json::Value;

use super::raw::RawRecord;
use super::ExtractError;

/// Build a raw record from the JSON carried in the breed page's
/// `data-js-props` attribute. Missing sub-maps leave their fields empty.
pub fn extract(props: &str, breed_key: &str) -> Result<RawRecord, ExtractError> {
    let json: Value = serde_json::from_str(props)?;

    let settings = json.get("settings").unwrap_or(&Value::Null);
    // Newer pages nest everything under settings.breed_data
    let data = settings.get("breed_data").unwrap_or(settings);
    let key = resolve_key(settings, data, breed_key);

    let basics = entry(data, "basics", key);
    let traits = entry(data, "traits", key);
    let health = entry(data, "health", key);
    let description = entry(data, "description", key);

    let scores = traits.and_then(|t| t.get("traits"));

    let mut raw = RawRecord {
        name: text(basics, "breed_name"),
        breed_group: text(basics, "breed_group"),
        origin: text(basics, "origin"),
        life_expectancy: text(basics, "life_expectancy"),
        year_recognized: text(basics, "year_recognized"),
        popularity: text(basics, "popularity_2023").or_else(|| text(basics, "popularity")),
        temperament: text(traits, "temperament"),
        description: text(description, "akc_org_about"),
        grooming: text(health, "akc_org_grooming"),
        exercise: text(health, "akc_org_exercise"),
        nutrition: text(health, "akc_org_nutrition"),
        health: text(health, "akc_org_health"),
        training: text(health, "akc_org_training"),
        coat_type: selected(scores, "coat_type"),
        coat_length: selected(scores, "coat_length"),
        ..Default::default()
    };

    if let Some(Value::Object(map)) = scores {
        for (name, entry) in map {
            if let Some(score) = text(Some(entry), "score") {
                raw.traits.insert(name.clone(), score);
            }
        }
    }

    Ok(raw)
}

/// The caller's key wins when the payload knows it; otherwise fall back to
/// the page's own `current_breed`.
fn resolve_key<'a>(settings: &'a Value, data: &Value, breed_key: &'a str) -> &'a str {
    let known = |k: &str| data.get("basics").and_then(|b| b.get(k)).is_some();
    if known(breed_key) {
        return breed_key;
    }
    match settings.get("current_breed").and_then(Value::as_str) {
        Some(current) if known(current) => current,
        _ => breed_key,
    }
}

fn entry<'a>(data: &'a Value, section: &str, key: &str) -> Option<&'a Value> {
    data.get(section)?.get(key)
}

fn text(parent: Option<&Value>, field: &str) -> Option<String> {
    scalar(parent?.get(field)?)
}

fn scalar(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `traits.<name>.selected` is a string on most pages, a list on a few.
fn selected(scores: Option<&Value>, name: &str) -> Option<String> {
    match scores?.get(name)?.get("selected")? {
        Value::Array(items) => items.iter().find_map(scalar),
        other => scalar(other),
    }
}

// ── Tests ──
