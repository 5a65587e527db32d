use std::collections::BTreeMap;

use crate::record::BreedRecord;

/// Flat result of one extraction. Every value is raw page text; nothing has
/// been validated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub name: Option<String>,
    pub breed_group: Option<String>,
    pub origin: Option<String>,
    pub temperament: Option<String>,
    pub life_expectancy: Option<String>,
    pub year_recognized: Option<String>,
    pub popularity: Option<String>,

    pub description: Option<String>,
    pub grooming: Option<String>,
    pub exercise: Option<String>,
    pub nutrition: Option<String>,
    pub health: Option<String>,
    pub training: Option<String>,

    /// Source trait key (payload key or normalized label) → raw score.
    pub traits: BTreeMap<String, String>,

    pub coat_type: Option<String>,
    pub coat_length: Option<String>,

    /// Normalized vital-stat label → value. Only filled for labeled pages.
    pub vital_stats: BTreeMap<String, String>,
}

impl From<&BreedRecord> for RawRecord {
    fn from(r: &BreedRecord) -> Self {
        RawRecord {
            name: Some(r.name.clone()),
            breed_group: r.breed_group.clone(),
            origin: r.origin.clone(),
            temperament: r.temperament.clone(),
            life_expectancy: r.life_expectancy.clone(),
            year_recognized: r.year_recognized.map(|y| y.to_string()),
            popularity: r.popularity.map(|p| p.to_string()),
            description: r.description.clone(),
            grooming: r.grooming.clone(),
            exercise: r.exercise.clone(),
            nutrition: r.nutrition.clone(),
            health: r.health.clone(),
            training: r.training.clone(),
            traits: r
                .traits
                .iter()
                .filter_map(|(t, s)| Some((t.column().to_string(), s?.to_string())))
                .collect(),
            coat_type: Some(r.coat_type.clone()),
            coat_length: Some(r.coat_length.clone()),
            vital_stats: BTreeMap::new(),
        }
    }
}
