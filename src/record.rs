use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Placeholder stored for coat categories the page does not select.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// The fixed set of rated traits, each scored 1–5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Trait {
    Adaptability,
    AffectionateWithFamily,
    BarkingLevel,
    CoatGroomingFrequency,
    DroolingLevel,
    EnergyLevel,
    GoodWithOtherDogs,
    GoodWithYoungChildren,
    MentalStimulationNeeds,
    OpennessToStrangers,
    PlayfulnessLevel,
    SheddingLevel,
    TrainabilityLevel,
    WatchdogProtectiveNature,
}

impl Trait {
    pub const ALL: [Trait; 14] = [
        Trait::Adaptability,
        Trait::AffectionateWithFamily,
        Trait::BarkingLevel,
        Trait::CoatGroomingFrequency,
        Trait::DroolingLevel,
        Trait::EnergyLevel,
        Trait::GoodWithOtherDogs,
        Trait::GoodWithYoungChildren,
        Trait::MentalStimulationNeeds,
        Trait::OpennessToStrangers,
        Trait::PlayfulnessLevel,
        Trait::SheddingLevel,
        Trait::TrainabilityLevel,
        Trait::WatchdogProtectiveNature,
    ];

    /// Output key and `dog_breeds` column name.
    pub fn column(self) -> &'static str {
        match self {
            Trait::Adaptability => "adaptability",
            Trait::AffectionateWithFamily => "affectionate_with_family",
            Trait::BarkingLevel => "barking_level",
            Trait::CoatGroomingFrequency => "coat_grooming_frequency",
            Trait::DroolingLevel => "drooling_level",
            Trait::EnergyLevel => "energy_level",
            Trait::GoodWithOtherDogs => "good_with_other_dogs",
            Trait::GoodWithYoungChildren => "good_with_young_children",
            Trait::MentalStimulationNeeds => "mental_stimulation_needs",
            Trait::OpennessToStrangers => "openness_to_strangers",
            Trait::PlayfulnessLevel => "playfulness_level",
            Trait::SheddingLevel => "shedding_level",
            Trait::TrainabilityLevel => "trainability_level",
            Trait::WatchdogProtectiveNature => "watchdog_protective_nature",
        }
    }

    /// Keys the trait appears under in page payloads and normalized DOM labels.
    /// The column name is always tried first.
    pub fn source_keys(self) -> &'static [&'static str] {
        match self {
            Trait::Adaptability => &["adaptability", "adaptability_level"],
            Trait::WatchdogProtectiveNature => &[
                "watchdog_protective_nature",
                "watchdogprotective_nature",
                "watchdog/protective_nature",
            ],
            Trait::AffectionateWithFamily => &["affectionate_with_family"],
            Trait::BarkingLevel => &["barking_level"],
            Trait::CoatGroomingFrequency => &["coat_grooming_frequency"],
            Trait::DroolingLevel => &["drooling_level"],
            Trait::EnergyLevel => &["energy_level"],
            Trait::GoodWithOtherDogs => &["good_with_other_dogs"],
            Trait::GoodWithYoungChildren => &["good_with_young_children"],
            Trait::MentalStimulationNeeds => &["mental_stimulation_needs"],
            Trait::OpennessToStrangers => &["openness_to_strangers"],
            Trait::PlayfulnessLevel => &["playfulness_level"],
            Trait::SheddingLevel => &["shedding_level"],
            Trait::TrainabilityLevel => &["trainability_level"],
        }
    }

    // Declaration order matches ALL.
    fn index(self) -> usize {
        self as usize
    }
}

/// Scores for every trait in [`Trait::ALL`]. Unknown scores are `None`,
/// but the key is always there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraitScores([Option<u8>; 14]);

impl TraitScores {
    pub fn new(scores: [Option<u8>; 14]) -> Self {
        TraitScores(scores)
    }

    pub fn get(&self, t: Trait) -> Option<u8> {
        self.0[t.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Trait, Option<u8>)> + '_ {
        Trait::ALL.iter().map(move |t| (*t, self.get(*t)))
    }

    pub fn all_absent(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

impl Serialize for TraitScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Trait::ALL.len()))?;
        for (t, score) in self.iter() {
            map.serialize_entry(t.column(), &score)?;
        }
        map.end()
    }
}

/// A validated breed record, ready for a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreedRecord {
    pub name: String,
    pub breed_group: Option<String>,
    pub origin: Option<String>,
    pub temperament: Option<String>,
    pub life_expectancy: Option<String>,
    pub year_recognized: Option<i32>,
    pub popularity: Option<i32>,

    pub description: Option<String>,
    pub grooming: Option<String>,
    pub exercise: Option<String>,
    pub nutrition: Option<String>,
    pub health: Option<String>,
    pub training: Option<String>,

    pub traits: TraitScores,

    pub coat_type: String,
    pub coat_length: String,
}

impl BreedRecord {
    /// Names of the fields the page did not supply.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let optional = [
            ("breed_group", self.breed_group.is_none()),
            ("origin", self.origin.is_none()),
            ("temperament", self.temperament.is_none()),
            ("life_expectancy", self.life_expectancy.is_none()),
            ("year_recognized", self.year_recognized.is_none()),
            ("popularity", self.popularity.is_none()),
            ("description", self.description.is_none()),
            ("grooming", self.grooming.is_none()),
            ("exercise", self.exercise.is_none()),
            ("nutrition", self.nutrition.is_none()),
            ("health", self.health.is_none()),
            ("training", self.training.is_none()),
        ];
        missing.extend(optional.iter().filter(|(_, m)| *m).map(|(f, _)| *f));
        missing.extend(
            self.traits
                .iter()
                .filter(|(_, s)| s.is_none())
                .map(|(t, _)| t.column()),
        );
        if self.coat_type == UNKNOWN_CATEGORY {
            missing.push("coat_type");
        }
        if self.coat_length == UNKNOWN_CATEGORY {
            missing.push("coat_length");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

// ── Tests ──
