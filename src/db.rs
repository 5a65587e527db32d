use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::listing::BreedLink;
use crate::record::{BreedRecord, Trait, TraitScores, UNKNOWN_CATEGORY};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pages (
            id         INTEGER PRIMARY KEY,
            url        TEXT UNIQUE NOT NULL,
            breed_key  TEXT NOT NULL,
            name       TEXT,
            visited    BOOLEAN NOT NULL DEFAULT 0,
            visited_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_pages_visited ON pages(visited);

        CREATE TABLE IF NOT EXISTS page_data (
            id         INTEGER PRIMARY KEY,
            page_id    INTEGER NOT NULL REFERENCES pages(id),
            url        TEXT NOT NULL,
            breed_key  TEXT NOT NULL,
            html       TEXT,
            status     INTEGER,
            error      TEXT,
            latency_ms INTEGER,
            processed  BOOLEAN NOT NULL DEFAULT 0,
            fetched_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_page_data_processed ON page_data(processed);

        CREATE TABLE IF NOT EXISTS dog_breeds (
            id              INTEGER PRIMARY KEY,
            name            TEXT NOT NULL,
            breed_group     TEXT,
            origin          TEXT,
            temperament     TEXT,
            life_expectancy TEXT,
            year_recognized INTEGER,
            popularity      INTEGER,

            description     TEXT,
            grooming        TEXT,
            exercise        TEXT,
            nutrition       TEXT,
            health          TEXT,
            training        TEXT,

            adaptability               INTEGER CHECK (adaptability BETWEEN 1 AND 5),
            affectionate_with_family   INTEGER CHECK (affectionate_with_family BETWEEN 1 AND 5),
            barking_level              INTEGER CHECK (barking_level BETWEEN 1 AND 5),
            coat_grooming_frequency    INTEGER CHECK (coat_grooming_frequency BETWEEN 1 AND 5),
            drooling_level             INTEGER CHECK (drooling_level BETWEEN 1 AND 5),
            energy_level               INTEGER CHECK (energy_level BETWEEN 1 AND 5),
            good_with_other_dogs       INTEGER CHECK (good_with_other_dogs BETWEEN 1 AND 5),
            good_with_young_children   INTEGER CHECK (good_with_young_children BETWEEN 1 AND 5),
            mental_stimulation_needs   INTEGER CHECK (mental_stimulation_needs BETWEEN 1 AND 5),
            openness_to_strangers      INTEGER CHECK (openness_to_strangers BETWEEN 1 AND 5),
            playfulness_level          INTEGER CHECK (playfulness_level BETWEEN 1 AND 5),
            shedding_level             INTEGER CHECK (shedding_level BETWEEN 1 AND 5),
            trainability_level         INTEGER CHECK (trainability_level BETWEEN 1 AND 5),
            watchdog_protective_nature INTEGER CHECK (watchdog_protective_nature BETWEEN 1 AND 5),

            -- JSON arrays of text, never empty
            coat_type       TEXT NOT NULL,
            coat_length     TEXT NOT NULL,

            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_breed_name ON dog_breeds(name);
        CREATE INDEX IF NOT EXISTS idx_breed_group ON dog_breeds(breed_group);
        ",
    )?;
    Ok(())
}

// ── Listing ──

pub fn insert_pages(conn: &Connection, links: &[BreedLink]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt =
            tx.prepare("INSERT OR IGNORE INTO pages (url, breed_key, name) VALUES (?1, ?2, ?3)")?;
        for l in links {
            count += stmt.execute(rusqlite::params![l.url, l.key, l.name])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub struct PendingPage {
    pub id: i64,
    pub url: String,
    pub breed_key: String,
}

pub fn fetch_unvisited(conn: &Connection, limit: Option<usize>) -> Result<Vec<PendingPage>> {
    let sql = format!(
        "SELECT id, url, breed_key FROM pages WHERE visited = 0 ORDER BY id{}",
        limit_clause(limit)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PendingPage {
                id: row.get(0)?,
                url: row.get(1)?,
                breed_key: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Fetching ──

pub struct FetchRow {
    pub page_id: i64,
    pub url: String,
    pub breed_key: String,
    pub html: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

/// Store one fetch result and mark its page visited.
pub fn save_page(conn: &Connection, row: &FetchRow) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO page_data (page_id, url, breed_key, html, status, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            row.page_id, row.url, row.breed_key, row.html, row.status, row.error, row.latency_ms,
        ],
    )?;
    tx.execute(
        "UPDATE pages SET visited = 1, visited_at = datetime('now') WHERE id = ?1",
        rusqlite::params![row.page_id],
    )?;
    tx.commit()?;
    Ok(())
}

// ── Processing ──

pub struct StoredPage {
    pub page_data_id: i64,
    pub url: String,
    pub breed_key: String,
    pub html: String,
}

pub fn fetch_unprocessed(conn: &Connection, limit: Option<usize>) -> Result<Vec<StoredPage>> {
    let sql = format!(
        "SELECT id, url, breed_key, html
         FROM page_data
         WHERE html IS NOT NULL AND processed = 0
         ORDER BY id{}",
        limit_clause(limit)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredPage {
                page_data_id: row.get(0)?,
                url: row.get(1)?,
                breed_key: row.get(2)?,
                html: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn mark_processed(conn: &Connection, ids: &[i64]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare("UPDATE page_data SET processed = 1 WHERE id = ?1")?;
        for id in ids {
            stmt.execute(rusqlite::params![id])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Breeds ──

const BREED_COLUMNS: &str = "name, breed_group, origin, temperament, life_expectancy,
     year_recognized, popularity, description, grooming, exercise, nutrition, health, training,
     adaptability, affectionate_with_family, barking_level, coat_grooming_frequency,
     drooling_level, energy_level, good_with_other_dogs, good_with_young_children,
     mental_stimulation_needs, openness_to_strangers, playfulness_level, shedding_level,
     trainability_level, watchdog_protective_nature, coat_type, coat_length";

pub fn breed_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM dog_breeds WHERE name = ?1 LIMIT 1",
            rusqlite::params![name],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn insert_breed(conn: &Connection, r: &BreedRecord) -> Result<()> {
    let sql = format!(
        "INSERT INTO dog_breeds ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
         ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29)",
        BREED_COLUMNS
    );
    let s = |t: Trait| r.traits.get(t);
    conn.execute(
        &sql,
        rusqlite::params![
            r.name,
            r.breed_group,
            r.origin,
            r.temperament,
            r.life_expectancy,
            r.year_recognized,
            r.popularity,
            r.description,
            r.grooming,
            r.exercise,
            r.nutrition,
            r.health,
            r.training,
            s(Trait::Adaptability),
            s(Trait::AffectionateWithFamily),
            s(Trait::BarkingLevel),
            s(Trait::CoatGroomingFrequency),
            s(Trait::DroolingLevel),
            s(Trait::EnergyLevel),
            s(Trait::GoodWithOtherDogs),
            s(Trait::GoodWithYoungChildren),
            s(Trait::MentalStimulationNeeds),
            s(Trait::OpennessToStrangers),
            s(Trait::PlayfulnessLevel),
            s(Trait::SheddingLevel),
            s(Trait::TrainabilityLevel),
            s(Trait::WatchdogProtectiveNature),
            category_array(&r.coat_type),
            category_array(&r.coat_length),
        ],
    )
    .with_context(|| format!("Failed to insert {}", r.name))?;
    Ok(())
}

pub fn fetch_breeds(conn: &Connection) -> Result<Vec<BreedRecord>> {
    let sql = format!("SELECT {} FROM dog_breeds ORDER BY name", BREED_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], breed_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn breed_from_row(row: &Row) -> rusqlite::Result<BreedRecord> {
    let mut scores = [None; 14];
    for (i, slot) in scores.iter_mut().enumerate() {
        *slot = row.get(13 + i)?;
    }
    Ok(BreedRecord {
        name: row.get(0)?,
        breed_group: row.get(1)?,
        origin: row.get(2)?,
        temperament: row.get(3)?,
        life_expectancy: row.get(4)?,
        year_recognized: row.get(5)?,
        popularity: row.get(6)?,
        description: row.get(7)?,
        grooming: row.get(8)?,
        exercise: row.get(9)?,
        nutrition: row.get(10)?,
        health: row.get(11)?,
        training: row.get(12)?,
        traits: TraitScores::new(scores),
        coat_type: first_category(&row.get::<_, String>(27)?),
        coat_length: first_category(&row.get::<_, String>(28)?),
    })
}

fn category_array(value: &str) -> String {
    serde_json::to_string(&[value]).unwrap_or_else(|_| format!("[\"{}\"]", UNKNOWN_CATEGORY))
}

fn first_category(stored: &str) -> String {
    serde_json::from_str::<Vec<String>>(stored)
        .ok()
        .and_then(|v| v.into_iter().next())
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
}

// ── Stats ──

pub struct Stats {
    pub pages: usize,
    pub visited: usize,
    pub unvisited: usize,
    pub fetched: usize,
    pub errors: usize,
    pub processed: usize,
    pub breeds: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |sql: &str| -> Result<usize> {
        let n: i64 = conn.query_row(sql, [], |r| r.get(0))?;
        Ok(n as usize)
    };
    let pages = count("SELECT COUNT(*) FROM pages")?;
    let visited = count("SELECT COUNT(*) FROM pages WHERE visited = 1")?;
    Ok(Stats {
        pages,
        visited,
        unvisited: pages - visited,
        fetched: count("SELECT COUNT(*) FROM page_data WHERE html IS NOT NULL")?,
        errors: count("SELECT COUNT(*) FROM page_data WHERE error IS NOT NULL")?,
        processed: count("SELECT COUNT(*) FROM page_data WHERE processed = 1")?,
        breeds: count("SELECT COUNT(*) FROM dog_breeds")?,
    })
}

fn limit_clause(limit: Option<usize>) -> String {
    match limit {
        Some(n) => format!(" LIMIT {}", n),
        None => String::new(),
    }
}

// ── Tests ──
