use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

/// `<dir>/<prefix>_<YYYYmmdd_HHMMSS>.json`
pub fn timestamped_path(dir: &Path, prefix: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{}.json", prefix, stamp))
}

/// Pretty-print `data` to a fresh timestamped file in `dir`.
pub fn write_json<T: Serialize + ?Sized>(dir: &Path, prefix: &str, data: &T) -> Result<PathBuf> {
    let path = timestamped_path(dir, prefix);
    write_json_to(&path, data)?;
    info!("Saved {:?}", path);
    Ok(path)
}

/// Pretty-print `data` to `path`, replacing it and creating parent directories.
pub fn write_json_to<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }

    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .with_context(|| format!("Failed to write {:?}", path))?;
    writer.flush()?;

    debug!("Wrote {:?}", path);
    Ok(())
}
