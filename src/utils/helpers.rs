/// Helper utilities for the backup-rotate CLI

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::constants::{
    APP_NAME, ARCHIVE_EXTENSION, DATE_TIME_FORMAT, DEFAULT_BACKUP_DIR_NAME,
};

/// Default backup directory: ~/backup
pub fn default_backup_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home.join(DEFAULT_BACKUP_DIR_NAME))
}

/// Archive path for a run started at `now`, e.g. `~/backup/backup-rotate-2024-01-05_23-30.tgz`
pub fn default_output_path(backup_dir: &Path, now: NaiveDateTime) -> PathBuf {
    backup_dir.join(format!(
        "{}-{}.{}",
        APP_NAME,
        now.format(DATE_TIME_FORMAT),
        ARCHIVE_EXTENSION
    ))
}

/// Format bytes to human-readable size
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Age of an archive relative to `now`, rounded to whole hours
pub fn format_age(timestamp: NaiveDateTime, now: NaiveDateTime) -> String {
    let hours = (now - timestamp).num_hours();
    if hours < 0 {
        return "in the future".to_string();
    }
    if hours == 0 {
        return "just now".to_string();
    }
    humantime::format_duration(Duration::from_secs(hours as u64 * 3600)).to_string()
}

/// Check if a directory exists and is writable
pub fn is_dir_writable<P: AsRef<Path>>(path: P) -> bool {
    if let Ok(metadata) = std::fs::metadata(&path) {
        metadata.is_dir() && !metadata.permissions().readonly()
    } else {
        false
    }
}
