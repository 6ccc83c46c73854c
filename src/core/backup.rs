/// Backup archive enumeration
///
/// Archives are plain files in one directory, named with a `YYYY-MM-DD` or
/// `YYYY-MM-DD_HH-MM` timestamp somewhere in the name (for example
/// `db-2024-01-05_23-30.tgz`). Listing annotates each archive with that
/// timestamp and its rotation tier.

use chrono::{Local, NaiveDate, NaiveDateTime};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::error::RetentionError;
use super::policy::Tier;
use crate::utils::constants::{DATE_FORMAT, DATE_TIME_FORMAT};

/// One archive found in the backup directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupFileRecord {
    pub path: PathBuf,
    pub timestamp: Option<NaiveDateTime>,
    pub tier: Option<Tier>,
    pub size_bytes: u64,
}

impl BackupFileRecord {
    /// Build a record from a path alone, parsing the timestamp from its name
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let timestamp = parse_timestamp(&file_name_of(&path)).ok();
        Self {
            path,
            timestamp,
            tier: None,
            size_bytes: 0,
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Extract the archive timestamp from a file name
pub fn parse_timestamp(file_name: &str) -> Result<NaiveDateTime, RetentionError> {
    static TIMESTAMP_RE: OnceLock<Regex> = OnceLock::new();
    let re = TIMESTAMP_RE.get_or_init(|| {
        Regex::new(r"(\d{4}-\d{2}-\d{2})(?:_(\d{2}-\d{2}))?").unwrap()
    });

    re.captures_iter(file_name)
        .find_map(|caps| {
            let date = caps.get(1)?.as_str();
            let with_time = caps.get(2).and_then(|time| {
                let stamp = format!("{}_{}", date, time.as_str());
                NaiveDateTime::parse_from_str(&stamp, DATE_TIME_FORMAT).ok()
            });
            with_time.or_else(|| {
                NaiveDate::parse_from_str(date, DATE_FORMAT)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
        .ok_or_else(|| RetentionError::MalformedFilename(file_name.to_string()))
}

/// Shell-style matcher for archive names (`*`, `?`, `[seq]`, `[!seq]`)
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: Pattern,
}

impl Glob {
    pub fn new(pattern: &str) -> Result<Self, RetentionError> {
        let compiled = Pattern::new(pattern).map_err(|source| RetentionError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern: compiled })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.pattern.matches(name)
    }
}

/// List archives in `directory` matching `pattern`, classified against the local clock
pub fn list_backups(
    directory: &Path,
    pattern: &str,
) -> Result<Vec<BackupFileRecord>, RetentionError> {
    list_backups_at(directory, pattern, Local::now().naive_local())
}

/// List archives in `directory` matching `pattern`, classified against `now`
pub fn list_backups_at(
    directory: &Path,
    pattern: &str,
    now: NaiveDateTime,
) -> Result<Vec<BackupFileRecord>, RetentionError> {
    if !directory.is_dir() {
        return Err(RetentionError::DirectoryNotFound(directory.to_path_buf()));
    }

    let glob = Glob::new(pattern)?;
    let entries = fs::read_dir(directory).map_err(|e| RetentionError::io(directory, e))?;

    let mut records = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RetentionError::io(directory, e))?;
        let path = entry.path();
        let metadata = entry.metadata().map_err(|e| RetentionError::io(&path, e))?;
        if !metadata.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if !glob.is_match(&name) {
            continue;
        }

        let timestamp = match parse_timestamp(&name) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::warn!("{}; keeping it out of rotation", e);
                None
            }
        };

        records.push(BackupFileRecord {
            path,
            timestamp,
            tier: timestamp.map(|ts| Tier::classify(ts, now)),
            size_bytes: metadata.len(),
        });
    }

    records.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(
        "Found {} archive(s) matching '{}' in {}",
        records.len(),
        pattern,
        directory.display()
    );

    Ok(records)
}
