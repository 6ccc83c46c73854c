/// One rotation run: resolve settings, scan, evaluate, report, prune

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::core::{
    evaluate, list_backups_at, parse_retention, parse_timestamp, prune, PruneReport,
    RetentionDecision, RetentionSpec, Verdict,
};
use crate::utils::{
    default_backup_dir, default_output_path, format_age, format_bytes, is_dir_writable,
    AppConfig, LogContext, LogSettings, DEFAULT_PATTERN,
};

/// Settings for a run after merging CLI flags over the config file
#[derive(Debug, Clone)]
pub struct App {
    pub backup_dir: PathBuf,
    pub output: PathBuf,
    pub pattern: String,
    pub retention: Option<String>,
    pub log: LogSettings,
    pub now: NaiveDateTime,
    pub dry_run: bool,
    pub json: bool,
    pub save_config: Option<PathBuf>,
}

/// What a run did
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub retention: Option<RetentionSpec>,
    /// Set when the backup directory had to be created
    pub created_directory: bool,
    pub decision: RetentionDecision,
    pub removed: usize,
    pub freed_bytes: u64,
    pub dry_run: bool,
}

impl App {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let (config, config_path) = match &cli.config {
            Some(path) => (AppConfig::load_from(path)?, path.clone()),
            None => (AppConfig::load()?, AppConfig::config_path()?),
        };
        Self::resolve(cli, config, config_path)
    }

    fn resolve(cli: Cli, config: AppConfig, config_path: PathBuf) -> Result<Self> {
        let now = match &cli.now {
            Some(raw) => parse_timestamp(raw)
                .with_context(|| format!("Invalid --now value: {}", raw))?,
            None => Local::now().naive_local(),
        };

        let backup_dir = match cli.backup_directory.or(config.backup_directory) {
            Some(dir) => dir,
            None => default_backup_dir()?,
        };
        let output = cli
            .output
            .unwrap_or_else(|| default_output_path(&backup_dir, now));

        Ok(Self {
            output,
            pattern: cli
                .pattern
                .or(config.pattern)
                .unwrap_or_else(|| DEFAULT_PATTERN.to_string()),
            retention: cli.retention.or(config.retention),
            log: LogSettings {
                verbosity: cli.log_level.or(config.log_level).unwrap_or(0),
                log_file: cli.log_file.or(config.log_file),
                color: !cli.no_color,
                to_stderr: cli.json,
            },
            now,
            dry_run: cli.dry_run,
            json: cli.json,
            save_config: cli.save_config.then_some(config_path),
            backup_dir,
        })
    }

    pub fn run(&self) -> Result<RunSummary> {
        let log = LogContext::init(&self.log).context("Failed to setup logging, aborting.")?;

        tracing::info!("Backup rotation starting");
        tracing::debug!("Backup Directory: {}", self.backup_dir.display());
        tracing::debug!("Backup File: {}", self.output.display());
        if let Some(file) = log.log_file() {
            tracing::debug!("Log File: {}", file.display());
        }
        tracing::debug!("Log Level: {}", log.console_level());

        let mut summary = RunSummary {
            dry_run: self.dry_run,
            ..Default::default()
        };

        // Parse before touching the filesystem so a bad policy aborts cleanly
        let spec = self.retention.as_deref().map(parse_retention).transpose()?;
        summary.retention = spec;

        if self.backup_dir.exists() && !self.backup_dir.is_dir() {
            anyhow::bail!(
                "Backup path is not a directory: {}",
                self.backup_dir.display()
            );
        }

        if !self.backup_dir.exists() {
            tracing::debug!("Directory set for backup does not exist");
            fs::create_dir_all(&self.backup_dir).with_context(|| {
                format!("Error creating directory: {}", self.backup_dir.display())
            })?;
            tracing::info!("Created backup directory {}", self.backup_dir.display());
            summary.created_directory = true;
        }

        match spec {
            Some(spec) if !summary.created_directory => {
                tracing::info!("Applying retention policy {}", spec);
                self.rotate(&spec, &mut summary)?;
            }
            Some(_) => tracing::info!("New backup directory has no history, skipping retention"),
            None => tracing::debug!("No retention policy given, skipping retention"),
        }

        if let Some(path) = &self.save_config {
            self.persist(path)?;
        }

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialize report")?
            );
        }

        tracing::info!("Backup rotation finished");
        Ok(summary)
    }

    fn rotate(&self, spec: &RetentionSpec, summary: &mut RunSummary) -> Result<()> {
        let records = list_backups_at(&self.backup_dir, &self.pattern, self.now)?;

        let decision = evaluate(&records, spec, self.now);
        tracing::info!(
            "{} archive(s): keeping {}, deleting {}",
            decision.len(),
            decision.keep.len(),
            decision.delete.len()
        );

        if !self.json {
            print!("{}", render_decision(&decision, self.now, self.log.color));
        }

        if !self.dry_run && !decision.delete.is_empty() && !is_dir_writable(&self.backup_dir) {
            tracing::warn!(
                "Backup directory looks read-only, removals may fail: {}",
                self.backup_dir.display()
            );
        }

        let PruneReport {
            removed,
            freed_bytes,
            ..
        } = prune(&decision, self.dry_run)?;
        tracing::info!(
            "{} {} archive(s), {}",
            if self.dry_run { "Would remove" } else { "Removed" },
            removed,
            format_bytes(freed_bytes)
        );

        summary.decision = decision;
        summary.removed = removed;
        summary.freed_bytes = freed_bytes;
        Ok(())
    }

    fn persist(&self, path: &std::path::Path) -> Result<()> {
        let mut config = AppConfig::load_from(path)?;
        config.backup_directory = Some(self.backup_dir.clone());
        config.pattern = Some(self.pattern.clone());
        if self.retention.is_some() {
            config.retention = self.retention.clone();
        }
        config.save_to(path)?;
        tracing::info!("Saved settings to {}", path.display());
        Ok(())
    }
}

/// One line per archive: verdict, tier, name, size, age
pub fn render_decision(decision: &RetentionDecision, now: NaiveDateTime, color: bool) -> String {
    let mut rows: Vec<(bool, &Verdict)> = decision
        .keep
        .iter()
        .map(|v| (true, v))
        .chain(decision.delete.iter().map(|v| (false, v)))
        .collect();
    rows.sort_by(|a, b| b.1.record.timestamp.cmp(&a.1.record.timestamp));

    let mut out = String::new();
    for (kept, verdict) in rows {
        let label = format!("{:<7}", if kept { "KEEP" } else { "DELETE" });
        let label = match (color, kept) {
            (false, _) => label,
            (true, true) => label.green().to_string(),
            (true, false) => label.red().to_string(),
        };
        let tier = verdict.tier.map(|t| t.as_str()).unwrap_or("-");
        let age = verdict
            .record
            .timestamp
            .map(|ts| format_age(ts, now))
            .unwrap_or_else(|| "unknown".to_string());

        out.push_str(&format!(
            "{} {:<8} {:<32} {:>10}  {}\n",
            label,
            tier,
            verdict.record.file_name(),
            format_bytes(verdict.record.size_bytes),
            age
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RetentionError;
    use clap::Parser;
    use tempfile::TempDir;

    fn app(dir: &TempDir, extra: &[&str]) -> App {
        let backup = dir.path().join("backup");
        let config = dir.path().join("config.toml");
        let mut args = vec![
            "backup-rotate".to_string(),
            "-d".to_string(),
            backup.display().to_string(),
            "-c".to_string(),
            config.display().to_string(),
            "--now".to_string(),
            "2024-01-11".to_string(),
            "--no-color".to_string(),
            "-l".to_string(),
            "2".to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        App::from_cli(Cli::try_parse_from(args).unwrap()).unwrap()
    }

    fn seed(dir: &TempDir, names: &[&str]) {
        let backup = dir.path().join("backup");
        fs::create_dir_all(&backup).unwrap();
        for name in names {
            fs::write(backup.join(name), b"archive").unwrap();
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, &[]);
        assert_eq!(app.pattern, "*.tgz");
        assert_eq!(app.retention, None);
        assert_eq!(
            app.output,
            dir.path().join("backup").join("backup-rotate-2024-01-11_00-00.tgz")
        );
        assert_eq!(app.save_config, None);
    }

    #[test]
    fn test_cli_overrides_config() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            pattern: Some("db-*.tgz".to_string()),
            retention: Some("10".to_string()),
            ..Default::default()
        };
        config.save_to(&dir.path().join("config.toml")).unwrap();

        let app = app(&dir, &["-r", "5,2"]);
        assert_eq!(app.pattern, "db-*.tgz");
        assert_eq!(app.retention.as_deref(), Some("5,2"));
    }

    #[test]
    fn test_without_retention_nothing_is_pruned() {
        let dir = TempDir::new().unwrap();
        seed(&dir, &["2024-01-01.tgz", "2024-01-02.tgz"]);

        let summary = app(&dir, &[]).run().unwrap();
        assert!(summary.retention.is_none());
        assert!(summary.decision.is_empty());
        assert!(dir.path().join("backup/2024-01-01.tgz").exists());
    }

    #[test]
    fn test_new_directory_skips_retention() {
        let dir = TempDir::new().unwrap();
        let summary = app(&dir, &["-r", "0"]).run().unwrap();

        assert!(summary.created_directory);
        assert!(summary.decision.is_empty());
        assert!(dir.path().join("backup").is_dir());
    }

    #[test]
    fn test_rotation_prunes_old_archives() {
        let dir = TempDir::new().unwrap();
        seed(
            &dir,
            &[
                "2024-01-05.tgz",
                "2024-01-06.tgz",
                "2024-01-07.tgz",
                "2024-01-08.tgz",
                "2024-01-09_18-30.tgz",
                "notadate.tgz",
                "keep.log",
            ],
        );

        let summary = app(&dir, &["-r", "100,2"]).run().unwrap();
        assert_eq!(summary.decision.keep.len(), 3);
        assert_eq!(summary.removed, 3);

        let backup = dir.path().join("backup");
        assert!(backup.join("2024-01-09_18-30.tgz").exists());
        assert!(backup.join("2024-01-08.tgz").exists());
        assert!(backup.join("notadate.tgz").exists());
        assert!(backup.join("keep.log").exists());
        assert!(!backup.join("2024-01-05.tgz").exists());
    }

    #[test]
    fn test_dry_run_leaves_files() {
        let dir = TempDir::new().unwrap();
        seed(&dir, &["2024-01-08.tgz", "2024-01-09.tgz", "2024-01-10.tgz"]);

        let summary = app(&dir, &["-r", "1", "-n"]).run().unwrap();
        assert!(summary.dry_run);
        assert_eq!(summary.removed, 2);
        assert!(dir.path().join("backup/2024-01-08.tgz").exists());
    }

    #[test]
    fn test_invalid_retention_aborts() {
        let dir = TempDir::new().unwrap();
        seed(&dir, &["2024-01-08.tgz"]);

        let err = app(&dir, &["-r", "1,2,3,4,5,6"]).run().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RetentionError>(),
            Some(RetentionError::InvalidRetentionSpec { .. })
        ));
        assert!(dir.path().join("backup/2024-01-08.tgz").exists());
    }

    #[test]
    fn test_backup_path_that_is_a_file_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("backup"), b"not a directory").unwrap();

        let err = app(&dir, &["-r", "1"]).run().unwrap_err();
        assert!(err.to_string().contains("not a directory"));
        assert!(dir.path().join("backup").is_file());
    }

    #[test]
    fn test_save_config() {
        let dir = TempDir::new().unwrap();
        seed(&dir, &[]);
        app(&dir, &["-r", "30,7", "--save-config"]).run().unwrap();

        let saved = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(saved.retention.as_deref(), Some("30,7"));
        assert_eq!(saved.pattern.as_deref(), Some("*.tgz"));
        assert_eq!(saved.backup_directory, Some(dir.path().join("backup")));
    }

    #[test]
    fn test_render_decision_plain() {
        let dir = TempDir::new().unwrap();
        seed(&dir, &["2024-01-09.tgz", "2024-01-10.tgz"]);
        let app = app(&dir, &[]);
        let records = list_backups_at(&app.backup_dir, "*.tgz", app.now).unwrap();
        let decision = evaluate(&records, &parse_retention("1").unwrap(), app.now);

        let rendered = render_decision(&decision, app.now, false);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("KEEP    daily    2024-01-10.tgz"));
        assert!(lines[0].ends_with("1day"));
        assert!(lines[1].starts_with("DELETE  daily    2024-01-09.tgz"));
    }
}
