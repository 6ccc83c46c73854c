use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;

use super::evaluator::RetentionDecision;

/// Outcome of applying a decision to the filesystem
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: usize,
    pub missing: usize,
    pub freed_bytes: u64,
    pub dry_run: bool,
}

/// Delete every archive the decision marks for deletion.
/// With `dry_run` nothing is touched and the report counts what would go.
pub fn prune(decision: &RetentionDecision, dry_run: bool) -> Result<PruneReport> {
    let mut report = PruneReport {
        dry_run,
        ..Default::default()
    };

    for verdict in &decision.delete {
        let path = &verdict.record.path;

        if dry_run {
            tracing::info!("Would remove {}", path.display());
            report.removed += 1;
            report.freed_bytes += verdict.record.size_bytes;
            continue;
        }

        match fs::remove_file(path) {
            Ok(()) => {
                tracing::info!("Removed {}", path.display());
                report.removed += 1;
                report.freed_bytes += verdict.record.size_bytes;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("Already gone: {}", path.display());
                report.missing += 1;
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to remove backup: {}", path.display()));
            }
        }
    }

    Ok(report)
}
