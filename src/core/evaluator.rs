/// Retention evaluation
///
/// Keeps the newest `spec.<tier>` archives of each tier, then trims the
/// combined keep set to `spec.total` by dropping the oldest. Archives that
/// cannot be classified are kept unless the cap leaves no room: they claim
/// cap slots before any dated archive does.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::backup::BackupFileRecord;
use super::policy::{RetentionSpec, Tier};

/// Why a record ended up where it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Within its tier's count and the total cap
    Retained,
    /// Could not be classified; kept ahead of dated archives
    Unclassified,
    /// Beyond its tier's count
    TierLimit,
    /// Dropped to satisfy the total cap
    TotalCap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub record: BackupFileRecord,
    pub tier: Option<Tier>,
    pub reason: Reason,
}

/// Keep/delete partition of a set of records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetentionDecision {
    pub keep: Vec<Verdict>,
    pub delete: Vec<Verdict>,
}

impl RetentionDecision {
    pub fn is_empty(&self) -> bool {
        self.keep.is_empty() && self.delete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keep.len() + self.delete.len()
    }

    pub fn deleted_bytes(&self) -> u64 {
        self.delete.iter().map(|v| v.record.size_bytes).sum()
    }
}

/// Newest first; equal timestamps put the greater file name first
fn newest_first(
    a: &(NaiveDateTime, &BackupFileRecord),
    b: &(NaiveDateTime, &BackupFileRecord),
) -> Ordering {
    b.0.cmp(&a.0)
        .then_with(|| b.1.file_name().cmp(&a.1.file_name()))
}

/// Partition `records` into keep and delete according to `spec`
pub fn evaluate(
    records: &[BackupFileRecord],
    spec: &RetentionSpec,
    now: NaiveDateTime,
) -> RetentionDecision {
    let mut decision = RetentionDecision::default();
    let mut tiers: BTreeMap<Tier, Vec<(NaiveDateTime, &BackupFileRecord)>> = BTreeMap::new();
    let mut unclassified: Vec<&BackupFileRecord> = Vec::new();

    for record in records {
        match record.timestamp {
            Some(ts) => {
                let tier = record.tier.unwrap_or_else(|| Tier::classify(ts, now));
                tiers.entry(tier).or_default().push((ts, record));
            }
            None => unclassified.push(record),
        }
    }

    // Candidates for the total cap, in the order they claim a slot
    unclassified.sort_by_key(|r| std::cmp::Reverse(r.file_name()));
    let mut candidates: Vec<Verdict> = unclassified
        .into_iter()
        .map(|record| Verdict {
            record: record.clone(),
            tier: None,
            reason: Reason::Unclassified,
        })
        .collect();

    let mut kept: Vec<(NaiveDateTime, &BackupFileRecord, Tier)> = Vec::new();
    for (tier, mut members) in tiers {
        members.sort_by(newest_first);
        let limit = spec.limit(tier);
        tracing::debug!(
            "{} tier: {} archive(s), keeping up to {}",
            tier,
            members.len(),
            limit
        );

        for (i, (ts, record)) in members.into_iter().enumerate() {
            if i < limit {
                kept.push((ts, record, tier));
            } else {
                decision.delete.push(Verdict {
                    record: record.clone(),
                    tier: Some(tier),
                    reason: Reason::TierLimit,
                });
            }
        }
    }

    kept.sort_by(|a, b| newest_first(&(a.0, a.1), &(b.0, b.1)));
    candidates.extend(kept.into_iter().map(|(_, record, tier)| Verdict {
        record: record.clone(),
        tier: Some(tier),
        reason: Reason::Retained,
    }));

    if candidates.len() > spec.total {
        tracing::debug!(
            "{} archive(s) retained exceeds total cap of {}",
            candidates.len(),
            spec.total
        );
    }

    for (i, mut verdict) in candidates.into_iter().enumerate() {
        if i < spec.total {
            decision.keep.push(verdict);
        } else {
            verdict.reason = Reason::TotalCap;
            decision.delete.push(verdict);
        }
    }

    decision
}
