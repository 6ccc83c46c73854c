/// Retention policy: how many archives to keep per rotation tier
///
/// A policy is written as up to five comma-separated counts, in the order
/// `total,daily,weekly,monthly,yearly`. Missing trailing fields default to 100.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::RetentionError;
use crate::utils::constants::{
    DAILY_MAX_AGE_DAYS, DEFAULT_RETENTION_COUNT, MONTHLY_MAX_AGE_DAYS, RETENTION_FIELDS,
    RETENTION_FIELD_NAMES, WEEKLY_MAX_AGE_DAYS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionSpec {
    pub total: usize,
    pub daily: usize,
    pub weekly: usize,
    pub monthly: usize,
    pub yearly: usize,
}

impl Default for RetentionSpec {
    fn default() -> Self {
        Self {
            total: DEFAULT_RETENTION_COUNT,
            daily: DEFAULT_RETENTION_COUNT,
            weekly: DEFAULT_RETENTION_COUNT,
            monthly: DEFAULT_RETENTION_COUNT,
            yearly: DEFAULT_RETENTION_COUNT,
        }
    }
}

impl RetentionSpec {
    /// Per-tier keep count
    pub fn limit(&self, tier: Tier) -> usize {
        match tier {
            Tier::Daily => self.daily,
            Tier::Weekly => self.weekly,
            Tier::Monthly => self.monthly,
            Tier::Yearly => self.yearly,
        }
    }
}

impl fmt::Display for RetentionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}t {}d {}w {}m {}y",
            self.total, self.daily, self.weekly, self.monthly, self.yearly
        )
    }
}

impl FromStr for RetentionSpec {
    type Err = RetentionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_retention(s)
    }
}

/// Parse a `total,daily,weekly,monthly,yearly` retention string
pub fn parse_retention(spec: &str) -> Result<RetentionSpec, RetentionError> {
    let fields: Vec<&str> = spec.split(',').map(str::trim).collect();

    if fields.len() > RETENTION_FIELDS {
        return Err(RetentionError::invalid_spec(
            spec,
            format!("expected at most {} fields, got {}", RETENTION_FIELDS, fields.len()),
        ));
    }

    let mut counts = [DEFAULT_RETENTION_COUNT; RETENTION_FIELDS];
    for (i, field) in fields.iter().enumerate() {
        let name = RETENTION_FIELD_NAMES[i];
        if field.is_empty() {
            return Err(RetentionError::invalid_spec(spec, format!("{} is empty", name)));
        }
        if field.starts_with('-') {
            return Err(RetentionError::invalid_spec(
                spec,
                format!("{} must not be negative", name),
            ));
        }
        if !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RetentionError::invalid_spec(
                spec,
                format!("{} is not a number: '{}'", name, field),
            ));
        }
        counts[i] = field.parse::<usize>().map_err(|_| {
            RetentionError::invalid_spec(spec, format!("{} is out of range: '{}'", name, field))
        })?;
    }

    let [total, daily, weekly, monthly, yearly] = counts;
    Ok(RetentionSpec {
        total,
        daily,
        weekly,
        monthly,
        yearly,
    })
}

/// Rotation tier of an archive, by age
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Tier {
    /// Classify a timestamp by whole days elapsed until `now`.
    /// Future timestamps count as daily.
    pub fn classify(timestamp: NaiveDateTime, now: NaiveDateTime) -> Self {
        let age_days = (now - timestamp).num_days();
        if age_days < DAILY_MAX_AGE_DAYS {
            Tier::Daily
        } else if age_days < WEEKLY_MAX_AGE_DAYS {
            Tier::Weekly
        } else if age_days < MONTHLY_MAX_AGE_DAYS {
            Tier::Monthly
        } else {
            Tier::Yearly
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Daily => "daily",
            Tier::Weekly => "weekly",
            Tier::Monthly => "monthly",
            Tier::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
