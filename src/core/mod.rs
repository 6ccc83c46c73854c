pub mod backup;
pub mod error;
pub mod evaluator;
pub mod policy;
pub mod pruner;

pub use backup::{list_backups, list_backups_at, parse_timestamp, BackupFileRecord, Glob};
pub use error::RetentionError;
pub use evaluator::{evaluate, Reason, RetentionDecision, Verdict};
pub use policy::{parse_retention, RetentionSpec, Tier};
pub use pruner::{prune, PruneReport};
