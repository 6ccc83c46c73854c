/// Defaults and tier boundaries shared by the CLI and the retention core

/// Default count for every retention field (`100t 100d 100w 100m 100y`)
pub const DEFAULT_RETENTION_COUNT: usize = 100;

/// Number of positional fields in a retention string
pub const RETENTION_FIELDS: usize = 5;

/// Field names in positional order
pub const RETENTION_FIELD_NAMES: [&str; RETENTION_FIELDS] =
    ["total", "daily", "weekly", "monthly", "yearly"];

/// Archive glob used when none is configured
pub const DEFAULT_PATTERN: &str = "*.tgz";

/// Archive extension appended to generated output names
pub const ARCHIVE_EXTENSION: &str = "tgz";

/// Backup directory under $HOME when none is configured
pub const DEFAULT_BACKUP_DIR_NAME: &str = "backup";

/// Name used for generated archives and the config directory
pub const APP_NAME: &str = "backup-rotate";

/// Timestamp formats accepted in archive names
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// Tier boundaries, in whole days of age (exclusive upper bounds)
pub const DAILY_MAX_AGE_DAYS: i64 = 7;
pub const WEEKLY_MAX_AGE_DAYS: i64 = 31;
pub const MONTHLY_MAX_AGE_DAYS: i64 = 365;
