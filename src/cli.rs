/// CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

// Build timestamp injected at compile time
pub const VERSION_WITH_BUILD: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built: ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "backup-rotate")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    /// Destination archive path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory holding the dated archives (default: ~/backup)
    #[arg(short = 'd', long)]
    pub backup_directory: Option<PathBuf>,

    /// Retention policy: total,daily,weekly,monthly,yearly. Enables pruning.
    #[arg(short, long, value_name = "SPEC")]
    pub retention: Option<String>,

    /// Console verbosity: 1-2 error, 3 warn, 4 info, 5 debug
    #[arg(short, long, value_name = "N")]
    pub log_level: Option<u8>,

    /// Also log everything at debug level to this file
    #[arg(short = 'f', long)]
    pub log_file: Option<PathBuf>,

    /// Glob matching archive names
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Report what would be deleted without deleting
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the decision as JSON
    #[arg(long)]
    pub json: bool,

    /// Evaluate ages against this time (YYYY-MM-DD or YYYY-MM-DD_HH-MM)
    #[arg(long, value_name = "TIMESTAMP")]
    pub now: Option<String>,

    /// Config file (default: ~/.config/backup-rotate/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the effective directory, pattern and retention to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
