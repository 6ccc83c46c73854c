use anyhow::Result;
use clap::Parser;

use backup_rotate::app::App;
use backup_rotate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let app = App::from_cli(cli)?;
    app.run()?;

    Ok(())
}
