use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use sourcemap_fs::infra::config::Config;
use sourcemap_fs::ui::app::UiApp;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding the sourcemap files to explore
    #[arg(long, default_value = ".")]
    path: PathBuf,
    /// Configuration file layered over the global and workspace ones
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.path, cli.config.as_deref())?;
    sourcemap_fs::init(&config)?;

    let mut app = UiApp::open(&cli.path, config)?;
    app.run()
}
