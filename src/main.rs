mod app;
mod cache;
mod cancel;
mod config;
mod debounce;
mod event;
mod logging;
mod movies;
mod search;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cinesearch")]
#[command(about = "Search a movie database from the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/cinesearch/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Delete cached responses and exit
  #[arg(long)]
  clear_cache: bool,

  /// Keep responses in memory only for this session
  #[arg(long)]
  no_cache: bool,

  /// Search to run on startup
  query: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Flushes buffered log lines on drop
  let _log_guard = logging::init()?;

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;
  if args.no_cache {
    config.cache.enabled = false;
  }

  if args.clear_cache {
    app::clear_persistent_cache(&config)?;
    println!("Cache cleared");
    return Ok(());
  }

  let client = app::build_client(&config)?;

  info!("starting cinesearch");

  // Initialize and run the app
  let mut app = app::App::new(config, client);
  app.run(args.query).await?;

  Ok(())
}
