mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_down, cmd_ps, cmd_startup, cmd_up};
use output::OutputFormat;

/// podup - converge podman containers to a compose file
#[derive(Parser)]
#[command(name = "podup")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Compose file to use instead of discovering one in the current directory
  #[arg(short, long, global = true)]
  file: Option<PathBuf>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Create or recreate containers so they match the compose file
  Up {
    /// Services to converge (default: all)
    services: Vec<String>,

    /// Run containers in the background
    #[arg(short, long)]
    detach: bool,

    /// Remove containers for services not defined in the compose file
    #[arg(long)]
    remove_orphans: bool,
  },

  /// Remove the containers created by `up`
  Down {
    /// Services to remove (default: all)
    services: Vec<String>,

    /// Remove containers for services not defined in the compose file
    #[arg(long)]
    remove_orphans: bool,
  },

  /// List the project's containers
  Ps {
    /// Include stopped containers
    #[arg(short, long)]
    all: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
  },

  /// Restart exited containers with restart policy `always` (run at boot)
  Startup,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("podup=debug,podup_lib=debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let file = cli.file.as_deref();
  match cli.command {
    Commands::Up {
      services,
      detach,
      remove_orphans,
    } => cmd_up(file, services, detach, remove_orphans),
    Commands::Down {
      services,
      remove_orphans,
    } => cmd_down(file, services, remove_orphans),
    Commands::Ps { all, format } => cmd_ps(file, all, format),
    Commands::Startup => cmd_startup(),
  }
}
