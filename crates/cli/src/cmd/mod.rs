mod down;
mod ps;
mod startup;
mod up;

pub use down::cmd_down;
pub use ps::cmd_ps;
pub use startup::cmd_startup;
pub use up::cmd_up;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use podup_lib::config::RuntimeConfig;
use podup_lib::manifest::Project;
use podup_lib::runtime::{ContainerRuntime, DockerRuntime};

/// Load the manifest given with `-f`, or discover one in the current directory.
fn load_project(file: Option<&Path>) -> Result<Project> {
  let project = match file {
    Some(file) => Project::load(file)?,
    None => {
      let cwd = std::env::current_dir().context("Failed to determine current directory")?;
      Project::discover(&cwd)?
    }
  };
  debug!(file = %project.file.display(), services = project.services.len(), "project loaded");
  Ok(project)
}

/// Connect to the runtime configured through the environment.
///
/// Must be called from within the tokio runtime.
fn connect_runtime() -> Result<Arc<dyn ContainerRuntime>> {
  let config = RuntimeConfig::from_env();
  let runtime = DockerRuntime::connect(config).context("Failed to connect to container runtime")?;
  Ok(Arc::new(runtime))
}

fn async_runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Runtime::new().context("Failed to create async runtime")
}
