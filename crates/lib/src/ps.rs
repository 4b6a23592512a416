//! Listing project containers.

use std::sync::Arc;

use serde::Serialize;

use crate::inventory::Inventory;
use crate::manifest::Project;
use crate::runtime::{ContainerRuntime, RuntimeContainer, RuntimeError};

/// One line of `ps` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PsRow {
  pub name: String,
  pub service: Option<String>,
  pub command: String,
  pub state: String,
  pub ports: String,
}

impl From<&RuntimeContainer> for PsRow {
  fn from(container: &RuntimeContainer) -> Self {
    let ports: Vec<String> = container.ports.iter().map(ToString::to_string).collect();
    Self {
      name: container.display_name().to_string(),
      service: container.service().map(str::to_string),
      command: container.command.clone(),
      state: container.state.clone(),
      ports: ports.join(","),
    }
  }
}

/// Rows for the project's containers. Only running ones unless `all` is set.
pub async fn list(runtime: Arc<dyn ContainerRuntime>, project: &Project, all: bool) -> Result<Vec<PsRow>, RuntimeError> {
  let inventory = Inventory::new(runtime, project.dir_label());
  let containers = inventory.load().await?;
  Ok(
    containers
      .iter()
      .filter(|c| all || c.is_running())
      .map(PsRow::from)
      .collect(),
  )
}
