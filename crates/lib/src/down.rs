//! Tearing a project down.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::converge::select_services;
use crate::inventory::Inventory;
use crate::manifest::Project;
use crate::orphans::{OrphanMode, OrphanReport, handle_orphans};
use crate::report::{Event, Reporter};
use crate::runtime::{ContainerRuntime, RuntimeError};

#[derive(Debug, Error)]
pub enum DownError {
  #[error("failed to load container inventory: {0}")]
  Inventory(#[source] RuntimeError),
}

/// Options for [`down`].
#[derive(Debug, Clone, Default)]
pub struct DownOptions {
  /// Services to remove. Empty means all services in the manifest.
  pub services: Vec<String>,
  pub remove_orphans: bool,
}

/// What happened to one service's container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
  Removed,
  /// No container carried the service label.
  Absent,
}

#[derive(Debug)]
pub struct DownOutcome {
  pub service: String,
  pub result: Result<Removal, RuntimeError>,
}

#[derive(Debug, Default)]
pub struct DownReport {
  pub outcomes: Vec<DownOutcome>,
  pub unknown: Vec<String>,
  pub orphans: OrphanReport,
}

impl DownReport {
  pub fn is_success(&self) -> bool {
    self.outcomes.iter().all(|o| o.result.is_ok()) && self.orphans.is_success()
  }
}

/// Force-remove the containers of the targeted services, then handle orphans.
///
/// Services are removed one at a time; a failed removal is reported and the
/// remaining services are still processed.
pub async fn down(
  runtime: Arc<dyn ContainerRuntime>,
  reporter: Arc<dyn Reporter>,
  project: &Project,
  options: &DownOptions,
) -> Result<DownReport, DownError> {
  let inventory = Inventory::new(runtime.clone(), project.dir_label());
  let snapshot = inventory.load().await.map_err(DownError::Inventory)?;

  let (targets, unknown) = select_services(project, &options.services, reporter.as_ref());
  info!(services = targets.len(), project = %project.dir.display(), "removing services");

  let mut outcomes = Vec::with_capacity(targets.len());
  for (service, _) in targets {
    let Some(container) = snapshot.iter().find(|c| c.service() == Some(service)) else {
      outcomes.push(DownOutcome {
        service: service.to_string(),
        result: Ok(Removal::Absent),
      });
      continue;
    };

    reporter.report(Event::Removing {
      service: service.to_string(),
    });
    let result = match runtime.remove_container(&container.id, true, false).await {
      Ok(()) => {
        info!(service, container = %container.id, "container removed");
        reporter.report(Event::Removed {
          service: service.to_string(),
        });
        Ok(Removal::Removed)
      }
      Err(err) => {
        warn!(service, container = %container.id, error = %err, "failed to remove container");
        reporter.report(Event::Failed {
          service: service.to_string(),
          error: err.to_string(),
        });
        Err(err)
      }
    };
    outcomes.push(DownOutcome {
      service: service.to_string(),
      result,
    });
  }

  let orphans = handle_orphans(
    runtime.as_ref(),
    reporter.as_ref(),
    snapshot,
    &project.services,
    OrphanMode::from_flag(options.remove_orphans),
  )
  .await;

  Ok(DownReport {
    outcomes,
    unknown,
    orphans,
  })
}
