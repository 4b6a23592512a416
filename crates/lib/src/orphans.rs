//! Orphan detection and cleanup.
//!
//! An orphan is a container scoped to the current project whose `compose-service`
//! label no longer names a desired service. Detection works on the cached
//! inventory snapshot and never lists the runtime again.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::manifest::ServiceConfig;
use crate::report::{Event, Reporter};
use crate::runtime::{ContainerRuntime, RuntimeContainer};

/// How to treat orphans once found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanMode {
  /// Warn that orphans exist.
  Report,
  /// Force-remove every orphan.
  Remove,
}

impl OrphanMode {
  pub fn from_flag(remove_orphans: bool) -> Self {
    if remove_orphans { Self::Remove } else { Self::Report }
  }
}

/// What the orphan pass found and did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrphanReport {
  /// Ids of orphan containers.
  pub found: Vec<String>,
  pub removed: Vec<String>,
  /// Container id and error message for each failed removal.
  pub failed: Vec<(String, String)>,
}

impl OrphanReport {
  pub fn is_success(&self) -> bool {
    self.failed.is_empty()
  }
}

/// Containers whose service label is not a key of `desired`.
///
/// Containers without a service label are not managed by the engine and are
/// never reported.
pub fn find_orphans<'a>(
  inventory: &'a [RuntimeContainer],
  desired: &BTreeMap<String, ServiceConfig>,
) -> Vec<&'a RuntimeContainer> {
  inventory
    .iter()
    .filter(|container| container.service().is_some_and(|service| !desired.contains_key(service)))
    .collect()
}

/// Detect orphans in `inventory` and handle them according to `mode`.
///
/// In remove mode every orphan is attempted; a failed removal is reported and
/// the pass continues with the next one.
pub async fn handle_orphans(
  runtime: &dyn ContainerRuntime,
  reporter: &dyn Reporter,
  inventory: &[RuntimeContainer],
  desired: &BTreeMap<String, ServiceConfig>,
  mode: OrphanMode,
) -> OrphanReport {
  let orphans = find_orphans(inventory, desired);
  let mut report = OrphanReport {
    found: orphans.iter().map(|c| c.id.clone()).collect(),
    ..Default::default()
  };

  if orphans.is_empty() {
    return report;
  }

  if mode == OrphanMode::Report {
    info!(count = orphans.len(), "orphan containers present");
    reporter.report(Event::OrphansPresent { count: orphans.len() });
    return report;
  }

  for orphan in orphans {
    let service = orphan.service().unwrap_or_default().to_string();
    let container = orphan.display_name().to_string();
    reporter.report(Event::RemovingOrphan {
      service: service.clone(),
      container: container.clone(),
    });

    match runtime.remove_container(&orphan.id, true, false).await {
      Ok(()) => {
        info!(service = %service, container = %orphan.id, "removed orphan");
        report.removed.push(orphan.id.clone());
      }
      Err(err) => {
        warn!(service = %service, container = %orphan.id, error = %err, "failed to remove orphan");
        reporter.report(Event::OrphanRemoveFailed {
          service,
          container,
          error: err.to_string(),
        });
        report.failed.push((orphan.id.clone(), err.to_string()));
      }
    }
  }

  report
}
