//! Convergence coordinator.
//!
//! Drives reconciliation for every targeted service of a project and then runs
//! the orphan pass exactly once. In attached mode services are reconciled one
//! after another so each foreground `run` owns the terminal. In detached mode
//! every service is reconciled on its own task and the coordinator waits on a
//! channel sized to the number of services until each task has signalled.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::inventory::Inventory;
use crate::manifest::{Project, ServiceConfig};
use crate::orphans::{OrphanMode, OrphanReport, handle_orphans};
use crate::reconcile::{ReconcileError, Reconciler, ServiceOutcome};
use crate::report::{Event, Reporter};
use crate::runtime::{ContainerRuntime, RuntimeError};

/// Options for [`converge`].
#[derive(Debug, Clone, Default)]
pub struct ConvergeOptions {
  /// Services to reconcile. Empty means all services in the manifest.
  pub services: Vec<String>,
  /// Launch containers in the background and reconcile services concurrently.
  pub detach: bool,
  /// Remove orphan containers instead of only warning about them.
  pub remove_orphans: bool,
}

/// Errors that abort the whole invocation before any service is touched.
#[derive(Debug, Error)]
pub enum ConvergeError {
  #[error("failed to load container inventory: {0}")]
  Inventory(#[source] RuntimeError),
}

/// Everything a convergence run did.
#[derive(Debug, Default)]
pub struct ConvergeReport {
  /// One outcome per reconciled service, ordered by service name.
  pub outcomes: Vec<ServiceOutcome>,
  /// Requested names that are not declared in the manifest.
  pub unknown: Vec<String>,
  pub orphans: OrphanReport,
}

impl ConvergeReport {
  /// True when every service reconciled and every requested orphan removal succeeded.
  pub fn is_success(&self) -> bool {
    self.outcomes.iter().all(ServiceOutcome::is_success) && self.orphans.is_success()
  }

  pub fn failures(&self) -> impl Iterator<Item = &ServiceOutcome> {
    self.outcomes.iter().filter(|o| !o.is_success())
  }
}

/// Split the requested names into declared services and unknown names.
///
/// An empty request selects every service. Unknown names are reported and skipped.
pub fn select_services<'a>(
  project: &'a Project,
  requested: &[String],
  reporter: &dyn Reporter,
) -> (Vec<(&'a str, &'a ServiceConfig)>, Vec<String>) {
  if requested.is_empty() {
    let all = project.services.iter().map(|(name, config)| (name.as_str(), config)).collect();
    return (all, Vec::new());
  }

  let mut selected = Vec::new();
  let mut unknown = Vec::new();
  let mut seen = BTreeSet::new();
  for name in requested {
    if !seen.insert(name.as_str()) {
      continue;
    }
    match project.services.get_key_value(name) {
      Some((name, config)) => selected.push((name.as_str(), config)),
      None => {
        warn!(service = %name, "service does not exist");
        reporter.report(Event::UnknownService { service: name.clone() });
        unknown.push(name.clone());
      }
    }
  }
  (selected, unknown)
}

/// Converge the runtime towards `project`.
///
/// The inventory is listed before anything else; if that fails nothing is
/// reconciled. Per-service failures end up in the report and never stop
/// sibling services.
pub async fn converge(
  runtime: Arc<dyn ContainerRuntime>,
  reporter: Arc<dyn Reporter>,
  project: &Project,
  options: &ConvergeOptions,
) -> Result<ConvergeReport, ConvergeError> {
  let inventory = Arc::new(Inventory::new(runtime.clone(), project.dir_label()));
  inventory.load().await.map_err(|err| {
    error!(error = %err, "cannot reconcile against unknown runtime state");
    ConvergeError::Inventory(err)
  })?;

  let (targets, unknown) = select_services(project, &options.services, reporter.as_ref());
  info!(
    services = targets.len(),
    detach = options.detach,
    project = %project.dir.display(),
    "converging services"
  );

  let reconciler = Reconciler::new(runtime.clone(), inventory.clone(), reporter.clone(), options.detach);
  let mut outcomes = if options.detach {
    converge_concurrent(&reconciler, &targets).await
  } else {
    converge_sequential(&reconciler, &targets).await
  };
  outcomes.sort_by(|a, b| a.service.cmp(&b.service));

  let snapshot = inventory.load().await.map_err(ConvergeError::Inventory)?;
  let orphans = handle_orphans(
    runtime.as_ref(),
    reporter.as_ref(),
    snapshot,
    &project.services,
    OrphanMode::from_flag(options.remove_orphans),
  )
  .await;

  let report = ConvergeReport {
    outcomes,
    unknown,
    orphans,
  };
  info!(
    reconciled = report.outcomes.len(),
    failed = report.failures().count(),
    orphans = report.orphans.found.len(),
    "convergence finished"
  );
  Ok(report)
}

async fn converge_sequential(reconciler: &Reconciler, targets: &[(&str, &ServiceConfig)]) -> Vec<ServiceOutcome> {
  let mut outcomes = Vec::with_capacity(targets.len());
  for (name, config) in targets {
    outcomes.push(reconciler.reconcile(name, config).await);
  }
  outcomes
}

async fn converge_concurrent(reconciler: &Reconciler, targets: &[(&str, &ServiceConfig)]) -> Vec<ServiceOutcome> {
  let expected = targets.len();
  if expected == 0 {
    return Vec::new();
  }

  let (tx, mut rx) = mpsc::channel::<ServiceOutcome>(expected);
  for (name, config) in targets {
    let tx = tx.clone();
    let reconciler = reconciler.clone();
    let name = name.to_string();
    let config = (*config).clone();
    tokio::spawn(async move {
      let outcome = reconciler.reconcile(&name, &config).await;
      if tx.send(outcome).await.is_err() {
        debug!(service = %name, "coordinator stopped listening");
      }
    });
  }
  drop(tx);

  let mut outcomes = Vec::with_capacity(expected);
  while outcomes.len() < expected {
    match rx.recv().await {
      Some(outcome) => outcomes.push(outcome),
      // Every sender is gone: the remaining tasks died without signalling.
      None => break,
    }
  }

  if outcomes.len() < expected {
    let finished: BTreeSet<&str> = outcomes.iter().map(|o| o.service.as_str()).collect();
    let aborted: Vec<ServiceOutcome> = targets
      .iter()
      .filter(|(name, _)| !finished.contains(name))
      .map(|(name, _)| {
        error!(service = %name, "reconciliation task aborted");
        ServiceOutcome {
          service: name.to_string(),
          result: Err(ReconcileError::Aborted {
            service: name.to_string(),
          }),
        }
      })
      .collect();
    outcomes.extend(aborted);
  }

  outcomes
}
