//! Per-service reconciliation.
//!
//! Each service goes through one decide-and-act cycle:
//! 1. Fingerprint the desired configuration and build its materialization arguments
//! 2. Look up the container carrying the service's identity label in the inventory
//! 3. [`decide`] between no-op, create and recreate
//! 4. Act: remove the stale container if recreating, then materialize a fresh one
//!
//! Failures are local to the service. They are returned as [`ReconcileError`]
//! with the service name attached and never abort sibling reconciliations.

mod command;

pub use command::{create_args, is_valid_port};

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fingerprint::{ServiceFingerprint, fingerprint};
use crate::inventory::Inventory;
use crate::labels::IdentityLabels;
use crate::manifest::ServiceConfig;
use crate::report::{Event, Reporter};
use crate::runtime::{ContainerRuntime, RuntimeContainer, RuntimeError};
use crate::util::hash::HashError;

/// Why an existing container has to be replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecreateReason {
  /// The container exists but is not running. Stopped containers are never resumed.
  NotRunning,
  /// The `config-fingerprint` label differs from the desired fingerprint.
  ConfigChanged,
  /// The image reference now resolves to a different image than the container runs.
  ImageChanged,
}

impl fmt::Display for RecreateReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let reason = match self {
      RecreateReason::NotRunning => "not running",
      RecreateReason::ConfigChanged => "configuration changed",
      RecreateReason::ImageChanged => "image changed",
    };
    write!(f, "{}", reason)
  }
}

/// What to do about one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  NoOp,
  Create,
  Recreate { container_id: String, reason: RecreateReason },
}

/// What a successful reconciliation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
  UpToDate,
  Created,
  Recreated(RecreateReason),
}

#[derive(Debug, Error)]
pub enum ReconcileError {
  #[error("image is required")]
  ImageRequired { service: String },

  #[error("port [{port}] is invalid")]
  InvalidPort { service: String, port: String },

  #[error("failed to fingerprint configuration: {source}")]
  Fingerprint {
    service: String,
    #[source]
    source: HashError,
  },

  #[error("{source}")]
  Runtime {
    service: String,
    #[source]
    source: RuntimeError,
  },

  #[error("reconciliation task aborted")]
  Aborted { service: String },
}

impl ReconcileError {
  /// The service whose reconciliation failed.
  pub fn service(&self) -> &str {
    match self {
      ReconcileError::ImageRequired { service }
      | ReconcileError::InvalidPort { service, .. }
      | ReconcileError::Fingerprint { service, .. }
      | ReconcileError::Runtime { service, .. }
      | ReconcileError::Aborted { service } => service,
    }
  }

  fn runtime(service: &str) -> impl FnOnce(RuntimeError) -> Self + '_ {
    move |source| ReconcileError::Runtime {
      service: service.to_string(),
      source,
    }
  }
}

/// Result of reconciling one service.
#[derive(Debug)]
pub struct ServiceOutcome {
  pub service: String,
  pub result: Result<Applied, ReconcileError>,
}

impl ServiceOutcome {
  pub fn is_success(&self) -> bool {
    self.result.is_ok()
  }
}

/// Decide what to do about a service given the container currently carrying its label.
///
/// Only a running container whose fingerprint label matches AND whose image is
/// still what the desired reference resolves to is left alone. The image check
/// is the only step that talks to the runtime, so containers that already fail
/// the label check are decided without any I/O.
pub async fn decide(
  runtime: &dyn ContainerRuntime,
  desired: &ServiceConfig,
  desired_fingerprint: &ServiceFingerprint,
  actual: Option<&RuntimeContainer>,
) -> Result<Action, RuntimeError> {
  let Some(container) = actual else {
    return Ok(Action::Create);
  };

  let recreate = |reason| Action::Recreate {
    container_id: container.id.clone(),
    reason,
  };

  if !container.is_running() {
    return Ok(recreate(RecreateReason::NotRunning));
  }

  let recorded = IdentityLabels::decode(&container.labels);
  if recorded.as_ref().map(|identity| &identity.fingerprint) != Some(desired_fingerprint) {
    return Ok(recreate(RecreateReason::ConfigChanged));
  }

  let image = runtime.resolve_image(desired.image_ref()).await?;
  let detail = runtime.inspect_container(&container.id).await?;
  if detail.image_id != image.id {
    debug!(container = %container.id, running = %detail.image_id, desired = %image.id, "image id mismatch");
    return Ok(recreate(RecreateReason::ImageChanged));
  }

  Ok(Action::NoOp)
}

/// Shared context for reconciling services of one project.
///
/// Cheap to clone; every clone observes the same inventory snapshot.
#[derive(Clone)]
pub struct Reconciler {
  runtime: Arc<dyn ContainerRuntime>,
  inventory: Arc<Inventory>,
  reporter: Arc<dyn Reporter>,
  detach: bool,
}

impl Reconciler {
  pub fn new(
    runtime: Arc<dyn ContainerRuntime>,
    inventory: Arc<Inventory>,
    reporter: Arc<dyn Reporter>,
    detach: bool,
  ) -> Self {
    Self {
      runtime,
      inventory,
      reporter,
      detach,
    }
  }

  /// Run one decide-and-act cycle, reporting progress and the final failure if any.
  pub async fn reconcile(&self, service: &str, config: &ServiceConfig) -> ServiceOutcome {
    let result = self.try_reconcile(service, config).await;

    match &result {
      Ok(applied) => debug!(service, outcome = ?applied, "service reconciled"),
      Err(err) => {
        warn!(service, error = %err, "service reconciliation failed");
        self.reporter.report(Event::Failed {
          service: service.to_string(),
          error: err.to_string(),
        });
      }
    }

    ServiceOutcome {
      service: service.to_string(),
      result,
    }
  }

  async fn try_reconcile(&self, service: &str, config: &ServiceConfig) -> Result<Applied, ReconcileError> {
    let desired_fingerprint = fingerprint(config).map_err(|source| ReconcileError::Fingerprint {
      service: service.to_string(),
      source,
    })?;

    let identity = IdentityLabels::new(self.inventory.project_dir(), service, desired_fingerprint.clone());
    let args = create_args(service, config, &identity, self.detach)?;

    let actual = self
      .inventory
      .get_container(service)
      .await
      .map_err(ReconcileError::runtime(service))?;

    let action = decide(self.runtime.as_ref(), config, &desired_fingerprint, actual)
      .await
      .map_err(ReconcileError::runtime(service))?;

    match action {
      Action::NoOp => {
        self.reporter.report(Event::UpToDate {
          service: service.to_string(),
        });
        Ok(Applied::UpToDate)
      }
      Action::Create => {
        self.reporter.report(Event::Creating {
          service: service.to_string(),
        });
        self.materialize(service, &args).await?;
        Ok(Applied::Created)
      }
      Action::Recreate { container_id, reason } => {
        info!(service, container = %container_id, %reason, "recreating container");
        self.reporter.report(Event::Recreating {
          service: service.to_string(),
          reason,
        });
        self
          .runtime
          .remove_container(&container_id, true, false)
          .await
          .map_err(ReconcileError::runtime(service))?;
        self.materialize(service, &args).await?;
        Ok(Applied::Recreated(reason))
      }
    }
  }

  async fn materialize(&self, service: &str, args: &[String]) -> Result<(), ReconcileError> {
    debug!(service, args = ?args, "materializing container");
    self
      .runtime
      .materialize_container(args, !self.detach)
      .await
      .map_err(ReconcileError::runtime(service))?;

    info!(service, "container created");
    self.reporter.report(Event::Created {
      service: service.to_string(),
    });
    Ok(())
  }
}
