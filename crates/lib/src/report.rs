//! Progress events emitted while converging.
//!
//! The engine reports what it is doing through a [`Reporter`]; the CLI renders
//! events as lines prefixed with the service name so concurrent runs stay
//! attributable. Reporters are shared across reconciliation tasks.

use std::fmt;

use crate::reconcile::RecreateReason;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  /// The running container already matches the desired configuration.
  UpToDate { service: String },
  Creating { service: String },
  Recreating { service: String, reason: RecreateReason },
  Created { service: String },
  Failed { service: String, error: String },
  /// A requested service is not declared in the manifest.
  UnknownService { service: String },
  /// Orphans exist but removal was not requested.
  OrphansPresent { count: usize },
  RemovingOrphan { service: String, container: String },
  OrphanRemoveFailed { service: String, container: String, error: String },
  Removing { service: String },
  Removed { service: String },
  Starting { container: String, id: String },
  Started { container: String },
  StartFailed { container: String, error: String },
}

impl Event {
  /// The service the event belongs to, if it is about one.
  pub fn service(&self) -> Option<&str> {
    match self {
      Event::UpToDate { service }
      | Event::Creating { service }
      | Event::Recreating { service, .. }
      | Event::Created { service }
      | Event::Failed { service, .. }
      | Event::UnknownService { service }
      | Event::RemovingOrphan { service, .. }
      | Event::OrphanRemoveFailed { service, .. }
      | Event::Removing { service }
      | Event::Removed { service } => Some(service.as_str()),
      Event::OrphansPresent { .. } | Event::Starting { .. } | Event::Started { .. } | Event::StartFailed { .. } => None,
    }
  }

  pub fn is_failure(&self) -> bool {
    matches!(
      self,
      Event::Failed { .. } | Event::OrphanRemoveFailed { .. } | Event::StartFailed { .. }
    )
  }
}

impl fmt::Display for Event {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Event::UpToDate { .. } => write!(f, "is up to date"),
      Event::Creating { .. } => write!(f, "creating..."),
      Event::Recreating { reason, .. } => write!(f, "recreating ({})...", reason),
      Event::Created { .. } => write!(f, "created"),
      Event::Failed { error, .. } => write!(f, "{}", error),
      Event::UnknownService { service } => write!(f, "Service {} does not exist", service),
      Event::OrphansPresent { count } => write!(
        f,
        "found {} orphan container(s), you can clean them up with `--remove-orphans`",
        count
      ),
      Event::RemovingOrphan { container, .. } => write!(f, "orphan {} removing...", container),
      Event::OrphanRemoveFailed { container, error, .. } => {
        write!(f, "failed to remove orphan {}: {}", container, error)
      }
      Event::Removing { .. } => write!(f, "removing..."),
      Event::Removed { .. } => write!(f, "removed"),
      Event::Starting { container, id } => write!(f, "{}[{}] starting...", container, id),
      Event::Started { container } => write!(f, "{} done", container),
      Event::StartFailed { container, error } => write!(f, "{} failed: {}", container, error),
    }
  }
}

pub trait Reporter: Send + Sync {
  fn report(&self, event: Event);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
  fn report(&self, _event: Event) {}
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
  events: std::sync::Mutex<Vec<Event>>,
}

impl RecordingReporter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> Vec<Event> {
    self.events.lock().map(|events| events.clone()).unwrap_or_default()
  }
}

impl Reporter for RecordingReporter {
  fn report(&self, event: Event) {
    if let Ok(mut events) = self.events.lock() {
      events.push(event);
    }
  }
}
