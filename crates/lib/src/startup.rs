//! Boot-time recovery.
//!
//! After a host reboot the runtime may come up before its API socket is ready
//! and containers with `restart: always` stay exited. [`startup`] waits for the
//! runtime to answer, then starts every exited container whose restart policy
//! is `always` and reloads its network. This sweep covers every container on
//! the host, not only the current project's.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::consts::{RESTART_ALWAYS, STARTUP_LIST_ATTEMPTS};
use crate::report::{Event, Reporter};
use crate::runtime::{ContainerRuntime, RuntimeContainer, RuntimeError};

/// Options for [`startup`].
#[derive(Debug, Clone)]
pub struct StartupOptions {
  /// How many times the container listing is attempted.
  pub attempts: usize,
  /// Pause between listing attempts.
  pub retry_delay: Duration,
}

impl Default for StartupOptions {
  fn default() -> Self {
    Self {
      attempts: STARTUP_LIST_ATTEMPTS,
      retry_delay: Duration::from_secs(1),
    }
  }
}

#[derive(Debug, Default)]
pub struct StartupReport {
  /// The runtime never answered the listing; nothing was attempted.
  pub gave_up: bool,
  pub started: Vec<String>,
  /// Container id and error message for each container that could not be restarted.
  pub failed: Vec<(String, String)>,
}

impl StartupReport {
  pub fn is_success(&self) -> bool {
    !self.gave_up && self.failed.is_empty()
  }
}

/// Restart exited containers whose restart policy is `always`.
pub async fn startup(runtime: &dyn ContainerRuntime, reporter: &dyn Reporter, options: &StartupOptions) -> StartupReport {
  let mut report = StartupReport::default();

  let Some(containers) = list_with_retry(runtime, options).await else {
    warn!(attempts = options.attempts, "runtime did not answer, giving up");
    report.gave_up = true;
    return report;
  };

  for container in containers.iter().filter(|c| c.is_exited()) {
    match restart_if_always(runtime, reporter, container).await {
      Ok(true) => report.started.push(container.id.clone()),
      Ok(false) => {}
      Err(err) => {
        warn!(container = %container.id, error = %err, "failed to restart container");
        reporter.report(Event::StartFailed {
          container: container.display_name().to_string(),
          error: err.to_string(),
        });
        report.failed.push((container.id.clone(), err.to_string()));
      }
    }
  }

  info!(started = report.started.len(), failed = report.failed.len(), "startup sweep finished");
  report
}

async fn list_with_retry(runtime: &dyn ContainerRuntime, options: &StartupOptions) -> Option<Vec<RuntimeContainer>> {
  for attempt in 1..=options.attempts.max(1) {
    match runtime.list_containers(true).await {
      Ok(containers) => return Some(containers),
      Err(err) => {
        debug!(attempt, error = %err, "container listing failed");
        if attempt < options.attempts {
          tokio::time::sleep(options.retry_delay).await;
        }
      }
    }
  }
  None
}

async fn restart_if_always(
  runtime: &dyn ContainerRuntime,
  reporter: &dyn Reporter,
  container: &RuntimeContainer,
) -> Result<bool, RuntimeError> {
  let detail = runtime.inspect_container(&container.id).await?;
  if detail.restart_policy.as_deref() != Some(RESTART_ALWAYS) {
    return Ok(false);
  }

  let name = container.display_name().to_string();
  reporter.report(Event::Starting {
    container: name.clone(),
    id: container.id.clone(),
  });
  runtime.start_container(&container.id).await?;
  runtime.reload_network(&container.id).await?;

  info!(container = %container.id, "container restarted");
  reporter.report(Event::Started { container: name });
  Ok(true)
}
