//! Materialization argument lists.
//!
//! Turns a desired [`ServiceConfig`] plus its identity labels into the argument
//! list handed to the runtime CLI, validating the fields the runtime would
//! otherwise reject halfway through a recreate.

use std::collections::BTreeMap;

use crate::labels::IdentityLabels;
use crate::manifest::ServiceConfig;

use super::ReconcileError;

/// True if `spec` is `port` or `host:container` with numeric port components.
pub fn is_valid_port(spec: &str) -> bool {
  let parts: Vec<&str> = spec.split(':').collect();
  matches!(parts.len(), 1 | 2) && parts.iter().all(|part| part.parse::<u16>().is_ok())
}

/// Build the `run` argument list for a service.
///
/// Validation happens before anything is assembled so a bad manifest entry is
/// reported without touching the runtime.
pub fn create_args(
  service: &str,
  config: &ServiceConfig,
  identity: &IdentityLabels,
  detach: bool,
) -> Result<Vec<String>, ReconcileError> {
  let image = config.image_ref();
  if image.is_empty() {
    return Err(ReconcileError::ImageRequired {
      service: service.to_string(),
    });
  }

  if let Some(port) = config.ports.iter().find(|port| !is_valid_port(port)) {
    return Err(ReconcileError::InvalidPort {
      service: service.to_string(),
      port: port.clone(),
    });
  }

  let mut args = vec!["run".to_string()];
  if detach {
    args.push("--detach".to_string());
  }

  for port in &config.ports {
    args.extend(["-p".to_string(), port.clone()]);
  }
  for volume in &config.volumes {
    args.extend(["-v".to_string(), volume.clone()]);
  }

  let cpus = config.resources.limits.cpus.filter(|cpus| *cpus > 0.0).map(|cpus| cpus.to_string());
  let optional_flags = [
    ("--name", config.container_name.as_deref()),
    ("--workdir", config.working_dir.as_deref()),
    ("--entrypoint", config.entrypoint.as_deref()),
    ("--restart", config.restart.as_deref()),
    ("--cpus", cpus.as_deref()),
    ("--memory", config.resources.limits.memory.as_deref()),
  ];
  for (flag, value) in optional_flags {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
      args.extend([flag.to_string(), value.to_string()]);
    }
  }

  for label in identity.to_label_args() {
    args.extend(["--label".to_string(), label]);
  }

  let environment: BTreeMap<&String, &String> = config.environment.iter().collect();
  for (key, value) in environment {
    args.extend(["--env".to_string(), format!("{}={}", key, value)]);
  }

  args.push(image.to_string());
  args.extend(config.command.iter().cloned());

  Ok(args)
}
