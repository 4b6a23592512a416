//! Test utilities for podup-lib.
//!
//! [`FakeRuntime`] is an in-memory [`ContainerRuntime`] that records every call so
//! tests can assert on what the engine asked the runtime to do.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::consts::{LABEL_COMPOSE_DIR, LABEL_COMPOSE_SERVICE, LABEL_CONFIG_FINGERPRINT};
use crate::runtime::{ContainerDetail, ContainerRuntime, ImageInfo, RuntimeContainer, RuntimeError};

/// A capability call observed by [`FakeRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  List { all: bool },
  Inspect(String),
  ResolveImage(String),
  Remove { id: String, force: bool },
  Start(String),
  Materialize { args: Vec<String>, attach: bool },
  ReloadNetwork(String),
}

#[derive(Default)]
pub struct FakeRuntime {
  pub containers: Vec<RuntimeContainer>,
  /// Image reference -> image id.
  pub images: HashMap<String, String>,
  /// Container id -> restart policy name.
  pub restart_policies: HashMap<String, String>,
  pub fail_list: bool,
  /// Number of leading list calls that fail before listing succeeds.
  pub list_failures_before_success: usize,
  pub fail_inspect: HashSet<String>,
  pub fail_remove: HashSet<String>,
  /// Materialization fails when the argument list contains any of these tokens.
  pub fail_materialize_with: HashSet<String>,
  /// Materialization panics when the argument list contains any of these tokens.
  pub panic_materialize_with: HashSet<String>,
  pub list_delay: Option<Duration>,
  pub list_calls: AtomicUsize,
  calls: Mutex<Vec<Call>>,
}

impl FakeRuntime {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_container(mut self, container: RuntimeContainer) -> Self {
    self.containers.push(container);
    self
  }

  pub fn with_image(mut self, reference: &str, id: &str) -> Self {
    self.images.insert(reference.to_string(), id.to_string());
    self
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }

  pub fn materializations(&self) -> Vec<Vec<String>> {
    self
      .calls()
      .into_iter()
      .filter_map(|call| match call {
        Call::Materialize { args, .. } => Some(args),
        _ => None,
      })
      .collect()
  }

  pub fn removals(&self) -> Vec<String> {
    self
      .calls()
      .into_iter()
      .filter_map(|call| match call {
        Call::Remove { id, .. } => Some(id),
        _ => None,
      })
      .collect()
  }

  fn record(&self, call: Call) {
    self.calls.lock().unwrap().push(call);
  }
}

/// A container labelled as belonging to `project_dir`/`service`.
pub fn managed_container(
  id: &str,
  project_dir: &str,
  service: &str,
  fingerprint: &str,
  state: &str,
  image_id: &str,
) -> RuntimeContainer {
  RuntimeContainer {
    id: id.to_string(),
    names: vec![format!("/{}", id)],
    image_id: image_id.to_string(),
    state: state.to_string(),
    labels: HashMap::from([
      (LABEL_COMPOSE_DIR.to_string(), project_dir.to_string()),
      (LABEL_COMPOSE_SERVICE.to_string(), service.to_string()),
      (LABEL_CONFIG_FINGERPRINT.to_string(), fingerprint.to_string()),
    ]),
    ..Default::default()
  }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
  async fn list_containers(&self, all: bool) -> Result<Vec<RuntimeContainer>, RuntimeError> {
    let attempt = self.list_calls.fetch_add(1, Ordering::SeqCst);
    self.record(Call::List { all });

    if let Some(delay) = self.list_delay {
      tokio::time::sleep(delay).await;
    }

    if self.fail_list || attempt < self.list_failures_before_success {
      return Err(RuntimeError::Api {
        operation: "list containers",
        message: "connection refused".to_string(),
      });
    }

    Ok(
      self
        .containers
        .iter()
        .filter(|c| all || c.is_running())
        .cloned()
        .collect(),
    )
  }

  async fn inspect_container(&self, id: &str) -> Result<ContainerDetail, RuntimeError> {
    self.record(Call::Inspect(id.to_string()));
    if self.fail_inspect.contains(id) {
      return Err(RuntimeError::Api {
        operation: "inspect container",
        message: "no such container".to_string(),
      });
    }
    let container = self
      .containers
      .iter()
      .find(|c| c.id == id)
      .ok_or_else(|| RuntimeError::NotFound {
        kind: "container",
        name: id.to_string(),
      })?;

    Ok(ContainerDetail {
      image_id: container.image_id.clone(),
      restart_policy: self.restart_policies.get(id).cloned(),
    })
  }

  async fn resolve_image(&self, reference: &str) -> Result<ImageInfo, RuntimeError> {
    self.record(Call::ResolveImage(reference.to_string()));
    self
      .images
      .get(reference)
      .map(|id| ImageInfo { id: id.clone() })
      .ok_or_else(|| RuntimeError::NotFound {
        kind: "image",
        name: reference.to_string(),
      })
  }

  async fn remove_container(&self, id: &str, force: bool, _remove_volumes: bool) -> Result<(), RuntimeError> {
    self.record(Call::Remove {
      id: id.to_string(),
      force,
    });
    if self.fail_remove.contains(id) {
      return Err(RuntimeError::Api {
        operation: "remove container",
        message: "device busy".to_string(),
      });
    }
    Ok(())
  }

  async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
    self.record(Call::Start(id.to_string()));
    Ok(())
  }

  async fn materialize_container(&self, args: &[String], attach: bool) -> Result<(), RuntimeError> {
    self.record(Call::Materialize {
      args: args.to_vec(),
      attach,
    });
    if let Some(arg) = args.iter().find(|arg| self.panic_materialize_with.contains(*arg)) {
      panic!("materialize blew up on {}", arg);
    }
    if args.iter().any(|arg| self.fail_materialize_with.contains(arg)) {
      return Err(RuntimeError::Cli {
        binary: "podman".to_string(),
        code: Some(125),
        stderr: "Error: creating container".to_string(),
      });
    }
    Ok(())
  }

  async fn reload_network(&self, id: &str) -> Result<(), RuntimeError> {
    self.record(Call::ReloadNetwork(id.to_string()));
    Ok(())
  }
}
