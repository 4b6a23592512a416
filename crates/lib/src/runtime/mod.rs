//! Container runtime capabilities.
//!
//! The engine never talks to the runtime directly; it goes through the
//! [`ContainerRuntime`] trait so reconciliation can be driven against a real
//! daemon ([`DockerRuntime`]) or a test double.

mod docker;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::consts::{STATE_EXITED, STATE_RUNNING};
use crate::labels;

pub use docker::DockerRuntime;

/// Errors reported by a runtime capability.
#[derive(Debug, Error)]
pub enum RuntimeError {
  /// The runtime endpoint could not be set up.
  #[error("failed to connect to container runtime: {0}")]
  Connect(String),

  /// The runtime API rejected or failed a request.
  #[error("{operation} failed: {message}")]
  Api { operation: &'static str, message: String },

  /// The named object does not exist.
  #[error("no such {kind}: {name}")]
  NotFound { kind: &'static str, name: String },

  /// The runtime CLI could not be launched.
  #[error("failed to launch {binary}: {source}")]
  Spawn {
    binary: String,
    #[source]
    source: std::io::Error,
  },

  /// The runtime CLI exited unsuccessfully.
  #[error("{binary} exited with code {code:?}: {stderr}")]
  Cli {
    binary: String,
    code: Option<i32>,
    stderr: String,
  },
}

/// A published port as reported by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortMapping {
  pub host_ip: Option<String>,
  pub host_port: Option<u16>,
  pub container_port: u16,
  pub protocol: String,
}

impl std::fmt::Display for PortMapping {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let ip = self.host_ip.as_deref().filter(|ip| !ip.is_empty()).unwrap_or("0.0.0.0");
    write!(
      f,
      "{}:{}->{}/{}",
      ip,
      self.host_port.unwrap_or(0),
      self.container_port,
      self.protocol
    )
  }
}

/// A container as listed by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeContainer {
  pub id: String,
  pub names: Vec<String>,
  pub image: String,
  pub image_id: String,
  pub command: String,
  /// Life-cycle state, e.g. `running` or `exited`.
  pub state: String,
  pub labels: HashMap<String, String>,
  pub ports: Vec<PortMapping>,
}

impl RuntimeContainer {
  pub fn is_running(&self) -> bool {
    self.state == STATE_RUNNING
  }

  pub fn is_exited(&self) -> bool {
    self.state == STATE_EXITED
  }

  /// The service this container instantiates, if it carries the label.
  pub fn service(&self) -> Option<&str> {
    labels::service_of(&self.labels)
  }

  /// First name without the leading `/` the API adds, or the short id.
  pub fn display_name(&self) -> &str {
    match self.names.first() {
      Some(name) => name.trim_start_matches('/'),
      None => self.id.get(..12).unwrap_or(&self.id),
    }
  }
}

/// Result of a deep inspect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDetail {
  pub image_id: String,
  pub restart_policy: Option<String>,
}

/// A resolved image reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageInfo {
  pub id: String,
}

/// Capabilities the engine consumes from the container runtime.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
  /// List containers; stopped ones are included when `all` is set.
  async fn list_containers(&self, all: bool) -> Result<Vec<RuntimeContainer>, RuntimeError>;

  async fn inspect_container(&self, id: &str) -> Result<ContainerDetail, RuntimeError>;

  /// Resolve an image reference to the image it currently points at.
  async fn resolve_image(&self, reference: &str) -> Result<ImageInfo, RuntimeError>;

  async fn remove_container(&self, id: &str, force: bool, remove_volumes: bool) -> Result<(), RuntimeError>;

  async fn start_container(&self, id: &str) -> Result<(), RuntimeError>;

  /// Create (and run) a container from a runtime CLI argument list.
  ///
  /// When `attach` is set the runtime's output goes straight to the terminal and
  /// the call returns when the container process exits.
  async fn materialize_container(&self, args: &[String], attach: bool) -> Result<(), RuntimeError>;

  /// Re-establish networking for a restarted container. Runtimes without such a
  /// step succeed without doing anything.
  async fn reload_network(&self, id: &str) -> Result<(), RuntimeError>;
}
