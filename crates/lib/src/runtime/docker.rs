//! Runtime client backed by the Docker-compatible REST API.
//!
//! Queries go through `bollard` (podman serves the same API on its socket);
//! container creation shells out to the runtime CLI so every flag the CLI
//! understands is available to the manifest.

use std::process::Stdio;

use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions, RemoveContainerOptions, StartContainerOptions};
use bollard::errors::Error as BollardError;
use bollard::models::{ContainerSummary, Port};
use bollard::{API_DEFAULT_VERSION, Docker};
use tokio::process::Command;
use tracing::{debug, info};

use super::{ContainerDetail, ContainerRuntime, ImageInfo, PortMapping, RuntimeContainer, RuntimeError};
use crate::config::{Endpoint, RuntimeConfig};

/// Seconds before an API request is abandoned.
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct DockerRuntime {
  client: Docker,
  config: RuntimeConfig,
}

impl DockerRuntime {
  /// Set up a client for the configured endpoint. No request is sent yet.
  pub fn connect(config: RuntimeConfig) -> Result<Self, RuntimeError> {
    let endpoint = config.endpoint().map_err(|e| RuntimeError::Connect(e.to_string()))?;

    let client = match &endpoint {
      Endpoint::Unix(path) => Docker::connect_with_unix(path, REQUEST_TIMEOUT_SECS, API_DEFAULT_VERSION),
      Endpoint::Http(addr) => Docker::connect_with_http(addr, REQUEST_TIMEOUT_SECS, API_DEFAULT_VERSION),
      Endpoint::LocalDefaults => Docker::connect_with_local_defaults(),
    }
    .map_err(|e| RuntimeError::Connect(e.to_string()))?;

    debug!(endpoint = ?endpoint, binary = %config.binary, "runtime client configured");

    Ok(Self { client, config })
  }

  async fn run_cli(&self, args: &[String], attach: bool) -> Result<(), RuntimeError> {
    let binary = &self.config.binary;
    let mut command = Command::new(binary);
    command.args(args);

    info!(binary = %binary, args = ?args, attach, "invoking runtime cli");

    if attach {
      let status = command
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|source| RuntimeError::Spawn {
          binary: binary.clone(),
          source,
        })?;

      if !status.success() {
        return Err(RuntimeError::Cli {
          binary: binary.clone(),
          code: status.code(),
          stderr: String::new(),
        });
      }
      return Ok(());
    }

    let output = command
      .stdin(Stdio::null())
      .output()
      .await
      .map_err(|source| RuntimeError::Spawn {
        binary: binary.clone(),
        source,
      })?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "runtime cli output");
    }

    if !output.status.success() {
      return Err(RuntimeError::Cli {
        binary: binary.clone(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    Ok(())
  }
}

/// Map a client error, turning 404 responses into [`RuntimeError::NotFound`].
fn api_error(operation: &'static str, kind: &'static str, name: &str, err: BollardError) -> RuntimeError {
  match err {
    BollardError::DockerResponseServerError { status_code: 404, .. } => RuntimeError::NotFound {
      kind,
      name: name.to_string(),
    },
    other => RuntimeError::Api {
      operation,
      message: other.to_string(),
    },
  }
}

fn convert_port(port: Port) -> PortMapping {
  PortMapping {
    host_ip: port.ip,
    host_port: port.public_port,
    container_port: port.private_port,
    protocol: port.typ.map(|t| t.to_string()).unwrap_or_else(|| "tcp".to_string()),
  }
}

fn convert_summary(summary: ContainerSummary) -> RuntimeContainer {
  RuntimeContainer {
    id: summary.id.unwrap_or_default(),
    names: summary.names.unwrap_or_default(),
    image: summary.image.unwrap_or_default(),
    image_id: summary.image_id.unwrap_or_default(),
    command: summary.command.unwrap_or_default(),
    state: summary.state.unwrap_or_default(),
    labels: summary.labels.unwrap_or_default(),
    ports: summary.ports.unwrap_or_default().into_iter().map(convert_port).collect(),
  }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
  async fn list_containers(&self, all: bool) -> Result<Vec<RuntimeContainer>, RuntimeError> {
    let options = ListContainersOptions::<String> {
      all,
      ..Default::default()
    };

    let summaries = self
      .client
      .list_containers(Some(options))
      .await
      .map_err(|e| RuntimeError::Api {
        operation: "list containers",
        message: e.to_string(),
      })?;

    Ok(summaries.into_iter().map(convert_summary).collect())
  }

  async fn inspect_container(&self, id: &str) -> Result<ContainerDetail, RuntimeError> {
    let response = self
      .client
      .inspect_container(id, None::<InspectContainerOptions>)
      .await
      .map_err(|e| api_error("inspect container", "container", id, e))?;

    let restart_policy = response
      .host_config
      .and_then(|hc| hc.restart_policy)
      .and_then(|rp| rp.name)
      .map(|name| name.to_string())
      .filter(|name| !name.is_empty());

    Ok(ContainerDetail {
      image_id: response.image.unwrap_or_default(),
      restart_policy,
    })
  }

  async fn resolve_image(&self, reference: &str) -> Result<ImageInfo, RuntimeError> {
    let image = self
      .client
      .inspect_image(reference)
      .await
      .map_err(|e| api_error("inspect image", "image", reference, e))?;

    Ok(ImageInfo {
      id: image.id.unwrap_or_default(),
    })
  }

  async fn remove_container(&self, id: &str, force: bool, remove_volumes: bool) -> Result<(), RuntimeError> {
    let options = RemoveContainerOptions {
      force,
      v: remove_volumes,
      ..Default::default()
    };

    self
      .client
      .remove_container(id, Some(options))
      .await
      .map_err(|e| api_error("remove container", "container", id, e))
  }

  async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
    self
      .client
      .start_container(id, None::<StartContainerOptions<String>>)
      .await
      .map_err(|e| api_error("start container", "container", id, e))
  }

  async fn materialize_container(&self, args: &[String], attach: bool) -> Result<(), RuntimeError> {
    self.run_cli(args, attach).await
  }

  async fn reload_network(&self, id: &str) -> Result<(), RuntimeError> {
    if !self.config.is_podman() {
      debug!(container = %id, "network reload not supported by runtime, skipping");
      return Ok(());
    }
    let args = ["network".to_string(), "reload".to_string(), id.to_string()];
    self.run_cli(&args, false).await
  }
}
