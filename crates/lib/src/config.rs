//! Runtime configuration resolved from the environment.
//!
//! - `PODUP_RUNTIME`: runtime CLI binary used to materialize containers (default `podman`)
//! - `PODUP_HOST`: runtime API endpoint, falling back to `DOCKER_HOST`, then to the
//!   podman root socket when the binary is podman

use thiserror::Error;

use crate::consts::{DEFAULT_RUNTIME_BINARY, PODMAN_SOCKET};

pub const ENV_RUNTIME: &str = "PODUP_RUNTIME";
pub const ENV_HOST: &str = "PODUP_HOST";
pub const ENV_DOCKER_HOST: &str = "DOCKER_HOST";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("unsupported runtime endpoint '{0}', expected unix://, http:// or tcp://")]
  UnsupportedEndpoint(String),
}

/// Where the runtime API lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
  /// Path to a unix socket.
  Unix(String),
  /// `host:port` reachable over plain HTTP.
  Http(String),
  /// Let the client pick its platform defaults.
  LocalDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
  /// Runtime CLI binary, e.g. `podman` or `docker`.
  pub binary: String,

  /// Raw endpoint, if one was configured or implied.
  pub host: Option<String>,
}

impl Default for RuntimeConfig {
  fn default() -> Self {
    Self {
      binary: DEFAULT_RUNTIME_BINARY.to_string(),
      host: Some(PODMAN_SOCKET.to_string()),
    }
  }
}

impl RuntimeConfig {
  pub fn from_env() -> Self {
    let binary = std::env::var(ENV_RUNTIME)
      .ok()
      .filter(|v| !v.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_RUNTIME_BINARY.to_string());

    let host = non_blank_var(ENV_HOST)
      .or_else(|| non_blank_var(ENV_DOCKER_HOST))
      .or_else(|| is_podman(&binary).then(|| PODMAN_SOCKET.to_string()));

    Self { binary, host }
  }

  pub fn is_podman(&self) -> bool {
    is_podman(&self.binary)
  }

  pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
    let Some(host) = &self.host else {
      return Ok(Endpoint::LocalDefaults);
    };

    if let Some(path) = host.strip_prefix("unix://") {
      Ok(Endpoint::Unix(path.to_string()))
    } else if let Some(addr) = host.strip_prefix("http://").or_else(|| host.strip_prefix("tcp://")) {
      Ok(Endpoint::Http(addr.to_string()))
    } else if host.starts_with('/') {
      Ok(Endpoint::Unix(host.clone()))
    } else {
      Err(ConfigError::UnsupportedEndpoint(host.clone()))
    }
  }
}

fn non_blank_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn is_podman(binary: &str) -> bool {
  std::path::Path::new(binary)
    .file_name()
    .and_then(|name| name.to_str())
    .is_some_and(|name| name.starts_with("podman"))
}
