//! Desired-state manifest loading.
//!
//! A project is a directory containing a compose-style YAML file. Loading it
//! produces a [`Project`]: the absolute project directory (used to scope runtime
//! containers) and the decoded service map.

mod types;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{COMPOSE_FILE_NAMES, MIN_SERVICE_NAME_WIDTH};

pub use types::*;

/// Errors that can occur while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error(
    "Can't find a suitable configuration file in {dir}. Are you in the right directory?\n\n\
     Supported filenames: {}",
    COMPOSE_FILE_NAMES.join(", ")
  )]
  NotFound { dir: PathBuf },

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("failed to resolve project directory {path}: {source}")]
  ProjectDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// A loaded project: where it lives and what it wants.
#[derive(Debug, Clone)]
pub struct Project {
  /// Absolute project directory, the value of the `compose-dir` label.
  pub dir: PathBuf,

  /// Manifest file the services were read from.
  pub file: PathBuf,

  /// Desired services keyed by name.
  pub services: BTreeMap<String, ServiceConfig>,

  name_width: usize,
}

impl Project {
  /// Build a project from already-decoded services.
  pub fn new(dir: impl Into<PathBuf>, services: BTreeMap<String, ServiceConfig>) -> Self {
    let dir = dir.into();
    let name_width = services
      .keys()
      .map(|name| name.len() + 1)
      .max()
      .unwrap_or(0)
      .max(MIN_SERVICE_NAME_WIDTH);
    Self {
      file: dir.clone(),
      dir,
      services,
      name_width,
    }
  }

  /// Load the manifest found in `dir`.
  pub fn discover(dir: &Path) -> Result<Self, ManifestError> {
    let file = find_compose_file(dir).ok_or_else(|| ManifestError::NotFound { dir: dir.to_path_buf() })?;
    Self::load(&file)
  }

  /// Load a specific manifest file. Its parent directory is the project directory.
  pub fn load(file: &Path) -> Result<Self, ManifestError> {
    let content = std::fs::read_to_string(file).map_err(|source| ManifestError::Read {
      path: file.to_path_buf(),
      source,
    })?;

    let compose: ComposeFile = serde_yaml::from_str(&content).map_err(|source| ManifestError::Parse {
      path: file.to_path_buf(),
      source,
    })?;

    let parent = match file.parent() {
      Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
      _ => PathBuf::from("."),
    };
    let dir = dunce::canonicalize(&parent).map_err(|source| ManifestError::ProjectDir { path: parent, source })?;

    debug!(file = %file.display(), dir = %dir.display(), services = compose.services.len(), "loaded manifest");

    let mut project = Self::new(dir, compose.services);
    project.file = file.to_path_buf();
    Ok(project)
  }

  /// The `compose-dir` label value for this project.
  pub fn dir_label(&self) -> String {
    self.dir.to_string_lossy().into_owned()
  }

  /// Width of the service-name column, fixed for the whole invocation.
  pub fn name_width(&self) -> usize {
    self.name_width
  }
}

/// Return the first supported manifest file that exists in `dir`.
pub fn find_compose_file(dir: &Path) -> Option<PathBuf> {
  COMPOSE_FILE_NAMES
    .iter()
    .map(|name| dir.join(name))
    .find(|path| path.is_file())
}
