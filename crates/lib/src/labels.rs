//! Engine-managed identity labels.
//!
//! Containers carry their identity as plain string labels on the runtime object.
//! [`IdentityLabels`] is the typed view of those labels, so the string format
//! stays in this module.

use std::collections::HashMap;

use crate::consts::{LABEL_COMPOSE_DIR, LABEL_COMPOSE_SERVICE, LABEL_CONFIG_FINGERPRINT};
use crate::fingerprint::ServiceFingerprint;

/// Identity of a managed container: which project, which service, which config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityLabels {
  pub project_dir: String,
  pub service: String,
  pub fingerprint: ServiceFingerprint,
}

impl IdentityLabels {
  pub fn new(project_dir: impl Into<String>, service: impl Into<String>, fingerprint: ServiceFingerprint) -> Self {
    Self {
      project_dir: project_dir.into(),
      service: service.into(),
      fingerprint,
    }
  }

  /// Label pairs in the order they are passed to the runtime.
  pub fn encode(&self) -> [(&'static str, &str); 3] {
    [
      (LABEL_COMPOSE_DIR, self.project_dir.as_str()),
      (LABEL_COMPOSE_SERVICE, self.service.as_str()),
      (LABEL_CONFIG_FINGERPRINT, self.fingerprint.as_str()),
    ]
  }

  /// `key=value` strings suitable for `--label`.
  pub fn to_label_args(&self) -> Vec<String> {
    self
      .encode()
      .iter()
      .map(|(key, value)| format!("{}={}", key, value))
      .collect()
  }

  /// Reads all three labels; `None` if any is missing.
  pub fn decode(labels: &HashMap<String, String>) -> Option<Self> {
    Some(Self {
      project_dir: labels.get(LABEL_COMPOSE_DIR)?.clone(),
      service: labels.get(LABEL_COMPOSE_SERVICE)?.clone(),
      fingerprint: ServiceFingerprint(labels.get(LABEL_CONFIG_FINGERPRINT)?.clone()),
    })
  }
}

/// Project directory a container is scoped to, if labelled.
pub fn project_dir_of(labels: &HashMap<String, String>) -> Option<&str> {
  labels.get(LABEL_COMPOSE_DIR).map(String::as_str)
}

/// Service a container instantiates, if labelled.
pub fn service_of(labels: &HashMap<String, String>) -> Option<&str> {
  labels.get(LABEL_COMPOSE_SERVICE).map(String::as_str)
}
