//! Service configuration fingerprints.
//!
//! A fingerprint is a deterministic digest of the reconcilable attributes of a
//! [`ServiceConfig`]. It is stored on the container as the `config-fingerprint`
//! label at creation time and compared on later runs to detect drift.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::manifest::ServiceConfig;
use crate::util::hash::{HashError, Hashable};

/// Digest of a service's reconcilable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceFingerprint(pub String);

impl std::fmt::Display for ServiceFingerprint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl ServiceFingerprint {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

/// The hashed material. Only reconcilable fields appear here, and the
/// environment is re-keyed into a `BTreeMap` so its order is fixed.
#[derive(Serialize)]
struct FingerprintMaterial<'a> {
  image: &'a str,
  restart: Option<&'a str>,
  entrypoint: Option<&'a str>,
  working_dir: Option<&'a str>,
  cpus: Option<f64>,
  memory: Option<&'a str>,
  container_name: Option<&'a str>,
  command: &'a [String],
  ports: &'a [String],
  environment: BTreeMap<&'a str, &'a str>,
  volumes: &'a [String],
}

impl Hashable for FingerprintMaterial<'_> {}

impl<'a> From<&'a ServiceConfig> for FingerprintMaterial<'a> {
  fn from(config: &'a ServiceConfig) -> Self {
    Self {
      image: config.image_ref(),
      restart: config.restart.as_deref(),
      entrypoint: config.entrypoint.as_deref(),
      working_dir: config.working_dir.as_deref(),
      cpus: config.resources.limits.cpus,
      memory: config.resources.limits.memory.as_deref(),
      container_name: config.container_name.as_deref(),
      command: &config.command,
      ports: &config.ports,
      environment: config
        .environment
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect(),
      volumes: &config.volumes,
    }
  }
}

/// Compute the fingerprint of a service configuration.
///
/// Pure and stable across processes. Fails only if the material cannot be
/// serialized.
pub fn fingerprint(config: &ServiceConfig) -> Result<ServiceFingerprint, HashError> {
  FingerprintMaterial::from(config).compute_hash().map(ServiceFingerprint)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn base() -> ServiceConfig {
    let mut config = ServiceConfig {
      image: "nginx:latest".to_string(),
      restart: Some("always".to_string()),
      command: vec!["nginx".to_string(), "-g".to_string(), "daemon off;".to_string()],
      ports: vec!["8080:80".to_string()],
      volumes: vec!["./html:/usr/share/nginx/html".to_string()],
      ..Default::default()
    };
    config.environment.insert("MODE".to_string(), "prod".to_string());
    config.environment.insert("WORKERS".to_string(), "4".to_string());
    config
  }

  #[test]
  fn identical_configs_share_a_fingerprint() {
    assert_eq!(fingerprint(&base()).unwrap(), fingerprint(&base()).unwrap());
  }

  #[test]
  fn environment_insertion_order_does_not_matter() {
    let keys: Vec<String> = (0..32).map(|i| format!("KEY_{:02}", i)).collect();

    let mut forward = base();
    forward.environment = HashMap::new();
    for key in &keys {
      forward.environment.insert(key.clone(), format!("v-{}", key));
    }

    let mut backward = base();
    backward.environment = HashMap::with_capacity(128);
    for key in keys.iter().rev() {
      backward.environment.insert(key.clone(), format!("v-{}", key));
    }

    assert_eq!(fingerprint(&forward).unwrap(), fingerprint(&backward).unwrap());
  }

  fn changes_fingerprint(mutate: impl FnOnce(&mut ServiceConfig)) -> bool {
    let mut config = base();
    mutate(&mut config);
    fingerprint(&config).unwrap() != fingerprint(&base()).unwrap()
  }

  #[test]
  fn surrounding_whitespace_in_image_is_ignored() {
    assert!(!changes_fingerprint(|c| c.image = format!("  {} ", c.image)));
  }

  #[test]
  fn each_reconcilable_field_changes_the_fingerprint() {
    assert!(changes_fingerprint(|c| c.image = "nginx:1.27".to_string()));
    assert!(changes_fingerprint(|c| c.restart = Some("no".to_string())));
    assert!(changes_fingerprint(|c| c.entrypoint = Some("/bin/sh".to_string())));
    assert!(changes_fingerprint(|c| c.working_dir = Some("/srv".to_string())));
    assert!(changes_fingerprint(|c| c.resources.limits.cpus = Some(1.5)));
    assert!(changes_fingerprint(|c| c.resources.limits.memory = Some("256m".to_string())));
    assert!(changes_fingerprint(|c| c.container_name = Some("web-1".to_string())));
    assert!(changes_fingerprint(|c| c.command.push("-q".to_string())));
    assert!(changes_fingerprint(|c| c.ports[0] = "8081:80".to_string()));
    assert!(changes_fingerprint(|c| c.volumes[0] = "./www:/usr/share/nginx/html".to_string()));
    assert!(changes_fingerprint(|c| {
      c.environment.insert("MODE".to_string(), "dev".to_string());
    }));
    assert!(changes_fingerprint(|c| {
      c.environment.insert("EXTRA".to_string(), String::new());
    }));
  }

  #[test]
  fn field_boundaries_are_preserved() {
    let mut joined = base();
    joined.command = vec!["a-b".to_string()];
    let mut split = base();
    split.command = vec!["a".to_string(), "b".to_string()];

    assert_ne!(fingerprint(&joined).unwrap(), fingerprint(&split).unwrap());
  }

  #[test]
  fn fingerprint_is_stable_across_runs() {
    let config = ServiceConfig {
      image: "alpine".to_string(),
      ..Default::default()
    };
    let first = fingerprint(&config).unwrap();
    assert_eq!(first.as_str().len(), 41);
    assert_eq!(first, fingerprint(&config.clone()).unwrap());
  }
}
