//! Manifest types for podup.
//!
//! The manifest captures the desired state of every service in a project. It is
//! decoded from a compose-style YAML file and stays immutable for the rest of the
//! invocation.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};

/// Resource limits for a service container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceResources {
  #[serde(default)]
  pub limits: ResourceLimits,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
  /// CPU share, e.g. `0.5`.
  #[serde(default)]
  pub cpus: Option<f64>,

  /// Memory limit in runtime notation, e.g. `512m`.
  #[serde(default)]
  pub memory: Option<String>,
}

/// Desired state for one service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceConfig {
  #[serde(default)]
  pub image: String,

  #[serde(default)]
  pub restart: Option<String>,

  #[serde(default)]
  pub entrypoint: Option<String>,

  #[serde(default)]
  pub working_dir: Option<String>,

  #[serde(default)]
  pub resources: ServiceResources,

  #[serde(default)]
  pub container_name: Option<String>,

  #[serde(default, deserialize_with = "deserialize_command")]
  pub command: Vec<String>,

  #[serde(default)]
  pub ports: Vec<String>,

  /// Environment variables. Keys are unique; iteration order is unspecified.
  #[serde(default, deserialize_with = "deserialize_environment")]
  pub environment: HashMap<String, String>,

  #[serde(default)]
  pub volumes: Vec<String>,
}

impl ServiceConfig {
  /// Returns the image reference with surrounding whitespace removed.
  pub fn image_ref(&self) -> &str {
    self.image.trim()
  }
}

/// The decoded manifest file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeFile {
  #[serde(default)]
  pub version: Option<String>,

  #[serde(default)]
  pub services: BTreeMap<String, ServiceConfig>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CommandSpec {
  Line(String),
  Args(Vec<String>),
}

fn deserialize_command<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let spec = Option::<CommandSpec>::deserialize(deserializer)?;
  Ok(match spec {
    Some(CommandSpec::Line(line)) => line.split_whitespace().map(str::to_string).collect(),
    Some(CommandSpec::Args(args)) => args,
    None => Vec::new(),
  })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnvironmentSpec {
  Map(BTreeMap<String, serde_yaml::Value>),
  List(Vec<String>),
}

/// Accepts either a `KEY: value` mapping or a list of `KEY=VALUE` strings.
fn deserialize_environment<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
  D: Deserializer<'de>,
{
  use serde::de::Error;

  let Some(spec) = Option::<EnvironmentSpec>::deserialize(deserializer)? else {
    return Ok(HashMap::new());
  };

  let mut environment = HashMap::new();
  match spec {
    EnvironmentSpec::Map(entries) => {
      for (key, value) in entries {
        let rendered = match value {
          serde_yaml::Value::Null => String::new(),
          serde_yaml::Value::Bool(b) => b.to_string(),
          serde_yaml::Value::Number(n) => n.to_string(),
          serde_yaml::Value::String(s) => s,
          _ => return Err(D::Error::custom(format!("environment \"{}\" must be a scalar value", key))),
        };
        environment.insert(key, rendered);
      }
    }
    EnvironmentSpec::List(entries) => {
      for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
          return Err(D::Error::custom(format!(
            "environment \"{}\" format error, expected KEY=VALUE",
            entry
          )));
        };
        environment.insert(key.to_string(), value.to_string());
      }
    }
  }

  Ok(environment)
}
