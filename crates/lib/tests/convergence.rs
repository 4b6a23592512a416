//! End-to-end convergence against an in-memory runtime.
//!
//! The runtime here materializes containers from the argument list it is
//! handed, so a second `converge` observes what the first one created.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use podup_lib::converge::{ConvergeOptions, converge};
use podup_lib::down::{DownOptions, down};
use podup_lib::manifest::Project;
use podup_lib::reconcile::{Applied, RecreateReason};
use podup_lib::report::NullReporter;
use podup_lib::runtime::{ContainerDetail, ContainerRuntime, ImageInfo, RuntimeContainer, RuntimeError};

#[derive(Default)]
struct MemoryRuntime {
  containers: Mutex<Vec<RuntimeContainer>>,
  images: Mutex<HashMap<String, String>>,
  next_id: Mutex<usize>,
}

impl MemoryRuntime {
  fn with_image(self, reference: &str, id: &str) -> Self {
    self.push_image(reference, id);
    self
  }

  fn push_image(&self, reference: &str, id: &str) {
    self.images.lock().unwrap().insert(reference.to_string(), id.to_string());
  }

  fn container_ids(&self) -> Vec<String> {
    self.containers.lock().unwrap().iter().map(|c| c.id.clone()).collect()
  }
}

#[async_trait]
impl ContainerRuntime for MemoryRuntime {
  async fn list_containers(&self, all: bool) -> Result<Vec<RuntimeContainer>, RuntimeError> {
    let containers = self.containers.lock().unwrap();
    Ok(containers.iter().filter(|c| all || c.is_running()).cloned().collect())
  }

  async fn inspect_container(&self, id: &str) -> Result<ContainerDetail, RuntimeError> {
    let containers = self.containers.lock().unwrap();
    let container = containers.iter().find(|c| c.id == id).ok_or_else(|| RuntimeError::NotFound {
      kind: "container",
      name: id.to_string(),
    })?;
    Ok(ContainerDetail {
      image_id: container.image_id.clone(),
      restart_policy: None,
    })
  }

  async fn resolve_image(&self, reference: &str) -> Result<ImageInfo, RuntimeError> {
    let images = self.images.lock().unwrap();
    images
      .get(reference)
      .map(|id| ImageInfo { id: id.clone() })
      .ok_or_else(|| RuntimeError::NotFound {
        kind: "image",
        name: reference.to_string(),
      })
  }

  async fn remove_container(&self, id: &str, _force: bool, _remove_volumes: bool) -> Result<(), RuntimeError> {
    self.containers.lock().unwrap().retain(|c| c.id != id);
    Ok(())
  }

  async fn start_container(&self, _id: &str) -> Result<(), RuntimeError> {
    Ok(())
  }

  async fn materialize_container(&self, args: &[String], _attach: bool) -> Result<(), RuntimeError> {
    let labels: HashMap<String, String> = args
      .windows(2)
      .filter(|pair| pair[0] == "--label")
      .filter_map(|pair| pair[1].split_once('='))
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    let image = args.last().cloned().unwrap_or_default();
    let image_id = self.images.lock().unwrap().get(&image).cloned().unwrap_or_default();

    let mut next_id = self.next_id.lock().unwrap();
    *next_id += 1;
    self.containers.lock().unwrap().push(RuntimeContainer {
      id: format!("c{}", next_id),
      image,
      image_id,
      state: "running".to_string(),
      labels,
      ..Default::default()
    });
    Ok(())
  }

  async fn reload_network(&self, _id: &str) -> Result<(), RuntimeError> {
    Ok(())
  }
}

fn write_manifest(dir: &TempDir, content: &str) -> Project {
  let file = dir.path().join("docker-compose.yml");
  std::fs::write(&file, content).unwrap();
  Project::discover(dir.path()).unwrap()
}

fn applied(report: &podup_lib::converge::ConvergeReport, service: &str) -> Applied {
  let outcome = report.outcomes.iter().find(|o| o.service == service).unwrap();
  *outcome.result.as_ref().unwrap()
}

const MANIFEST: &str = r#"
services:
  web:
    image: nginx:latest
    ports: ["8080:80"]
    environment:
      MODE: prod
  db:
    image: postgres:16
    environment:
      - POSTGRES_PASSWORD=secret
"#;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_run_is_a_no_op() {
  let dir = TempDir::new().unwrap();
  let project = write_manifest(&dir, MANIFEST);
  let runtime = Arc::new(
    MemoryRuntime::default()
      .with_image("nginx:latest", "sha-nginx")
      .with_image("postgres:16", "sha-pg"),
  );
  let options = ConvergeOptions {
    detach: true,
    ..Default::default()
  };

  let first = converge(runtime.clone(), Arc::new(NullReporter), &project, &options).await.unwrap();
  assert!(first.is_success());
  assert_eq!(applied(&first, "web"), Applied::Created);
  assert_eq!(applied(&first, "db"), Applied::Created);

  let second = converge(runtime.clone(), Arc::new(NullReporter), &project, &options).await.unwrap();
  assert_eq!(applied(&second, "web"), Applied::UpToDate);
  assert_eq!(applied(&second, "db"), Applied::UpToDate);
  assert_eq!(runtime.container_ids().len(), 2);
}

#[tokio::test]
async fn edits_and_repushes_trigger_recreation() {
  let dir = TempDir::new().unwrap();
  let project = write_manifest(&dir, MANIFEST);
  let runtime = Arc::new(
    MemoryRuntime::default()
      .with_image("nginx:latest", "sha-nginx")
      .with_image("postgres:16", "sha-pg"),
  );
  let options = ConvergeOptions::default();

  converge(runtime.clone(), Arc::new(NullReporter), &project, &options).await.unwrap();

  let edited = write_manifest(&dir, &MANIFEST.replace("MODE: prod", "MODE: debug"));
  runtime.push_image("postgres:16", "sha-pg-2");

  let report = converge(runtime.clone(), Arc::new(NullReporter), &edited, &options).await.unwrap();
  assert_eq!(applied(&report, "web"), Applied::Recreated(RecreateReason::ConfigChanged));
  assert_eq!(applied(&report, "db"), Applied::Recreated(RecreateReason::ImageChanged));
  assert_eq!(runtime.container_ids(), vec!["c3", "c4"]);
}

#[tokio::test]
async fn dropped_service_becomes_an_orphan() {
  let dir = TempDir::new().unwrap();
  let project = write_manifest(&dir, MANIFEST);
  let runtime = Arc::new(
    MemoryRuntime::default()
      .with_image("nginx:latest", "sha-nginx")
      .with_image("postgres:16", "sha-pg"),
  );

  converge(runtime.clone(), Arc::new(NullReporter), &project, &ConvergeOptions::default())
    .await
    .unwrap();

  let web_only = write_manifest(
    &dir,
    r#"
services:
  web:
    image: nginx:latest
    ports: ["8080:80"]
    environment:
      MODE: prod
"#,
  );
  let options = ConvergeOptions {
    remove_orphans: true,
    ..Default::default()
  };
  let report = converge(runtime.clone(), Arc::new(NullReporter), &web_only, &options).await.unwrap();

  assert_eq!(applied(&report, "web"), Applied::UpToDate);
  assert_eq!(report.orphans.removed.len(), 1);
  assert_eq!(runtime.container_ids().len(), 1);

  let down_report = down(runtime.clone(), Arc::new(NullReporter), &web_only, &DownOptions::default())
    .await
    .unwrap();
  assert!(down_report.is_success());
  assert!(runtime.container_ids().is_empty());
}
