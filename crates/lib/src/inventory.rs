//! Runtime inventory cache.
//!
//! The inventory is the set of containers labelled as belonging to the current
//! project directory. It is listed from the runtime at most once per invocation:
//! the first caller triggers the query, concurrent callers wait for that same
//! query, and every later read is served from the snapshot. All reconciliation
//! decisions within one run therefore observe the same view of actual state.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::labels;
use crate::runtime::{ContainerRuntime, RuntimeContainer, RuntimeError};

pub struct Inventory {
  runtime: Arc<dyn ContainerRuntime>,
  project_dir: String,
  snapshot: OnceCell<Vec<RuntimeContainer>>,
}

impl Inventory {
  pub fn new(runtime: Arc<dyn ContainerRuntime>, project_dir: impl Into<String>) -> Self {
    Self {
      runtime,
      project_dir: project_dir.into(),
      snapshot: OnceCell::new(),
    }
  }

  pub fn project_dir(&self) -> &str {
    &self.project_dir
  }

  /// Return the snapshot, listing the runtime on first use.
  ///
  /// A failed listing leaves the cache empty and is returned to the caller; the
  /// engine treats it as fatal for the invocation.
  pub async fn load(&self) -> Result<&[RuntimeContainer], RuntimeError> {
    let containers = self
      .snapshot
      .get_or_try_init(|| async {
        debug!(project_dir = %self.project_dir, "listing runtime containers");
        let all = self.runtime.list_containers(true).await?;
        let total = all.len();

        let scoped: Vec<RuntimeContainer> = all
          .into_iter()
          .filter(|c| labels::project_dir_of(&c.labels) == Some(self.project_dir.as_str()))
          .collect();

        info!(total, project = scoped.len(), "inventory loaded");
        Ok::<_, RuntimeError>(scoped)
      })
      .await?;

    Ok(containers.as_slice())
  }

  /// The container instantiating `service`, if any.
  pub async fn get_container(&self, service: &str) -> Result<Option<&RuntimeContainer>, RuntimeError> {
    let containers = self.load().await?;
    Ok(containers.iter().find(|c| c.service() == Some(service)))
  }

  /// The snapshot if it has already been loaded. Never queries the runtime.
  pub fn cached(&self) -> Option<&[RuntimeContainer]> {
    self.snapshot.get().map(Vec::as_slice)
  }
}
