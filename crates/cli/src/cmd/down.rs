//! Implementation of the `podup down` command.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use podup_lib::down::{DownOptions, Removal, down};

use super::{async_runtime, connect_runtime, load_project};
use crate::output::print_info;

/// Execute the down command.
///
/// Force-removes the containers of the selected services (all by default)
/// and handles orphans. Exits non-zero if any removal failed.
pub fn cmd_down(file: Option<&Path>, services: Vec<String>, remove_orphans: bool) -> Result<()> {
  let project = load_project(file)?;
  let reporter = Arc::new(crate::output::TerminalReporter::new(project.name_width()));
  let options = DownOptions {
    services,
    remove_orphans,
  };

  let rt = async_runtime()?;
  let report = rt.block_on(async {
    let runtime = connect_runtime()?;
    down(runtime, reporter, &project, &options).await.context("Down failed")
  })?;

  let removed = report
    .outcomes
    .iter()
    .filter(|o| matches!(o.result, Ok(Removal::Removed)))
    .count();
  if removed == 0 && report.orphans.removed.is_empty() {
    print_info("Nothing to remove.");
  }

  if !report.is_success() {
    let failed = report.outcomes.iter().filter(|o| o.result.is_err()).count() + report.orphans.failed.len();
    bail!("failed to remove {} container(s)", failed);
  }

  Ok(())
}
