//! Implementation of the `podup up` command.
//!
//! Converges the runtime towards the manifest: creates missing containers,
//! recreates stale ones and handles orphans.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use podup_lib::converge::{ConvergeOptions, converge};
use podup_lib::reconcile::Applied;

use super::{async_runtime, connect_runtime, load_project};
use crate::output::{TerminalReporter, format_duration, print_stat, print_success};

/// Execute the up command.
///
/// Attached runs reconcile services one by one with the container output on
/// the terminal. Detached runs reconcile every service concurrently and print
/// a summary. Exits non-zero if any service failed.
pub fn cmd_up(file: Option<&Path>, services: Vec<String>, detach: bool, remove_orphans: bool) -> Result<()> {
  let project = load_project(file)?;
  let reporter = Arc::new(TerminalReporter::new(project.name_width()));
  let options = ConvergeOptions {
    services,
    detach,
    remove_orphans,
  };

  let start = Instant::now();
  let rt = async_runtime()?;
  let report = rt
    .block_on(async {
      let runtime = connect_runtime()?;
      converge(runtime, reporter, &project, &options)
        .await
        .context("Up failed")
    })?;

  if detach {
    let count = |wanted: fn(&Applied) -> bool| {
      report
        .outcomes
        .iter()
        .filter(|o| o.result.as_ref().is_ok_and(|applied| wanted(applied)))
        .count()
    };

    println!();
    print_success(&format!(
      "Converged {} service(s) in {}",
      report.outcomes.len(),
      format_duration(start.elapsed())
    ));
    print_stat("Created", &count(|a| matches!(a, Applied::Created)).to_string());
    print_stat("Recreated", &count(|a| matches!(a, Applied::Recreated(_))).to_string());
    print_stat("Up to date", &count(|a| matches!(a, Applied::UpToDate)).to_string());
    print_stat("Failed", &report.failures().count().to_string());
  }

  if !report.is_success() {
    let failed: Vec<&str> = report.failures().map(|o| o.service.as_str()).collect();
    if failed.is_empty() {
      bail!("failed to remove {} orphan container(s)", report.orphans.failed.len());
    }
    bail!("{} service(s) failed: {}", failed.len(), failed.join(", "));
  }

  Ok(())
}
