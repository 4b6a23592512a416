//! Implementation of the `podup startup` command.
//!
//! Meant to run once at boot: brings back every exited container whose restart
//! policy is `always`, on the whole host.

use anyhow::{Result, bail};

use podup_lib::startup::{StartupOptions, startup};

use super::{async_runtime, connect_runtime};
use crate::output::{TerminalReporter, print_warning};

pub fn cmd_startup() -> Result<()> {
  let reporter = TerminalReporter::new(0);

  let rt = async_runtime()?;
  let report = rt.block_on(async {
    let runtime = connect_runtime()?;
    Ok::<_, anyhow::Error>(startup(runtime.as_ref(), &reporter, &StartupOptions::default()).await)
  })?;

  if report.gave_up {
    print_warning("Container runtime did not respond, nothing was started.");
    return Ok(());
  }

  if !report.failed.is_empty() {
    bail!("failed to start {} container(s)", report.failed.len());
  }

  Ok(())
}
