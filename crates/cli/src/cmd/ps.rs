//! Implementation of the `podup ps` command.

use std::path::Path;

use anyhow::{Context, Result};

use podup_lib::ps::{PsRow, list};

use super::{async_runtime, connect_runtime, load_project};
use crate::output::{OutputFormat, fix_size_string, print_json};

const NAME_WIDTH: usize = 16;
const COMMAND_WIDTH: usize = 30;
const STATE_WIDTH: usize = 9;
const PORTS_WIDTH: usize = 46;

pub fn cmd_ps(file: Option<&Path>, all: bool, format: OutputFormat) -> Result<()> {
  let project = load_project(file)?;

  let rt = async_runtime()?;
  let rows = rt.block_on(async {
    let runtime = connect_runtime()?;
    list(runtime, &project, all).await.context("Failed to list containers")
  })?;

  if format.is_json() {
    return print_json(&rows);
  }

  println!("{}", format_header());
  println!("{}", "-".repeat(NAME_WIDTH + COMMAND_WIDTH + STATE_WIDTH + PORTS_WIDTH));
  for row in &rows {
    println!("{}", format_row(row));
  }

  Ok(())
}

fn format_header() -> String {
  format!(
    "{}{}{}{}",
    fix_size_string("Name", NAME_WIDTH, true),
    fix_size_string("Command", COMMAND_WIDTH, true),
    fix_size_string("State", STATE_WIDTH, true),
    fix_size_string("Ports", PORTS_WIDTH, true)
  )
}

fn format_row(row: &PsRow) -> String {
  format!(
    "{}{}{}{}",
    fix_size_string(&row.name, NAME_WIDTH, false),
    fix_size_string(&format!(" {}", row.command), COMMAND_WIDTH, true),
    fix_size_string(&format!(" {}", row.state), STATE_WIDTH, false),
    fix_size_string(&format!(" {}", row.ports), PORTS_WIDTH, true)
  )
}
