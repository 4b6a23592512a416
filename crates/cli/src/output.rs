//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output including colored status
//! messages, fixed-width columns, and the terminal [`Reporter`] that prefixes
//! every engine event with its service name.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use podup_lib::report::{Event, Reporter};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
}

/// Pad or truncate `s` to exactly `width` characters, optionally centered.
pub fn fix_size_string(s: &str, width: usize, center: bool) -> String {
  let len = s.chars().count();
  if len >= width {
    return s.chars().take(width).collect();
  }

  let left = width - len;
  let (before, after) = if center { (left / 2, left - left / 2) } else { (0, left) };
  format!("{}{}{}", " ".repeat(before), s, " ".repeat(after))
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// Renders engine events as lines prefixed with the padded service name.
pub struct TerminalReporter {
  name_width: usize,
}

impl TerminalReporter {
  pub fn new(name_width: usize) -> Self {
    Self { name_width }
  }

  fn line(&self, event: &Event) -> String {
    match event.service() {
      Some(service) if !matches!(event, Event::UnknownService { .. }) => {
        format!("{} {}", fix_size_string(service, self.name_width, false), event)
      }
      _ => event.to_string(),
    }
  }
}

impl Reporter for TerminalReporter {
  fn report(&self, event: Event) {
    let line = self.line(&event);
    match &event {
      _ if event.is_failure() => print_error(&line),
      Event::UnknownService { .. } | Event::OrphansPresent { .. } => print_warning(&line),
      Event::Created { .. } | Event::Removed { .. } | Event::Started { .. } => print_success(&line),
      _ => print_info(&line),
    }
  }
}
