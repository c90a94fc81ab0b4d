//! Bentley - stage-styled log output for the review search service
//!
//! ## Features
//!
//! - Installs the process-wide `tracing` subscriber with an `EnvFilter`
//! - Renders every event with a coloured level prefix (`[info]  message`)
//! - Multi-line messages get one prefixed line per line
//! - Optional `HH:MM:SS` timestamps
//! - Banner helper (`announce`) for startup milestones
//!
//! ## Usage
//!
//! ```no_run
//! let options = bentley::LogOptions::new(bentley::default_filter("reviews", false));
//! bentley::init(&options).expect("logging already initialised");
//! tracing::info!("service ready");
//! bentley::announce("Review Search API");
//! ```

use chrono::Local;
use colored::{Color, Colorize};
use std::fmt::{self, Write as _};
use std::io::IsTerminal;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
  filter::EnvFilter,
  fmt::{format::Writer, FmtContext, FormatEvent, FormatFields, FormattedFields},
  prelude::*,
  registry::LookupSpan,
  util::TryInitError,
};

/// Options for the global subscriber
#[derive(Debug, Clone)]
pub struct LogOptions {
  /// Filter directives used when `RUST_LOG` is not set
  pub default_directives: String,
  /// Prefix each line with a local `HH:MM:SS` timestamp
  pub timestamps: bool,
  /// Emit ANSI colours
  pub ansi: bool,
}

impl LogOptions {
  pub fn new(default_directives: impl Into<String>) -> Self {
    Self {
      default_directives: default_directives.into(),
      timestamps: true,
      ansi: std::io::stderr().is_terminal(),
    }
  }
}

/// Default filter directives for a service crate.
///
/// Quiet mode keeps the service at `info` and everything else at `warn`;
/// verbose mode drops the service to `debug` and lets other crates speak at `info`.
/// ONNX Runtime stays at `warn` either way, it is extremely chatty.
pub fn default_filter(target: &str, verbose: bool) -> String {
  if verbose {
    format!("{target}=debug,tower_http=debug,ort=warn,info")
  } else {
    format!("{target}=info,tower_http=info,ort=warn,warn")
  }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(options: &LogOptions) -> Result<(), TryInitError> {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(&options.default_directives));

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(options.ansi)
        .event_format(StageFormat::new(options.timestamps)),
    )
    .with(filter)
    .try_init()
}

/// Label and colour used for a level
pub fn level_label(level: &Level) -> (&'static str, Color) {
  match *level {
    Level::ERROR => ("error", Color::Red),
    Level::WARN => ("warn", Color::Yellow),
    Level::INFO => ("info", Color::Blue),
    Level::DEBUG => ("debug", Color::Magenta),
    Level::TRACE => ("verb", Color::Cyan),
  }
}

/// Format the bracketed prefix for a level, padded so messages line up
pub fn format_prefix(level: &Level, ansi: bool) -> String {
  let (label, color) = level_label(level);
  let padding = 7usize.saturating_sub(label.len() + 2);
  if ansi {
    format!("[{}]{:<padding$}", label.color(color).bold(), "")
  } else {
    format!("[{label}]{:<padding$}", "")
  }
}

/// Event formatter producing bentley-style lines
#[derive(Debug, Clone, Copy)]
pub struct StageFormat {
  timestamps: bool,
}

impl StageFormat {
  pub fn new(timestamps: bool) -> Self {
    Self { timestamps }
  }
}

impl<S, N> FormatEvent<S, N> for StageFormat
where
  S: Subscriber + for<'a> LookupSpan<'a>,
  N: for<'a> FormatFields<'a> + 'static,
{
  fn format_event(
    &self,
    ctx: &FmtContext<'_, S, N>,
    mut writer: Writer<'_>,
    event: &Event<'_>,
  ) -> fmt::Result {
    let prefix = format_prefix(event.metadata().level(), writer.has_ansi_escapes());

    let stamp = if self.timestamps {
      let now = Local::now().format("%H:%M:%S").to_string();
      if writer.has_ansi_escapes() {
        format!("[{}] ", now.as_str().cyan())
      } else {
        format!("[{now}] ")
      }
    } else {
      String::new()
    };

    let mut scope = String::new();
    if let Some(spans) = ctx.event_scope() {
      for span in spans.from_root() {
        scope.push_str(span.name());
        let extensions = span.extensions();
        if let Some(fields) = extensions.get::<FormattedFields<N>>() {
          if !fields.is_empty() {
            write!(scope, "{{{fields}}}")?;
          }
        }
        scope.push_str(": ");
      }
    }

    let mut body = String::new();
    ctx.field_format().format_fields(Writer::new(&mut body), event)?;

    if body.is_empty() {
      return writeln!(writer, "{prefix} {stamp}{scope}");
    }

    for line in body.lines() {
      writeln!(writer, "{prefix} {stamp}{scope}{line}")?;
    }

    Ok(())
  }
}

/// Create a banner line of the specified length and character
pub fn banner_line(length: usize, char: char) -> String {
  char.to_string().repeat(length)
}

/// Display a message with a banner around it
pub fn as_banner<F>(log_fn: F, message: &str, width: Option<usize>, border_char: Option<char>)
where
  F: Fn(&str),
{
  let width = width.unwrap_or(50);
  let border_char = border_char.unwrap_or('=');

  let banner = banner_line(width, border_char);

  log_fn(&banner);
  for line in message.lines() {
    log_fn(line);
  }
  log_fn(&banner);
}

/// Theatrical announcement - for important but not critical messages
pub fn announce(message: &str) {
  as_banner(|line| tracing::info!("{line}"), message, Some(50), Some('-'));
}
