use std::io;

use colored::*;
use geopipe_common::config::OutputMode;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

const CRATES: &[&str] = &["geopipe", "geopipe_core", "geopipe_protocols"];

pub struct GeopipeFormatter;

impl<S, N> FormatEvent<S, N> for GeopipeFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();

        let (symbol, color_func): (&str, fn(ColoredString) -> ColoredString) = match *meta.level() {
            Level::TRACE => ("[ ]", |s| s.dimmed()),
            Level::DEBUG => ("[?]", |s| s.blue()),
            Level::INFO => ("[+]", |s| s.green().bold()),
            Level::WARN => ("[*]", |s| s.yellow().bold()),
            Level::ERROR => ("[-]", |s| s.red().bold()),
        };

        write!(writer, "{} ", color_func(symbol.into()))?;

        // Worker spans, e.g. "dns_worker{id=3}: "
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name().bright_black())?;
                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>()
                    && !fields.is_empty()
                {
                    write!(writer, "{}", format!("{{{fields}}}").bright_black())?;
                }
                write!(writer, "{} ", ":".bright_black())?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Installs the global subscriber.
///
/// Verbose runs log to stdout next to the results; every other mode keeps
/// stdout for results only and logs warnings and errors to stderr. Silent
/// runs only show fatal errors. `RUST_LOG` overrides the level unless silent.
pub fn init_logging(mode: OutputMode, silent: bool) {
    let level: &str = if mode.is_verbose() { "debug" } else { "warn" };
    let filter: EnvFilter = if silent {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(level)))
    };

    let writer: BoxMakeWriter = if mode.is_verbose() {
        BoxMakeWriter::new(io::stdout)
    } else {
        BoxMakeWriter::new(io::stderr)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .event_format(GeopipeFormatter)
        .init();
}

/// Our own crates log at `level`; dependencies only at warn.
fn directives(level: &str) -> String {
    let mut directives: Vec<String> = vec!["warn".to_string()];
    directives.extend(CRATES.iter().map(|krate| format!("{krate}={level}")));
    directives.join(",")
}
