//! # Colorized Tracing Output
//!
//! A library never installs a global subscriber on its own — doing so would
//! fight whatever the embedding application already configured. This module
//! only provides the formatter and an opt-in test helper; binaries and test
//! suites that embed this crate decide whether and how to use them.
//!
//! [`ColorizedFormatter`] colors an entire log line by its severity level
//! instead of printing separate timestamp/level columns, adapted directly
//! from the teacher crate's own `logging.rs`.

use std::fmt;
use std::sync::Once;

use colored::*;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// A tracing event formatter that colors the whole rendered line by level,
/// with no timestamp or level column printed separately.
pub struct ColorizedFormatter;

impl<S, N> FormatEvent<S, N> for ColorizedFormatter
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
        let mut buffer = String::new();
        let buf_writer = Writer::new(&mut buffer);
        ctx.format_fields(buf_writer, event)?;

        let colored_output = match *event.metadata().level() {
            Level::INFO => buffer.white(),
            Level::WARN => buffer.yellow(),
            Level::ERROR => buffer.red(),
            Level::DEBUG => buffer.blue(),
            Level::TRACE => buffer.purple(),
        };

        writeln!(writer, "{colored_output}")
    }
}

static INIT: Once = Once::new();

/// Installs a process-local `tracing_subscriber` registry exactly once,
/// using [`ColorizedFormatter`] and an `EnvFilter` read from `RUST_LOG`
/// (defaulting to `info`). Intended for `cargo test -- --nocapture` and
/// demo binaries; library code paths never call this implicitly.
pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .event_format(ColorizedFormatter)
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
