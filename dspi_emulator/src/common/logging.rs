//! Utilities for configuring logging
//!
//! Every CPU access to the DSP interface is logged at trace level, which is far too noisy to print.
//! Trace records are held back instead and only printed as context of the next record of a higher
//! level, so e.g. the warning about a dropped register write shows the accesses leading up to it.
use std::sync::Mutex;
use std::sync::Once;

use colored::Colorize;
use env_logger::Logger;
use log::Level;
use log::Log;
use log::Metadata;
use log::Record;

use crate::common::util::RingBuffer;

static ONCE_INIT: Once = Once::new();

const TRACE_CONTEXT_LINES: usize = 20;

/// Environment variable holding the env_logger filter string, e.g. `DSPI_LOG=dspi_emulator=trace`.
pub const LOG_FILTER_ENV: &str = "DSPI_LOG";

type TraceContext = RingBuffer<String, TRACE_CONTEXT_LINES>;

/// Uses env_logger for filtering and prints records in a compact, colored format.
struct DspiLogger {
    held_traces: Mutex<TraceContext>,
    filter: Logger,
}

impl DspiLogger {
    fn new(filter: Logger) -> Self {
        log::set_max_level(filter.filter());
        Self {
            held_traces: Mutex::new(TraceContext::default()),
            filter,
        }
    }
}

/// `<level tag> <message>`. Trace records have no tag.
fn format_message(level: Level, message: &str) -> String {
    let tag = match level {
        Level::Error => "E".red().bold(),
        Level::Warn => "W".yellow().bold(),
        Level::Info => "I".blue().bold(),
        Level::Debug => "D".blue(),
        Level::Trace => return message.dimmed().to_string(),
    };
    let message = match level {
        Level::Error => message.red(),
        Level::Warn => message.yellow(),
        _ => message.normal(),
    };
    format!("{tag} {message}")
}

/// Lines to print for a record above trace level: the held back traces oldest first, then the
/// record itself. Leaves the context empty.
fn release_context(context: &mut TraceContext, line: String) -> Vec<String> {
    let mut lines = Vec::with_capacity(context.len() + 2);
    if context.len() == TRACE_CONTEXT_LINES {
        lines.push("...".dimmed().to_string());
    }
    lines.extend(context.iter().rev().cloned());
    context.clear();
    lines.push(line);
    lines
}

impl Log for DspiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.filter.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.filter.matches(record) {
            return;
        }
        let line = format_message(record.level(), &record.args().to_string());
        let Ok(mut context) = self.held_traces.lock() else {
            println!("{line}");
            return;
        };
        if record.level() == Level::Trace {
            context.push(line);
            return;
        }
        for line in release_context(&mut context, line) {
            println!("{line}");
        }
    }

    fn flush(&self) {}
}

fn install(default_filter: &str) {
    let filter_config =
        std::env::var(LOG_FILTER_ENV).unwrap_or_else(|_| default_filter.to_string());
    let filter = env_logger::builder().parse_filters(&filter_config).build();
    // Another logger may already be installed by the embedding application.
    if log::set_boxed_logger(Box::new(DspiLogger::new(filter))).is_err() {
        log::debug!("Logger already installed, keeping it");
    }
}

pub fn init() {
    ONCE_INIT.call_once(|| install("error"));
}

pub fn test_init(verbose: bool) {
    ONCE_INIT.call_once(|| install(if verbose { "info,dspi_emulator=trace" } else { "warn" }));
}
