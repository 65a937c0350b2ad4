//! Output sinks
//!
//! The orchestrator reports progress and build output one line at a time.
//! Writes are fire-and-forget: a sink never fails and never blocks the run.

use colored::Colorize;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

/// Accepts lines of text.
pub trait OutputSink: Send + Sync {
    fn line(&self, line: &str);
}

/// Prints every line to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn line(&self, line: &str) {
        if line.starts_with("cache error:") || line == "ignoring build cache" {
            println!("{}", line.yellow());
        } else if line.starts_with("$ ") {
            println!("{}", line.dimmed());
        } else {
            println!("{}", line);
        }
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Mutex<Vec<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl OutputSink for BufferSink {
    fn line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

impl OutputSink for UnboundedSender<String> {
    fn line(&self, line: &str) {
        // a dropped receiver just means nobody is watching any more
        let _ = self.send(line.to_string());
    }
}
