//! Per-run state and the handlers that feed it from the live stream.

use tracing::debug;

use crate::clock;
use crate::extract::{DependencyTable, UpdatePayload};
use crate::model::{Dependency, LogEntry, LogLevel, LogMessage};
use crate::present;
use crate::traits::StreamError;

pub const COMPLETION_MESSAGE: &str = "Renovate process completed.";

/// Whether the log view should follow new entries.
///
/// Following stops as soon as the user scrolls away from the bottom and
/// resumes when they return to it or a new run starts.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    threshold_px: u32,
    follow: bool,
}

impl ScrollTracker {
    pub fn new(threshold_px: u32) -> Self {
        Self {
            threshold_px,
            follow: true,
        }
    }

    pub fn on_scroll(&mut self, scroll_top: u32, client_height: u32, scroll_height: u32) {
        let bottom = scroll_top.saturating_add(client_height);
        self.follow = bottom >= scroll_height.saturating_sub(self.threshold_px);
    }

    pub fn reset(&mut self) {
        self.follow = true;
    }

    pub fn should_follow(&self) -> bool {
        self.follow
    }
}

/// Everything one run displays. Rebuilt from scratch at each run start.
#[derive(Debug)]
pub struct SessionState {
    logs: Vec<LogEntry>,
    dependencies: DependencyTable,
    running: bool,
    generation: u64,
    scroll: ScrollTracker,
    default_datasource: String,
}

impl SessionState {
    pub fn new(default_datasource: impl Into<String>, scroll_threshold_px: u32) -> Self {
        Self {
            logs: Vec::new(),
            dependencies: DependencyTable::new(),
            running: false,
            generation: 0,
            scroll: ScrollTracker::new(scroll_threshold_px),
            default_datasource: default_datasource.into(),
        }
    }

    /// Clears both lists and starts a new generation. Returns the generation
    /// the new run must present to the handlers.
    pub fn reset(&mut self) -> u64 {
        self.logs.clear();
        self.dependencies.clear();
        self.running = false;
        self.scroll.reset();
        self.generation += 1;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn dependencies(&self) -> &[Dependency] {
        self.dependencies.rows()
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollTracker {
        &mut self.scroll
    }

    pub fn should_auto_scroll(&self) -> bool {
        self.scroll.should_follow()
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.logs.push(LogEntry::synthetic(message, LogLevel::Error, "error"));
    }

    /// Appends the entry for `message`, then routes it to the extractor.
    /// Ignored when `generation` belongs to an earlier run.
    pub fn apply_message(&mut self, generation: u64, message: LogMessage) -> bool {
        if generation != self.generation {
            return false;
        }

        let entry = LogEntry {
            message: message.text().to_string(),
            time: clock::format_timestamp(message.time.as_ref()),
            level: LogLevel::from_value(message.level.as_ref()),
            kind: message.tag().unwrap_or("log").to_string(),
            raw: serde_json::to_value(&message).ok(),
        };
        let display = present::clean_message(&entry.message);
        self.logs.push(entry);

        if let Some(payload) = UpdatePayload::detect(&message, &display) {
            let shape = payload.shape();
            let found = payload.into_dependencies(&self.default_datasource);
            debug!(shape, count = found.len(), "Extracted dependency updates");
            self.dependencies.extend(found);
        }
        true
    }

    /// Records a stream failure and ends the run.
    pub fn apply_error(&mut self, generation: u64, error: &StreamError) -> bool {
        if generation != self.generation {
            return false;
        }
        self.push_error(format!("Error: {error}"));
        self.running = false;
        true
    }

    /// Records normal stream completion and ends the run.
    pub fn apply_complete(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.running = false;
        self.logs
            .push(LogEntry::synthetic(COMPLETION_MESSAGE, LogLevel::Success, "success"));
        true
    }
}
