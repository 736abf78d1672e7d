//! Structured event stream for the dashboard.
//!
//! Each event is printed to stdout as `JSON_DATA:{...}` and appended to
//! `events.jsonl` with a sequence number and timestamp.

use restock_core::clock::now_rfc3339;
use restock_core::ScheduledTask;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const STDOUT_PREFIX: &str = "JSON_DATA:";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A restock listing scan started.
    NewRound,
    ScrapedItem {
        date: String,
        caption: String,
        title: String,
        is_target: bool,
    },
    /// A listed title equals a target; emitted before dedup or purchase.
    MatchedItem { title: String, caption: String },
    TasksUpdated { tasks: Vec<ScheduledTask> },
}

impl AgentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AgentEvent::NewRound => "new_round",
            AgentEvent::ScrapedItem { .. } => "scraped_item",
            AgentEvent::MatchedItem { .. } => "matched_item",
            AgentEvent::TasksUpdated { .. } => "tasks_updated",
        }
    }
}

#[derive(Debug, Serialize)]
struct FullEvent<'a> {
    seq: u64,
    ts: String,
    #[serde(flatten)]
    event: &'a AgentEvent,
}

/// Best-effort event writer: a failed write is logged and dropped.
pub struct EventLogger {
    jsonl_path: Option<PathBuf>,
    stdout: bool,
    seq: Mutex<u64>,
}

impl EventLogger {
    pub fn new(jsonl_path: Option<PathBuf>, stdout: bool) -> Self {
        Self {
            jsonl_path,
            stdout,
            seq: Mutex::new(0),
        }
    }

    pub fn emit(&self, event: AgentEvent) {
        let seq = match self.seq.lock() {
            Ok(mut seq) => {
                let current = *seq;
                *seq += 1;
                current
            }
            Err(_) => return,
        };

        if self.stdout {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{STDOUT_PREFIX}{line}"),
                Err(e) => tracing::warn!(error = %e, "event not serializable"),
            }
        }

        if let Some(path) = &self.jsonl_path {
            let full = FullEvent {
                seq,
                ts: now_rfc3339(),
                event: &event,
            };
            let written = serde_json::to_string(&full)
                .map_err(std::io::Error::other)
                .and_then(|line| append_line(path, &line));
            if let Err(e) = written {
                tracing::warn!(event = event.name(), error = %e, "event log write failed");
            }
        }
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

/// Parse `events.jsonl` back into raw values, skipping malformed lines.
#[cfg(test)]
pub(crate) fn read_event_log(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .map(|content| {
            content
                .lines()
                .filter_map(|l| serde_json::from_str(l).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_matches_dashboard_tags() {
        let v = serde_json::to_value(AgentEvent::ScrapedItem {
            date: "2024/5/1 09:30:00".into(),
            caption: "One Piece".into(),
            title: "Figure A".into(),
            is_target: true,
        })
        .unwrap();
        assert_eq!(v["type"], "scraped_item");
        assert_eq!(v["is_target"], true);
        assert_eq!(
            serde_json::to_value(AgentEvent::NewRound).unwrap(),
            serde_json::json!({"type": "new_round"})
        );
        let tasks = vec![ScheduledTask::new("01J", "Figure", "2024-05-01", "10:00", 2)];
        let v = serde_json::to_value(AgentEvent::TasksUpdated { tasks }).unwrap();
        assert_eq!(v["tasks"][0]["productName"], "Figure");
    }

    #[test]
    fn jsonl_lines_carry_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");
        let log = EventLogger::new(Some(path.clone()), false);
        log.emit(AgentEvent::NewRound);
        log.emit(AgentEvent::MatchedItem {
            title: "Figure A".into(),
            caption: "One Piece".into(),
        });
        let events = read_event_log(&path);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["seq"], 0);
        assert_eq!(events[1]["seq"], 1);
        assert_eq!(events[1]["type"], "matched_item");
        assert!(events[0]["ts"].as_str().is_some());
    }

    #[test]
    fn logger_without_sinks_writes_nothing() {
        EventLogger::new(None, false).emit(AgentEvent::NewRound);
    }
}
