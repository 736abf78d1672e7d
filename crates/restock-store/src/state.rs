//! Typed access to the four JSON state sets.
//!
//! Every save serialises the complete document and replaces the file
//! atomically; readers never see a half-written file.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use restock_core::{DailyHistory, ScheduledTask, Target};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::mail::MailConfig;
use crate::paths::StorePaths;
use crate::write_atomic;

#[derive(Debug, Clone)]
pub struct StateStore {
    paths: StorePaths,
}

impl StateStore {
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    // ── Targets ──

    pub fn load_targets(&self) -> Result<Vec<Target>> {
        Ok(read_json(&self.paths.targets_json)?.unwrap_or_default())
    }

    pub fn save_targets(&self, targets: &[Target]) -> Result<()> {
        write_json(&self.paths.targets_json, &targets)
    }

    // ── Scheduled tasks ──

    pub fn load_tasks(&self) -> Result<Vec<ScheduledTask>> {
        Ok(read_json(&self.paths.tasks_json)?.unwrap_or_default())
    }

    pub fn save_tasks(&self, tasks: &[ScheduledTask]) -> Result<()> {
        write_json(&self.paths.tasks_json, &tasks)
    }

    /// Replace one task by id inside the stored list and persist the whole
    /// list. Returns the full list as written. A task missing from disk (for
    /// example deleted by the operator mid-run) is appended.
    pub fn upsert_task(&self, task: &ScheduledTask) -> Result<Vec<ScheduledTask>> {
        let mut tasks = self.load_tasks()?;
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task.clone(),
            None => tasks.push(task.clone()),
        }
        self.save_tasks(&tasks)?;
        Ok(tasks)
    }

    // ── Daily history ──

    /// History for `today`. A file dated any other day yields an empty day.
    pub fn load_history(&self, today: NaiveDate) -> Result<DailyHistory> {
        let stored: Option<DailyHistory> = read_json(&self.paths.history_json)?;
        Ok(stored
            .map(|h| h.for_day(today))
            .unwrap_or_else(|| DailyHistory::empty(today)))
    }

    pub fn save_history(&self, history: &DailyHistory) -> Result<()> {
        write_json(&self.paths.history_json, history)
    }

    // ── Mail config ──

    pub fn load_mail_config(&self) -> Result<Option<MailConfig>> {
        read_json(&self.paths.mail_config_json)
    }

    pub fn save_mail_config(&self, config: &MailConfig) -> Result<()> {
        write_json(&self.paths.mail_config_json, config)
    }
}

/// `Ok(None)` when the file does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(value))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_string_pretty(value)?;
    write_atomic(path, data.as_bytes()).with_context(|| format!("saving {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use restock_core::{HistoryEntry, TaskStatus};

    fn store() -> (tempfile::TempDir, StateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(StorePaths::discover(dir.path()));
        (dir, store)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn missing_files_load_empty() {
        let (_dir, store) = store();
        assert!(store.load_targets().unwrap().is_empty());
        assert!(store.load_tasks().unwrap().is_empty());
        assert!(store.load_history(day(2026, 10, 19)).unwrap().is_empty());
        assert!(store.load_mail_config().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let (_dir, store) = store();
        std::fs::write(&store.paths().targets_json, "{not json").unwrap();
        let err = store.load_targets().unwrap_err();
        assert!(format!("{err:#}").contains("targets.json"));
    }

    #[test]
    fn targets_accept_legacy_strings() {
        let (_dir, store) = store();
        std::fs::write(
            &store.paths().targets_json,
            r#"["Figure A", {"title": "Figure B", "quantity": 2}]"#,
        )
        .unwrap();
        let targets = store.load_targets().unwrap();
        assert_eq!(targets[0], Target::new("Figure A", None));
        assert_eq!(targets[1], Target::new("Figure B", Some(2)));

        store.save_targets(&targets).unwrap();
        let raw = std::fs::read_to_string(&store.paths().targets_json).unwrap();
        assert!(raw.contains(r#""title": "Figure A""#));
    }

    fn record(store: &StateStore, today: NaiveDate, entry: HistoryEntry) -> DailyHistory {
        let mut history = store.load_history(today).unwrap();
        history.record(entry);
        store.save_history(&history).unwrap();
        history
    }

    #[test]
    fn history_from_yesterday_loads_empty() {
        let (_dir, store) = store();
        record(&store, day(2026, 10, 18), HistoryEntry::new("Figure A", "IP", 1, "t"));

        let today = store.load_history(day(2026, 10, 19)).unwrap();
        assert!(today.is_empty());
        assert_eq!(today.date, "2026-10-19");

        let yesterday = store.load_history(day(2026, 10, 18)).unwrap();
        assert!(yesterday.contains("Figure A"));
    }

    #[test]
    fn recording_on_a_new_day_drops_the_old_one() {
        let (_dir, store) = store();
        record(&store, day(2026, 10, 18), HistoryEntry::new("Old", "", 1, "t"));
        let h = record(&store, day(2026, 10, 19), HistoryEntry::new("New", "", 2, "t"));
        assert_eq!(h.len(), 1);
        assert!(h.contains("New"));
        assert!(!h.contains("Old"));
    }

    #[test]
    fn upsert_task_updates_in_place() {
        let (_dir, store) = store();
        let a = ScheduledTask::new("a", "Figure", "2026-10-19", "10:00", 2);
        let b = ScheduledTask::new("b", "Stand", "2026-10-19", "11:00", 1);
        store.save_tasks(&[a.clone(), b.clone()]).unwrap();

        let mut progressed = a.clone();
        progressed.record_fulfilled(2);
        let all = store.upsert_task(&progressed).unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "a");
        assert_eq!(all[0].status, TaskStatus::Completed);
        assert_eq!(all[1], b);
        assert_eq!(store.load_tasks().unwrap(), all);
    }

    #[test]
    fn mail_config_roundtrip() {
        let (_dir, store) = store();
        let cfg = MailConfig {
            user: "me@qq.com".into(),
            pass: "code".into(),
            to: "you@qq.com".into(),
            ..Default::default()
        };
        store.save_mail_config(&cfg).unwrap();
        assert_eq!(store.load_mail_config().unwrap(), Some(cfg));
    }
}
