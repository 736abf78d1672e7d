use std::path::{Path, PathBuf};

/// All well-known files under the data root.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub root: PathBuf,
    pub targets_json: PathBuf,
    pub tasks_json: PathBuf,
    pub history_json: PathBuf,
    pub mail_config_json: PathBuf,
    pub config_json: PathBuf,
    pub events_jsonl: PathBuf,
    pub lock_file: PathBuf,
}

impl StorePaths {
    /// Derive all paths from a data root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            targets_json: root.join("targets.json"),
            tasks_json: root.join("scheduled_tasks.json"),
            history_json: root.join("matched_history.json"),
            mail_config_json: root.join("mail_config.json"),
            config_json: root.join("config.json"),
            events_jsonl: root.join("events.jsonl"),
            lock_file: root.join("LOCK"),
            root,
        }
    }

    /// Resolve the data root: explicit flag, then `RESTOCK_DATA_DIR`, then the
    /// per-user default.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        let root = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("RESTOCK_DATA_DIR").map(PathBuf::from))
            .unwrap_or_else(crate::default_root);
        Self::discover(root)
    }

    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }
}
