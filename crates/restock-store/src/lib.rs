pub mod config;
pub mod mail;
pub mod paths;
pub mod state;

pub use mail::MailConfig;
pub use paths::StorePaths;
pub use state::StateStore;

use fs2::FileExt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default data root when neither `--data-dir` nor `RESTOCK_DATA_DIR` is given.
/// `<data_dir>/restock` (falls back to `~/.restock`, then `./.restock`).
pub fn default_root() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("restock")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".restock")
    } else {
        PathBuf::from(".restock")
    }
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// File-based exclusive lock guard. Released on drop.
pub struct LockGuard {
    _file: fs::File,
}

/// Acquire an exclusive lock without blocking. Fails if another process holds it.
pub fn try_lock_file(path: &Path) -> anyhow::Result<LockGuard> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.try_lock_exclusive().map_err(|e| {
        anyhow::anyhow!(
            "another restock agent holds {} ({e}); only one may run per data dir",
            path.display()
        )
    })?;
    Ok(LockGuard { _file: file })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_root_is_not_empty() {
        assert!(!default_root().as_os_str().is_empty());
    }

    #[test]
    fn write_atomic_creates_file_and_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("state.json");
        write_atomic(&path, b"[]").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn write_atomic_replaces_whole_document() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.json");
        write_atomic(&path, b"a much longer first document").unwrap();
        write_atomic(&path, b"short").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn second_lock_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let lock_path = tmp.path().join("LOCK");
        let guard = try_lock_file(&lock_path).unwrap();
        assert!(lock_path.exists());
        assert!(try_lock_file(&lock_path).is_err());
        drop(guard);
        assert!(try_lock_file(&lock_path).is_ok());
    }
}
