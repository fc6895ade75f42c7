use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::engine::errors::WalError;
use crate::shared::path::absolutize;

pub const WAL_FILE_EXTENSION: &str = "wal";

/// Resolves WAL ids to file paths. Files live in one directory and are named
/// `<wal_id>_<label>.wal`.
#[derive(Debug)]
pub struct WalManager {
    base_dir: PathBuf,
    paths: RwLock<HashMap<i64, PathBuf>>,
}

impl WalManager {
    /// Opens `base_dir`, creating it if needed, and registers every WAL file already in it.
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self, WalError> {
        let base_dir = absolutize(base_dir);
        std::fs::create_dir_all(&base_dir).map_err(|e| WalError::io(&base_dir, e))?;

        let mut paths = HashMap::new();
        let entries = std::fs::read_dir(&base_dir).map_err(|e| WalError::io(&base_dir, e))?;
        for entry in entries.flatten() {
            let path = entry.path();
            match parse_wal_id(&path) {
                Some(wal_id) => {
                    if let Some(prev) = paths.insert(wal_id, path.clone()) {
                        warn!(
                            target: "olap_ingest::wal_manager::open",
                            wal_id, ?prev, ?path,
                            "Duplicate WAL id on disk, keeping the later entry"
                        );
                    }
                }
                None => debug!(target: "olap_ingest::wal_manager::open", ?path, "Ignoring non-WAL file"),
            }
        }

        info!(
            target: "olap_ingest::wal_manager::open",
            base_dir = %base_dir.display(),
            wal_count = paths.len(),
            "WAL directory scanned"
        );

        Ok(Self {
            base_dir,
            paths: RwLock::new(paths),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Allocates and registers the path for a new WAL. The file itself is not created.
    pub fn create_wal_path(&self, wal_id: i64, label: &str) -> PathBuf {
        let label: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let path = self
            .base_dir
            .join(format!("{}_{}.{}", wal_id, label, WAL_FILE_EXTENSION));
        self.add_wal_path(wal_id, path.clone());
        path
    }

    pub fn add_wal_path(&self, wal_id: i64, path: PathBuf) {
        debug!(target: "olap_ingest::wal_manager::add_wal_path", wal_id, ?path, "Registering WAL path");
        self.paths.write().insert(wal_id, path);
    }

    pub fn get_wal_path(&self, wal_id: i64) -> Result<PathBuf, WalError> {
        self.paths
            .read()
            .get(&wal_id)
            .cloned()
            .ok_or(WalError::UnknownWal(wal_id))
    }

    pub fn wal_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.paths.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Removes the WAL file and forgets its id.
    pub fn delete_wal(&self, wal_id: i64) -> Result<(), WalError> {
        let path = self
            .paths
            .write()
            .remove(&wal_id)
            .ok_or(WalError::UnknownWal(wal_id))?;

        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(target: "olap_ingest::wal_manager::delete_wal", wal_id, ?path, "Deleted WAL file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(target: "olap_ingest::wal_manager::delete_wal", wal_id, ?path, "WAL file already gone");
                Ok(())
            }
            Err(e) => Err(WalError::io(path, e)),
        }
    }
}

fn parse_wal_id(path: &Path) -> Option<i64> {
    if path.extension().map(|ext| ext != WAL_FILE_EXTENSION).unwrap_or(true) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let id = stem.split_once('_').map(|(id, _)| id).unwrap_or(stem);
    id.parse::<i64>().ok()
}
