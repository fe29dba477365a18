use pandemic_game::{
    CatalogError, CatalogLoader, GameSession, GameStorage, LocationRegistry, SnapshotError,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },
    #[error("{path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },
}

/// Saves sessions as pretty JSON files, one per save name.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, save_name: &str) -> PathBuf {
        self.dir.join(format!("{save_name}.json"))
    }
}

impl GameStorage for FileStorage {
    type Error = StorageError;

    /// Written to a sibling temp file, then renamed over the old save.
    fn save_session(&self, save_name: &str, session: &GameSession) -> Result<(), Self::Error> {
        let path = self.path_for(save_name);
        let json = session.to_json().map_err(|source| StorageError::Snapshot {
            path: path.clone(),
            source,
        })?;
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        if let Err(source) = fs::rename(&tmp, &path) {
            if let Err(err) = fs::remove_file(&tmp) {
                log::warn!("could not remove {}: {err}", tmp.display());
            }
            return Err(StorageError::Io { path, source });
        }
        log::debug!("saved {save_name} to {}", path.display());
        Ok(())
    }

    fn load_session(&self, save_name: &str) -> Result<Option<GameSession>, Self::Error> {
        let path = self.path_for(save_name);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        GameSession::from_json(&json)
            .map(Some)
            .map_err(|source| StorageError::Snapshot { path, source })
    }

    fn delete_session(&self, save_name: &str) -> Result<(), Self::Error> {
        let path = self.path_for(save_name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// Catalog source selected on the command line.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    Bundled,
    File(PathBuf),
}

impl CatalogSource {
    pub fn from_arg(path: Option<&Path>) -> Self {
        path.map_or(Self::Bundled, |p| Self::File(p.to_path_buf()))
    }
}

impl CatalogLoader for CatalogSource {
    type Error = StorageError;

    fn load_catalog(&self) -> Result<LocationRegistry, Self::Error> {
        match self {
            Self::Bundled => Ok(LocationRegistry::default_catalog().clone()),
            Self::File(path) => {
                let json = fs::read_to_string(path).map_err(|source| StorageError::Io {
                    path: path.clone(),
                    source,
                })?;
                LocationRegistry::from_json(&json).map_err(|source| StorageError::Catalog {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pandemic_game::SessionConfig;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "pandemic-storage-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn save_then_load_round_trips() {
        let storage = FileStorage::new(temp_dir("roundtrip"));
        let mut session =
            GameSession::with_default_catalog("roundtrip", SessionConfig::default()).unwrap();
        session.infect("Lima").unwrap();
        storage.save_session("game", &session).unwrap();
        assert!(!storage.path_for("game").with_extension("json.tmp").exists());
        let loaded = storage.load_session("game").unwrap().unwrap();
        assert_eq!(loaded, session);
        storage.delete_session("game").unwrap();
        assert!(storage.load_session("game").unwrap().is_none());
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = temp_dir("blocked");
        let storage = FileStorage::new(&dir);
        fs::create_dir_all(storage.path_for("blocked")).unwrap();
        let session =
            GameSession::with_default_catalog("blocked", SessionConfig::default()).unwrap();
        let err = storage.save_session("blocked", &session).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
        assert!(!storage.path_for("blocked").with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_save_is_an_error_not_a_partial_load() {
        let dir = temp_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        let storage = FileStorage::new(&dir);
        fs::write(storage.path_for("bad"), "{\"catalog\": {\"locations\": []}}").unwrap();
        let err = storage.load_session("bad").unwrap_err();
        assert!(matches!(err, StorageError::Snapshot { .. }));
    }

    #[test]
    fn missing_catalog_file_is_reported() {
        let source = CatalogSource::from_arg(Some(Path::new("/definitely/not/here.json")));
        assert!(matches!(
            source.load_catalog(),
            Err(StorageError::Io { .. })
        ));
        assert_eq!(
            CatalogSource::Bundled.load_catalog().unwrap().len(),
            48
        );
    }
}
