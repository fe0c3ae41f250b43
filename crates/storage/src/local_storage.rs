//! App-local state kept as JSON files in a directory.

use std::{
    collections::VecDeque,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use repwise_app::{Settings, SettingsRepository, log};
use serde::{Serialize, de::DeserializeOwned};

const KEY_SETTINGS: &str = "settings";
const KEY_LOG: &str = "log";

pub struct LocalStorage {
    dir: PathBuf,
    // Serializes read-modify-write cycles of the log.
    log_lock: Mutex<()>,
}

impl LocalStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            log_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, String> {
        match fs::read(self.path(key)) {
            Ok(content) => serde_json::from_slice(&content)
                .map(Some)
                .map_err(|err| format!("failed to parse {key}: {err}")),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(format!("failed to read {key}: {err}")),
        }
    }

    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), String> {
        let content =
            serde_json::to_vec(value).map_err(|err| format!("failed to serialize {key}: {err}"))?;
        fs::create_dir_all(&self.dir).map_err(|err| err.to_string())?;
        fs::write(self.path(key), content).map_err(|err| format!("failed to write {key}: {err}"))
    }
}

impl SettingsRepository for LocalStorage {
    async fn read_settings(&self) -> Result<Settings, String> {
        Ok(self.get(KEY_SETTINGS)?.unwrap_or_default())
    }

    async fn write_settings(&self, settings: Settings) -> Result<(), String> {
        self.set(KEY_SETTINGS, &settings)
    }
}

impl log::Repository for LocalStorage {
    fn read_entries(&self) -> Result<VecDeque<log::Entry>, log::Error> {
        Ok(self
            .get(KEY_LOG)
            .map_err(log::Error::Unknown)?
            .unwrap_or_default())
    }

    fn write_entry(&self, entry: log::Entry) -> Result<(), log::Error> {
        let _guard = self
            .log_lock
            .lock()
            .map_err(|err| log::Error::Unknown(err.to_string()))?;
        let mut entries = self.read_entries()?;
        log::push_entry(&mut entries, entry);
        self.set(KEY_LOG, &entries).map_err(log::Error::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use ::log::Level;
    use pretty_assertions::assert_eq;
    use repwise_app::log::Repository;

    use super::*;

    #[tokio::test]
    async fn test_settings() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("state"));
        assert_eq!(storage.read_settings().await, Ok(Settings::default()));

        let settings = Settings {
            linked_sides: false,
        };
        storage.write_settings(settings).await.unwrap();
        assert_eq!(storage.read_settings().await, Ok(settings));
        assert_eq!(
            LocalStorage::new(storage.dir()).read_settings().await,
            Ok(settings)
        );
    }

    #[tokio::test]
    async fn test_settings_with_missing_and_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("settings.json"), r#"{"beep_volume": 10}"#).unwrap();
        assert_eq!(
            LocalStorage::new(dir.path()).read_settings().await,
            Ok(Settings::default())
        );
        fs::write(dir.path().join("settings.json"), r#"{"linked_sides": false}"#).unwrap();
        assert_eq!(
            LocalStorage::new(dir.path()).read_settings().await,
            Ok(Settings {
                linked_sides: false,
            })
        );
    }

    #[tokio::test]
    async fn test_corrupt_settings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("settings.json"), "{").unwrap();
        assert!(LocalStorage::new(dir.path()).read_settings().await.is_err());
    }

    #[test]
    fn test_log() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        assert!(storage.read_entries().unwrap().is_empty());

        for i in 0..105 {
            storage
                .write_entry(log::Entry::new(Level::Info, format!("entry {i}")))
                .unwrap();
        }

        let entries = storage.read_entries().unwrap();
        assert_eq!(entries.len(), log::MAX_ENTRIES);
        assert_eq!(entries[0].message, "entry 104");
        assert_eq!(entries[log::MAX_ENTRIES - 1].message, "entry 5");
    }
}
