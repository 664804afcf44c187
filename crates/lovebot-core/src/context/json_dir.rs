//! One JSON file per conversation in a directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{LovebotError, LovebotResult};

use super::persistence::{ContextPersistence, LoadedRecord};
use super::types::ConversationContext;

const EXTENSION: &str = "json";

/// Stores `<key>.json` files, each written to a temporary file first and
/// renamed into place.
pub struct JsonDirPersistence {
    dir: PathBuf,
}

impl JsonDirPersistence {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> LovebotResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            LovebotError::storage(format!("cannot create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, EXTENSION))
    }
}

impl ContextPersistence for JsonDirPersistence {
    fn load_all(&self) -> LovebotResult<Vec<LoadedRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let context = fs::read_to_string(&path)
                .map_err(|e| LovebotError::storage_load(key.clone(), e.to_string()))
                .and_then(|data| {
                    serde_json::from_str::<ConversationContext>(&data)
                        .map_err(|e| LovebotError::storage_load(key.clone(), e.to_string()))
                });
            records.push((key, context));
        }
        records.sort_by(|a, b| a.0.cmp(&b.0));
        debug!(dir = %self.dir.display(), count = records.len(), "Loaded context files");
        Ok(records)
    }

    fn save(&self, key: &str, context: &ConversationContext) -> LovebotResult<()> {
        let data = serde_json::to_vec_pretty(context)?;
        let target = self.path_for(key);
        let tmp = self.dir.join(format!("{}.{}.tmp", key, EXTENSION));

        fs::write(&tmp, data).map_err(|e| LovebotError::storage_save(key, e.to_string()))?;
        fs::rename(&tmp, &target).map_err(|e| LovebotError::storage_save(key, e.to_string()))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> LovebotResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "json_dir"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_roundtrip_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirPersistence::new(dir.path().join("contexts")).unwrap();

        let mut ctx = ConversationContext::new("1@g.us".into(), Utc::now());
        ctx.summary = Some("first".to_string());
        store.save("1_g_us", &ctx).unwrap();
        ctx.summary = Some("second".to_string());
        store.save("1_g_us", &ctx).unwrap();

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1.as_ref().unwrap(), &ctx);
        assert!(!store.dir().join("1_g_us.json.tmp").exists());
    }

    #[test]
    fn test_unusable_dir_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("contexts");
        fs::write(&blocker, "not a directory").unwrap();

        let err = JsonDirPersistence::new(blocker.join("inner")).err().unwrap();
        assert!(matches!(err, LovebotError::Storage { key: None, .. }));
    }

    #[test]
    fn test_ignores_foreign_files_and_reports_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirPersistence::new(dir.path()).unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "broken");
        assert!(records[0].1.is_err());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirPersistence::new(dir.path()).unwrap();
        assert!(store.delete("nope").is_ok());
    }
}
