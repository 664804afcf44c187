//! SQLite-backed context persistence.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::{LovebotError, LovebotResult};

use super::persistence::{ContextPersistence, LoadedRecord};
use super::types::ConversationContext;

/// Stores each context as a JSON document in one table row.
pub struct SqliteContextPersistence {
    conn: Mutex<Connection>,
}

impl SqliteContextPersistence {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn new(path: impl AsRef<Path>) -> LovebotResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(LovebotError::db_connection)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> LovebotResult<Self> {
        let conn = Connection::open_in_memory().map_err(LovebotError::db_connection)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> LovebotResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LovebotError::database("sqlite connection lock poisoned"))
    }

    fn init_schema(&self) -> LovebotResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS conversation_contexts (
                key TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }
}

impl ContextPersistence for SqliteContextPersistence {
    fn load_all(&self) -> LovebotResult<Vec<LoadedRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key, data FROM conversation_contexts ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (key, data) = row?;
            let context = serde_json::from_str::<ConversationContext>(&data)
                .map_err(|e| LovebotError::storage_load(key.clone(), e.to_string()));
            records.push((key, context));
        }
        Ok(records)
    }

    fn save(&self, key: &str, context: &ConversationContext) -> LovebotResult<()> {
        let data = serde_json::to_string(context)?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO conversation_contexts (key, conversation_id, data, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                conversation_id = excluded.conversation_id,
                data = excluded.data,
                updated_at = excluded.updated_at
            "#,
            params![
                key,
                context.conversation_id.as_str(),
                data,
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(|e| LovebotError::storage_save(key, e.to_string()))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> LovebotResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM conversation_contexts WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::types::MessageEntry;

    fn context(id: &str) -> ConversationContext {
        let mut ctx = ConversationContext::new(id.into(), Utc::now());
        ctx.push_message(
            MessageEntry {
                conversation_id: id.into(),
                sender: "a@c.us".to_string(),
                sender_name: "Ana".to_string(),
                text: "hello".to_string(),
                timestamp: Utc::now(),
                is_from_bot: false,
            },
            20,
        );
        ctx
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let store = SqliteContextPersistence::in_memory().unwrap();
        let ctx = context("1@g.us");
        store.save("1_g_us", &ctx).unwrap();
        store.save("1_g_us", &ctx).unwrap();

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 1);
        let (key, loaded) = &records[0];
        assert_eq!(key, "1_g_us");
        assert_eq!(loaded.as_ref().unwrap(), &ctx);
    }

    #[test]
    fn test_corrupt_row_reported_per_record() {
        let store = SqliteContextPersistence::in_memory().unwrap();
        store.save("good", &context("good@c.us")).unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO conversation_contexts VALUES ('bad', 'bad@c.us', '{not json', '')",
                [],
            )
            .unwrap();

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().find(|(k, _)| k == "bad").unwrap().1.is_err());
        assert!(records.iter().find(|(k, _)| k == "good").unwrap().1.is_ok());
    }

    #[test]
    fn test_delete() {
        let store = SqliteContextPersistence::in_memory().unwrap();
        store.save("k", &context("k@c.us")).unwrap();
        store.delete("k").unwrap();
        store.delete("k").unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_file_database_created_in_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("contexts.db");
        let store = SqliteContextPersistence::new(&path).unwrap();
        store.save("k", &context("k@c.us")).unwrap();
        drop(store);

        let reopened = SqliteContextPersistence::new(&path).unwrap();
        assert_eq!(reopened.load_all().unwrap().len(), 1);
    }
}
