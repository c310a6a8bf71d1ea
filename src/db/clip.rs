//! Generated clip repository

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DbPool;
use crate::voices::Service;
use crate::{Error, Result};

/// A persisted generation record
#[derive(Debug, Clone)]
pub struct Clip {
    pub id: String,
    pub account_id: String,
    pub text: String,
    /// Voice as the user requested it, before catalog translation
    pub voice: String,
    pub service: String,
    pub s3_key: String,
    pub created_at: DateTime<Utc>,
}

/// Clip repository
#[derive(Clone)]
pub struct ClipRepo {
    pool: DbPool,
}

impl ClipRepo {
    /// Create a new clip repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Persist a generation record, returning its id
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn create(
        &self,
        account_id: &str,
        text: &str,
        voice: &str,
        service: Service,
        s3_key: &str,
    ) -> Result<String> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO clips (id, account_id, text, voice, service, s3_key, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![id, account_id, text, voice, service.to_string(), s3_key, now],
        )
        .map_err(|e| Error::Persistence(e.to_string()))?;

        Ok(id)
    }

    /// Find a clip by id (returns None if not found)
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find(&self, id: &str) -> Result<Option<Clip>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let clip = conn
            .query_row(
                "SELECT id, account_id, text, voice, service, s3_key, created_at
                 FROM clips WHERE id = ?1",
                [id],
                row_to_clip,
            )
            .ok();

        Ok(clip)
    }

    /// List an account's clips, newest first
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list_for_account(&self, account_id: &str) -> Result<Vec<Clip>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, account_id, text, voice, service, s3_key, created_at
                 FROM clips WHERE account_id = ?1 ORDER BY created_at DESC",
            )
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let clips = stmt
            .query_map([account_id], row_to_clip)
            .map_err(|e| Error::Persistence(e.to_string()))?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(clips)
    }

    /// Number of clips stored for an account
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn count_for_account(&self, account_id: &str) -> Result<i64> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Persistence(e.to_string()))?;

        conn.query_row(
            "SELECT COUNT(*) FROM clips WHERE account_id = ?1",
            [account_id],
            |row| row.get(0),
        )
        .map_err(|e| Error::Persistence(e.to_string()))
    }
}

fn row_to_clip(row: &rusqlite::Row<'_>) -> rusqlite::Result<Clip> {
    Ok(Clip {
        id: row.get(0)?,
        account_id: row.get(1)?,
        text: row.get(2)?,
        voice: row.get(3)?,
        service: row.get(4)?,
        s3_key: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory, AccountRepo};

    fn setup() -> (ClipRepo, AccountRepo) {
        let pool = init_memory().unwrap();
        (ClipRepo::new(pool.clone()), AccountRepo::new(pool))
    }

    #[test]
    fn test_create_and_find() {
        let (clips, accounts) = setup();
        accounts.find_or_create("user-1", 10).unwrap();

        let id = clips
            .create("user-1", "Hello world", "andreas", Service::StyleTts2, "k1")
            .unwrap();

        let clip = clips.find(&id).unwrap().expect("clip should exist");
        assert_eq!(clip.account_id, "user-1");
        assert_eq!(clip.text, "Hello world");
        assert_eq!(clip.voice, "andreas");
        assert_eq!(clip.service, "styletts2");
        assert_eq!(clip.s3_key, "k1");
    }

    #[test]
    fn test_list_for_account() {
        let (clips, accounts) = setup();
        accounts.find_or_create("user-2", 10).unwrap();

        clips
            .create("user-2", "one", "woman", Service::StyleTts2, "k1")
            .unwrap();
        clips
            .create("user-2", "two", "woman", Service::StyleTts2, "k2")
            .unwrap();

        let listed = clips.list_for_account("user-2").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(clips.count_for_account("user-2").unwrap(), 2);
        assert_eq!(clips.count_for_account("other").unwrap(), 0);
    }
}
