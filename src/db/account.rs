//! Account repository: credit balance reads and the conditional debit

use chrono::Utc;
use rusqlite::OptionalExtension;

use super::DbPool;
use crate::{Error, Result};

/// Outcome of a conditional credit debit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Debit {
    /// One credit was removed
    Applied,
    /// Balance was already zero; nothing changed
    NoCredits,
}

/// Account repository
#[derive(Clone)]
pub struct AccountRepo {
    pool: DbPool,
}

impl AccountRepo {
    /// Create a new account repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Find an account, creating it with `starting_credits` if absent
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find_or_create(&self, id: &str, starting_credits: i64) -> Result<i64> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let existing: Option<i64> = conn
            .query_row("SELECT credits FROM accounts WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .ok();

        if let Some(credits) = existing {
            return Ok(credits);
        }

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO accounts (id, credits, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            rusqlite::params![id, starting_credits, now],
        )
        .map_err(|e| Error::Persistence(e.to_string()))?;

        Ok(starting_credits)
    }

    /// Current credit balance (None if the account does not exist)
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn credits(&self, id: &str) -> Result<Option<i64>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let credits = conn
            .query_row("SELECT credits FROM accounts WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| Error::Persistence(e.to_string()))?;

        Ok(credits)
    }

    /// Remove exactly one credit if the balance is positive.
    ///
    /// The guard lives in the statement itself (`WHERE credits > 0`), so
    /// concurrent debits against a one-credit account apply at most once.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn atomic_debit(&self, id: &str) -> Result<Debit> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let changed = conn
            .execute(
                "UPDATE accounts SET credits = credits - 1, updated_at = ?2
                 WHERE id = ?1 AND credits > 0",
                rusqlite::params![id, now],
            )
            .map_err(|e| Error::Persistence(e.to_string()))?;

        if changed == 0 {
            Ok(Debit::NoCredits)
        } else {
            Ok(Debit::Applied)
        }
    }

    /// Add credits to an account
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn grant(&self, id: &str, amount: i64) -> Result<i64> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE accounts SET credits = credits + ?2, updated_at = ?3 WHERE id = ?1",
            rusqlite::params![id, amount, now],
        )
        .map_err(|e| Error::Persistence(e.to_string()))?;

        self.credits(id)?
            .ok_or_else(|| Error::Persistence(format!("account not found: {id}")))
    }
}
