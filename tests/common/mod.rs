//! Shared test utilities

use timbre_studio::db::{self, AccountRepo, ClipRepo, DbPool};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Create a test account with the given balance
pub fn create_test_account(pool: &DbPool, id: &str, credits: i64) -> AccountRepo {
    let repo = AccountRepo::new(pool.clone());
    repo.find_or_create(id, credits)
        .expect("failed to create test account");
    repo
}

/// Clip repository over the test database
#[must_use]
pub fn clip_repo(pool: &DbPool) -> ClipRepo {
    ClipRepo::new(pool.clone())
}
