//! Session handling
//!
//! Authentication mechanics live outside the core; the synthesizer only
//! needs to know who (if anyone) is calling. `SessionProvider` is that seam.

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Owning user id
    pub user_id: String,
}

impl Session {
    /// Create a session for a user
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Supplies the current session, if any
pub trait SessionProvider: Send + Sync {
    /// The caller's session, or `None` when unauthenticated
    fn current_session(&self) -> Option<Session>;
}

/// Fixed single-user session for local CLI use
#[derive(Debug, Clone)]
pub struct LocalSession {
    user_id: String,
}

impl LocalSession {
    /// Create a provider that always reports the given user
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

impl SessionProvider for LocalSession {
    fn current_session(&self) -> Option<Session> {
        Some(Session::new(self.user_id.clone()))
    }
}

/// Always-unauthenticated provider (for tests and logged-out flows)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSession;

impl SessionProvider for NoSession {
    fn current_session(&self) -> Option<Session> {
        None
    }
}
