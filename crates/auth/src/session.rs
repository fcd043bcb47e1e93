use chrono::{DateTime, Utc};
use serde::Serialize;

use stockdash_core::{DomainError, DomainResult, UserId};

/// Login form input.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: UserId,
    /// Shown in the dashboard header; the email as entered, trimmed.
    pub display_name: String,
    pub logged_in_at: DateTime<Utc>,
}

/// Holds at most one session.
///
/// There is no credential check beyond presence: any non-empty email and
/// password pair is accepted.
#[derive(Debug, Default)]
pub struct SessionManager {
    current: Option<Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session, replacing any existing one.
    pub fn login(&mut self, credentials: &Credentials) -> DomainResult<Session> {
        let email = credentials.email.trim();
        if email.is_empty() || credentials.password.trim().is_empty() {
            tracing::info!("login rejected: missing credentials");
            return Err(DomainError::validation("email and password are required"));
        }

        let session = Session {
            user_id: UserId::new(),
            display_name: email.to_string(),
            logged_in_at: Utc::now(),
        };
        tracing::info!(user_id = %session.user_id, "user logged in");
        self.current = Some(session.clone());
        Ok(session)
    }

    /// End the current session, if any.
    pub fn logout(&mut self) {
        if let Some(session) = self.current.take() {
            tracing::info!(user_id = %session.user_id, "user logged out");
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// The current session, or `Unauthorized`.
    pub fn require(&self) -> DomainResult<&Session> {
        self.current.as_ref().ok_or(DomainError::Unauthorized)
    }
}
