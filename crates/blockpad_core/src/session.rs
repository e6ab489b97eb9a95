//! Session context for one signed-in user.
//!
//! # Responsibility
//! - Hold the bearer credential attached to persistence calls.
//! - Model the explicit login -> logout lifecycle of an editing session.
//!
//! # Invariants
//! - An ended session never exposes a credential again.
//! - Credentials are never written to logs.

use std::fmt::{Debug, Formatter};

/// Credential and identity of the signed-in user.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user_email: Option<String>,
}

impl Session {
    /// Starts a session from a credential issued by the auth collaborator.
    pub fn new(token: impl Into<String>, user_email: impl Into<String>) -> Self {
        let token = token.into();
        let token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        Self {
            token,
            user_email: Some(user_email.into()),
        }
    }

    /// Session without a credential; requests go out unauthenticated.
    pub fn anonymous() -> Self {
        Self {
            token: None,
            user_email: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.token.is_some()
    }

    pub fn user_email(&self) -> Option<&str> {
        self.user_email.as_deref()
    }

    /// Value for the `Authorization` header, if a credential is held.
    pub fn authorization_header(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {token}"))
    }

    /// Drops the credential and identity.
    pub fn end(&mut self) {
        self.token = None;
        self.user_email = None;
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_email", &self.user_email)
            .finish()
    }
}
