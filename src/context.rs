//! Session context: who the user is and what they asked.
//!
//! A [`UserContext`] is created once at session bootstrap and is read-only for
//! the rest of the session. Tool activation predicates are evaluated against
//! it on every call, so entitlement checks (premium status and the like) are
//! never cached or bypassed.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Facts about the user that gate what the desk may do on their behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    /// Display name, read at session bootstrap.
    pub name: String,
    /// Whether the user is on a premium plan. Gates entitled-only tools.
    pub premium: bool,
}

impl UserContext {
    pub fn new(name: impl Into<String>, premium: bool) -> Self {
        Self {
            name: name.into(),
            premium,
        }
    }
}

/// A single user utterance together with the session context it belongs to.
///
/// Created per turn and discarded once the turn completes.
#[derive(Debug, Clone)]
pub struct Query {
    text: String,
    user: Arc<UserContext>,
}

impl Query {
    pub fn new(text: impl Into<String>, user: Arc<UserContext>) -> Self {
        Self {
            text: text.into(),
            user,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn user(&self) -> &UserContext {
        &self.user
    }
}
