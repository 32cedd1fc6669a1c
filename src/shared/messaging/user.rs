//! User Profile Data Structure
//!
//! The public slice of a user record that the chat subsystem reads. Secret
//! fields never leave the user store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public profile of a user, attached to a connection once it authenticates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Unique user ID
    pub id: Uuid,
    /// User email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar URL, if the user has one
    pub profile_picture: Option<String>,
}

impl UserProfile {
    pub fn new(id: Uuid, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: name.into(),
            profile_picture: None,
        }
    }

    /// Stand-in for a user whose record no longer exists
    pub fn unknown(id: Uuid) -> Self {
        Self::new(id, "", "Unknown user")
    }

    pub fn with_picture(mut self, url: impl Into<String>) -> Self {
        self.profile_picture = Some(url.into());
        self
    }
}
