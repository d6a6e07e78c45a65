use gridgate_core::{AppResult, NonEmptyString, UserId};
use serde::{Deserialize, Serialize};

/// Application user referenced by permission grants and audit events.
///
/// Credential material is owned by the external authentication collaborator
/// and is referenced by [`UserId`] only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: NonEmptyString,
    is_admin: bool,
    is_active: bool,
}

impl User {
    /// Creates a validated user projection.
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        is_admin: bool,
        is_active: bool,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            username: NonEmptyString::new(username)?,
            is_admin,
            is_active,
        })
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the login name.
    #[must_use]
    pub fn username(&self) -> &NonEmptyString {
        &self.username
    }

    /// Returns whether the user bypasses grant rows.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Returns whether the user may act at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }
}
