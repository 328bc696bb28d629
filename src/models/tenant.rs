//! Tenant and player profile models.

use serde::{Deserialize, Serialize};

use super::{PlayerId, TenantId};

/// A company hosting games on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant slug, used in query addresses
    pub id: TenantId,

    /// Human readable company name
    pub display_name: String,
}

impl Tenant {
    pub fn new(id: impl Into<TenantId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// A player's profile. Leaderboard figures are never read from here; they are
/// always derived from game sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,

    pub display_name: String,

    /// Avatar reference (URL or asset key)
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar: None,
        }
    }

    /// Builder method to set the avatar.
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}
