//! Game session fact rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, PlayerId, SessionId, TenantId};

/// One completed game for one player. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    /// Unique identifier (derived from the other fields)
    pub id: SessionId,

    /// Tenant that hosted the game
    pub tenant_id: TenantId,

    /// Product name (e.g. "Trivia")
    pub product: String,

    /// Game type tag (e.g. "quiz")
    pub game_type: String,

    pub player_id: PlayerId,

    /// Points scored in this game
    pub score: u64,

    /// Whether the player won this game
    pub won: bool,

    /// When the game finished
    pub played_at: DateTime<Utc>,
}

impl GameSession {
    /// Create a new GameSession with auto-generated ID, stamped now.
    pub fn new(
        tenant_id: impl Into<TenantId>,
        product: impl Into<String>,
        game_type: impl Into<String>,
        player_id: impl Into<PlayerId>,
        score: u64,
        won: bool,
    ) -> Self {
        Self::at(tenant_id, product, game_type, player_id, score, won, Utc::now())
    }

    /// Create a GameSession with an explicit timestamp.
    pub fn at(
        tenant_id: impl Into<TenantId>,
        product: impl Into<String>,
        game_type: impl Into<String>,
        player_id: impl Into<PlayerId>,
        score: u64,
        won: bool,
        played_at: DateTime<Utc>,
    ) -> Self {
        let tenant_id = tenant_id.into();
        let product = product.into();
        let game_type = game_type.into();
        let player_id = player_id.into();
        let id = Self::derive_id(&tenant_id, &product, &game_type, &player_id, score, won, played_at);

        Self {
            id,
            tenant_id,
            product,
            game_type,
            player_id,
            score,
            won,
            played_at,
        }
    }

    fn derive_id(
        tenant_id: &TenantId,
        product: &str,
        game_type: &str,
        player_id: &PlayerId,
        score: u64,
        won: bool,
        played_at: DateTime<Utc>,
    ) -> SessionId {
        EntityId::generate(&[
            tenant_id.as_str(),
            product,
            game_type,
            player_id.as_str(),
            &score.to_string(),
            if won { "1" } else { "0" },
            &played_at.to_rfc3339(),
        ])
    }

    /// Recompute the id from the row contents.
    pub fn with_derived_id(mut self) -> Self {
        self.id = Self::derive_id(
            &self.tenant_id,
            &self.product,
            &self.game_type,
            &self.player_id,
            self.score,
            self.won,
            self.played_at,
        );
        self
    }
}

/// Incoming session record without an id, as produced by gameplay exports.
#[derive(Debug, Clone, Deserialize)]
pub struct NewGameSession {
    pub tenant_id: TenantId,
    pub product: String,
    pub game_type: String,
    pub player_id: PlayerId,
    pub score: u64,
    pub won: bool,
    pub played_at: DateTime<Utc>,
}

impl From<NewGameSession> for GameSession {
    fn from(s: NewGameSession) -> Self {
        GameSession::at(
            s.tenant_id,
            s.product,
            s.game_type,
            s.player_id,
            s.score,
            s.won,
            s.played_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_id_is_deterministic_for_same_row() {
        let a = GameSession::at("acme", "Trivia", "quiz", "p1", 10, true, ts());
        let b = GameSession::at("acme", "Trivia", "quiz", "p1", 10, true, ts());
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_id_changes_with_outcome() {
        let a = GameSession::at("acme", "Trivia", "quiz", "p1", 10, true, ts());
        let b = GameSession::at("acme", "Trivia", "quiz", "p1", 10, false, ts());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_new_session_conversion_assigns_id() {
        let raw = r#"{"tenant_id":"acme","product":"Trivia","game_type":"quiz",
            "player_id":"p1","score":10,"won":true,"played_at":"2026-03-01T12:00:00Z"}"#;
        let incoming: NewGameSession = serde_json::from_str(raw).unwrap();
        let session: GameSession = incoming.into();
        let expected = GameSession::at("acme", "Trivia", "quiz", "p1", 10, true, ts());
        assert_eq!(session, expected);
    }

    #[test]
    fn test_with_derived_id_repairs_tampered_id() {
        let mut s = GameSession::at("acme", "Trivia", "quiz", "p1", 10, true, ts());
        let original = s.id.clone();
        s.id = EntityId::from("bogus");
        assert_eq!(s.with_derived_id().id, original);
    }
}
