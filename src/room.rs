//! Room resolution boundary.
//!
//! Joining a live room is handled by an external service. This module only
//! validates codes, decodes the service's answer and turns a successful
//! answer into the route the caller should redirect to.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("invalid room code '{0}'")]
    InvalidCode(String),

    #[error("room lookup failed: {0}")]
    Rejected(String),

    #[error("malformed room response: {0}")]
    Malformed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Z0-9]{4,8}$").expect("room code pattern is valid")
    })
}

/// Trim and upper-case a room code, rejecting anything that is not 4-8
/// alphanumerics.
pub fn normalize_room_code(code: &str) -> Result<String, RoomError> {
    let normalized = code.trim().to_ascii_uppercase();
    if code_pattern().is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(RoomError::InvalidCode(code.to_string()))
    }
}

/// Answer from the room service as it appears on the wire.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoomResponse {
    pub success: bool,
    #[serde(default, rename = "gameType")]
    pub game_type: Option<String>,
    #[serde(default, rename = "tenantSlug")]
    pub tenant_slug: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A room that can be joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomTarget {
    pub game_type: String,
    pub tenant_slug: Option<String>,
}

impl TryFrom<RoomResponse> for RoomTarget {
    type Error = RoomError;

    fn try_from(response: RoomResponse) -> Result<Self, Self::Error> {
        if !response.success {
            return Err(RoomError::Rejected(
                response.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        let game_type = response
            .game_type
            .filter(|g| !g.trim().is_empty())
            .ok_or_else(|| RoomError::Malformed("success without gameType".to_string()))?;
        Ok(Self {
            game_type,
            tenant_slug: response.tenant_slug.filter(|t| !t.trim().is_empty()),
        })
    }
}

impl RoomTarget {
    /// `/{tenant}/play/{gameType}`, or `/play/{gameType}` without a tenant.
    /// Segments are percent-encoded.
    pub fn redirect_path(&self) -> String {
        let mut url = match Url::parse("http://rooms.invalid/") {
            Ok(url) => url,
            Err(_) => return format!("/play/{}", self.game_type),
        };
        if let Ok(mut segments) = url.path_segments_mut() {
            if let Some(tenant) = &self.tenant_slug {
                segments.push(tenant);
            }
            segments.push("play").push(&self.game_type);
        }
        url.path().to_string()
    }
}

#[async_trait]
pub trait RoomResolver: Send + Sync {
    async fn resolve(&self, code: &str) -> Result<RoomTarget, RoomError>;
}

/// Path of the room service's resolve endpoint, relative to its root URL.
pub const ROOM_RESOLVE_PATH: &str = "/api/rooms/resolve";

/// Resolves rooms by POSTing `{"code": ...}` to `{base}/api/rooms/resolve`.
#[derive(Debug, Clone)]
pub struct HttpRoomResolver {
    endpoint: Url,
    http: Client,
}

impl HttpRoomResolver {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RoomError> {
        let endpoint = crate::endpoint_url(base_url, ROOM_RESOLVE_PATH)?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, http })
    }
}

#[async_trait]
impl RoomResolver for HttpRoomResolver {
    async fn resolve(&self, code: &str) -> Result<RoomTarget, RoomError> {
        let code = normalize_room_code(code)?;
        let response: RoomResponse = self
            .http
            .post(self.endpoint.clone())
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await?
            .json()
            .await?;
        RoomTarget::try_from(response)
    }
}
