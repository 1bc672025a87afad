//! Client for the official Clash Royale API.
//!
//! Endpoints used:
//! - `GET /clans?name=&minMembers=&limit=`
//! - `GET /clans/{tag}/members`
//! - `GET /players/{tag}`
//! - `GET /players/{tag}/battlelog`
//!
//! Every request carries the bearer token. Tags start with `#`, so they are
//! always pushed as percent-encoded path segments, never formatted into the
//! URL string.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::{FetchError, MatchSource};
use crate::models::Card;

// ── API response types ──────────────────────────────────────────────────────

/// Wrapper the API puts around list responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// A clan from the clan search endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanSummary {
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub members: u32,
}

/// A member from the clan members endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub tag: String,
    pub name: String,
    pub role: Option<String>,
    pub trophies: Option<u32>,
}

/// A player profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub exp_level: u32,
    #[serde(default)]
    pub trophies: u32,
    #[serde(default)]
    pub best_trophies: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub battle_count: u32,
    #[serde(default)]
    pub three_crown_wins: u32,
    #[serde(default)]
    pub current_deck: Vec<Card>,
}

/// One participant of a battle-log entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParticipant {
    pub tag: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub crowns: u8,
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// One entry of a player's battle log, from that player's perspective.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBattle {
    pub battle_time: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub team: Vec<RawParticipant>,
    #[serde(default)]
    pub opponent: Vec<RawParticipant>,
}

// ── Client ──────────────────────────────────────────────────────────────────

/// Configuration for [`RoyaleClient`].
#[derive(Debug, Clone)]
pub struct RoyaleClientConfig {
    /// API root, e.g. `https://api.clashroyale.com/v1`
    pub base_url: String,

    /// Bearer token
    pub token: String,

    /// Request timeout
    pub timeout: Duration,

    /// `minMembers` filter for clan search
    pub clan_min_members: u32,

    /// `limit` for clan search
    pub clan_limit: u32,
}

impl Default for RoyaleClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.clashroyale.com/v1".to_string(),
            token: String::new(),
            timeout: Duration::from_secs(30),
            clan_min_members: 10,
            clan_limit: 10,
        }
    }
}

/// Authenticated client for the game API.
pub struct RoyaleClient {
    client: Client,
    base_url: Url,
    config: RoyaleClientConfig,
}

impl RoyaleClient {
    pub fn new(config: RoyaleClientConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(config.base_url.clone()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|e| FetchError::InvalidToken(e.to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("royale-meta/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Build an endpoint URL from path segments. Each segment is
    /// percent-encoded, so `#2PP` becomes `%232PP`.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn clan_search_url(&self, name: &str) -> Url {
        let mut url = self.endpoint(&["clans"]);
        url.query_pairs_mut()
            .append_pair("name", name)
            .append_pair("minMembers", &self.config.clan_min_members.to_string())
            .append_pair("limit", &self.config.clan_limit.to_string());
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status == StatusCode::OK {
            let body = response.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, url.host_str(), retry_after.as_deref(), body))
    }
}

/// Error for a response that was not `200 OK`. A 429 is rate limiting; its
/// `Retry-After` falls back to 60 seconds.
fn status_error(
    status: StatusCode,
    host: Option<&str>,
    retry_after: Option<&str>,
    body: String,
) -> FetchError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return FetchError::RateLimited {
            host: host.unwrap_or("unknown").to_string(),
            retry_after_secs: retry_after.and_then(|s| s.trim().parse().ok()).unwrap_or(60),
        };
    }

    FetchError::HttpStatus {
        status: status.as_u16(),
        message: if body.is_empty() {
            status.canonical_reason().unwrap_or("Unknown").to_string()
        } else {
            body
        },
    }
}

#[async_trait]
impl MatchSource for RoyaleClient {
    fn name(&self) -> &'static str {
        "clash-royale-api"
    }

    async fn fetch_clans(&self, name: &str) -> Result<Vec<ClanSummary>, FetchError> {
        info!("Fetching clans named {:?}", name);
        let response: ItemsResponse<ClanSummary> =
            self.get_json(self.clan_search_url(name)).await?;
        info!("Fetched {} clans", response.items.len());
        Ok(response.items)
    }

    async fn fetch_clan_members(&self, clan_tag: &str) -> Result<Vec<MemberSummary>, FetchError> {
        let url = self.endpoint(&["clans", clan_tag, "members"]);
        let response: ItemsResponse<MemberSummary> = self.get_json(url).await?;
        info!("Fetched {} members for clan {}", response.items.len(), clan_tag);
        Ok(response.items)
    }

    async fn fetch_player(&self, player_tag: &str) -> Result<PlayerProfile, FetchError> {
        let profile: PlayerProfile = self.get_json(self.endpoint(&["players", player_tag])).await?;
        debug!("Fetched profile for {}", player_tag);
        Ok(profile)
    }

    async fn fetch_battle_log(&self, player_tag: &str) -> Result<Vec<RawBattle>, FetchError> {
        let url = self.endpoint(&["players", player_tag, "battlelog"]);
        let battles: Vec<RawBattle> = self.get_json(url).await?;
        debug!("Fetched {} battles for {}", battles.len(), player_tag);
        Ok(battles)
    }
}
