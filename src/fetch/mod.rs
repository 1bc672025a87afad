//! External match API access.
//!
//! [`MatchSource`] is the seam the ingestion engine pulls through; the
//! production implementation is [`RoyaleClient`], an authenticated client for
//! the official game API.

mod royale;
#[cfg(test)]
pub(crate) mod scripted;

pub use royale::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid API token: {0}")]
    InvalidToken(String),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source of clans, members, player profiles and battle logs.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Identifier for logging.
    fn name(&self) -> &'static str;

    /// Clans whose name matches `name`.
    async fn fetch_clans(&self, name: &str) -> Result<Vec<ClanSummary>, FetchError>;

    /// Current members of one clan.
    async fn fetch_clan_members(&self, clan_tag: &str) -> Result<Vec<MemberSummary>, FetchError>;

    /// Full profile of one player.
    async fn fetch_player(&self, player_tag: &str) -> Result<PlayerProfile, FetchError>;

    /// The player's recent battles, newest first.
    async fn fetch_battle_log(&self, player_tag: &str) -> Result<Vec<RawBattle>, FetchError>;
}
