//! In-process [`MatchSource`] with canned responses, for ingestion tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ClanSummary, FetchError, MatchSource, MemberSummary, PlayerProfile, RawBattle};

/// Serves whatever was scripted; anything not scripted is a 404.
#[derive(Default)]
pub struct ScriptedSource {
    clans: HashMap<String, Vec<ClanSummary>>,
    members: HashMap<String, Vec<MemberSummary>>,
    players: HashMap<String, PlayerProfile>,
    battle_logs: HashMap<String, Vec<RawBattle>>,
    failing: Vec<String>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clans(mut self, name: &str, clans: Vec<ClanSummary>) -> Self {
        self.clans.insert(name.to_string(), clans);
        self
    }

    pub fn with_members(mut self, clan_tag: &str, members: Vec<MemberSummary>) -> Self {
        self.members.insert(clan_tag.to_string(), members);
        self
    }

    pub fn with_player(mut self, profile: PlayerProfile) -> Self {
        self.players.insert(profile.tag.clone(), profile);
        self
    }

    pub fn with_battle_log(mut self, player_tag: &str, battles: Vec<RawBattle>) -> Self {
        self.battle_logs.insert(player_tag.to_string(), battles);
        self
    }

    /// Every request that mentions `key` fails with HTTP 503.
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.push(key.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, key: &str) -> Result<(), FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.iter().any(|k| k == key) {
            return Err(FetchError::HttpStatus {
                status: 503,
                message: format!("scripted failure for {}", key),
            });
        }
        Ok(())
    }

    fn not_found(key: &str) -> FetchError {
        FetchError::HttpStatus {
            status: 404,
            message: format!("{} not scripted", key),
        }
    }
}

#[async_trait]
impl MatchSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_clans(&self, name: &str) -> Result<Vec<ClanSummary>, FetchError> {
        self.check(name)?;
        self.clans.get(name).cloned().ok_or_else(|| Self::not_found(name))
    }

    async fn fetch_clan_members(&self, clan_tag: &str) -> Result<Vec<MemberSummary>, FetchError> {
        self.check(clan_tag)?;
        self.members
            .get(clan_tag)
            .cloned()
            .ok_or_else(|| Self::not_found(clan_tag))
    }

    async fn fetch_player(&self, player_tag: &str) -> Result<PlayerProfile, FetchError> {
        self.check(player_tag)?;
        self.players
            .get(player_tag)
            .cloned()
            .ok_or_else(|| Self::not_found(player_tag))
    }

    async fn fetch_battle_log(&self, player_tag: &str) -> Result<Vec<RawBattle>, FetchError> {
        self.check(player_tag)?;
        Ok(self.battle_logs.get(player_tag).cloned().unwrap_or_default())
    }
}
