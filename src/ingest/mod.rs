//! Ingestion engine.
//!
//! Populates the store from a [`MatchSource`]:
//! 1. Search clans by name
//! 2. List each clan's members
//! 3. Per member: fetch and upsert the profile, fetch the battle log,
//!    resolve each opponent, upsert each battle
//!
//! A failed fetch is logged and treated as "no data" for that step; the run
//! continues with the next item. A failed store write aborts the run.
//! Re-running over the same clans converges on the same documents.

mod normalize;

pub use normalize::*;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::fetch::{ClanSummary, FetchError, MatchSource, PlayerProfile, RawBattle};
use crate::models::{normalize_tag, Battle, PlayerId};
use crate::storage::{DocumentStore, StorageError, UpsertOutcome};

/// Errors that abort an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No clans configured")]
    NoClans,
}

/// Configuration for an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Clan names to search for
    pub clans: Vec<String>,

    /// Players ingested at the same time
    pub player_concurrency: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            clans: Vec::new(),
            player_concurrency: 4,
        }
    }
}

/// Counters for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub clans_seen: usize,
    pub members_seen: usize,
    pub players_inserted: usize,
    pub players_updated: usize,
    pub battles_inserted: usize,
    pub battles_updated: usize,
    pub battles_rejected: usize,
    pub failed_fetches: usize,

    #[serde(skip)]
    pub duration: Duration,
}

impl IngestReport {
    fn merge(&mut self, other: IngestReport) {
        self.clans_seen += other.clans_seen;
        self.members_seen += other.members_seen;
        self.players_inserted += other.players_inserted;
        self.players_updated += other.players_updated;
        self.battles_inserted += other.battles_inserted;
        self.battles_updated += other.battles_updated;
        self.battles_rejected += other.battles_rejected;
        self.failed_fetches += other.failed_fetches;
    }

    fn record_player(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.players_inserted += 1,
            UpsertOutcome::Updated => self.players_updated += 1,
        }
    }

    fn record_battle(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.battles_inserted += 1,
            UpsertOutcome::Updated => self.battles_updated += 1,
        }
    }
}

/// Drives a [`MatchSource`] into a [`DocumentStore`].
pub struct Ingestor {
    source: Arc<dyn MatchSource>,
    store: Arc<DocumentStore>,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(source: Arc<dyn MatchSource>, store: Arc<DocumentStore>, config: IngestConfig) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    // ── Fetch steps (failures become empty results) ─────────────────────────

    fn fetch_failed(&self, what: &str, err: &FetchError, report: &mut IngestReport) {
        error!("{}: failed to fetch {}: {}", self.source.name(), what, err);
        report.failed_fetches += 1;
    }

    async fn fetch_clans(&self, name: &str, report: &mut IngestReport) -> Vec<ClanSummary> {
        match self.source.fetch_clans(name).await {
            Ok(clans) => clans,
            Err(e) => {
                self.fetch_failed(&format!("clans named {:?}", name), &e, report);
                Vec::new()
            }
        }
    }

    async fn fetch_member_tags(&self, clan: &ClanSummary, report: &mut IngestReport) -> Vec<String> {
        let members = match self.source.fetch_clan_members(&clan.tag).await {
            Ok(members) => members,
            Err(e) => {
                self.fetch_failed(&format!("members of clan {}", clan.tag), &e, report);
                return Vec::new();
            }
        };

        members
            .into_iter()
            .filter_map(|m| {
                let tag = normalize_tag(&m.tag);
                if tag.is_none() {
                    warn!("Skipping member {:?} of clan {}: invalid tag", m.tag, clan.tag);
                }
                tag
            })
            .collect()
    }

    async fn fetch_player(&self, tag: &str, report: &mut IngestReport) -> Option<PlayerProfile> {
        match self.source.fetch_player(tag).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                self.fetch_failed(&format!("player {}", tag), &e, report);
                None
            }
        }
    }

    async fn fetch_battle_log(&self, tag: &str, report: &mut IngestReport) -> Vec<RawBattle> {
        match self.source.fetch_battle_log(tag).await {
            Ok(battles) => battles,
            Err(e) => {
                self.fetch_failed(&format!("battle log of {}", tag), &e, report);
                Vec::new()
            }
        }
    }

    // ── Operations ──────────────────────────────────────────────────────────

    /// Insert or update the player described by `profile`.
    ///
    /// Known tags are updated in place, so counters always reflect the latest
    /// fetch. Returns `None` (and writes nothing) when the profile has no
    /// usable tag.
    pub async fn upsert_player(
        &self,
        profile: &PlayerProfile,
    ) -> Result<Option<(PlayerId, UpsertOutcome)>, IngestError> {
        let Some(player) = player_from_profile(profile) else {
            warn!("Skipping profile {:?}: invalid tag", profile.tag);
            return Ok(None);
        };

        let id = player.id.clone();
        let outcome = self.store.upsert_player(player).await?;
        debug!("Player {} {:?}", profile.tag, outcome);
        Ok(Some((id, outcome)))
    }

    /// Stored reference for `tag`, fetching and storing the player first when
    /// it is unknown. `None` when the fetch fails.
    async fn resolve_player(
        &self,
        tag: &str,
        report: &mut IngestReport,
    ) -> Result<Option<PlayerId>, IngestError> {
        if let Some(player) = self.store.find_player(tag).await {
            return Ok(Some(player.id));
        }

        let Some(profile) = self.fetch_player(tag, report).await else {
            return Ok(None);
        };
        match self.upsert_player(&profile).await? {
            Some((id, outcome)) => {
                report.record_player(outcome);
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Normalize one battle-log entry of `observer_tag`.
    ///
    /// Returns `None` for entries that cannot be stored (ties, missing or
    /// extra participants, malformed times); each is logged.
    pub async fn normalize_battle(
        &self,
        raw: &RawBattle,
        observer_tag: &str,
        observer_ref: &PlayerId,
        report: &mut IngestReport,
    ) -> Result<Option<Battle>, IngestError> {
        let opponent_ref = match opponent_tag(raw) {
            Ok(tag) => self.resolve_player(&tag, report).await?,
            Err(_) => None,
        };

        match build_battle(raw, observer_tag, observer_ref, opponent_ref) {
            Ok(battle) => Ok(Some(battle)),
            Err(reason) => {
                warn!(
                    "Rejected battle {} from log of {}: {}",
                    raw.battle_time, observer_tag, reason
                );
                report.battles_rejected += 1;
                Ok(None)
            }
        }
    }

    /// Insert the battle, or overwrite the stored copy of the same match.
    pub async fn upsert_battle(&self, battle: Battle) -> Result<UpsertOutcome, IngestError> {
        Ok(self.store.upsert_battle(battle).await?)
    }

    /// Delete every player and battle.
    pub async fn reset_all(&self) -> Result<(), IngestError> {
        warn!("Resetting all collected data");
        Ok(self.store.reset().await?)
    }

    /// Ingest one player: profile, then every battle in the log.
    pub async fn ingest_player(&self, tag: &str) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport::default();

        let Some(profile) = self.fetch_player(tag, &mut report).await else {
            return Ok(report);
        };
        let Some((player_ref, outcome)) = self.upsert_player(&profile).await? else {
            return Ok(report);
        };
        report.record_player(outcome);

        let log = self.fetch_battle_log(tag, &mut report).await;
        debug!("{} battles in log of {}", log.len(), tag);

        for raw in &log {
            if let Some(battle) = self.normalize_battle(raw, tag, &player_ref, &mut report).await? {
                let outcome = self.upsert_battle(battle).await?;
                report.record_battle(outcome);
            }
        }

        Ok(report)
    }

    /// Run a full ingestion over the configured clans.
    pub async fn run(&self) -> Result<IngestReport, IngestError> {
        if self.config.clans.is_empty() {
            return Err(IngestError::NoClans);
        }

        let start = Instant::now();
        let mut report = IngestReport::default();
        info!("Starting ingestion from {}", self.source.name());

        let mut seen = HashSet::new();
        let mut tags = Vec::new();
        for name in &self.config.clans {
            info!("Clan search: {}", name);
            for clan in self.fetch_clans(name, &mut report).await {
                report.clans_seen += 1;
                let members = self.fetch_member_tags(&clan, &mut report).await;
                info!("Clan {} ({}): {} members", clan.name, clan.tag, members.len());
                report.members_seen += members.len();
                tags.extend(members.into_iter().filter(|tag| seen.insert(tag.clone())));
            }
        }

        info!("Collected {} player tags", tags.len());

        let players = stream::iter(tags.iter())
            .map(|tag| self.ingest_player(tag))
            .buffer_unordered(self.config.player_concurrency.max(1))
            .try_fold(IngestReport::default(), |mut acc, player_report| async move {
                acc.merge(player_report);
                Ok::<_, IngestError>(acc)
            })
            .await?;
        report.merge(players);
        report.duration = start.elapsed();

        info!(
            "Ingestion completed: {} players (+{} new), {} battles (+{} new), {} rejected, {} failed fetches in {:?}",
            report.players_inserted + report.players_updated,
            report.players_inserted,
            report.battles_inserted + report.battles_updated,
            report.battles_inserted,
            report.battles_rejected,
            report.failed_fetches,
            report.duration
        );

        Ok(report)
    }
}
