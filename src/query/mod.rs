//! Read-only analytics over the stored battles and players.
//!
//! Each analytic is a pure function over a snapshot (see [`cards`] and
//! [`decks`]); [`QueryEngine`] takes the snapshot from the store and hands it
//! over. Queries issued while an ingestion is running see whatever has been
//! written so far.

pub mod cards;
pub mod decks;
pub mod pipeline;

pub use cards::{CardUsageRow, CardVictoryRow, SpecificVictoriesRow, WinRateShiftRow};
pub use decks::{ComboDefeatsRow, ComboWinRow, DeckWinRow};
pub use pipeline::{Pipeline, Stage};

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::TimeRange;
use crate::storage::DocumentStore;

/// Entry points for the seven analytics and the catalogs.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<DocumentStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn victory_percentage(&self, card: &str, range: &TimeRange) -> CardVictoryRow {
        let battles = self.store.battles().await;
        debug!("victory_percentage over {} battles", battles.len());
        cards::victory_percentage(&battles, card, range)
    }

    pub async fn high_win_decks(&self, min_win_percentage: f64, range: &TimeRange) -> Vec<DeckWinRow> {
        let battles = self.store.battles().await;
        decks::high_win_decks(&battles, min_win_percentage, range)
    }

    pub async fn defeats_with_combo(&self, combo: &[String], range: &TimeRange) -> ComboDefeatsRow {
        let battles = self.store.battles().await;
        decks::defeats_with_combo(&battles, combo, range)
    }

    pub async fn specific_victories(
        &self,
        card: &str,
        trophy_difference_percentage: f64,
        range: Option<&TimeRange>,
    ) -> SpecificVictoriesRow {
        let battles = self.store.battles().await;
        let players = self.store.players().await;
        cards::specific_victories(&battles, &players, card, trophy_difference_percentage, range)
    }

    pub async fn high_win_combos(
        &self,
        combo_size: usize,
        min_win_rate: f64,
        range: &TimeRange,
    ) -> Vec<ComboWinRow> {
        let battles = self.store.battles().await;
        decks::high_win_combos(&battles, combo_size, min_win_rate, range)
    }

    pub async fn win_rate_shift(&self, card: &str, update_date: NaiveDate) -> WinRateShiftRow {
        let battles = self.store.battles().await;
        cards::win_rate_shift(&battles, card, update_date)
    }

    pub async fn win_usage_scatter(
        &self,
        min_win_rate: f64,
        max_usage_rate: f64,
        range: &TimeRange,
    ) -> Vec<CardUsageRow> {
        let battles = self.store.battles().await;
        cards::win_usage_scatter(&battles, min_win_rate, max_usage_rate, range)
    }

    pub async fn card_names(&self) -> Vec<String> {
        cards::card_names(&self.store.players().await)
    }

    pub async fn battle_dates(&self) -> Vec<NaiveDate> {
        cards::battle_dates(&self.store.battles().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Battle, BattleSide, BattleTime, Card, Player};

    fn side(tag: &str, deck: &[&str], crowns: u8) -> BattleSide {
        BattleSide {
            player_id: None,
            tag: tag.to_string(),
            name: tag.to_string(),
            deck: deck.iter().map(|c| c.to_string()).collect(),
            crowns,
        }
    }

    async fn engine() -> QueryEngine {
        let store = Arc::new(DocumentStore::in_memory());
        store
            .upsert_player(
                Player::new("#2PP".to_string(), "Alice".to_string())
                    .with_deck(vec![Card::named("Knight")]),
            )
            .await
            .unwrap();
        store
            .upsert_battle(Battle {
                battle_time: BattleTime::parse("20240601T100000.000Z").unwrap(),
                winner: side("#2PP", &["Knight", "Archers"], 3),
                loser: side("#8QQ", &["Golem"], 2),
                main_player_tag: "#2PP".to_string(),
            })
            .await
            .unwrap();
        QueryEngine::new(store)
    }

    fn june(from: u32, to: u32) -> TimeRange {
        TimeRange::from_dates(
            NaiveDate::from_ymd_opt(2024, 6, from).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, to).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_engine_reads_store_snapshot() {
        let engine = engine().await;

        let row = engine.victory_percentage("Knight", &june(1, 2)).await;
        assert_eq!(row.win_percentage, 100.0);

        let combos = engine.high_win_combos(1, 0.0, &june(1, 2)).await;
        assert_eq!(combos[0].combo, vec!["Knight".to_string()]);

        assert_eq!(engine.card_names().await, vec!["Knight".to_string()]);
        assert_eq!(
            engine.battle_dates().await,
            vec![NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()]
        );
    }

    #[tokio::test]
    async fn test_engine_empty_range_everywhere() {
        let engine = engine().await;
        let empty = june(1, 1);

        assert_eq!(engine.victory_percentage("Knight", &empty).await.total_wins, 0);
        assert!(engine.high_win_decks(0.0, &empty).await.is_empty());
        assert_eq!(
            engine
                .defeats_with_combo(&["Golem".to_string()], &empty)
                .await
                .total_losses,
            0
        );
        assert_eq!(
            engine
                .specific_victories("Knight", 0.0, Some(&empty))
                .await
                .victories_with_card,
            0
        );
        assert!(engine.high_win_combos(2, 0.0, &empty).await.is_empty());
        assert!(engine.win_usage_scatter(0.0, 100.0, &empty).await.is_empty());
    }
}
