//! Per-card analytics and the card/date catalogs.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use super::pipeline::{Pipeline, Stage};
use crate::calculate::{percentage, win_loss_split};
use crate::models::{Battle, BattleTime, Player, TimeRange};

/// How often a card won versus lost.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardVictoryRow {
    pub card: String,
    pub total_wins: usize,
    pub total_losses: usize,
    pub win_percentage: f64,
    pub loss_percentage: f64,
}

/// Close victories won by a lower-rated player using the card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificVictoriesRow {
    pub card: String,
    pub trophy_difference_percentage: f64,
    pub victories_with_card: usize,
}

/// A card's win rate before and after a balance update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinRateShiftRow {
    pub card: String,
    pub update_date: NaiveDate,
    pub before_battles: usize,
    pub before_win_rate: f64,
    pub after_battles: usize,
    pub after_win_rate: f64,
}

/// One point of the win-rate versus usage-rate scatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardUsageRow {
    pub card: String,
    pub battles: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub usage_rate: f64,
}

/// Share of in-range battles with `card` in the winning deck versus the
/// losing deck. Battles where the card is in neither deck are ignored; with
/// no battle involving the card both percentages are zero.
pub fn victory_percentage(battles: &[Battle], card: &str, range: &TimeRange) -> CardVictoryRow {
    let in_range = Pipeline::new(battles).within(Some(range));
    let wins = in_range.count_where(&Stage::WinnerHas(card.to_string()));
    let losses = in_range.count_where(&Stage::LoserHas(card.to_string()));
    let (win_percentage, loss_percentage) = win_loss_split(wins, losses);

    debug!(
        "{}: {} wins, {} losses in {} battles",
        card,
        wins,
        losses,
        in_range.count()
    );

    CardVictoryRow {
        card: card.to_string(),
        total_wins: wins,
        total_losses: losses,
        win_percentage,
        loss_percentage,
    }
}

/// Victories where the loser still took at least two crowns, the winner held
/// more than `trophy_difference_percentage` percent fewer trophies than the
/// loser, and the winning deck contained `card`.
///
/// Trophies come from the players' current records, not from the time of
/// the battle. A battle with either side missing from `players`, or whose
/// loser has no trophies, does not count; the trophy ratio is undefined for
/// it, so it is excluded rather than treated as a qualifying gap.
pub fn specific_victories(
    battles: &[Battle],
    players: &[Player],
    card: &str,
    trophy_difference_percentage: f64,
    range: Option<&TimeRange>,
) -> SpecificVictoriesRow {
    let trophies: HashMap<&str, u32> = players
        .iter()
        .map(|p| (p.tag.as_str(), p.trophies))
        .collect();
    let ratio_limit = 1.0 - trophy_difference_percentage / 100.0;

    let victories = Pipeline::new(battles)
        .within(range)
        .matching(Stage::LoserCrownsAtLeast(2))
        .matching(Stage::WinnerHas(card.to_string()))
        .iter()
        .filter(|b| {
            let winner = trophies.get(b.winner.tag.as_str());
            let loser = trophies.get(b.loser.tag.as_str());
            match (winner, loser) {
                (Some(&w), Some(&l)) if l > 0 => (w as f64 / l as f64) < ratio_limit,
                _ => false,
            }
        })
        .count();

    SpecificVictoriesRow {
        card: card.to_string(),
        trophy_difference_percentage,
        victories_with_card: victories,
    }
}

/// Win rate of `card` in all battles featuring it, split at midnight UTC of
/// `update_date`. An empty side reports a zero rate.
pub fn win_rate_shift(battles: &[Battle], card: &str, update_date: NaiveDate) -> WinRateShiftRow {
    let boundary = BattleTime::at_midnight(update_date);
    let featuring = Pipeline::new(battles).matching(Stage::Features(card.to_string()));

    let before = featuring.clone().matching(Stage::Before(boundary.clone()));
    let after = featuring.matching(Stage::NotBefore(boundary));

    let winner_has = Stage::WinnerHas(card.to_string());
    let before_wins = before.count_where(&winner_has);
    let after_wins = after.count_where(&winner_has);

    WinRateShiftRow {
        card: card.to_string(),
        update_date,
        before_battles: before.count(),
        before_win_rate: percentage(before_wins, before.count()),
        after_battles: after.count(),
        after_win_rate: percentage(after_wins, after.count()),
    }
}

/// Cards that win often but are rarely played.
///
/// For every card in any in-range deck: win rate is the share of its
/// in-range battles it won, usage rate the share of all stored battles
/// featuring it, whatever their date. Keeps cards with
/// `win_rate > min_win_rate` and `usage_rate < max_usage_rate`, highest win
/// rate first.
pub fn win_usage_scatter(
    battles: &[Battle],
    min_win_rate: f64,
    max_usage_rate: f64,
    range: &TimeRange,
) -> Vec<CardUsageRow> {
    let everything = Pipeline::new(battles);
    let in_range = everything.clone().within(Some(range));
    let total = everything.count();

    let cards: BTreeSet<&str> = in_range
        .iter()
        .flat_map(|b| b.winner.deck.iter().chain(b.loser.deck.iter()))
        .map(String::as_str)
        .collect();

    let mut rows: Vec<CardUsageRow> = cards
        .into_iter()
        .map(|card| {
            let featuring = Stage::Features(card.to_string());
            let battles = in_range.count_where(&featuring);
            let wins = in_range.count_where(&Stage::WinnerHas(card.to_string()));
            CardUsageRow {
                card: card.to_string(),
                battles,
                wins,
                win_rate: percentage(wins, battles),
                usage_rate: percentage(everything.count_where(&featuring), total),
            }
        })
        .filter(|row| row.win_rate > min_win_rate && row.usage_rate < max_usage_rate)
        .collect();

    rows.sort_by(|a, b| {
        b.win_rate
            .total_cmp(&a.win_rate)
            .then_with(|| a.card.cmp(&b.card))
    });
    rows
}

/// Distinct card names across every stored player's deck, sorted.
pub fn card_names(players: &[Player]) -> Vec<String> {
    players
        .iter()
        .flat_map(|p| p.deck.iter().map(|c| c.name.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct battle dates (`YYYY-MM-DD`), oldest first.
pub fn battle_dates(battles: &[Battle]) -> Vec<NaiveDate> {
    battles
        .iter()
        .filter_map(|b| {
            let date = b.battle_time.date();
            if date.is_none() {
                warn!("Skipping unparseable battle time {}", b.battle_time);
            }
            date
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
