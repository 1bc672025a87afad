//! Deck and combo analytics.
//!
//! Decks and combos are compared as ordered card lists: `["A", "B"]` and
//! `["B", "A"]` are different keys. Only the defeat count treats its combo
//! as a set.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use super::pipeline::{Pipeline, Stage};
use crate::calculate::percentage_floored;
use crate::models::{Battle, TimeRange};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckWinRow {
    pub deck: Vec<String>,
    pub total_wins: usize,
    pub total_games: usize,
    pub win_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboDefeatsRow {
    pub combo: Vec<String>,
    pub total_losses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboWinRow {
    pub combo: Vec<String>,
    pub total_wins: usize,
    pub total_games: usize,
    pub win_rate: f64,
}

/// Highest rate first, then most wins, then the card list.
fn rank(rate: (f64, f64), wins: (usize, usize), cards: (&[String], &[String])) -> Ordering {
    rate.1
        .total_cmp(&rate.0)
        .then_with(|| wins.1.cmp(&wins.0))
        .then_with(|| cards.0.cmp(cards.1))
}

/// Winning decks whose win percentage is strictly above `min_win_percentage`.
///
/// Wins are counted per exact winning deck; the denominator is every
/// in-range game where that deck was played by either side.
pub fn high_win_decks(battles: &[Battle], min_win_percentage: f64, range: &TimeRange) -> Vec<DeckWinRow> {
    let in_range = Pipeline::new(battles).within(Some(range));
    let wins_by_deck = in_range.group_by(|b| b.winner.deck.clone());
    debug!("{} distinct winning decks", wins_by_deck.len());

    let mut rows: Vec<DeckWinRow> = wins_by_deck
        .into_iter()
        .map(|(deck, wins)| {
            let games = in_range.count_where(&Stage::PlayedDeck(deck.clone()));
            DeckWinRow {
                win_percentage: percentage_floored(wins, games),
                deck,
                total_wins: wins,
                total_games: games,
            }
        })
        .filter(|row| row.win_percentage > min_win_percentage)
        .collect();

    rows.sort_by(|a, b| {
        rank(
            (a.win_percentage, b.win_percentage),
            (a.total_wins, b.total_wins),
            (&a.deck, &b.deck),
        )
    });
    rows
}

/// In-range battles whose losing deck contains every card of `combo`.
pub fn defeats_with_combo(battles: &[Battle], combo: &[String], range: &TimeRange) -> ComboDefeatsRow {
    let losses = Pipeline::new(battles)
        .within(Some(range))
        .count_where(&Stage::LoserHasAll(combo.to_vec()));

    ComboDefeatsRow {
        combo: combo.to_vec(),
        total_losses: losses,
    }
}

/// Combos of the first `combo_size` winning cards, in stored order, whose
/// win rate is strictly above `min_win_rate`.
///
/// The denominator is the number of battles in range, not the number of
/// battles featuring the combo.
pub fn high_win_combos(
    battles: &[Battle],
    combo_size: usize,
    min_win_rate: f64,
    range: &TimeRange,
) -> Vec<ComboWinRow> {
    let in_range = Pipeline::new(battles).within(Some(range));
    let total = in_range.count();

    let mut rows: Vec<ComboWinRow> = in_range
        .group_by(|b| b.winner.combo(combo_size).to_vec())
        .into_iter()
        .map(|(combo, wins)| ComboWinRow {
            combo,
            total_wins: wins,
            total_games: total,
            win_rate: percentage_floored(wins, total),
        })
        .filter(|row| row.win_rate > min_win_rate)
        .collect();

    rows.sort_by(|a, b| {
        rank(
            (a.win_rate, b.win_rate),
            (a.total_wins, b.total_wins),
            (&a.combo, &b.combo),
        )
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BattleSide, BattleTime};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn june(from: u32, to: u32) -> TimeRange {
        TimeRange::from_dates(
            NaiveDate::from_ymd_opt(2024, 6, from).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, to).unwrap(),
        )
    }

    fn cards(names: &[&str]) -> Vec<String> {
        names.iter().map(|c| c.to_string()).collect()
    }

    fn side(tag: &str, deck: &[&str], crowns: u8) -> BattleSide {
        BattleSide {
            player_id: None,
            tag: tag.to_string(),
            name: tag.to_string(),
            deck: cards(deck),
            crowns,
        }
    }

    /// Battle `n` on June 1st; `n` keeps the timestamps distinct.
    fn battle(n: u32, winner: &[&str], loser: &[&str]) -> Battle {
        Battle {
            battle_time: BattleTime::parse(&format!("20240601T10{:02}00.000Z", n)).unwrap(),
            winner: side("#AAA", winner, 3),
            loser: side("#BBB", loser, 1),
            main_player_tag: "#AAA".to_string(),
        }
    }

    #[test]
    fn test_high_win_decks_scenario() {
        let xy = &["X", "Y"];
        let battles = vec![
            battle(0, xy, &["Z"]),
            battle(1, xy, &["Z"]),
            battle(2, xy, &["W"]),
            battle(3, xy, &["W"]),
            battle(4, &["Z"], xy),
        ];

        let rows = high_win_decks(&battles, 50.0, &june(1, 2));
        let row = rows.iter().find(|r| r.deck == cards(xy)).unwrap();
        assert_eq!(row.total_wins, 4);
        assert_eq!(row.total_games, 5);
        assert_eq!(row.win_percentage, 80.0);
    }

    #[test]
    fn test_high_win_decks_threshold_is_strict_and_sorted() {
        let battles = vec![
            battle(0, &["A"], &["B"]),
            battle(1, &["B"], &["A"]),
            battle(2, &["C"], &["D"]),
            battle(3, &["C"], &["E"]),
        ];

        // A and B: 50%, C: 100%
        let rows = high_win_decks(&battles, 50.0, &june(1, 2));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].deck, cards(&["C"]));

        let rows = high_win_decks(&battles, 0.0, &june(1, 2));
        let decks: Vec<Vec<String>> = rows.into_iter().map(|r| r.deck).collect();
        assert_eq!(decks, vec![cards(&["C"]), cards(&["A"]), cards(&["B"])]);
    }

    #[test]
    fn test_high_win_decks_order_matters() {
        let battles = vec![battle(0, &["X", "Y"], &["Z"]), battle(1, &["Z"], &["Y", "X"])];
        let rows = high_win_decks(&battles, 99.0, &june(1, 2));
        let row = rows.iter().find(|r| r.deck == cards(&["X", "Y"])).unwrap();
        assert_eq!(row.total_games, 1);
        assert_eq!(row.win_percentage, 100.0);
    }

    #[test]
    fn test_high_win_decks_empty_range() {
        let battles = vec![battle(0, &["X"], &["Y"])];
        assert!(high_win_decks(&battles, 0.0, &june(1, 1)).is_empty());
    }

    #[test]
    fn test_defeats_with_combo_scenario() {
        let mut battles: Vec<Battle> = (0..7).map(|n| battle(n, &["A", "B"], &["A", "C"])).collect();
        battles.push(battle(7, &["X"], &["A", "B"]));
        battles.push(battle(8, &["X"], &["C", "B", "D", "A"]));
        battles.push(battle(9, &["X"], &["B", "A"]));

        let row = defeats_with_combo(&battles, &cards(&["A", "B"]), &june(1, 2));
        assert_eq!(row.total_losses, 3);
    }

    #[test]
    fn test_defeats_with_combo_none() {
        let battles = vec![battle(0, &["A", "B"], &["C"])];
        let row = defeats_with_combo(&battles, &cards(&["A", "B"]), &june(1, 2));
        assert_eq!(row.total_losses, 0);
    }

    #[test]
    fn test_combo_keys_keep_deck_order() {
        let battles = vec![battle(0, &["A", "B", "C", "D"], &["Z"])];
        let rows = high_win_combos(&battles, 2, 0.0, &june(1, 2));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].combo, cards(&["A", "B"]));
        assert_ne!(rows[0].combo, cards(&["B", "A"]));
    }

    #[test]
    fn test_high_win_combos_denominator_is_all_battles() {
        let battles = vec![
            battle(0, &["A", "B", "C"], &["Z"]),
            battle(1, &["A", "B", "D"], &["Z"]),
            battle(2, &["B", "A", "C"], &["Z"]),
            battle(3, &["Z"], &["A", "B"]),
        ];

        // [A, B] 2/4, [B, A] 1/4, [Z] 1/4
        let rows = high_win_combos(&battles, 2, 20.0, &june(1, 2));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].combo, cards(&["A", "B"]));
        assert_eq!(rows[0].total_wins, 2);
        assert_eq!(rows[0].total_games, 4);
        assert_eq!(rows[0].win_rate, 50.0);
        assert_eq!(rows[1].combo, cards(&["B", "A"]));
        assert_eq!(rows[1].win_rate, 25.0);
        assert_eq!(rows[2].combo, cards(&["Z"]));

        assert_eq!(high_win_combos(&battles, 2, 25.0, &june(1, 2)).len(), 1);
    }

    #[test]
    fn test_high_win_combos_short_decks() {
        let battles = vec![battle(0, &["A"], &["Z"])];
        let rows = high_win_combos(&battles, 3, 0.0, &june(1, 2));
        assert_eq!(rows[0].combo, cards(&["A"]));
    }

    #[test]
    fn test_high_win_combos_empty_range() {
        let battles = vec![battle(0, &["A", "B"], &["Z"])];
        assert!(high_win_combos(&battles, 2, 0.0, &june(1, 1)).is_empty());
    }
}
