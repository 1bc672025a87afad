//! Battle documents (winner/loser schema).

use serde::{Deserialize, Serialize};

use super::{BattleTime, PlayerId};

/// One side of a finished battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleSide {
    /// Stored player this side resolves to, when it could be resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,

    pub tag: String,
    pub name: String,

    /// Card names in the order the API returned them. Not sorted.
    pub deck: Vec<String>,

    pub crowns: u8,
}

impl BattleSide {
    pub fn has_card(&self, card: &str) -> bool {
        self.deck.iter().any(|c| c == card)
    }

    /// Every card of `cards` is in this deck, in any order.
    pub fn has_all(&self, cards: &[String]) -> bool {
        cards.iter().all(|card| self.has_card(card))
    }

    /// First `size` cards of the deck, in stored order.
    pub fn combo(&self, size: usize) -> &[String] {
        &self.deck[..size.min(self.deck.len())]
    }
}

/// Composite key a battle is upserted under.
///
/// Battle time plus both participants, so the copies of one match seen in
/// both players' battle logs collapse into a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BattleKey(String);

impl BattleKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A finished battle, normalized so the side with more crowns is `winner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Battle {
    pub battle_time: BattleTime,
    pub winner: BattleSide,
    pub loser: BattleSide,

    /// Tag of the player whose battle log this document was last written from.
    pub main_player_tag: String,
}

impl Battle {
    pub fn key(&self) -> BattleKey {
        BattleKey(format!(
            "{}|{}|{}",
            self.battle_time, self.winner.tag, self.loser.tag
        ))
    }

    /// Card is in either deck.
    pub fn features(&self, card: &str) -> bool {
        self.winner.has_card(card) || self.loser.has_card(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side(tag: &str, deck: &[&str], crowns: u8) -> BattleSide {
        BattleSide {
            player_id: None,
            tag: tag.to_string(),
            name: tag.to_string(),
            deck: deck.iter().map(|c| c.to_string()).collect(),
            crowns,
        }
    }

    fn battle(time: &str, winner: BattleSide, loser: BattleSide, observer: &str) -> Battle {
        Battle {
            battle_time: BattleTime::parse(time).unwrap(),
            winner,
            loser,
            main_player_tag: observer.to_string(),
        }
    }

    #[test]
    fn test_key_ignores_perspective() {
        let a = battle(
            "20240601T120000.000Z",
            side("#AAA", &["Knight"], 3),
            side("#BBB", &["Golem"], 1),
            "#AAA",
        );
        let b = battle(
            "20240601T120000.000Z",
            side("#AAA", &["Knight"], 3),
            side("#BBB", &["Golem"], 1),
            "#BBB",
        );
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_key_differs_per_match() {
        let a = battle(
            "20240601T120000.000Z",
            side("#AAA", &[], 3),
            side("#BBB", &[], 1),
            "#AAA",
        );
        let b = battle(
            "20240601T120000.000Z",
            side("#AAA", &[], 3),
            side("#CCC", &[], 1),
            "#AAA",
        );
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_combo_keeps_stored_order() {
        let s = side("#AAA", &["D", "A", "C", "B"], 1);
        assert_eq!(s.combo(2), ["D".to_string(), "A".to_string()]);
        assert_eq!(s.combo(10).len(), 4);
        assert!(s.combo(0).is_empty());
    }

    #[test]
    fn test_has_all_is_unordered() {
        let s = side("#AAA", &["A", "B", "C"], 1);
        assert!(s.has_all(&["C".to_string(), "A".to_string()]));
        assert!(!s.has_all(&["A".to_string(), "Z".to_string()]));
    }

    #[test]
    fn test_battle_serializes_expected_field_names() {
        let mut winner = side("#AAA", &["Knight"], 3);
        winner.player_id = Some(PlayerId::for_tag("#AAA"));
        let b = battle("20240601T120000.000Z", winner, side("#BBB", &[], 2), "#AAA");
        let json = serde_json::to_value(&b).unwrap();

        assert_eq!(json["battleTime"], "20240601T120000.000Z");
        assert_eq!(json["mainPlayerTag"], "#AAA");
        assert_eq!(json["winner"]["deck"][0], "Knight");
        assert!(json["winner"]["playerId"].is_string());
        assert!(json["loser"].get("playerId").is_none());
    }
}
