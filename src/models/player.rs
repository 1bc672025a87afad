//! Player documents.

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// One card in a player's current deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_level: Option<u32>,
}

impl Card {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            level: None,
            max_level: None,
        }
    }
}

/// A player, one document per unique tag.
///
/// Counters are the values observed at the latest ingestion; they are
/// overwritten on every re-observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub tag: String,
    pub name: String,
    pub exp_level: u32,
    pub trophies: u32,
    pub best_trophies: u32,
    pub wins: u32,
    pub losses: u32,
    pub battle_count: u32,
    pub three_crown_wins: u32,

    /// Active deck at capture time, in API order.
    #[serde(default)]
    pub deck: Vec<Card>,
}

impl Player {
    /// Create a player with zeroed counters. The id is derived from the tag.
    pub fn new(tag: String, name: String) -> Self {
        Self {
            id: PlayerId::for_tag(&tag),
            tag,
            name,
            exp_level: 0,
            trophies: 0,
            best_trophies: 0,
            wins: 0,
            losses: 0,
            battle_count: 0,
            three_crown_wins: 0,
            deck: Vec::new(),
        }
    }

    pub fn with_trophies(mut self, trophies: u32) -> Self {
        self.trophies = trophies;
        self
    }

    pub fn with_deck(mut self, deck: Vec<Card>) -> Self {
        self.deck = deck;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_follows_tag() {
        let player = Player::new("#2PP".to_string(), "Alice".to_string());
        assert_eq!(player.id, PlayerId::for_tag("#2PP"));
    }

    #[test]
    fn test_player_field_names_are_camel_case() {
        let player = Player::new("#2PP".to_string(), "Alice".to_string())
            .with_trophies(5000)
            .with_deck(vec![Card::named("Knight")]);
        let json = serde_json::to_value(&player).unwrap();

        assert_eq!(json["tag"], "#2PP");
        assert_eq!(json["expLevel"], 0);
        assert_eq!(json["bestTrophies"], 0);
        assert_eq!(json["battleCount"], 0);
        assert_eq!(json["threeCrownWins"], 0);
        assert_eq!(json["trophies"], 5000);
        assert_eq!(json["deck"][0]["name"], "Knight");
        assert!(json["deck"][0].get("level").is_none());
    }

    #[test]
    fn test_card_deserializes_api_shape() {
        let card: Card =
            serde_json::from_str(r#"{"name":"Hog Rider","id":26000021,"level":11,"maxLevel":14}"#)
                .unwrap();
        assert_eq!(card.name, "Hog Rider");
        assert_eq!(card.level, Some(11));
        assert_eq!(card.max_level, Some(14));
    }
}
