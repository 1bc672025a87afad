//! Turning API responses into stored documents.
//!
//! Everything here is pure; opponent resolution (which may hit the store or
//! the API) happens in the ingestor before [`build_battle`] is called.

use thiserror::Error;

use crate::fetch::{PlayerProfile, RawBattle, RawParticipant};
use crate::models::{normalize_tag, Battle, BattleSide, BattleTime, PlayerId, Player};

/// Why a raw battle was not stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("invalid battle time '{0}'")]
    InvalidTime(String),

    #[error("missing {0} participant")]
    MissingSide(&'static str),

    #[error("{0} side has {1} participants, expected 1")]
    NotOneVersusOne(&'static str, usize),

    #[error("invalid participant tag '{0}'")]
    InvalidTag(String),

    #[error("tied at {0} crowns")]
    Tie(u8),
}

/// Normalize a profile into the stored player shape.
///
/// Returns `None` when the profile's tag is not a game tag.
pub fn player_from_profile(profile: &PlayerProfile) -> Option<Player> {
    let tag = normalize_tag(&profile.tag)?;
    let mut player = Player::new(tag, profile.name.clone()).with_deck(profile.current_deck.clone());
    player.exp_level = profile.exp_level;
    player.trophies = profile.trophies;
    player.best_trophies = profile.best_trophies;
    player.wins = profile.wins;
    player.losses = profile.losses;
    player.battle_count = profile.battle_count;
    player.three_crown_wins = profile.three_crown_wins;
    Some(player)
}

fn single<'a>(
    participants: &'a [RawParticipant],
    role: &'static str,
) -> Result<&'a RawParticipant, Rejected> {
    match participants {
        [one] => Ok(one),
        [] => Err(Rejected::MissingSide(role)),
        many => Err(Rejected::NotOneVersusOne(role, many.len())),
    }
}

/// Canonical tag of the opponent in a raw battle, if it has one.
pub fn opponent_tag(raw: &RawBattle) -> Result<String, Rejected> {
    let opponent = single(&raw.opponent, "opponent")?;
    let tag = opponent
        .tag
        .as_deref()
        .ok_or(Rejected::MissingSide("opponent"))?;
    normalize_tag(tag).ok_or_else(|| Rejected::InvalidTag(tag.to_string()))
}

fn side(participant: &RawParticipant, tag: String, player_id: Option<PlayerId>) -> BattleSide {
    BattleSide {
        player_id,
        name: participant.name.clone().unwrap_or_else(|| tag.clone()),
        tag,
        deck: participant.cards.iter().map(|c| c.name.clone()).collect(),
        crowns: participant.crowns,
    }
}

/// Build the canonical winner/loser record for one battle-log entry.
///
/// `observer_tag` owns the battle log; the team side always belongs to it,
/// whatever tag the entry carries.
pub fn build_battle(
    raw: &RawBattle,
    observer_tag: &str,
    observer_ref: &PlayerId,
    opponent_ref: Option<PlayerId>,
) -> Result<Battle, Rejected> {
    let battle_time =
        BattleTime::parse(&raw.battle_time).map_err(|_| Rejected::InvalidTime(raw.battle_time.clone()))?;
    let team = single(&raw.team, "team")?;
    let opponent = single(&raw.opponent, "opponent")?;

    if team.crowns == opponent.crowns {
        return Err(Rejected::Tie(team.crowns));
    }

    let ours = side(team, observer_tag.to_string(), Some(observer_ref.clone()));
    let theirs = side(opponent, opponent_tag(raw)?, opponent_ref);

    let (winner, loser) = if ours.crowns > theirs.crowns {
        (ours, theirs)
    } else {
        (theirs, ours)
    };

    Ok(Battle {
        battle_time,
        winner,
        loser,
        main_player_tag: observer_tag.to_string(),
    })
}
