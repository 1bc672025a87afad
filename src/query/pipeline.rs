//! Composable filter stages over a battle snapshot.
//!
//! A [`Pipeline`] narrows a borrowed slice of battles stage by stage; the
//! analytics then count or group what is left.

use std::collections::BTreeMap;

use crate::models::{Battle, BattleTime, TimeRange};

/// One filter over battles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// `start <= battleTime < end`
    InRange(TimeRange),
    /// `battleTime < t`
    Before(BattleTime),
    /// `battleTime >= t`
    NotBefore(BattleTime),
    WinnerHas(String),
    LoserHas(String),
    /// Card is in either deck.
    Features(String),
    /// Every listed card is in the losing deck, in any order.
    LoserHasAll(Vec<String>),
    LoserCrownsAtLeast(u8),
    /// Either side played exactly this deck, card order included.
    PlayedDeck(Vec<String>),
}

impl Stage {
    pub fn matches(&self, battle: &Battle) -> bool {
        match self {
            Stage::InRange(range) => range.contains(&battle.battle_time),
            Stage::Before(t) => battle.battle_time < *t,
            Stage::NotBefore(t) => battle.battle_time >= *t,
            Stage::WinnerHas(card) => battle.winner.has_card(card),
            Stage::LoserHas(card) => battle.loser.has_card(card),
            Stage::Features(card) => battle.features(card),
            Stage::LoserHasAll(cards) => battle.loser.has_all(cards),
            Stage::LoserCrownsAtLeast(n) => battle.loser.crowns >= *n,
            Stage::PlayedDeck(deck) => battle.winner.deck == *deck || battle.loser.deck == *deck,
        }
    }
}

/// Battles left after the stages applied so far.
#[derive(Debug, Clone)]
pub struct Pipeline<'a> {
    battles: Vec<&'a Battle>,
}

impl<'a> Pipeline<'a> {
    pub fn new(battles: &'a [Battle]) -> Self {
        Self {
            battles: battles.iter().collect(),
        }
    }

    /// Keep battles matching `stage`.
    pub fn matching(mut self, stage: Stage) -> Self {
        self.battles.retain(|b| stage.matches(b));
        self
    }

    /// Keep battles inside `range`, when one is given.
    pub fn within(self, range: Option<&TimeRange>) -> Self {
        match range {
            Some(range) => self.matching(Stage::InRange(range.clone())),
            None => self,
        }
    }

    pub fn count(&self) -> usize {
        self.battles.len()
    }

    pub fn count_where(&self, stage: &Stage) -> usize {
        self.battles.iter().filter(|b| stage.matches(b)).count()
    }

    /// Battle count per key.
    pub fn group_by<K, F>(&self, key: F) -> BTreeMap<K, usize>
    where
        K: Ord,
        F: Fn(&Battle) -> K,
    {
        let mut groups = BTreeMap::new();
        for battle in &self.battles {
            *groups.entry(key(*battle)).or_insert(0) += 1;
        }
        groups
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Battle> + '_ {
        self.battles.iter().copied()
    }
}
