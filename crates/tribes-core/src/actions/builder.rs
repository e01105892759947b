use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Action, ActionKind, ActorId, GameState};

/// Enumerates the legal actions of one actor category.
pub trait ActionBuilder {
    fn actions(&self, state: &GameState, actor: ActorId) -> Vec<Action>;
}

fn union_of(kinds: &[ActionKind], state: &GameState, actor: ActorId) -> Vec<Action> {
    kinds
        .iter()
        .flat_map(|kind| kind.variants(state, actor))
        .collect()
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CityActionBuilder;

impl ActionBuilder for CityActionBuilder {
    /// A city ready to grow offers nothing but its level-up choices.
    fn actions(&self, state: &GameState, city: ActorId) -> Vec<Action> {
        let grows = state.board.city(city).is_some_and(|c| c.can_level_up());
        if grows {
            return ActionKind::LevelUp.variants(state, city);
        }
        union_of(&ActionKind::CITY, state, city)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UnitActionBuilder;

impl ActionBuilder for UnitActionBuilder {
    fn actions(&self, state: &GameState, unit: ActorId) -> Vec<Action> {
        union_of(&ActionKind::UNIT, state, unit)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TribeActionBuilder;

impl ActionBuilder for TribeActionBuilder {
    fn actions(&self, state: &GameState, tribe: ActorId) -> Vec<Action> {
        union_of(&ActionKind::TRIBE, state, tribe)
    }
}

/// The active tribe's legal actions, grouped by actor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCatalogue {
    tribe: Option<ActorId>,
    city_actions: BTreeMap<ActorId, Vec<Action>>,
    unit_actions: BTreeMap<ActorId, Vec<Action>>,
    tribe_actions: Vec<Action>,
    can_end_turn: bool,
}

impl ActionCatalogue {
    /// Cities are visited in founding order. Once one of them is ready to level up, the cities
    /// after it are left out and the turn cannot end until that growth is resolved.
    pub fn compute(state: &GameState, tribe: ActorId) -> Self {
        let mut catalogue = Self {
            tribe: Some(tribe),
            ..Self::default()
        };
        let Some(t) = state.board.tribe(tribe) else {
            return catalogue;
        };

        let mut growth_pending = false;
        for &city in t.cities() {
            let actions = CityActionBuilder.actions(state, city);
            if !actions.is_empty() {
                catalogue.city_actions.insert(city, actions);
            }
            if state.board.city(city).is_some_and(|c| c.can_level_up()) {
                growth_pending = true;
                break;
            }
        }

        for unit in state.board.units_of(tribe) {
            let actions = UnitActionBuilder.actions(state, unit);
            if !actions.is_empty() {
                catalogue.unit_actions.insert(unit, actions);
            }
        }

        catalogue.tribe_actions = TribeActionBuilder.actions(state, tribe);
        catalogue.can_end_turn = !growth_pending
            && catalogue
                .tribe_actions
                .iter()
                .any(|a| matches!(a, Action::EndTurn { .. }));

        trace!(
            ?tribe,
            cities = catalogue.city_actions.len(),
            units = catalogue.unit_actions.len(),
            total = catalogue.len(),
            "catalogue computed"
        );
        catalogue
    }

    pub fn tribe(&self) -> Option<ActorId> {
        self.tribe
    }

    pub fn can_end_turn(&self) -> bool {
        self.can_end_turn
    }

    pub fn city_actions(&self, city: ActorId) -> &[Action] {
        self.city_actions.get(&city).map_or(&[], Vec::as_slice)
    }

    pub fn unit_actions(&self, unit: ActorId) -> &[Action] {
        self.unit_actions.get(&unit).map_or(&[], Vec::as_slice)
    }

    pub fn tribe_actions(&self) -> &[Action] {
        &self.tribe_actions
    }

    pub fn cities(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.city_actions.keys().copied()
    }

    pub fn units(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.unit_actions.keys().copied()
    }

    /// Cities first, then units, then tribe-level actions.
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.city_actions
            .values()
            .flatten()
            .chain(self.unit_actions.values().flatten())
            .chain(self.tribe_actions.iter())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Whether anything other than ending the turn is on offer.
    pub fn has_playable_actions(&self) -> bool {
        self.iter().any(|a| !matches!(a, Action::EndTurn { .. }))
    }
}
