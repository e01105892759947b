//! Every move a tribe can make, as one closed enum.
//!
//! Each kind has three faces: enumeration (`ActionKind::variants`), the legality predicate
//! (`Action::check`) and the mutation (`Action::execute`). Enumeration is candidate generation
//! filtered through `check`, so a listed action and an executed action answer to the same rule.
//! `execute` re-checks against the current state first and never applies half an effect.

mod builder;
mod city;
mod tribe;
mod unit;

pub use builder::*;
pub use tribe::GIFT_AMOUNTS;
pub(crate) use unit::recover_amount;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    ActorId, ActorKind, BoardError, BuildingKind, City, GameState, LevelUpBonus, Position,
    Relationship, ResourceKind, Technology, Terrain, Tribe, TurnPhase, TurnStatus, Unit, UnitKind,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("game is over")]
    GameOver,
    #[error("no turn in progress")]
    TurnNotActive,
    #[error("unknown actor {0:?}")]
    UnknownActor(ActorId),
    #[error("actor {actor:?} is not a {expected:?}")]
    WrongActorKind { actor: ActorId, expected: ActorKind },
    #[error("actor {0:?} does not belong to the active tribe")]
    NotActiveTribe(ActorId),
    #[error("needs {needed} stars, {available} available")]
    InsufficientStars { needed: i32, available: i32 },
    #[error("missing technology {0:?}")]
    MissingTechnology(Technology),
    #[error("technology {0:?} cannot be researched")]
    TechnologyUnavailable(Technology),
    #[error("position {0:?} is outside the board")]
    OutOfBounds(Position),
    #[error("wrong terrain {found:?} at {position:?}")]
    WrongTerrain { position: Position, found: Terrain },
    #[error("{0:?} is not in this city's territory")]
    NotCityTile(Position),
    #[error("{0:?} is occupied")]
    Occupied(Position),
    #[error("no suitable resource at {0:?}")]
    MissingResource(Position),
    #[error("target out of range")]
    OutOfRange,
    #[error("city {0:?} has no room for another unit")]
    CityFull(ActorId),
    #[error("unit status {0:?} forbids this action")]
    UnitStatus(TurnStatus),
    #[error("{0:?} units cannot do this")]
    UnitKind(UnitKind),
    #[error("city cannot level up")]
    CannotLevelUp,
    #[error("bonus {0:?} is not offered at this level")]
    BonusUnavailable(LevelUpBonus),
    #[error("city already has a {0:?}")]
    DuplicateBuilding(BuildingKind),
    #[error("invalid target")]
    InvalidTarget,
    #[error("nothing to do")]
    NothingToDo,
    #[error("a city must level up before the turn can end")]
    CannotEndTurn,
    #[error("tribes {0:?} and {1:?} have not met")]
    NotMet(ActorId, ActorId),
    #[error("{0:?} is unreachable")]
    Unreachable(Position),
}

impl From<BoardError> for ActionError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::OutOfBounds(pos) => ActionError::OutOfBounds(pos),
        }
    }
}

/// Outcome drawn when a unit examines ruins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamineReward {
    SuperUnit,
    Research,
    PopulationGrowth,
    Explorer,
    Resources,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    TerrainChanged {
        position: Position,
        terrain: Terrain,
    },
    BuildingBuilt {
        city: ActorId,
        position: Position,
        building: BuildingKind,
    },
    BuildingDestroyed {
        city: ActorId,
        position: Position,
        building: BuildingKind,
    },
    ResourceGathered {
        city: ActorId,
        position: Position,
        resource: ResourceKind,
    },
    CityLeveledUp {
        city: ActorId,
        level: u32,
        bonus: LevelUpBonus,
    },
    CityFounded {
        city: ActorId,
        tribe: ActorId,
        position: Position,
    },
    CityCaptured {
        city: ActorId,
        from: ActorId,
        to: ActorId,
    },
    TribeEliminated {
        tribe: ActorId,
    },
    UnitSpawned {
        unit: ActorId,
        kind: UnitKind,
        position: Position,
    },
    UnitMoved {
        unit: ActorId,
        from: Position,
        to: Position,
    },
    UnitDamaged {
        unit: ActorId,
        hp: i32,
    },
    UnitKilled {
        unit: ActorId,
        by: ActorId,
    },
    UnitConverted {
        unit: ActorId,
        from: ActorId,
        to: ActorId,
    },
    UnitHealed {
        unit: ActorId,
        amount: i32,
    },
    UnitPromoted {
        unit: ActorId,
    },
    UnitDisbanded {
        unit: ActorId,
        refund: i32,
    },
    RuinsExamined {
        unit: ActorId,
        reward: ExamineReward,
    },
    TechResearched {
        tribe: ActorId,
        tech: Technology,
    },
    StarsGained {
        tribe: ActorId,
        amount: i32,
    },
    RoadBuilt {
        position: Position,
    },
    StarsSent {
        from: ActorId,
        to: ActorId,
        amount: i32,
    },
    RelationshipChanged {
        a: ActorId,
        b: ActorId,
        relationship: Relationship,
    },
    TribesMet {
        a: ActorId,
        b: ActorId,
    },
    TurnEndRequested {
        tribe: ActorId,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Build,
    BurnForest,
    ClearForest,
    Destroy,
    GrowForest,
    LevelUp,
    ResourceGathering,
    Spawn,
    Attack,
    Capture,
    Convert,
    Disband,
    Examine,
    HealOthers,
    MakeVeteran,
    Move,
    Recover,
    EndTurn,
    ResearchTech,
    BuildRoad,
    DeclareWar,
    SendStars,
}

impl ActionKind {
    pub const CITY: [ActionKind; 8] = [
        ActionKind::Build,
        ActionKind::BurnForest,
        ActionKind::ClearForest,
        ActionKind::Destroy,
        ActionKind::GrowForest,
        ActionKind::LevelUp,
        ActionKind::ResourceGathering,
        ActionKind::Spawn,
    ];

    pub const UNIT: [ActionKind; 9] = [
        ActionKind::Attack,
        ActionKind::Capture,
        ActionKind::Convert,
        ActionKind::Disband,
        ActionKind::Examine,
        ActionKind::HealOthers,
        ActionKind::MakeVeteran,
        ActionKind::Move,
        ActionKind::Recover,
    ];

    pub const TRIBE: [ActionKind; 5] = [
        ActionKind::EndTurn,
        ActionKind::ResearchTech,
        ActionKind::BuildRoad,
        ActionKind::DeclareWar,
        ActionKind::SendStars,
    ];

    pub fn category(self) -> ActorKind {
        if Self::CITY.contains(&self) {
            ActorKind::City
        } else if Self::UNIT.contains(&self) {
            ActorKind::Unit
        } else {
            ActorKind::Tribe
        }
    }

    /// Every legal parameterisation of this kind for `actor` in the current state.
    pub fn variants(self, state: &GameState, actor: ActorId) -> Vec<Action> {
        if actor_check(state, actor, self.category()).is_err() {
            return Vec::new();
        }
        let candidates = match self {
            ActionKind::Build => city::build_candidates(state, actor),
            ActionKind::BurnForest => city::territory_candidates(state, actor, |city, target| {
                Action::BurnForest { city, target }
            }),
            ActionKind::ClearForest => city::territory_candidates(state, actor, |city, target| {
                Action::ClearForest { city, target }
            }),
            ActionKind::Destroy => city::territory_candidates(state, actor, |city, target| {
                Action::Destroy { city, target }
            }),
            ActionKind::GrowForest => city::territory_candidates(state, actor, |city, target| {
                Action::GrowForest { city, target }
            }),
            ActionKind::LevelUp => city::level_up_candidates(state, actor),
            ActionKind::ResourceGathering => city::gathering_candidates(state, actor),
            ActionKind::Spawn => UnitKind::SPAWNABLE
                .into_iter()
                .map(|unit| Action::Spawn { city: actor, unit })
                .collect(),
            ActionKind::Attack => unit::target_candidates(state, actor, |unit, target| {
                Action::Attack { unit, target }
            }),
            ActionKind::Convert => unit::target_candidates(state, actor, |unit, target| {
                Action::Convert { unit, target }
            }),
            ActionKind::Move => unit::move_candidates(state, actor),
            ActionKind::Capture => vec![Action::Capture { unit: actor }],
            ActionKind::Disband => vec![Action::Disband { unit: actor }],
            ActionKind::Examine => vec![Action::Examine { unit: actor }],
            ActionKind::HealOthers => vec![Action::HealOthers { unit: actor }],
            ActionKind::MakeVeteran => vec![Action::MakeVeteran { unit: actor }],
            ActionKind::Recover => vec![Action::Recover { unit: actor }],
            ActionKind::EndTurn => vec![Action::EndTurn { tribe: actor }],
            ActionKind::ResearchTech => Technology::ALL
                .into_iter()
                .map(|tech| Action::ResearchTech { tribe: actor, tech })
                .collect(),
            ActionKind::BuildRoad => state
                .board
                .positions()
                .map(|target| Action::BuildRoad {
                    tribe: actor,
                    target,
                })
                .collect(),
            ActionKind::DeclareWar => state
                .board
                .tribe_ids()
                .map(|target| Action::DeclareWar {
                    tribe: actor,
                    target,
                })
                .collect(),
            ActionKind::SendStars => tribe::gift_candidates(state, actor),
        };
        candidates
            .into_iter()
            .filter(|action| action.is_feasible(state))
            .collect()
    }
}

/// One fully parameterised move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    // City
    Build {
        city: ActorId,
        target: Position,
        building: BuildingKind,
    },
    BurnForest {
        city: ActorId,
        target: Position,
    },
    ClearForest {
        city: ActorId,
        target: Position,
    },
    Destroy {
        city: ActorId,
        target: Position,
    },
    GrowForest {
        city: ActorId,
        target: Position,
    },
    LevelUp {
        city: ActorId,
        bonus: LevelUpBonus,
    },
    ResourceGathering {
        city: ActorId,
        target: Position,
        resource: ResourceKind,
    },
    Spawn {
        city: ActorId,
        unit: UnitKind,
    },
    // Unit
    Attack {
        unit: ActorId,
        target: ActorId,
    },
    Capture {
        unit: ActorId,
    },
    Convert {
        unit: ActorId,
        target: ActorId,
    },
    Disband {
        unit: ActorId,
    },
    Examine {
        unit: ActorId,
    },
    HealOthers {
        unit: ActorId,
    },
    MakeVeteran {
        unit: ActorId,
    },
    Move {
        unit: ActorId,
        destination: Position,
    },
    Recover {
        unit: ActorId,
    },
    // Tribe
    EndTurn {
        tribe: ActorId,
    },
    ResearchTech {
        tribe: ActorId,
        tech: Technology,
    },
    BuildRoad {
        tribe: ActorId,
        target: Position,
    },
    DeclareWar {
        tribe: ActorId,
        target: ActorId,
    },
    SendStars {
        tribe: ActorId,
        target: ActorId,
        amount: i32,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Build { .. } => ActionKind::Build,
            Action::BurnForest { .. } => ActionKind::BurnForest,
            Action::ClearForest { .. } => ActionKind::ClearForest,
            Action::Destroy { .. } => ActionKind::Destroy,
            Action::GrowForest { .. } => ActionKind::GrowForest,
            Action::LevelUp { .. } => ActionKind::LevelUp,
            Action::ResourceGathering { .. } => ActionKind::ResourceGathering,
            Action::Spawn { .. } => ActionKind::Spawn,
            Action::Attack { .. } => ActionKind::Attack,
            Action::Capture { .. } => ActionKind::Capture,
            Action::Convert { .. } => ActionKind::Convert,
            Action::Disband { .. } => ActionKind::Disband,
            Action::Examine { .. } => ActionKind::Examine,
            Action::HealOthers { .. } => ActionKind::HealOthers,
            Action::MakeVeteran { .. } => ActionKind::MakeVeteran,
            Action::Move { .. } => ActionKind::Move,
            Action::Recover { .. } => ActionKind::Recover,
            Action::EndTurn { .. } => ActionKind::EndTurn,
            Action::ResearchTech { .. } => ActionKind::ResearchTech,
            Action::BuildRoad { .. } => ActionKind::BuildRoad,
            Action::DeclareWar { .. } => ActionKind::DeclareWar,
            Action::SendStars { .. } => ActionKind::SendStars,
        }
    }

    /// The acting city, unit or tribe.
    pub fn actor(&self) -> ActorId {
        match *self {
            Action::Build { city, .. }
            | Action::BurnForest { city, .. }
            | Action::ClearForest { city, .. }
            | Action::Destroy { city, .. }
            | Action::GrowForest { city, .. }
            | Action::LevelUp { city, .. }
            | Action::ResourceGathering { city, .. }
            | Action::Spawn { city, .. } => city,
            Action::Attack { unit, .. }
            | Action::Capture { unit }
            | Action::Convert { unit, .. }
            | Action::Disband { unit }
            | Action::Examine { unit }
            | Action::HealOthers { unit }
            | Action::MakeVeteran { unit }
            | Action::Move { unit, .. }
            | Action::Recover { unit } => unit,
            Action::EndTurn { tribe }
            | Action::ResearchTech { tribe, .. }
            | Action::BuildRoad { tribe, .. }
            | Action::DeclareWar { tribe, .. }
            | Action::SendStars { tribe, .. } => tribe,
        }
    }

    pub fn is_feasible(&self, state: &GameState) -> bool {
        self.check(state).is_ok()
    }

    /// The legality predicate, evaluated against `state` as it is now.
    pub fn check(&self, state: &GameState) -> Result<(), ActionError> {
        actor_check(state, self.actor(), self.kind().category())?;
        match *self {
            Action::Build {
                city,
                target,
                building,
            } => city::check_build(state, city, target, building),
            Action::BurnForest { city, target } => city::check_burn_forest(state, city, target),
            Action::ClearForest { city, target } => city::check_clear_forest(state, city, target),
            Action::Destroy { city, target } => city::check_destroy(state, city, target),
            Action::GrowForest { city, target } => city::check_grow_forest(state, city, target),
            Action::LevelUp { city, bonus } => city::check_level_up(state, city, bonus),
            Action::ResourceGathering {
                city,
                target,
                resource,
            } => city::check_gathering(state, city, target, resource),
            Action::Spawn { city, unit } => city::check_spawn(state, city, unit),
            Action::Attack { unit, target } => unit::check_attack(state, unit, target),
            Action::Capture { unit } => unit::check_capture(state, unit).map(|_| ()),
            Action::Convert { unit, target } => unit::check_convert(state, unit, target),
            Action::Disband { unit } => unit::check_disband(state, unit),
            Action::Examine { unit } => unit::check_examine(state, unit),
            Action::HealOthers { unit } => unit::check_heal_others(state, unit).map(|_| ()),
            Action::MakeVeteran { unit } => unit::check_make_veteran(state, unit),
            Action::Move { unit, destination } => unit::check_move(state, unit, destination),
            Action::Recover { unit } => unit::check_recover(state, unit),
            Action::EndTurn { tribe } => tribe::check_end_turn(state, tribe),
            Action::ResearchTech { tribe, tech } => tribe::check_research(state, tribe, tech),
            Action::BuildRoad { tribe, target } => tribe::check_road(state, tribe, target),
            Action::DeclareWar { tribe, target } => tribe::check_declare_war(state, tribe, target),
            Action::SendStars {
                tribe,
                target,
                amount,
            } => tribe::check_send_stars(state, tribe, target, amount),
        }
    }

    /// Re-checks, then applies the full effect. On error `state` is untouched.
    pub fn execute(&self, state: &mut GameState) -> Result<Vec<Event>, ActionError> {
        self.check(state)?;
        let events = match *self {
            Action::Build {
                city,
                target,
                building,
            } => city::apply_build(state, city, target, building)?,
            Action::BurnForest { city, target } => city::apply_burn_forest(state, city, target)?,
            Action::ClearForest { city, target } => city::apply_clear_forest(state, city, target)?,
            Action::Destroy { city, target } => city::apply_destroy(state, city, target)?,
            Action::GrowForest { city, target } => city::apply_grow_forest(state, city, target)?,
            Action::LevelUp { city, bonus } => city::apply_level_up(state, city, bonus)?,
            Action::ResourceGathering {
                city,
                target,
                resource,
            } => city::apply_gathering(state, city, target, resource)?,
            Action::Spawn { city, unit } => city::apply_spawn(state, city, unit)?,
            Action::Attack { unit, target } => unit::apply_attack(state, unit, target)?,
            Action::Capture { unit } => unit::apply_capture(state, unit)?,
            Action::Convert { unit, target } => unit::apply_convert(state, unit, target)?,
            Action::Disband { unit } => unit::apply_disband(state, unit)?,
            Action::Examine { unit } => unit::apply_examine(state, unit)?,
            Action::HealOthers { unit } => unit::apply_heal_others(state, unit)?,
            Action::MakeVeteran { unit } => unit::apply_make_veteran(state, unit)?,
            Action::Move { unit, destination } => unit::apply_move(state, unit, destination)?,
            Action::Recover { unit } => unit::apply_recover(state, unit)?,
            Action::EndTurn { tribe } => tribe::apply_end_turn(state, tribe),
            Action::ResearchTech { tribe, tech } => tribe::apply_research(state, tribe, tech)?,
            Action::BuildRoad { tribe, target } => tribe::apply_road(state, tribe, target)?,
            Action::DeclareWar { tribe, target } => tribe::apply_declare_war(state, tribe, target),
            Action::SendStars {
                tribe,
                target,
                amount,
            } => tribe::apply_send_stars(state, tribe, target, amount)?,
        };
        debug!(action = ?self, events = events.len(), "action applied");
        Ok(events)
    }
}

// =============================================================================
// Shared checks
// =============================================================================

/// Checks common to every action: the game runs, a turn is open, the actor exists, has the
/// right kind and belongs to the tribe whose turn it is.
fn actor_check(state: &GameState, actor: ActorId, expected: ActorKind) -> Result<(), ActionError> {
    if state.is_game_over() {
        return Err(ActionError::GameOver);
    }
    if state.phase != TurnPhase::ActionLoop {
        return Err(ActionError::TurnNotActive);
    }
    let entry = state
        .board
        .get_actor(actor)
        .ok_or(ActionError::UnknownActor(actor))?;
    if entry.kind() != expected {
        return Err(ActionError::WrongActorKind { actor, expected });
    }
    if entry.tribe_id() != state.active_tribe {
        return Err(ActionError::NotActiveTribe(actor));
    }
    Ok(())
}

fn tribe_ref(state: &GameState, id: ActorId) -> Result<&Tribe, ActionError> {
    state.board.tribe(id).ok_or(ActionError::UnknownActor(id))
}

fn city_ref(state: &GameState, id: ActorId) -> Result<&City, ActionError> {
    state.board.city(id).ok_or(ActionError::UnknownActor(id))
}

fn unit_ref(state: &GameState, id: ActorId) -> Result<&Unit, ActionError> {
    state.board.unit(id).ok_or(ActionError::UnknownActor(id))
}

fn require_tech(tribe: &Tribe, tech: Technology) -> Result<(), ActionError> {
    if tribe.tech.is_researched(tech) {
        Ok(())
    } else {
        Err(ActionError::MissingTechnology(tech))
    }
}

fn require_stars(tribe: &Tribe, cost: i32) -> Result<(), ActionError> {
    if tribe.can_afford(cost) {
        Ok(())
    } else {
        Err(ActionError::InsufficientStars {
            needed: cost,
            available: tribe.stars(),
        })
    }
}

fn spend(state: &mut GameState, tribe: ActorId, cost: i32) -> Result<(), ActionError> {
    let t = state
        .board
        .tribe_mut(tribe)
        .ok_or(ActionError::UnknownActor(tribe))?;
    if t.spend(cost) {
        Ok(())
    } else {
        Err(ActionError::InsufficientStars {
            needed: cost,
            available: t.stars(),
        })
    }
}

/// Applies an allegiance change and evaluates its consequence in the same step.
fn shift_allegiance(state: &mut GameState, delta: i32, a: ActorId, b: ActorId) -> Option<Event> {
    let diplomacy = state.board.diplomacy_mut();
    diplomacy.update_allegiance(delta, a, b);
    diplomacy
        .check_consequences(delta, a, b)
        .map(|relationship| Event::RelationshipChanged { a, b, relationship })
}

fn reveal(state: &mut GameState, tribe: ActorId, center: Position, radius: i32) -> Vec<Event> {
    state
        .board
        .reveal(tribe, center, radius)
        .into_iter()
        .map(|other| Event::TribesMet { a: tribe, b: other })
        .collect()
}

/// Random walk over land revealing the explorer's surroundings at each step.
fn explore(state: &mut GameState, tribe: ActorId, start: Position) -> Vec<Event> {
    let steps = state.rules.examine.explorer_steps;
    let radius = state.rules.vision.explorer;
    let mut events = reveal(state, tribe, start, radius);
    let mut pos = start;
    for _ in 0..steps {
        let options: Vec<Position> = pos
            .neighbours()
            .filter(|&p| state.board.terrain_at(p).is_some_and(Terrain::is_land))
            .collect();
        let Some(&next) = state.rng.choose(&options) else {
            break;
        };
        pos = next;
        events.extend(reveal(state, tribe, pos, radius));
    }
    events
}
