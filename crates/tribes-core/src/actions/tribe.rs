use super::{
    require_stars, require_tech, shift_allegiance, spend, tribe_ref, Action, ActionError, Event,
};
use crate::{ActorId, GameResult, GameState, Position, Relationship, Technology, Terrain, TurnPhase};

/// Star amounts a tribe may gift in one go.
pub const GIFT_AMOUNTS: [i32; 3] = [1, 5, 10];

pub(super) fn gift_candidates(state: &GameState, tribe: ActorId) -> Vec<Action> {
    state
        .board
        .tribe_ids()
        .flat_map(|target| {
            GIFT_AMOUNTS.into_iter().map(move |amount| Action::SendStars {
                tribe,
                target,
                amount,
            })
        })
        .collect()
}

/// Another tribe this one has met and that is still in the game.
fn other_tribe(state: &GameState, tribe: ActorId, target: ActorId) -> Result<(), ActionError> {
    let other = tribe_ref(state, target)?;
    if target == tribe || other.result == GameResult::Loss {
        return Err(ActionError::InvalidTarget);
    }
    if !tribe_ref(state, tribe)?.has_met(target) {
        return Err(ActionError::NotMet(tribe, target));
    }
    Ok(())
}

pub(super) fn check_end_turn(state: &GameState, tribe: ActorId) -> Result<(), ActionError> {
    tribe_ref(state, tribe)?;
    if state.growth_pending(tribe) {
        return Err(ActionError::CannotEndTurn);
    }
    Ok(())
}

pub(super) fn apply_end_turn(state: &mut GameState, tribe: ActorId) -> Vec<Event> {
    state.phase = TurnPhase::TurnEnding;
    vec![Event::TurnEndRequested { tribe }]
}

pub(super) fn check_research(
    state: &GameState,
    tribe: ActorId,
    tech: Technology,
) -> Result<(), ActionError> {
    let t = tribe_ref(state, tribe)?;
    if !t.tech.is_researchable(tech) {
        return Err(ActionError::TechnologyUnavailable(tech));
    }
    require_stars(t, state.rules.research_cost(tech, t.cities().len()))
}

pub(super) fn apply_research(
    state: &mut GameState,
    tribe: ActorId,
    tech: Technology,
) -> Result<Vec<Event>, ActionError> {
    let cities = tribe_ref(state, tribe)?.cities().len();
    let cost = state.rules.research_cost(tech, cities);
    let points = tech.tier() as i32 * state.rules.research.points_per_tier;
    spend(state, tribe, cost)?;
    let t = state
        .board
        .tribe_mut(tribe)
        .ok_or(ActionError::UnknownActor(tribe))?;
    t.tech
        .research(tech)
        .map_err(|_| ActionError::TechnologyUnavailable(tech))?;
    t.score += points;
    Ok(vec![Event::TechResearched { tribe, tech }])
}

pub(super) fn check_road(
    state: &GameState,
    tribe: ActorId,
    target: Position,
) -> Result<(), ActionError> {
    let t = tribe_ref(state, tribe)?;
    require_tech(t, Technology::Roads)?;
    let terrain = state
        .board
        .terrain_at(target)
        .ok_or(ActionError::OutOfBounds(target))?;
    if !state.board.is_visible(tribe, target) {
        return Err(ActionError::InvalidTarget);
    }
    if !terrain.is_land() || terrain == Terrain::Mountain {
        return Err(ActionError::WrongTerrain {
            position: target,
            found: terrain,
        });
    }
    if state.board.has_road(target) {
        return Err(ActionError::NothingToDo);
    }
    if state
        .board
        .territory_owner(target)
        .is_some_and(|owner| owner != tribe)
    {
        return Err(ActionError::NotCityTile(target));
    }
    require_stars(t, state.rules.costs.road)
}

pub(super) fn apply_road(
    state: &mut GameState,
    tribe: ActorId,
    target: Position,
) -> Result<Vec<Event>, ActionError> {
    let cost = state.rules.costs.road;
    state.board.set_road(target, true)?;
    spend(state, tribe, cost)?;
    Ok(vec![Event::RoadBuilt { position: target }])
}

pub(super) fn check_declare_war(
    state: &GameState,
    tribe: ActorId,
    target: ActorId,
) -> Result<(), ActionError> {
    other_tribe(state, tribe, target)?;
    if state.board.diplomacy().is_at_war(tribe, target) {
        return Err(ActionError::NothingToDo);
    }
    Ok(())
}

pub(super) fn apply_declare_war(state: &mut GameState, tribe: ActorId, target: ActorId) -> Vec<Event> {
    if !state.board.diplomacy_mut().declare_war(tribe, target) {
        return Vec::new();
    }
    vec![Event::RelationshipChanged {
        a: tribe,
        b: target,
        relationship: Relationship::War,
    }]
}

pub(super) fn check_send_stars(
    state: &GameState,
    tribe: ActorId,
    target: ActorId,
    amount: i32,
) -> Result<(), ActionError> {
    let t = tribe_ref(state, tribe)?;
    require_tech(t, Technology::Diplomacy)?;
    if !GIFT_AMOUNTS.contains(&amount) {
        return Err(ActionError::InvalidTarget);
    }
    other_tribe(state, tribe, target)?;
    if t.has_gifted(target) {
        return Err(ActionError::NothingToDo);
    }
    require_stars(t, amount)
}

pub(super) fn apply_send_stars(
    state: &mut GameState,
    tribe: ActorId,
    target: ActorId,
    amount: i32,
) -> Result<Vec<Event>, ActionError> {
    spend(state, tribe, amount)?;
    if let Some(t) = state.board.tribe_mut(tribe) {
        t.record_gift(target);
    }
    if let Some(t) = state.board.tribe_mut(target) {
        t.add_stars(amount);
    }
    let mut events = vec![Event::StarsSent {
        from: tribe,
        to: target,
        amount,
    }];
    events.extend(shift_allegiance(state, amount, tribe, target));
    Ok(events)
}
