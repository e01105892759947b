use tracing::info;

use super::{
    explore, require_tech, reveal, shift_allegiance, tribe_ref, unit_ref, Action, ActionError,
    Event, ExamineReward,
};
use crate::{
    calculate_combat_preview, Actor, ActorId, City, GameResult, GameState, Position, ResourceKind,
    Technology, Terrain, TurnStatus, Unit, UnitKind,
};

fn require_fresh(u: &Unit) -> Result<(), ActionError> {
    if u.is_fresh() {
        Ok(())
    } else {
        Err(ActionError::UnitStatus(u.status))
    }
}

/// A visible foreign unit within `u`'s range.
fn enemy_in_range<'a>(
    state: &'a GameState,
    u: &Unit,
    target: ActorId,
) -> Result<&'a Unit, ActionError> {
    let t = unit_ref(state, target)?;
    if t.tribe_id == u.tribe_id || !state.board.is_visible(u.tribe_id, t.position) {
        return Err(ActionError::InvalidTarget);
    }
    if u.position.distance(t.position) > u.stats().range {
        return Err(ActionError::OutOfRange);
    }
    Ok(t)
}

fn credit_kill(state: &mut GameState, killer: ActorId) {
    let Some(u) = state.board.unit_mut(killer) else {
        return;
    };
    u.kills += 1;
    let tribe = u.tribe_id;
    if let Some(t) = state.board.tribe_mut(tribe) {
        t.kills += 1;
    }
}

// =============================================================================
// Candidates
// =============================================================================

pub(super) fn move_candidates(state: &GameState, unit: ActorId) -> Vec<Action> {
    state
        .board
        .movement_range(unit)
        .into_iter()
        .map(|destination| Action::Move { unit, destination })
        .collect()
}

/// Every unit standing within range, to be filtered by the action's own check.
pub(super) fn target_candidates(
    state: &GameState,
    unit: ActorId,
    make: impl Fn(ActorId, ActorId) -> Action,
) -> Vec<Action> {
    let Some(u) = state.board.unit(unit) else {
        return Vec::new();
    };
    u.position
        .square(u.stats().range)
        .filter_map(|p| state.board.unit_at(p))
        .filter(|&t| t != unit)
        .map(|target| make(unit, target))
        .collect()
}

// =============================================================================
// Move
// =============================================================================

pub(super) fn check_move(
    state: &GameState,
    unit: ActorId,
    destination: Position,
) -> Result<(), ActionError> {
    let u = unit_ref(state, unit)?;
    if !u.can_move() {
        return Err(ActionError::UnitStatus(u.status));
    }
    if !state.board.contains(destination) {
        return Err(ActionError::OutOfBounds(destination));
    }
    if !state.board.movement_range(unit).contains(&destination) {
        return Err(ActionError::Unreachable(destination));
    }
    Ok(())
}

pub(super) fn apply_move(
    state: &mut GameState,
    unit: ActorId,
    destination: Position,
) -> Result<Vec<Event>, ActionError> {
    let u = unit_ref(state, unit)?;
    let (from, tribe) = (u.position, u.tribe_id);
    if !state.board.move_unit(unit, destination) {
        return Err(ActionError::Occupied(destination));
    }
    if let Some(u) = state.board.unit_mut(unit) {
        u.transition(TurnStatus::Moved);
    }
    let mut events = vec![Event::UnitMoved {
        unit,
        from,
        to: destination,
    }];
    let radius = state.rules.vision.unit;
    events.extend(reveal(state, tribe, destination, radius));
    Ok(events)
}

// =============================================================================
// Attack / Convert
// =============================================================================

pub(super) fn check_attack(
    state: &GameState,
    unit: ActorId,
    target: ActorId,
) -> Result<(), ActionError> {
    let u = unit_ref(state, unit)?;
    if !u.can_attack() {
        return Err(ActionError::UnitStatus(u.status));
    }
    if u.stats().attack <= 0 {
        return Err(ActionError::UnitKind(u.kind()));
    }
    enemy_in_range(state, u, target).map(|_| ())
}

pub(super) fn apply_attack(
    state: &mut GameState,
    unit: ActorId,
    target: ActorId,
) -> Result<Vec<Event>, ActionError> {
    let rules = state.rules.clone();
    let attacker = unit_ref(state, unit)?;
    let defender = unit_ref(state, target)?;
    let preview = calculate_combat_preview(attacker, defender, &state.board, &rules.combat);
    let (attacker_tribe, defender_tribe) = (attacker.tribe_id, defender.tribe_id);

    let mut events = Vec::new();
    if preview.defender_dies() {
        state.board.remove_unit(target);
        credit_kill(state, unit);
        events.push(Event::UnitKilled { unit: target, by: unit });
    } else if let Some(d) = state.board.unit_mut(target) {
        d.set_hp(preview.defender_hp_after);
        events.push(Event::UnitDamaged {
            unit: target,
            hp: d.hp(),
        });
    }

    if preview.retaliation > 0 {
        if preview.attacker_dies() {
            state.board.remove_unit(unit);
            credit_kill(state, target);
            events.push(Event::UnitKilled { unit, by: target });
        } else if let Some(a) = state.board.unit_mut(unit) {
            a.set_hp(preview.attacker_hp_after);
            events.push(Event::UnitDamaged { unit, hp: a.hp() });
        }
    }
    if let Some(a) = state.board.unit_mut(unit) {
        a.transition(TurnStatus::Attacked);
    }

    let delta = -rules.diplomacy.attack_repercussion;
    events.extend(shift_allegiance(state, delta, attacker_tribe, defender_tribe));
    Ok(events)
}

pub(super) fn check_convert(
    state: &GameState,
    unit: ActorId,
    target: ActorId,
) -> Result<(), ActionError> {
    let u = unit_ref(state, unit)?;
    if u.kind() != UnitKind::MindBender {
        return Err(ActionError::UnitKind(u.kind()));
    }
    if !u.can_attack() {
        return Err(ActionError::UnitStatus(u.status));
    }
    enemy_in_range(state, u, target).map(|_| ())
}

pub(super) fn apply_convert(
    state: &mut GameState,
    unit: ActorId,
    target: ActorId,
) -> Result<Vec<Event>, ActionError> {
    let tribe = unit_ref(state, unit)?.tribe_id;
    let victim = unit_ref(state, target)?;
    let (old_tribe, old_city) = (victim.tribe_id, victim.city_id);

    state.board.detach_from_rosters(target, old_city, old_tribe);
    if let Some(v) = state.board.unit_mut(target) {
        v.tribe_id = tribe;
        v.city_id = None;
        v.status = TurnStatus::Finished;
    }
    if let Some(t) = state.board.tribe_mut(tribe) {
        t.add_extra_unit(target);
    }
    if let Some(u) = state.board.unit_mut(unit) {
        u.transition(TurnStatus::Attacked);
    }

    let mut events = vec![Event::UnitConverted {
        unit: target,
        from: old_tribe,
        to: tribe,
    }];
    let delta = -state.rules.diplomacy.convert_repercussion;
    events.extend(shift_allegiance(state, delta, tribe, old_tribe));
    Ok(events)
}

// =============================================================================
// Capture
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum CaptureTarget {
    Village,
    City(ActorId),
}

pub(super) fn check_capture(state: &GameState, unit: ActorId) -> Result<CaptureTarget, ActionError> {
    let u = unit_ref(state, unit)?;
    require_fresh(u)?;
    let pos = u.position;
    match state.board.terrain_at(pos) {
        Some(Terrain::Village) => Ok(CaptureTarget::Village),
        Some(Terrain::City) => {
            let city = state
                .board
                .city_at(pos)
                .and_then(|c| state.board.city(c))
                .filter(|c| c.position == pos && c.tribe_id != u.tribe_id)
                .ok_or(ActionError::NothingToDo)?;
            Ok(CaptureTarget::City(city.id()))
        }
        _ => Err(ActionError::NothingToDo),
    }
}

pub(super) fn apply_capture(state: &mut GameState, unit: ActorId) -> Result<Vec<Event>, ActionError> {
    let target = check_capture(state, unit)?;
    let rules = state.rules.clone();
    let u = unit_ref(state, unit)?;
    let (tribe, pos) = (u.tribe_id, u.position);

    let events = match target {
        CaptureTarget::Village => {
            state.board.set_terrain(pos, Terrain::City)?;
            let city = state.board.add_actor(|id| {
                Actor::City(City::new(id, tribe, pos, false, true, &rules.city))
            });
            state.board.set_city_id(pos, Some(city))?;
            state.board.claim_territory(city, pos, 1);
            if let Some(c) = state.board.city_mut(city) {
                c.add_points(rules.city.capture_points);
            }
            take_city(state, tribe, city);
            let mut events = vec![Event::CityFounded {
                city,
                tribe,
                position: pos,
            }];
            events.extend(reveal(state, tribe, pos, rules.vision.city));
            events
        }
        CaptureTarget::City(city) => capture_city(state, tribe, city)?,
    };

    if let Some(u) = state.board.unit_mut(unit) {
        u.transition(TurnStatus::Finished);
    }
    Ok(events)
}

/// Registers `city` with `tribe`, making it the capital if the tribe has none.
fn take_city(state: &mut GameState, tribe: ActorId, city: ActorId) {
    let rules = state.rules.clone();
    let Some(t) = state.board.tribe_mut(tribe) else {
        return;
    };
    t.add_city(city);
    let becomes_capital = t.capital.is_none();
    if becomes_capital {
        t.capital = Some(city);
    }
    if let Some(c) = state.board.city_mut(city) {
        c.set_capital(becomes_capital, &rules.city);
    }
}

fn capture_city(
    state: &mut GameState,
    tribe: ActorId,
    city: ActorId,
) -> Result<Vec<Event>, ActionError> {
    let rules = state.rules.clone();
    let c = state
        .board
        .city_mut(city)
        .ok_or(ActionError::UnknownActor(city))?;
    let old_tribe = c.tribe_id;
    let pos = c.position;
    let radius = c.bound + 1;
    let roster = c.take_units();
    c.tribe_id = tribe;
    c.add_points(rules.city.capture_points);

    // The garrison stays with its tribe, now without a home.
    for &id in &roster {
        if let Some(u) = state.board.unit_mut(id) {
            u.city_id = None;
        }
    }
    let mut eliminated = false;
    if let Some(old) = state.board.tribe_mut(old_tribe) {
        for &id in &roster {
            old.add_extra_unit(id);
        }
        old.remove_city(city);
        if old.cities().is_empty() {
            old.result = GameResult::Loss;
            eliminated = true;
        }
    }
    take_city(state, tribe, city);

    let mut events = vec![Event::CityCaptured {
        city,
        from: old_tribe,
        to: tribe,
    }];
    info!(?city, from = ?old_tribe, to = ?tribe, "city captured");
    let delta = -rules.diplomacy.capture_repercussion;
    events.extend(shift_allegiance(state, delta, tribe, old_tribe));
    if eliminated {
        info!(tribe = ?old_tribe, "tribe eliminated");
        events.push(Event::TribeEliminated { tribe: old_tribe });
    }
    events.extend(reveal(state, tribe, pos, radius));
    Ok(events)
}

// =============================================================================
// Examine
// =============================================================================

pub(super) fn check_examine(state: &GameState, unit: ActorId) -> Result<(), ActionError> {
    let u = unit_ref(state, unit)?;
    require_fresh(u)?;
    if state.board.resource_at(u.position) != Some(ResourceKind::Ruins) {
        return Err(ActionError::MissingResource(u.position));
    }
    Ok(())
}

pub(super) fn apply_examine(state: &mut GameState, unit: ActorId) -> Result<Vec<Event>, ActionError> {
    let rules = state.rules.clone();
    let u = unit_ref(state, unit)?;
    let (tribe, pos) = (u.tribe_id, u.position);
    let t = tribe_ref(state, tribe)?;
    // Rewards land in the capital, or the oldest city once the capital has fallen.
    let home = t
        .capital
        .into_iter()
        .chain(t.cities().iter().copied())
        .find(|&c| state.board.city(c).is_some());

    let mut rewards = vec![
        ExamineReward::SuperUnit,
        ExamineReward::PopulationGrowth,
        ExamineReward::Explorer,
        ExamineReward::Resources,
    ];
    if !t.tech.is_everything_researched() {
        rewards.push(ExamineReward::Research);
    }
    let reward = state
        .rng
        .choose(&rewards)
        .copied()
        .unwrap_or(ExamineReward::Resources);

    state.board.set_resource(pos, None)?;
    if let Some(u) = state.board.unit_mut(unit) {
        u.transition(TurnStatus::Finished);
    }

    let mut events = vec![Event::RuinsExamined { unit, reward }];
    match reward {
        ExamineReward::SuperUnit => {
            let stats = rules.unit(UnitKind::SuperUnit).stats;
            let anchor = home
                .and_then(|c| state.board.city(c))
                .map_or(pos, |c| c.position);
            if let Some(occupant) = state.board.unit_at(anchor) {
                if state.board.push_unit(anchor) {
                    if let Some(to) = state.board.unit(occupant).map(|u| u.position) {
                        events.push(Event::UnitMoved {
                            unit: occupant,
                            from: anchor,
                            to,
                        });
                    }
                }
            }
            let spawned = state
                .board
                .free_land_near(anchor, 2)
                .and_then(|spot| {
                    let id = state
                        .board
                        .add_unit(UnitKind::SuperUnit, stats, spot, tribe, home)?;
                    Some((id, spot))
                });
            match spawned {
                Some((id, spot)) => {
                    if let Some(s) = state.board.unit_mut(id) {
                        s.status = TurnStatus::Finished;
                    }
                    events.push(Event::UnitSpawned {
                        unit: id,
                        kind: UnitKind::SuperUnit,
                        position: spot,
                    });
                    events.extend(reveal(state, tribe, spot, rules.vision.unit));
                }
                // Boxed in on every side: the ruins pay out in stars instead.
                None => events.extend(grant_examine_stars(state, tribe, rules.examine.stars)),
            }
        }
        ExamineReward::Research => {
            let points = rules.research.points_per_tier;
            if let Some(t) = state.board.tribe_mut(tribe) {
                if let Some(tech) = t.tech.research_at_random(&mut state.rng) {
                    t.score += tech.tier() as i32 * points;
                    events.push(Event::TechResearched { tribe, tech });
                }
            }
        }
        ExamineReward::PopulationGrowth => {
            if let Some(c) = home.and_then(|c| state.board.city_mut(c)) {
                c.add_population(rules.examine.population);
            }
        }
        ExamineReward::Explorer => events.extend(explore(state, tribe, pos)),
        ExamineReward::Resources => {
            events.extend(grant_examine_stars(state, tribe, rules.examine.stars))
        }
    }
    Ok(events)
}

fn grant_examine_stars(state: &mut GameState, tribe: ActorId, amount: i32) -> Option<Event> {
    let t = state.board.tribe_mut(tribe)?;
    t.add_stars(amount);
    Some(Event::StarsGained { tribe, amount })
}

// =============================================================================
// Healing, promotion, disbanding
// =============================================================================

pub(super) fn check_recover(state: &GameState, unit: ActorId) -> Result<(), ActionError> {
    let u = unit_ref(state, unit)?;
    require_fresh(u)?;
    if !u.is_injured() {
        return Err(ActionError::NothingToDo);
    }
    Ok(())
}

pub(super) fn apply_recover(state: &mut GameState, unit: ActorId) -> Result<Vec<Event>, ActionError> {
    let u = unit_ref(state, unit)?;
    let amount = recover_amount(state, u);
    let u = state
        .board
        .unit_mut(unit)
        .ok_or(ActionError::UnknownActor(unit))?;
    let healed = u.heal(amount);
    u.transition(TurnStatus::Finished);
    Ok(vec![Event::UnitHealed {
        unit,
        amount: healed,
    }])
}

/// Healing for a unit resting in place; more inside its own tribe's territory.
pub(crate) fn recover_amount(state: &GameState, u: &Unit) -> i32 {
    let heal = &state.rules.heal;
    if state.board.territory_owner(u.position) == Some(u.tribe_id) {
        heal.recover + heal.territory_bonus
    } else {
        heal.recover
    }
}

pub(super) fn check_heal_others(
    state: &GameState,
    unit: ActorId,
) -> Result<Vec<ActorId>, ActionError> {
    let u = unit_ref(state, unit)?;
    if u.kind() != UnitKind::MindBender {
        return Err(ActionError::UnitKind(u.kind()));
    }
    require_fresh(u)?;
    let patients: Vec<ActorId> = u
        .position
        .neighbours()
        .filter_map(|p| state.board.unit_at(p))
        .filter(|&id| {
            state
                .board
                .unit(id)
                .is_some_and(|o| o.tribe_id == u.tribe_id && o.is_injured())
        })
        .collect();
    if patients.is_empty() {
        return Err(ActionError::NothingToDo);
    }
    Ok(patients)
}

pub(super) fn apply_heal_others(
    state: &mut GameState,
    unit: ActorId,
) -> Result<Vec<Event>, ActionError> {
    let patients = check_heal_others(state, unit)?;
    let amount = state.rules.heal.heal_others;
    let mut events = Vec::with_capacity(patients.len());
    for id in patients {
        if let Some(p) = state.board.unit_mut(id) {
            let healed = p.heal(amount);
            events.push(Event::UnitHealed {
                unit: id,
                amount: healed,
            });
        }
    }
    if let Some(u) = state.board.unit_mut(unit) {
        u.transition(TurnStatus::Finished);
    }
    Ok(events)
}

pub(super) fn check_make_veteran(state: &GameState, unit: ActorId) -> Result<(), ActionError> {
    let u = unit_ref(state, unit)?;
    if u.kind() == UnitKind::SuperUnit {
        return Err(ActionError::UnitKind(u.kind()));
    }
    if u.is_veteran() || u.kills < state.rules.game.veteran_kills {
        return Err(ActionError::NothingToDo);
    }
    Ok(())
}

pub(super) fn apply_make_veteran(
    state: &mut GameState,
    unit: ActorId,
) -> Result<Vec<Event>, ActionError> {
    let bonus = state.rules.game.veteran_hp_bonus;
    let u = state
        .board
        .unit_mut(unit)
        .ok_or(ActionError::UnknownActor(unit))?;
    u.promote(bonus);
    Ok(vec![Event::UnitPromoted { unit }])
}

pub(super) fn check_disband(state: &GameState, unit: ActorId) -> Result<(), ActionError> {
    let u = unit_ref(state, unit)?;
    require_tech(tribe_ref(state, u.tribe_id)?, Technology::FreeSpirit)?;
    require_fresh(u)
}

pub(super) fn apply_disband(state: &mut GameState, unit: ActorId) -> Result<Vec<Event>, ActionError> {
    let removed = state
        .board
        .remove_unit(unit)
        .ok_or(ActionError::UnknownActor(unit))?;
    let refund = removed.stats().cost / 2;
    if let Some(t) = state.board.tribe_mut(removed.tribe_id) {
        t.add_stars(refund);
    }
    Ok(vec![Event::UnitDisbanded { unit, refund }])
}
