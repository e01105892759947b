use super::{
    city_ref, explore, require_stars, require_tech, reveal, spend, tribe_ref, Action, ActionError,
    Event,
};
use crate::{
    ActorId, BuildingKind, City, GameState, LevelUpBonus, Position, ResourceKind, Technology,
    Terrain, TurnStatus, UnitKind,
};

/// Cells claimed by `city`.
fn territory(state: &GameState, city: ActorId) -> Vec<Position> {
    let Some(c) = state.board.city(city) else {
        return Vec::new();
    };
    c.position
        .square(c.bound)
        .filter(|&p| state.board.city_at(p) == Some(city))
        .collect()
}

fn owned_target(state: &GameState, city: ActorId, target: Position) -> Result<(), ActionError> {
    if !state.board.contains(target) {
        return Err(ActionError::OutOfBounds(target));
    }
    if state.board.city_at(target) != Some(city) {
        return Err(ActionError::NotCityTile(target));
    }
    Ok(())
}

fn terrain_is(state: &GameState, target: Position, want: Terrain) -> Result<(), ActionError> {
    let found = state
        .board
        .terrain_at(target)
        .ok_or(ActionError::OutOfBounds(target))?;
    if found != want {
        return Err(ActionError::WrongTerrain {
            position: target,
            found,
        });
    }
    Ok(())
}

fn no_building(state: &GameState, target: Position) -> Result<(), ActionError> {
    if state.board.building_at(target).is_some() {
        return Err(ActionError::Occupied(target));
    }
    Ok(())
}

// =============================================================================
// Candidates
// =============================================================================

pub(super) fn territory_candidates(
    state: &GameState,
    city: ActorId,
    make: impl Fn(ActorId, Position) -> Action,
) -> Vec<Action> {
    territory(state, city)
        .into_iter()
        .map(|target| make(city, target))
        .collect()
}

pub(super) fn build_candidates(state: &GameState, city: ActorId) -> Vec<Action> {
    territory(state, city)
        .into_iter()
        .flat_map(|target| {
            BuildingKind::ALL.into_iter().map(move |building| Action::Build {
                city,
                target,
                building,
            })
        })
        .collect()
}

pub(super) fn level_up_candidates(state: &GameState, city: ActorId) -> Vec<Action> {
    let Some(c) = state.board.city(city) else {
        return Vec::new();
    };
    LevelUpBonus::choices(c.level() + 1)
        .into_iter()
        .map(|bonus| Action::LevelUp { city, bonus })
        .collect()
}

pub(super) fn gathering_candidates(state: &GameState, city: ActorId) -> Vec<Action> {
    territory(state, city)
        .into_iter()
        .filter_map(|target| {
            let resource = state.board.resource_at(target)?;
            Some(Action::ResourceGathering {
                city,
                target,
                resource,
            })
        })
        .collect()
}

// =============================================================================
// Build / Destroy
// =============================================================================

pub(super) fn check_build(
    state: &GameState,
    city: ActorId,
    target: Position,
    building: BuildingKind,
) -> Result<(), ActionError> {
    let c = city_ref(state, city)?;
    let tribe = tribe_ref(state, c.tribe_id)?;
    owned_target(state, city, target)?;
    let rule = state.rules.building(building);
    require_tech(tribe, rule.tech)?;
    terrain_is(state, target, rule.terrain)?;
    if let Some(resource) = rule.resource {
        if state.board.resource_at(target) != Some(resource) {
            return Err(ActionError::MissingResource(target));
        }
    }
    no_building(state, target)?;
    if building.is_unique() && c.has_building(building) {
        return Err(ActionError::DuplicateBuilding(building));
    }
    if let Some(base) = building.boosts() {
        let next_to_base = c
            .buildings()
            .iter()
            .any(|b| b.kind == base && b.position.is_adjacent(target));
        if !next_to_base {
            return Err(ActionError::NothingToDo);
        }
    }
    require_stars(tribe, rule.cost)
}

pub(super) fn apply_build(
    state: &mut GameState,
    city: ActorId,
    target: Position,
    building: BuildingKind,
) -> Result<Vec<Event>, ActionError> {
    let rules = state.rules.clone();
    let tribe = city_ref(state, city)?.tribe_id;
    spend(state, tribe, rules.building(building).cost)?;
    state.board.set_building(target, Some(building))?;
    if let Some(c) = state.board.city_mut(city) {
        c.add_building(building, target, &rules.buildings);
    }
    Ok(vec![Event::BuildingBuilt {
        city,
        position: target,
        building,
    }])
}

pub(super) fn check_destroy(
    state: &GameState,
    city: ActorId,
    target: Position,
) -> Result<(), ActionError> {
    let c = city_ref(state, city)?;
    require_tech(tribe_ref(state, c.tribe_id)?, Technology::Construction)?;
    owned_target(state, city, target)?;
    if c.building_at(target).is_none() {
        return Err(ActionError::NothingToDo);
    }
    Ok(())
}

pub(super) fn apply_destroy(
    state: &mut GameState,
    city: ActorId,
    target: Position,
) -> Result<Vec<Event>, ActionError> {
    let rules = state.rules.clone();
    state.board.set_building(target, None)?;
    let removed = state
        .board
        .city_mut(city)
        .and_then(|c| c.remove_building(target, &rules.buildings));
    Ok(removed
        .map(|(building, _)| Event::BuildingDestroyed {
            city,
            position: target,
            building,
        })
        .into_iter()
        .collect())
}

// =============================================================================
// Forests
// =============================================================================

pub(super) fn check_burn_forest(
    state: &GameState,
    city: ActorId,
    target: Position,
) -> Result<(), ActionError> {
    let c = city_ref(state, city)?;
    let tribe = tribe_ref(state, c.tribe_id)?;
    require_tech(tribe, Technology::Chivalry)?;
    owned_target(state, city, target)?;
    terrain_is(state, target, Terrain::Forest)?;
    no_building(state, target)?;
    require_stars(tribe, state.rules.costs.burn_forest)
}

pub(super) fn apply_burn_forest(
    state: &mut GameState,
    city: ActorId,
    target: Position,
) -> Result<Vec<Event>, ActionError> {
    let tribe = city_ref(state, city)?.tribe_id;
    let cost = state.rules.costs.burn_forest;
    spend(state, tribe, cost)?;
    state.board.set_terrain(target, Terrain::Plain)?;
    state.board.set_resource(target, Some(ResourceKind::Crops))?;
    Ok(vec![Event::TerrainChanged {
        position: target,
        terrain: Terrain::Plain,
    }])
}

pub(super) fn check_clear_forest(
    state: &GameState,
    city: ActorId,
    target: Position,
) -> Result<(), ActionError> {
    let c = city_ref(state, city)?;
    require_tech(tribe_ref(state, c.tribe_id)?, Technology::Forestry)?;
    owned_target(state, city, target)?;
    terrain_is(state, target, Terrain::Forest)?;
    no_building(state, target)
}

pub(super) fn apply_clear_forest(
    state: &mut GameState,
    city: ActorId,
    target: Position,
) -> Result<Vec<Event>, ActionError> {
    let tribe = city_ref(state, city)?.tribe_id;
    let stars = state.rules.costs.clear_forest_stars;
    state.board.set_terrain(target, Terrain::Plain)?;
    state.board.set_resource(target, None)?;
    if let Some(t) = state.board.tribe_mut(tribe) {
        t.add_stars(stars);
    }
    Ok(vec![
        Event::TerrainChanged {
            position: target,
            terrain: Terrain::Plain,
        },
        Event::StarsGained {
            tribe,
            amount: stars,
        },
    ])
}

pub(super) fn check_grow_forest(
    state: &GameState,
    city: ActorId,
    target: Position,
) -> Result<(), ActionError> {
    let c = city_ref(state, city)?;
    let tribe = tribe_ref(state, c.tribe_id)?;
    require_tech(tribe, Technology::Spiritualism)?;
    owned_target(state, city, target)?;
    terrain_is(state, target, Terrain::Plain)?;
    require_stars(tribe, state.rules.costs.grow_forest)
}

pub(super) fn apply_grow_forest(
    state: &mut GameState,
    city: ActorId,
    target: Position,
) -> Result<Vec<Event>, ActionError> {
    let tribe = city_ref(state, city)?.tribe_id;
    let cost = state.rules.costs.grow_forest;
    spend(state, tribe, cost)?;
    state.board.set_terrain(target, Terrain::Forest)?;
    Ok(vec![Event::TerrainChanged {
        position: target,
        terrain: Terrain::Forest,
    }])
}

// =============================================================================
// Growth
// =============================================================================

fn super_unit_spot(state: &GameState, c: &City) -> Option<Position> {
    if state.board.unit_at(c.position).is_none() {
        return Some(c.position);
    }
    state.board.free_land_near(c.position, c.bound)
}

pub(super) fn check_level_up(
    state: &GameState,
    city: ActorId,
    bonus: LevelUpBonus,
) -> Result<(), ActionError> {
    let c = city_ref(state, city)?;
    if !c.can_level_up() {
        return Err(ActionError::CannotLevelUp);
    }
    if !LevelUpBonus::choices(c.level() + 1).contains(&bonus) {
        return Err(ActionError::BonusUnavailable(bonus));
    }
    if bonus == LevelUpBonus::SuperUnit && super_unit_spot(state, c).is_none() {
        return Err(ActionError::Occupied(c.position));
    }
    Ok(())
}

pub(super) fn apply_level_up(
    state: &mut GameState,
    city: ActorId,
    bonus: LevelUpBonus,
) -> Result<Vec<Event>, ActionError> {
    let rules = state.rules.clone();
    let c = city_ref(state, city)?;
    let (tribe, pos) = (c.tribe_id, c.position);
    let spot = match bonus {
        LevelUpBonus::SuperUnit => {
            Some(super_unit_spot(state, c).ok_or(ActionError::Occupied(pos))?)
        }
        _ => None,
    };

    let (level, bound) = {
        let c = state
            .board
            .city_mut(city)
            .ok_or(ActionError::UnknownActor(city))?;
        c.level_up(&rules.city);
        match bonus {
            LevelUpBonus::Workshop => c.add_production(rules.city.workshop_production),
            LevelUpBonus::CityWall => c.walls = true,
            LevelUpBonus::PopulationGrowth => c.add_population(rules.city.population_growth),
            LevelUpBonus::BorderGrowth => c.bound += 1,
            LevelUpBonus::Park => c.add_long_term_points(rules.city.park_points),
            LevelUpBonus::Explorer | LevelUpBonus::Resources | LevelUpBonus::SuperUnit => {}
        }
        (c.level(), c.bound)
    };

    let mut events = vec![Event::CityLeveledUp { city, level, bonus }];
    match bonus {
        LevelUpBonus::Resources => {
            let amount = rules.city.resources_bonus_stars;
            if let Some(t) = state.board.tribe_mut(tribe) {
                t.add_stars(amount);
            }
            events.push(Event::StarsGained { tribe, amount });
        }
        LevelUpBonus::BorderGrowth => {
            state.board.claim_territory(city, pos, bound);
            events.extend(reveal(state, tribe, pos, bound + 1));
        }
        LevelUpBonus::Explorer => events.extend(explore(state, tribe, pos)),
        LevelUpBonus::SuperUnit => {
            if let Some(spot) = spot {
                let stats = rules.unit(UnitKind::SuperUnit).stats;
                if let Some(id) =
                    state
                        .board
                        .add_unit(UnitKind::SuperUnit, stats, spot, tribe, Some(city))
                {
                    if let Some(u) = state.board.unit_mut(id) {
                        u.status = TurnStatus::Finished;
                    }
                    events.push(Event::UnitSpawned {
                        unit: id,
                        kind: UnitKind::SuperUnit,
                        position: spot,
                    });
                    events.extend(reveal(state, tribe, spot, rules.vision.unit));
                }
            }
        }
        LevelUpBonus::Workshop
        | LevelUpBonus::CityWall
        | LevelUpBonus::PopulationGrowth
        | LevelUpBonus::Park => {}
    }
    Ok(events)
}

// =============================================================================
// Gathering and spawning
// =============================================================================

pub(super) fn check_gathering(
    state: &GameState,
    city: ActorId,
    target: Position,
    resource: ResourceKind,
) -> Result<(), ActionError> {
    let rule = state
        .rules
        .gathering
        .get(resource)
        .ok_or(ActionError::InvalidTarget)?;
    let c = city_ref(state, city)?;
    let tribe = tribe_ref(state, c.tribe_id)?;
    owned_target(state, city, target)?;
    require_tech(tribe, rule.tech)?;
    if state.board.resource_at(target) != Some(resource) {
        return Err(ActionError::MissingResource(target));
    }
    terrain_is(state, target, rule.terrain)?;
    require_stars(tribe, rule.cost)
}

pub(super) fn apply_gathering(
    state: &mut GameState,
    city: ActorId,
    target: Position,
    resource: ResourceKind,
) -> Result<Vec<Event>, ActionError> {
    let rule = *state
        .rules
        .gathering
        .get(resource)
        .ok_or(ActionError::InvalidTarget)?;
    let tribe = city_ref(state, city)?.tribe_id;
    spend(state, tribe, rule.cost)?;
    state.board.set_resource(target, None)?;
    if let Some(c) = state.board.city_mut(city) {
        c.add_population(rule.population);
    }

    let mut events = vec![Event::ResourceGathered {
        city,
        position: target,
        resource,
    }];
    if rule.stars > 0 {
        if let Some(t) = state.board.tribe_mut(tribe) {
            t.add_stars(rule.stars);
        }
        events.push(Event::StarsGained {
            tribe,
            amount: rule.stars,
        });
    }
    Ok(events)
}

pub(super) fn check_spawn(
    state: &GameState,
    city: ActorId,
    kind: UnitKind,
) -> Result<(), ActionError> {
    if !UnitKind::SPAWNABLE.contains(&kind) {
        return Err(ActionError::UnitKind(kind));
    }
    let c = city_ref(state, city)?;
    let tribe = tribe_ref(state, c.tribe_id)?;
    let rule = state.rules.unit(kind);
    if let Some(tech) = rule.tech {
        require_tech(tribe, tech)?;
    }
    if !c.has_capacity() {
        return Err(ActionError::CityFull(city));
    }
    if state.board.unit_at(c.position).is_some() {
        return Err(ActionError::Occupied(c.position));
    }
    require_stars(tribe, rule.stats.cost)
}

pub(super) fn apply_spawn(
    state: &mut GameState,
    city: ActorId,
    kind: UnitKind,
) -> Result<Vec<Event>, ActionError> {
    let rules = state.rules.clone();
    let c = city_ref(state, city)?;
    let (tribe, pos) = (c.tribe_id, c.position);
    let stats = rules.unit(kind).stats;

    spend(state, tribe, stats.cost)?;
    let id = state
        .board
        .add_unit(kind, stats, pos, tribe, Some(city))
        .ok_or(ActionError::Occupied(pos))?;
    if let Some(u) = state.board.unit_mut(id) {
        u.status = TurnStatus::Finished;
    }

    let mut events = vec![Event::UnitSpawned {
        unit: id,
        kind,
        position: pos,
    }];
    events.extend(reveal(state, tribe, pos, rules.vision.unit));
    Ok(events)
}
