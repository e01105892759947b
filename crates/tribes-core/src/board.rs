use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Actor, ActorId, ActorRegistry, BuildingKind, City, Diplomacy, DiplomacyRules, Position,
    ResourceKind, Technology, Terrain, Tribe, Unit, UnitKind, UnitStats,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("position {0:?} is outside the board")]
    OutOfBounds(Position),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: Terrain,
    pub resource: Option<ResourceKind>,
    pub building: Option<BuildingKind>,
    pub unit: Option<ActorId>,
    /// City whose territory contains this cell.
    pub city: Option<ActorId>,
    /// Road network overlay.
    pub road: bool,
}

impl Tile {
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            resource: None,
            building: None,
            unit: None,
            city: None,
            road: false,
        }
    }
}

/// Square grid plus every actor living on it and the diplomacy between tribes.
///
/// Tribes are registered first and own ids `0..tribe_count`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    tiles: Vec<Tile>,
    actors: ActorRegistry,
    tribe_count: usize,
    diplomacy: Diplomacy,
}

impl Board {
    pub fn new(size: usize, tribes: Vec<Tribe>, diplomacy: DiplomacyRules) -> Self {
        let tribe_count = tribes.len();
        let mut actors = ActorRegistry::default();
        for mut tribe in tribes {
            actors.insert_with(|id| {
                tribe.set_id(id);
                tribe.reset_visibility(size * size);
                Actor::Tribe(tribe)
            });
        }
        Self {
            size,
            tiles: vec![Tile::new(Terrain::Plain); size * size],
            actors,
            tribe_count,
            diplomacy: Diplomacy::new(tribe_count, diplomacy),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.index_of(pos).is_some()
    }

    pub fn index_of(&self, pos: Position) -> Option<usize> {
        let n = self.size as i32;
        if pos.x < 0 || pos.y < 0 || pos.x >= n || pos.y >= n {
            return None;
        }
        Some(pos.y as usize * self.size + pos.x as usize)
    }

    pub fn position_of(&self, index: usize) -> Option<Position> {
        if index >= self.tiles.len() {
            return None;
        }
        Some(Position::new(
            (index % self.size) as i32,
            (index / self.size) as i32,
        ))
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.tiles.len()).filter_map(|i| self.position_of(i))
    }

    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        self.index_of(pos).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        self.index_of(pos).map(move |i| &mut self.tiles[i])
    }

    fn checked_tile_mut(&mut self, pos: Position) -> Result<&mut Tile, BoardError> {
        self.tile_mut(pos).ok_or(BoardError::OutOfBounds(pos))
    }

    // =========================================================================
    // Cell layers
    // =========================================================================

    pub fn terrain_at(&self, pos: Position) -> Option<Terrain> {
        self.tile(pos).map(|t| t.terrain)
    }

    pub fn resource_at(&self, pos: Position) -> Option<ResourceKind> {
        self.tile(pos).and_then(|t| t.resource)
    }

    pub fn building_at(&self, pos: Position) -> Option<BuildingKind> {
        self.tile(pos).and_then(|t| t.building)
    }

    pub fn unit_at(&self, pos: Position) -> Option<ActorId> {
        self.tile(pos).and_then(|t| t.unit)
    }

    pub fn city_at(&self, pos: Position) -> Option<ActorId> {
        self.tile(pos).and_then(|t| t.city)
    }

    pub fn has_road(&self, pos: Position) -> bool {
        self.tile(pos).is_some_and(|t| t.road)
    }

    pub fn set_terrain(&mut self, pos: Position, terrain: Terrain) -> Result<(), BoardError> {
        self.checked_tile_mut(pos)?.terrain = terrain;
        Ok(())
    }

    pub fn set_resource(
        &mut self,
        pos: Position,
        resource: Option<ResourceKind>,
    ) -> Result<(), BoardError> {
        self.checked_tile_mut(pos)?.resource = resource;
        Ok(())
    }

    pub fn set_building(
        &mut self,
        pos: Position,
        building: Option<BuildingKind>,
    ) -> Result<(), BoardError> {
        self.checked_tile_mut(pos)?.building = building;
        Ok(())
    }

    pub fn set_unit_id(&mut self, pos: Position, unit: Option<ActorId>) -> Result<(), BoardError> {
        self.checked_tile_mut(pos)?.unit = unit;
        Ok(())
    }

    pub fn set_city_id(&mut self, pos: Position, city: Option<ActorId>) -> Result<(), BoardError> {
        self.checked_tile_mut(pos)?.city = city;
        Ok(())
    }

    pub fn set_road(&mut self, pos: Position, road: bool) -> Result<(), BoardError> {
        self.checked_tile_mut(pos)?.road = road;
        Ok(())
    }

    // =========================================================================
    // Actor registry
    // =========================================================================

    pub fn actors(&self) -> &ActorRegistry {
        &self.actors
    }

    pub fn add_actor(&mut self, make: impl FnOnce(ActorId) -> Actor) -> ActorId {
        self.actors.insert_with(make)
    }

    pub fn get_actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn remove_actor(&mut self, id: ActorId) -> bool {
        self.actors.remove(id).is_some()
    }

    pub fn tribe_count(&self) -> usize {
        self.tribe_count
    }

    pub fn tribe_ids(&self) -> impl Iterator<Item = ActorId> {
        (0..self.tribe_count as u32).map(ActorId)
    }

    pub fn tribe(&self, id: ActorId) -> Option<&Tribe> {
        self.actors.tribe(id)
    }

    pub fn tribe_mut(&mut self, id: ActorId) -> Option<&mut Tribe> {
        self.actors.tribe_mut(id)
    }

    pub fn city(&self, id: ActorId) -> Option<&City> {
        self.actors.city(id)
    }

    pub fn city_mut(&mut self, id: ActorId) -> Option<&mut City> {
        self.actors.city_mut(id)
    }

    pub fn unit(&self, id: ActorId) -> Option<&Unit> {
        self.actors.unit(id)
    }

    pub fn unit_mut(&mut self, id: ActorId) -> Option<&mut Unit> {
        self.actors.unit_mut(id)
    }

    pub(crate) fn units_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.actors.units_mut()
    }

    pub fn diplomacy(&self) -> &Diplomacy {
        &self.diplomacy
    }

    pub fn diplomacy_mut(&mut self) -> &mut Diplomacy {
        &mut self.diplomacy
    }

    /// Units of `tribe`: city rosters in city order, then extra units.
    pub fn units_of(&self, tribe: ActorId) -> Vec<ActorId> {
        let Some(t) = self.tribe(tribe) else {
            return Vec::new();
        };
        let mut out: Vec<ActorId> = t
            .cities()
            .iter()
            .filter_map(|&c| self.city(c))
            .flat_map(|c| c.units().iter().copied())
            .collect();
        out.extend_from_slice(t.extra_units());
        out
    }

    /// Tribe owning the territory at `pos`.
    pub fn territory_owner(&self, pos: Position) -> Option<ActorId> {
        self.city_at(pos)
            .and_then(|c| self.city(c))
            .map(|c| c.tribe_id)
    }

    // =========================================================================
    // Units
    // =========================================================================

    /// Places a new unit on a free cell. It joins `home` when that city has room, otherwise it
    /// becomes an extra unit of `tribe`.
    pub fn add_unit(
        &mut self,
        kind: UnitKind,
        stats: UnitStats,
        pos: Position,
        tribe: ActorId,
        home: Option<ActorId>,
    ) -> Option<ActorId> {
        let index = self.index_of(pos)?;
        if self.tiles[index].unit.is_some() || self.tribe(tribe).is_none() {
            return None;
        }
        let home = home.filter(|&c| {
            self.city(c)
                .is_some_and(|city| city.tribe_id == tribe && city.has_capacity())
        });
        let id = self
            .actors
            .insert_with(|id| Actor::Unit(Unit::new(id, kind, stats, pos, tribe, home)));
        self.tiles[index].unit = Some(id);
        let joined = home
            .and_then(|c| self.city_mut(c))
            .is_some_and(|city| city.add_unit(id));
        if !joined {
            if let Some(t) = self.tribe_mut(tribe) {
                t.add_extra_unit(id);
            }
        }
        Some(id)
    }

    /// Takes a unit off the board, out of its roster and out of the registry.
    pub fn remove_unit(&mut self, id: ActorId) -> Option<Unit> {
        self.unit(id)?;
        let Some(Actor::Unit(unit)) = self.actors.remove(id) else {
            return None;
        };
        if let Some(tile) = self.tile_mut(unit.position) {
            if tile.unit == Some(id) {
                tile.unit = None;
            }
        }
        self.detach_from_rosters(id, unit.city_id, unit.tribe_id);
        Some(unit)
    }

    pub(crate) fn detach_from_rosters(
        &mut self,
        id: ActorId,
        city: Option<ActorId>,
        tribe: ActorId,
    ) {
        if let Some(c) = city.and_then(|c| self.city_mut(c)) {
            c.remove_unit(id);
        }
        if let Some(t) = self.tribe_mut(tribe) {
            t.remove_extra_unit(id);
        }
    }

    pub fn move_unit(&mut self, id: ActorId, to: Position) -> bool {
        let Some(from) = self.unit(id).map(|u| u.position) else {
            return false;
        };
        if self.unit_at(to).is_some() || !self.contains(to) {
            return false;
        }
        if let Some(tile) = self.tile_mut(from) {
            tile.unit = None;
        }
        if let Some(tile) = self.tile_mut(to) {
            tile.unit = Some(id);
        }
        if let Some(unit) = self.unit_mut(id) {
            unit.position = to;
        }
        true
    }

    /// Moves whatever stands on `pos` to a free neighbouring land cell.
    pub fn push_unit(&mut self, pos: Position) -> bool {
        let Some(occupant) = self.unit_at(pos) else {
            return true;
        };
        let target = pos.neighbours().find(|&p| self.is_free_land(p));
        match target {
            Some(p) => self.move_unit(occupant, p),
            None => false,
        }
    }

    pub fn is_free_land(&self, pos: Position) -> bool {
        self.tile(pos)
            .is_some_and(|t| t.terrain.is_land() && t.unit.is_none())
    }

    /// Closest free land cell to `pos` within `max_radius`, scanning rings outward.
    pub fn free_land_near(&self, pos: Position, max_radius: i32) -> Option<Position> {
        (0..=max_radius).find_map(|r| {
            pos.square(r)
                .filter(|p| p.distance(pos) == r)
                .find(|&p| self.is_free_land(p))
        })
    }

    /// Cells `unit` can reach this turn.
    ///
    /// Steps cost 2, or 1 along the road network. Water and units block; mountains need
    /// Climbing. Forest and mountain cells without a road end movement, as does any cell next
    /// to an enemy unit.
    pub fn movement_range(&self, unit_id: ActorId) -> Vec<Position> {
        let Some(unit) = self.unit(unit_id) else {
            return Vec::new();
        };
        let Some(start) = self.index_of(unit.position) else {
            return Vec::new();
        };
        let tribe = unit.tribe_id;
        let climbing = self
            .tribe(tribe)
            .is_some_and(|t| t.tech.is_researched(Technology::Climbing));
        let budget = unit.stats().movement * 2;

        let mut spent = vec![i32::MAX; self.tiles.len()];
        spent[start] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(index) = queue.pop_front() {
            if index != start && self.ends_movement(index, tribe) {
                continue;
            }
            let Some(pos) = self.position_of(index) else {
                continue;
            };
            for next in pos.neighbours() {
                let Some(ni) = self.index_of(next) else {
                    continue;
                };
                let tile = &self.tiles[ni];
                let passable = tile.terrain.is_land()
                    && (tile.terrain != Terrain::Mountain || climbing)
                    && tile.unit.is_none();
                if !passable {
                    continue;
                }
                let step = if self.tiles[index].road && tile.road { 1 } else { 2 };
                let total = spent[index] + step;
                if total > budget || total >= spent[ni] {
                    continue;
                }
                spent[ni] = total;
                queue.push_back(ni);
            }
        }

        spent
            .iter()
            .enumerate()
            .filter(|&(i, &s)| i != start && s != i32::MAX)
            .filter_map(|(i, _)| self.position_of(i))
            .collect()
    }

    fn ends_movement(&self, index: usize, tribe: ActorId) -> bool {
        let tile = &self.tiles[index];
        if tile.terrain.stops_movement() && !tile.road {
            return true;
        }
        let Some(pos) = self.position_of(index) else {
            return true;
        };
        pos.neighbours().any(|p| {
            self.unit_at(p)
                .and_then(|u| self.unit(u))
                .is_some_and(|u| u.tribe_id != tribe)
        })
    }

    // =========================================================================
    // Territory and vision
    // =========================================================================

    /// Claims every unowned cell within `radius` of `center` for `city`.
    pub fn claim_territory(&mut self, city: ActorId, center: Position, radius: i32) -> usize {
        let mut claimed = 0;
        for pos in center.square(radius) {
            if let Some(tile) = self.tile_mut(pos) {
                if tile.city.is_none() {
                    tile.city = Some(city);
                    claimed += 1;
                }
            }
        }
        claimed
    }

    pub fn is_visible(&self, tribe: ActorId, pos: Position) -> bool {
        match (self.tribe(tribe), self.index_of(pos)) {
            (Some(t), Some(i)) => t.sees_index(i),
            _ => false,
        }
    }

    /// Reveals the square of `radius` around `center` to `tribe`.
    /// Returns tribes met for the first time.
    pub fn reveal(&mut self, tribe: ActorId, center: Position, radius: i32) -> Vec<ActorId> {
        let indices: Vec<usize> = center
            .square(radius)
            .filter_map(|p| self.index_of(p))
            .collect();

        let mut seen: Vec<ActorId> = Vec::new();
        for &i in &indices {
            let tile = &self.tiles[i];
            let unit_owner = tile.unit.and_then(|u| self.unit(u)).map(|u| u.tribe_id);
            let city_owner = tile.city.and_then(|c| self.city(c)).map(|c| c.tribe_id);
            for owner in [unit_owner, city_owner].into_iter().flatten() {
                if owner != tribe && !seen.contains(&owner) {
                    seen.push(owner);
                }
            }
        }

        let Some(t) = self.tribe_mut(tribe) else {
            return Vec::new();
        };
        for i in indices {
            t.reveal_index(i);
        }
        let met: Vec<ActorId> = seen.into_iter().filter(|&other| t.meet(other)).collect();
        for &other in &met {
            if let Some(o) = self.tribe_mut(other) {
                o.meet(tribe);
            }
        }
        met
    }

    // =========================================================================
    // Copy
    // =========================================================================

    /// Independent deep clone. With `reduce` set and an observer given, cells the observer has
    /// not seen lose terrain, resource, building, road and any foreign unit. Removed units are
    /// also dropped from the registry and their rosters so the clone stays consistent.
    pub fn copy(&self, reduce: bool, observer: Option<ActorId>) -> Board {
        let mut board = self.clone();
        let Some(observer) = observer.filter(|_| reduce) else {
            return board;
        };
        let Some(tribe) = self.tribe(observer) else {
            return board;
        };

        for index in 0..board.tiles.len() {
            if tribe.sees_index(index) {
                continue;
            }
            let tile = &mut board.tiles[index];
            tile.terrain = Terrain::Fog;
            tile.resource = None;
            tile.building = None;
            tile.road = false;
            let occupant = tile.unit;

            if let Some(unit) = occupant {
                if board.unit(unit).is_some_and(|u| u.tribe_id != observer) {
                    board.remove_unit(unit);
                }
            }
        }

        let visible: Vec<bool> = tribe.visibility().to_vec();
        let size = board.size;
        let foreign_cities: Vec<ActorId> = board
            .actors
            .cities()
            .filter(|c| c.tribe_id != observer)
            .map(|c| c.id())
            .collect();
        for id in foreign_cities {
            if let Some(city) = board.city_mut(id) {
                city.forget_buildings(|p| {
                    p.x >= 0
                        && p.y >= 0
                        && visible
                            .get(p.y as usize * size + p.x as usize)
                            .copied()
                            .unwrap_or(false)
                });
            }
        }
        board
    }
}
