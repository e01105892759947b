use serde::{Deserialize, Serialize};

use crate::{ActorId, BuildingKind, BuildingTable, CityRules, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedBuilding {
    pub kind: BuildingKind,
    pub position: Position,
}

/// What a single building adds to its city, given the buildings around it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingYield {
    pub population: i32,
    pub production: i32,
    pub long_term_points: i32,
}

/// Reward chosen when a city grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelUpBonus {
    Workshop,
    Explorer,
    CityWall,
    Resources,
    PopulationGrowth,
    BorderGrowth,
    Park,
    SuperUnit,
}

impl LevelUpBonus {
    /// The pair of bonuses offered when a city reaches `new_level`.
    pub fn choices(new_level: u32) -> [LevelUpBonus; 2] {
        match new_level {
            0..=2 => [LevelUpBonus::Workshop, LevelUpBonus::Explorer],
            3 => [LevelUpBonus::CityWall, LevelUpBonus::Resources],
            4 => [LevelUpBonus::PopulationGrowth, LevelUpBonus::BorderGrowth],
            _ => [LevelUpBonus::Park, LevelUpBonus::SuperUnit],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    id: ActorId,
    pub tribe_id: ActorId,
    pub position: Position,
    level: u32,
    population: i32,
    population_need: i32,
    production: i32,
    buildings: Vec<PlacedBuilding>,
    /// Territory radius.
    pub bound: i32,
    capital: bool,
    /// Founded by occupying a neutral village rather than placed by the level.
    village: bool,
    pub walls: bool,
    /// Points earned this turn; moved into the tribe score at end of turn.
    points: i32,
    /// Points paid into the tribe score every turn.
    long_term_points: i32,
    units: Vec<ActorId>,
}

impl City {
    pub fn new(
        id: ActorId,
        tribe_id: ActorId,
        position: Position,
        capital: bool,
        village: bool,
        rules: &CityRules,
    ) -> Self {
        let production = rules.base_production + if capital { rules.capital_production } else { 0 };
        Self {
            id,
            tribe_id,
            position,
            level: 1,
            population: 0,
            population_need: 2,
            production,
            buildings: Vec::new(),
            bound: 1,
            capital,
            village,
            walls: false,
            points: 0,
            long_term_points: 0,
            units: Vec::new(),
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn population(&self) -> i32 {
        self.population
    }

    pub fn population_need(&self) -> i32 {
        self.population_need
    }

    pub fn production(&self) -> i32 {
        self.production
    }

    pub fn is_capital(&self) -> bool {
        self.capital
    }

    pub fn is_village(&self) -> bool {
        self.village
    }

    pub fn points(&self) -> i32 {
        self.points
    }

    pub fn long_term_points(&self) -> i32 {
        self.long_term_points
    }

    pub fn buildings(&self) -> &[PlacedBuilding] {
        &self.buildings
    }

    pub fn units(&self) -> &[ActorId] {
        &self.units
    }

    pub fn can_level_up(&self) -> bool {
        self.population >= self.population_need
    }

    pub fn level_up(&mut self, rules: &CityRules) {
        let points = rules.level_up_points(self.level);
        self.level += 1;
        self.population -= self.population_need;
        self.population_need = self.level as i32 + 1;
        self.points += points;
    }

    pub fn add_population(&mut self, amount: i32) {
        self.population = (self.population + amount).max(0);
    }

    pub fn add_production(&mut self, amount: i32) {
        self.production = (self.production + amount).max(0);
    }

    pub fn add_points(&mut self, amount: i32) {
        self.points += amount;
    }

    pub fn add_long_term_points(&mut self, amount: i32) {
        self.long_term_points += amount;
    }

    /// Returns this turn's points and clears them.
    pub fn take_points(&mut self) -> i32 {
        std::mem::take(&mut self.points)
    }

    pub fn set_capital(&mut self, capital: bool, rules: &CityRules) {
        if self.capital == capital {
            return;
        }
        self.capital = capital;
        if capital {
            self.add_production(rules.capital_production);
        } else {
            self.add_production(-rules.capital_production);
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.units.len() < self.level as usize
    }

    /// Adds a unit to the roster if capacity allows.
    pub fn add_unit(&mut self, unit: ActorId) -> bool {
        if !self.has_capacity() || self.units.contains(&unit) {
            return false;
        }
        self.units.push(unit);
        true
    }

    pub fn remove_unit(&mut self, unit: ActorId) -> bool {
        let before = self.units.len();
        self.units.retain(|&id| id != unit);
        self.units.len() != before
    }

    /// Empties the roster, returning the units that were in it.
    pub fn take_units(&mut self) -> Vec<ActorId> {
        std::mem::take(&mut self.units)
    }

    pub fn has_building(&self, kind: BuildingKind) -> bool {
        self.buildings.iter().any(|b| b.kind == kind)
    }

    pub fn building_at(&self, position: Position) -> Option<BuildingKind> {
        self.buildings
            .iter()
            .find(|b| b.position == position)
            .map(|b| b.kind)
    }

    pub fn add_building(
        &mut self,
        kind: BuildingKind,
        position: Position,
        table: &BuildingTable,
    ) -> BuildingYield {
        let gained = building_yield(kind, position, &self.buildings, table);
        self.apply_yield(gained, 1);
        self.buildings.push(PlacedBuilding { kind, position });
        gained
    }

    /// Removes the building at `position`, undoing exactly what it contributed.
    pub fn remove_building(
        &mut self,
        position: Position,
        table: &BuildingTable,
    ) -> Option<(BuildingKind, BuildingYield)> {
        let index = self.buildings.iter().position(|b| b.position == position)?;
        let removed = self.buildings.remove(index);
        let lost = building_yield(removed.kind, position, &self.buildings, table);
        self.apply_yield(lost, -1);
        Some((removed.kind, lost))
    }

    /// Drops buildings the observer of a redacted copy cannot see, leaving yields untouched.
    pub(crate) fn forget_buildings(&mut self, visible: impl Fn(Position) -> bool) {
        self.buildings.retain(|b| visible(b.position));
    }

    fn apply_yield(&mut self, y: BuildingYield, sign: i32) {
        self.add_population(sign * y.population);
        self.add_production(sign * y.production);
        self.long_term_points += sign * y.long_term_points;
    }
}

/// Contribution of a `kind` building at `position` next to `others`.
///
/// Base buildings (farm, mine, lumber hut, port) give population and pick up the bonus of any
/// adjacent functional building that boosts them. Functional buildings give their bonus once
/// per adjacent base building; the custom house pays in production, the rest in population.
pub fn building_yield(
    kind: BuildingKind,
    position: Position,
    others: &[PlacedBuilding],
    table: &BuildingTable,
) -> BuildingYield {
    let rule = table.get(kind);
    let mut out = BuildingYield::default();

    if let Some(base) = kind.boosts() {
        let matches = others
            .iter()
            .filter(|b| b.kind == base && b.position.is_adjacent(position))
            .count() as i32;
        credit(&mut out, kind, matches * rule.per_adjacent);
    } else if kind.is_temple() {
        out.long_term_points += rule.points;
    } else {
        out.population += rule.population;
        for booster in others
            .iter()
            .filter(|b| b.kind.boosts() == Some(kind) && b.position.is_adjacent(position))
        {
            credit(&mut out, booster.kind, table.get(booster.kind).per_adjacent);
        }
    }
    out
}

fn credit(out: &mut BuildingYield, functional: BuildingKind, amount: i32) {
    if functional == BuildingKind::CustomHouse {
        out.production += amount;
    } else {
        out.population += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rules;

    fn city() -> City {
        City::new(
            ActorId(4),
            ActorId(0),
            Position::new(2, 2),
            true,
            false,
            &Rules::default().city,
        )
    }

    #[test]
    fn level_up_consumes_population_and_raises_need() {
        let rules = Rules::default();
        let mut c = city();
        c.add_population(3);
        assert!(c.can_level_up());
        c.level_up(&rules.city);
        assert_eq!(c.level(), 2);
        assert_eq!(c.population(), 1);
        assert_eq!(c.population_need(), 3);
        assert_eq!(c.take_points(), 100);
        assert_eq!(c.points(), 0);
        assert!(!c.can_level_up());
    }

    #[test]
    fn unit_capacity_follows_level() {
        let rules = Rules::default();
        let mut c = city();
        assert!(c.add_unit(ActorId(10)));
        assert!(!c.add_unit(ActorId(11)));
        c.add_population(2);
        c.level_up(&rules.city);
        assert!(c.add_unit(ActorId(11)));
        assert_eq!(c.units().len(), 2);
        assert!(c.remove_unit(ActorId(10)));
        assert!(!c.remove_unit(ActorId(10)));
    }

    #[test]
    fn functional_buildings_count_adjacent_bases() {
        let rules = Rules::default();
        let mut c = city();
        c.add_building(BuildingKind::Farm, Position::new(1, 1), &rules.buildings);
        c.add_building(BuildingKind::Farm, Position::new(3, 1), &rules.buildings);
        assert_eq!(c.population(), 4);

        let gained = c.add_building(BuildingKind::Windmill, Position::new(2, 1), &rules.buildings);
        assert_eq!(gained.population, 2);
        assert_eq!(c.population(), 6);

        // A new farm next to the windmill also picks up its bonus.
        let gained = c.add_building(BuildingKind::Farm, Position::new(2, 0), &rules.buildings);
        assert_eq!(gained.population, 3);
    }

    #[test]
    fn custom_house_pays_in_production() {
        let rules = Rules::default();
        let mut c = city();
        let base = c.production();
        c.add_building(BuildingKind::Port, Position::new(1, 2), &rules.buildings);
        c.add_building(BuildingKind::CustomHouse, Position::new(1, 3), &rules.buildings);
        assert_eq!(c.production(), base + 2);
    }

    #[test]
    fn removing_a_building_reverses_its_yield() {
        let rules = Rules::default();
        let mut c = city();
        c.add_building(BuildingKind::Mine, Position::new(1, 1), &rules.buildings);
        let before = c.clone();
        c.add_building(BuildingKind::Forge, Position::new(1, 2), &rules.buildings);
        assert_eq!(c.population(), before.population() + 2);

        let (kind, lost) = c
            .remove_building(Position::new(1, 2), &rules.buildings)
            .expect("forge present");
        assert_eq!(kind, BuildingKind::Forge);
        assert_eq!(lost.population, 2);
        assert_eq!(c, before);
    }

    #[test]
    fn temples_add_long_term_points() {
        let rules = Rules::default();
        let mut c = city();
        c.add_building(BuildingKind::Temple, Position::new(3, 3), &rules.buildings);
        assert_eq!(c.long_term_points(), 10);
    }
}
