use serde::{Deserialize, Serialize};

use crate::{BuildingKind, ResourceKind, Technology, Terrain, UnitKind};

/// Combat stats fixed at unit creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    pub attack: i32,
    pub defence: i32,
    pub movement: i32,
    pub max_hp: i32,
    pub range: i32,
    pub cost: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRule {
    #[serde(flatten)]
    pub stats: UnitStats,
    /// Technology needed to spawn this unit. `None` means always available.
    #[serde(default)]
    pub tech: Option<Technology>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTable {
    pub warrior: UnitRule,
    pub archer: UnitRule,
    pub defender: UnitRule,
    pub rider: UnitRule,
    pub swordsman: UnitRule,
    pub catapult: UnitRule,
    pub knight: UnitRule,
    pub mind_bender: UnitRule,
    pub super_unit: UnitRule,
}

impl UnitTable {
    pub fn get(&self, kind: UnitKind) -> &UnitRule {
        match kind {
            UnitKind::Warrior => &self.warrior,
            UnitKind::Archer => &self.archer,
            UnitKind::Defender => &self.defender,
            UnitKind::Rider => &self.rider,
            UnitKind::Swordsman => &self.swordsman,
            UnitKind::Catapult => &self.catapult,
            UnitKind::Knight => &self.knight,
            UnitKind::MindBender => &self.mind_bender,
            UnitKind::SuperUnit => &self.super_unit,
        }
    }

    fn all(&self) -> [&UnitRule; 9] {
        [
            &self.warrior,
            &self.archer,
            &self.defender,
            &self.rider,
            &self.swordsman,
            &self.catapult,
            &self.knight,
            &self.mind_bender,
            &self.super_unit,
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingRule {
    pub cost: i32,
    pub tech: Technology,
    pub terrain: Terrain,
    /// Resource that must sit on the tile.
    #[serde(default)]
    pub resource: Option<ResourceKind>,
    /// Population granted by a base building.
    #[serde(default)]
    pub population: i32,
    /// Bonus per adjacent boosted building, for functional buildings.
    #[serde(default)]
    pub per_adjacent: i32,
    /// Long-term points per turn, for temples.
    #[serde(default)]
    pub points: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingTable {
    pub farm: BuildingRule,
    pub mine: BuildingRule,
    pub lumber_hut: BuildingRule,
    pub port: BuildingRule,
    pub windmill: BuildingRule,
    pub sawmill: BuildingRule,
    pub forge: BuildingRule,
    pub custom_house: BuildingRule,
    pub temple: BuildingRule,
    pub water_temple: BuildingRule,
    pub forest_temple: BuildingRule,
    pub mountain_temple: BuildingRule,
}

impl BuildingTable {
    pub fn get(&self, kind: BuildingKind) -> &BuildingRule {
        match kind {
            BuildingKind::Farm => &self.farm,
            BuildingKind::Mine => &self.mine,
            BuildingKind::LumberHut => &self.lumber_hut,
            BuildingKind::Port => &self.port,
            BuildingKind::Windmill => &self.windmill,
            BuildingKind::Sawmill => &self.sawmill,
            BuildingKind::Forge => &self.forge,
            BuildingKind::CustomHouse => &self.custom_house,
            BuildingKind::Temple => &self.temple,
            BuildingKind::WaterTemple => &self.water_temple,
            BuildingKind::ForestTemple => &self.forest_temple,
            BuildingKind::MountainTemple => &self.mountain_temple,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatherRule {
    pub cost: i32,
    pub tech: Technology,
    pub terrain: Terrain,
    #[serde(default)]
    pub population: i32,
    #[serde(default)]
    pub stars: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatherTable {
    pub fish: GatherRule,
    pub fruit: GatherRule,
    pub animal: GatherRule,
    pub whales: GatherRule,
}

impl GatherTable {
    /// `None` for resources that are built on rather than gathered.
    pub fn get(&self, kind: ResourceKind) -> Option<&GatherRule> {
        match kind {
            ResourceKind::Fish => Some(&self.fish),
            ResourceKind::Fruit => Some(&self.fruit),
            ResourceKind::Animal => Some(&self.animal),
            ResourceKind::Whales => Some(&self.whales),
            ResourceKind::Ore | ResourceKind::Crops | ResourceKind::Ruins => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRules {
    pub grow_forest: i32,
    pub burn_forest: i32,
    pub clear_forest_stars: i32,
    pub road: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealRules {
    pub recover: i32,
    /// Extra healing on a tile owned by one of the unit's tribe's cities.
    pub territory_bonus: i32,
    pub heal_others: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamineRules {
    pub population: i32,
    pub stars: i32,
    pub explorer_steps: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiplomacyRules {
    pub min_allegiance: i32,
    pub max_allegiance: i32,
    pub initial_allegiance: i32,
    /// Allegiance at or below this flips a peaceful pair to war.
    pub war_threshold: i32,
    /// Allegiance at or above this flips a warring pair back to peace.
    pub peace_threshold: i32,
    pub convert_repercussion: i32,
    pub attack_repercussion: i32,
    pub capture_repercussion: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchRules {
    pub base_cost: i32,
    pub points_per_tier: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRules {
    pub base_production: i32,
    pub capital_production: i32,
    pub workshop_production: i32,
    pub resources_bonus_stars: i32,
    pub population_growth: i32,
    pub park_points: i32,
    pub capture_points: i32,
    pub first_level_up_points: i32,
    pub level_up_points_base: i32,
    pub level_up_points_step: i32,
}

impl CityRules {
    /// Points earned when a city leaves `level`.
    pub fn level_up_points(&self, level: u32) -> i32 {
        if level <= 1 {
            self.first_level_up_points
        } else {
            (self.level_up_points_base - self.level_up_points_step * level as i32).max(0)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionRules {
    pub city: i32,
    pub unit: i32,
    pub explorer: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatRules {
    pub damage_factor: f64,
    pub terrain_defence: f64,
    pub wall_defence: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRules {
    pub starting_stars: i32,
    pub max_ticks: u32,
    pub veteran_kills: u32,
    pub veteran_hp_bonus: i32,
}

/// Every tunable constant of the game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    pub units: UnitTable,
    pub buildings: BuildingTable,
    pub gathering: GatherTable,
    pub costs: CostRules,
    pub heal: HealRules,
    pub examine: ExamineRules,
    pub diplomacy: DiplomacyRules,
    pub research: ResearchRules,
    pub city: CityRules,
    pub vision: VisionRules,
    pub combat: CombatRules,
    pub game: GameRules,
}

impl Rules {
    pub fn unit(&self, kind: UnitKind) -> &UnitRule {
        self.units.get(kind)
    }

    pub fn building(&self, kind: BuildingKind) -> &BuildingRule {
        self.buildings.get(kind)
    }

    pub fn research_cost(&self, tech: Technology, num_cities: usize) -> i32 {
        tech.tier() as i32 * num_cities.max(1) as i32 + self.research.base_cost
    }

    pub(crate) fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let d = &self.diplomacy;
        if d.min_allegiance > d.max_allegiance {
            errors.push("diplomacy.min_allegiance exceeds max_allegiance".to_string());
        }
        if !(d.min_allegiance..=d.max_allegiance).contains(&d.initial_allegiance) {
            errors.push("diplomacy.initial_allegiance outside bounds".to_string());
        }
        if d.war_threshold >= d.peace_threshold {
            errors.push("diplomacy.war_threshold must be below peace_threshold".to_string());
        }
        for rule in self.units.all() {
            if rule.stats.max_hp <= 0 {
                errors.push("unit max_hp must be positive".to_string());
            }
            if rule.stats.cost < 0 || rule.stats.movement < 0 || rule.stats.range < 0 {
                errors.push("unit cost, movement and range must not be negative".to_string());
            }
        }
        for kind in BuildingKind::ALL {
            if self.building(kind).cost < 0 {
                errors.push(format!("building {kind:?} has a negative cost"));
            }
        }
        let c = &self.costs;
        if c.grow_forest < 0 || c.burn_forest < 0 || c.road < 0 {
            errors.push("costs must not be negative".to_string());
        }
        errors
    }
}

const fn unit(
    attack: i32,
    defence: i32,
    movement: i32,
    max_hp: i32,
    range: i32,
    cost: i32,
    tech: Option<Technology>,
) -> UnitRule {
    UnitRule {
        stats: UnitStats {
            attack,
            defence,
            movement,
            max_hp,
            range,
            cost,
        },
        tech,
    }
}

const fn building(
    cost: i32,
    tech: Technology,
    terrain: Terrain,
    resource: Option<ResourceKind>,
) -> BuildingRule {
    BuildingRule {
        cost,
        tech,
        terrain,
        resource,
        population: 0,
        per_adjacent: 0,
        points: 0,
    }
}

impl Default for Rules {
    fn default() -> Self {
        use Technology as T;
        Self {
            units: UnitTable {
                warrior: unit(2, 2, 1, 10, 1, 2, None),
                archer: unit(2, 1, 1, 10, 2, 3, Some(T::Archery)),
                defender: unit(1, 3, 1, 15, 1, 3, Some(T::Shields)),
                rider: unit(2, 1, 2, 10, 1, 3, Some(T::Riding)),
                swordsman: unit(3, 3, 1, 15, 1, 5, Some(T::Smithery)),
                catapult: unit(4, 0, 1, 10, 3, 8, Some(T::Mathematics)),
                knight: unit(3, 1, 3, 10, 1, 8, Some(T::Chivalry)),
                mind_bender: unit(0, 1, 1, 10, 1, 5, Some(T::Philosophy)),
                super_unit: unit(5, 4, 1, 40, 1, 10, None),
            },
            buildings: BuildingTable {
                farm: BuildingRule {
                    population: 2,
                    ..building(5, T::Farming, Terrain::Plain, Some(ResourceKind::Crops))
                },
                mine: BuildingRule {
                    population: 2,
                    ..building(5, T::Mining, Terrain::Mountain, Some(ResourceKind::Ore))
                },
                lumber_hut: BuildingRule {
                    population: 1,
                    ..building(3, T::Forestry, Terrain::Forest, None)
                },
                port: BuildingRule {
                    population: 1,
                    ..building(7, T::Fishing, Terrain::ShallowWater, None)
                },
                windmill: BuildingRule {
                    per_adjacent: 1,
                    ..building(5, T::Construction, Terrain::Plain, None)
                },
                sawmill: BuildingRule {
                    per_adjacent: 1,
                    ..building(5, T::Mathematics, Terrain::Plain, None)
                },
                forge: BuildingRule {
                    per_adjacent: 2,
                    ..building(5, T::Smithery, Terrain::Plain, None)
                },
                custom_house: BuildingRule {
                    per_adjacent: 2,
                    ..building(5, T::Trade, Terrain::Plain, None)
                },
                temple: BuildingRule {
                    points: 10,
                    ..building(10, T::FreeSpirit, Terrain::Plain, None)
                },
                water_temple: BuildingRule {
                    points: 10,
                    ..building(10, T::Aquatism, Terrain::ShallowWater, None)
                },
                forest_temple: BuildingRule {
                    points: 10,
                    ..building(10, T::Spiritualism, Terrain::Forest, None)
                },
                mountain_temple: BuildingRule {
                    points: 10,
                    ..building(10, T::Meditation, Terrain::Mountain, None)
                },
            },
            gathering: GatherTable {
                fish: GatherRule {
                    cost: 2,
                    tech: T::Fishing,
                    terrain: Terrain::ShallowWater,
                    population: 1,
                    stars: 0,
                },
                fruit: GatherRule {
                    cost: 2,
                    tech: T::Organization,
                    terrain: Terrain::Plain,
                    population: 1,
                    stars: 0,
                },
                animal: GatherRule {
                    cost: 2,
                    tech: T::Hunting,
                    terrain: Terrain::Forest,
                    population: 1,
                    stars: 0,
                },
                whales: GatherRule {
                    cost: 0,
                    tech: T::Whaling,
                    terrain: Terrain::DeepWater,
                    population: 0,
                    stars: 10,
                },
            },
            costs: CostRules {
                grow_forest: 5,
                burn_forest: 5,
                clear_forest_stars: 1,
                road: 2,
            },
            heal: HealRules {
                recover: 2,
                territory_bonus: 2,
                heal_others: 4,
            },
            examine: ExamineRules {
                population: 3,
                stars: 10,
                explorer_steps: 15,
            },
            diplomacy: DiplomacyRules {
                min_allegiance: -60,
                max_allegiance: 60,
                initial_allegiance: 0,
                war_threshold: -30,
                peace_threshold: 30,
                convert_repercussion: 5,
                attack_repercussion: 2,
                capture_repercussion: 10,
            },
            research: ResearchRules {
                base_cost: 4,
                points_per_tier: 100,
            },
            city: CityRules {
                base_production: 1,
                capital_production: 1,
                workshop_production: 1,
                resources_bonus_stars: 5,
                population_growth: 3,
                park_points: 10,
                capture_points: 100,
                first_level_up_points: 100,
                level_up_points_base: 50,
                level_up_points_step: 5,
            },
            vision: VisionRules {
                city: 2,
                unit: 1,
                explorer: 1,
            },
            combat: CombatRules {
                damage_factor: 4.5,
                terrain_defence: 1.5,
                wall_defence: 4.0,
            },
            game: GameRules {
                starting_stars: 5,
                max_ticks: 50,
                veteran_kills: 3,
                veteran_hp_bonus: 5,
            },
        }
    }
}
