use serde::{Deserialize, Serialize};

/// Board coordinate. Neighbourhood is 8-connected and distance is Chebyshev.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    pub fn is_adjacent(self, other: Position) -> bool {
        self.distance(other) == 1
    }

    /// All positions within `radius` (square), including `self`. Not bounds-checked.
    pub fn square(self, radius: i32) -> impl Iterator<Item = Position> {
        let radius = radius.max(0);
        (-radius..=radius).flat_map(move |dy| {
            (-radius..=radius).map(move |dx| Position::new(self.x + dx, self.y + dy))
        })
    }

    /// The eight surrounding positions. Not bounds-checked.
    pub fn neighbours(self) -> impl Iterator<Item = Position> {
        self.square(1).filter(move |p| *p != self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Plain,
    ShallowWater,
    DeepWater,
    Mountain,
    Village,
    City,
    Forest,
    /// Unknown to the observer of a redacted copy.
    Fog,
}

impl Terrain {
    pub fn is_water(self) -> bool {
        matches!(self, Terrain::ShallowWater | Terrain::DeepWater)
    }

    pub fn is_land(self) -> bool {
        matches!(
            self,
            Terrain::Plain | Terrain::Mountain | Terrain::Village | Terrain::City | Terrain::Forest
        )
    }

    /// Entering this terrain ends a unit's movement unless it travels along roads.
    pub fn stops_movement(self) -> bool {
        matches!(self, Terrain::Forest | Terrain::Mountain)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Fish,
    Fruit,
    Animal,
    Whales,
    Ore,
    Crops,
    Ruins,
}

impl ResourceKind {
    pub const GATHERABLE: [ResourceKind; 4] = [
        ResourceKind::Fish,
        ResourceKind::Fruit,
        ResourceKind::Animal,
        ResourceKind::Whales,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Farm,
    Mine,
    LumberHut,
    Port,
    Windmill,
    Sawmill,
    Forge,
    CustomHouse,
    Temple,
    WaterTemple,
    ForestTemple,
    MountainTemple,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 12] = [
        BuildingKind::Farm,
        BuildingKind::Mine,
        BuildingKind::LumberHut,
        BuildingKind::Port,
        BuildingKind::Windmill,
        BuildingKind::Sawmill,
        BuildingKind::Forge,
        BuildingKind::CustomHouse,
        BuildingKind::Temple,
        BuildingKind::WaterTemple,
        BuildingKind::ForestTemple,
        BuildingKind::MountainTemple,
    ];

    /// For functional buildings, the base building whose neighbours they boost.
    pub fn boosts(self) -> Option<BuildingKind> {
        match self {
            BuildingKind::Windmill => Some(BuildingKind::Farm),
            BuildingKind::Sawmill => Some(BuildingKind::LumberHut),
            BuildingKind::Forge => Some(BuildingKind::Mine),
            BuildingKind::CustomHouse => Some(BuildingKind::Port),
            _ => None,
        }
    }

    pub fn is_functional(self) -> bool {
        self.boosts().is_some()
    }

    pub fn is_temple(self) -> bool {
        matches!(
            self,
            BuildingKind::Temple
                | BuildingKind::WaterTemple
                | BuildingKind::ForestTemple
                | BuildingKind::MountainTemple
        )
    }

    /// Functional buildings are limited to one per city.
    pub fn is_unique(self) -> bool {
        self.is_functional()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Warrior,
    Archer,
    Defender,
    Rider,
    Swordsman,
    Catapult,
    Knight,
    MindBender,
    SuperUnit,
}

impl UnitKind {
    pub const SPAWNABLE: [UnitKind; 8] = [
        UnitKind::Warrior,
        UnitKind::Archer,
        UnitKind::Defender,
        UnitKind::Rider,
        UnitKind::Swordsman,
        UnitKind::Catapult,
        UnitKind::Knight,
        UnitKind::MindBender,
    ];
}

/// Per-turn unit status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    #[default]
    Fresh,
    Moved,
    Attacked,
    Finished,
}

impl TurnStatus {
    /// Status after performing an action that leaves the unit in `next`.
    pub fn transition(self, next: TurnStatus) -> TurnStatus {
        match (self, next) {
            (TurnStatus::Fresh, next) => next,
            (current, next) if current == next => current,
            _ => TurnStatus::Finished,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    Win,
    Loss,
    #[default]
    Incomplete,
}
