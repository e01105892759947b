use serde::{Deserialize, Serialize};

use crate::{
    ActorId, BuildingKind, City, GameState, ResourceKind, Terrain, Tribe, TurnPhase, Unit,
};

/// Serializable export of a game at one instant: per-cell layers in row-major order plus every
/// live actor. Meant for viewers and logs; field layout may change between versions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub tick: u32,
    pub active_tribe: ActorId,
    pub phase: TurnPhase,
    pub game_over: bool,
    pub size: usize,
    pub terrain: Vec<Terrain>,
    pub resources: Vec<Option<ResourceKind>>,
    pub buildings: Vec<Option<BuildingKind>>,
    pub unit_layer: Vec<Option<ActorId>>,
    pub city_layer: Vec<Option<ActorId>>,
    pub roads: Vec<bool>,
    pub tribes: Vec<Tribe>,
    pub cities: Vec<City>,
    pub units: Vec<Unit>,
}

impl GameSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let board = state.board();
        let tiles = board.tiles();
        let actors = board.actors();
        Self {
            tick: state.tick(),
            active_tribe: state.active_tribe(),
            phase: state.phase(),
            game_over: state.is_game_over(),
            size: board.size(),
            terrain: tiles.iter().map(|t| t.terrain).collect(),
            resources: tiles.iter().map(|t| t.resource).collect(),
            buildings: tiles.iter().map(|t| t.building).collect(),
            unit_layer: tiles.iter().map(|t| t.unit).collect(),
            city_layer: tiles.iter().map(|t| t.city).collect(),
            roads: tiles.iter().map(|t| t.road).collect(),
            tribes: board
                .tribe_ids()
                .filter_map(|id| board.tribe(id).cloned())
                .collect(),
            cities: actors.cities().cloned().collect(),
            units: actors.units().cloned().collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::encode::to_vec(self)
    }

    pub fn from_msgpack(data: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::decode::from_slice(data)
    }
}
