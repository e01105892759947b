mod actions;
mod board;
mod city;
mod combat;
mod diplomacy;
mod game;
mod level;
mod registry;
mod rng;
mod rules;
pub mod selfplay;
mod snapshot;
mod tech;
mod tribe;
mod types;
mod unit;

pub use crate::actions::*;
pub use crate::board::*;
pub use crate::city::*;
pub use crate::combat::*;
pub use crate::diplomacy::*;
pub use crate::game::*;
pub use crate::level::*;
pub use crate::registry::*;
pub use crate::rng::*;
pub use crate::rules::*;
pub use crate::selfplay::{
    play_tick, play_turn, run_batch_selfplay, run_selfplay, Agent, BatchSelfPlayResult,
    GameMetrics, RandomAgent, SelfPlayConfig, SelfPlayResult, TurnBudget, TurnOutcome,
};
pub use crate::snapshot::*;
pub use crate::tech::*;
pub use crate::tribe::*;
pub use crate::types::*;
pub use crate::unit::*;
