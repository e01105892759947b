//! Headless self-play: agents pick from the action catalogue until the game ends.
//!
//! The driver owns the turn machine. Each turn runs `init_turn`, then feeds the agent's choices
//! to `GameState::next` until an `EndTurn` goes through, and finishes with `end_turn`. An agent
//! that passes, or a catalogue with nothing left but ending the turn, requests `EndTurn`; while a
//! city still has to grow that request is refused and the turn stays open. Only an exhausted turn
//! budget closes a turn with `force_end_turn`. A tick closes once every tribe still in the game
//! has played.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    Action, ActorId, Event, GameResult, GameRng, GameState, InitError, LevelData, Rules, Tribe,
    TribeKind, TurnPhase,
};

/// Something that chooses moves for one tribe.
pub trait Agent: Send {
    /// Next action for the active tribe, or `None` to ask for the end of the turn.
    fn act(&mut self, state: &GameState) -> Option<Action>;
}

/// Picks uniformly among everything the catalogue offers.
#[derive(Clone, Debug)]
pub struct RandomAgent {
    rng: GameRng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: GameRng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn act(&mut self, state: &GameState) -> Option<Action> {
        let actions: Vec<&Action> = state.catalogue().iter().collect();
        self.rng.choose(&actions).map(|&&action| action)
    }
}

/// Limits on one turn. Rejected actions count against `max_actions` too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnBudget {
    pub max_actions: usize,
    #[serde(default)]
    pub max_duration: Option<Duration>,
}

impl TurnBudget {
    fn exhausted(&self, attempts: usize, elapsed: Duration) -> bool {
        attempts >= self.max_actions || self.max_duration.is_some_and(|limit| elapsed >= limit)
    }
}

impl Default for TurnBudget {
    fn default() -> Self {
        Self {
            max_actions: 64,
            max_duration: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub tribe: Option<ActorId>,
    pub applied: usize,
    pub rejected: usize,
    /// The budget ran out and the turn was closed by the driver.
    pub forced: bool,
    pub events: Vec<Event>,
}

/// Plays one full turn of `tribe`.
pub fn play_turn(
    state: &mut GameState,
    tribe: ActorId,
    agent: &mut dyn Agent,
    budget: &TurnBudget,
) -> TurnOutcome {
    let mut outcome = TurnOutcome {
        tribe: Some(tribe),
        events: state.init_turn(tribe),
        ..TurnOutcome::default()
    };
    let started = Instant::now();

    while state.phase() == TurnPhase::ActionLoop {
        if budget.exhausted(outcome.applied + outcome.rejected, started.elapsed()) {
            warn!(?tribe, applied = outcome.applied, "turn budget exhausted, forcing end of turn");
            outcome.forced = true;
            break;
        }
        let end = Action::EndTurn { tribe };
        let action = if state.exist_available_actions() {
            agent.act(state).unwrap_or(end)
        } else {
            end
        };
        match state.next(&action) {
            Ok(events) => {
                outcome.applied += 1;
                outcome.events.extend(events);
            }
            Err(err) => {
                outcome.rejected += 1;
                debug!(?tribe, ?action, %err, "action rejected");
            }
        }
    }

    if state.is_game_over() || state.phase() == TurnPhase::AwaitingInit {
        return outcome;
    }
    if outcome.forced {
        outcome.events.extend(state.force_end_turn(tribe));
        return outcome;
    }
    match state.end_turn(tribe) {
        Ok(events) => outcome.events.extend(events),
        Err(err) => {
            warn!(?tribe, %err, "turn end refused, forcing it");
            outcome.forced = true;
            outcome.events.extend(state.force_end_turn(tribe));
        }
    }
    outcome
}

/// Plays every remaining turn of the current tick, then advances the tick. `agents` is indexed
/// by tribe id; a tribe without an agent passes every turn.
pub fn play_tick(
    state: &mut GameState,
    agents: &mut [Box<dyn Agent>],
    budget: &TurnBudget,
) -> Vec<TurnOutcome> {
    let mut outcomes = Vec::new();
    while let Some(tribe) = state.next_active_tribe() {
        if state.is_game_over() {
            break;
        }
        let outcome = match agents.get_mut(tribe.index()) {
            Some(agent) => play_turn(state, tribe, agent.as_mut(), budget),
            None => play_turn(state, tribe, &mut Passive, budget),
        };
        outcomes.push(outcome);
    }
    if !state.is_game_over() {
        state.inc_tick();
        state.game_over_check();
    }
    outcomes
}

struct Passive;

impl Agent for Passive {
    fn act(&mut self, _state: &GameState) -> Option<Action> {
        None
    }
}

// =============================================================================
// Whole games
// =============================================================================

/// Configuration for self-play runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfPlayConfig {
    /// Seed for the game and, offset by tribe index, for each random agent.
    pub seed: u64,
    /// One entry per capital in the level.
    pub tribes: Vec<TribeKind>,
    pub budget: TurnBudget,
    /// Overrides the tick limit from the rules.
    pub max_ticks: Option<u32>,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tribes: vec![
                TribeKind::XinXi,
                TribeKind::Imperius,
                TribeKind::Bardur,
                TribeKind::Oumaji,
            ],
            budget: TurnBudget::default(),
            max_ticks: None,
        }
    }
}

/// Counters gathered from the event stream of one game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetrics {
    pub actions_applied: usize,
    pub actions_rejected: usize,
    pub forced_turns: usize,
    pub units_killed: u32,
    pub cities_founded: u32,
    pub cities_captured: u32,
    pub techs_researched: u32,
    pub wars_declared: u32,
}

impl GameMetrics {
    fn record(&mut self, outcome: &TurnOutcome) {
        self.actions_applied += outcome.applied;
        self.actions_rejected += outcome.rejected;
        self.forced_turns += usize::from(outcome.forced);
        for event in &outcome.events {
            match event {
                Event::UnitKilled { .. } => self.units_killed += 1,
                Event::CityFounded { .. } => self.cities_founded += 1,
                Event::CityCaptured { .. } => self.cities_captured += 1,
                Event::TechResearched { .. } => self.techs_researched += 1,
                Event::RelationshipChanged {
                    relationship: crate::Relationship::War,
                    ..
                } => self.wars_declared += 1,
                _ => {}
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelfPlayResult {
    pub seed: u64,
    pub ticks: u32,
    pub scores: Vec<(ActorId, i32)>,
    pub results: Vec<(ActorId, GameResult)>,
    pub metrics: GameMetrics,
    /// Wall clock time.
    pub duration_ms: u64,
}

impl SelfPlayResult {
    pub fn winners(&self) -> Vec<ActorId> {
        self.results
            .iter()
            .filter(|&&(_, result)| result == GameResult::Win)
            .map(|&(id, _)| id)
            .collect()
    }
}

/// Runs one game between random agents.
pub fn run_selfplay(
    rules: Arc<Rules>,
    level: &LevelData,
    config: &SelfPlayConfig,
) -> Result<SelfPlayResult, InitError> {
    let started = Instant::now();
    let rules = match config.max_ticks {
        Some(max_ticks) => {
            let mut custom = (*rules).clone();
            custom.game.max_ticks = max_ticks;
            Arc::new(custom)
        }
        None => rules,
    };

    let tribes: Vec<Tribe> = config.tribes.iter().map(|&kind| Tribe::new(kind)).collect();
    let mut state = GameState::new(tribes, level, rules, config.seed)?;
    let mut agents: Vec<Box<dyn Agent>> = (0..config.tribes.len() as u64)
        .map(|i| Box::new(RandomAgent::new(config.seed.wrapping_add(i + 1))) as Box<dyn Agent>)
        .collect();

    let mut metrics = GameMetrics::default();
    while !state.is_game_over() {
        for outcome in play_tick(&mut state, &mut agents, &config.budget) {
            metrics.record(&outcome);
        }
    }

    let result = SelfPlayResult {
        seed: config.seed,
        ticks: state.tick(),
        scores: state.scores(),
        results: state.winner_status(),
        metrics,
        duration_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        seed = result.seed,
        ticks = result.ticks,
        winners = ?result.winners(),
        "self-play game finished"
    );
    Ok(result)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSelfPlayResult {
    pub games_played: u32,
    pub results: Vec<SelfPlayResult>,
    /// Fraction of games each tribe won, ties included.
    pub win_rates: Vec<f64>,
    pub avg_ticks: f64,
}

/// Runs `games` games with consecutive seeds.
pub fn run_batch_selfplay(
    rules: Arc<Rules>,
    level: &LevelData,
    config: &SelfPlayConfig,
    games: u32,
) -> Result<BatchSelfPlayResult, InitError> {
    let mut results = Vec::with_capacity(games as usize);
    for i in 0..games {
        let game_config = SelfPlayConfig {
            seed: config.seed.wrapping_add(u64::from(i)),
            ..config.clone()
        };
        results.push(run_selfplay(Arc::clone(&rules), level, &game_config)?);
    }

    if results.is_empty() {
        return Ok(BatchSelfPlayResult::default());
    }
    let n = results.len() as f64;
    let mut wins = vec![0u32; config.tribes.len()];
    for winner in results.iter().flat_map(SelfPlayResult::winners) {
        if let Some(count) = wins.get_mut(winner.index()) {
            *count += 1;
        }
    }
    let avg_ticks = results.iter().map(|r| f64::from(r.ticks)).sum::<f64>() / n;

    Ok(BatchSelfPlayResult {
        games_played: games,
        win_rates: wins.iter().map(|&w| f64::from(w) / n).collect(),
        avg_ticks,
        results,
    })
}
