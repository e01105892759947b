use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    actions::recover_amount, build_board, Action, ActionCatalogue, ActionError, ActorId, Board,
    Event, GameResult, GameRng, GameSnapshot, InitError, LevelData, Rules, Tribe, TurnStatus,
};

/// Where the active tribe is in its turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Between turns; `init_turn` has not run for anyone yet.
    #[default]
    AwaitingInit,
    /// Actions are being accepted for the active tribe.
    ActionLoop,
    /// The active tribe asked to end its turn; `end_turn` is next.
    TurnEnding,
}

// =============================================================================
// Game state
// =============================================================================

/// The authoritative game: board, turn bookkeeping, the active tribe's action catalogue and the
/// random stream actions draw from.
///
/// A state is cheap to `copy` and copies share nothing mutable with their source, so search
/// code can drive one copy per thread.
#[derive(Clone, Debug)]
pub struct GameState {
    pub(crate) rules: Arc<Rules>,
    pub(crate) board: Board,
    pub(crate) tick: u32,
    pub(crate) active_tribe: ActorId,
    pub(crate) phase: TurnPhase,
    pub(crate) turn_done: Vec<bool>,
    pub(crate) catalogue: ActionCatalogue,
    pub(crate) rng: GameRng,
    pub(crate) game_over: bool,
}

/// Equal when everything observable matches; the random stream is not compared.
impl PartialEq for GameState {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules
            && self.board == other.board
            && self.tick == other.tick
            && self.active_tribe == other.active_tribe
            && self.phase == other.phase
            && self.turn_done == other.turn_done
            && self.catalogue == other.catalogue
            && self.game_over == other.game_over
    }
}

impl GameState {
    /// Sets up a game from level data. Tribes take ids in the order given; tribe `n` gets the
    /// capital marked `c<n>` in the level. No turn is started.
    pub fn new(
        tribes: Vec<Tribe>,
        level: &LevelData,
        rules: Arc<Rules>,
        seed: u64,
    ) -> Result<Self, InitError> {
        let board = build_board(tribes, level, &rules)?;
        let tribe_count = board.tribe_count();
        debug!(tribe_count, seed, "game created");
        Ok(Self {
            rules,
            board,
            tick: 0,
            active_tribe: ActorId(0),
            phase: TurnPhase::AwaitingInit,
            turn_done: vec![false; tribe_count],
            catalogue: ActionCatalogue::default(),
            rng: GameRng::seed_from_u64(seed),
            game_over: false,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Direct board access for scenario setup. Bypasses every rule check.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn active_tribe(&self) -> ActorId {
        self.active_tribe
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn catalogue(&self) -> &ActionCatalogue {
        &self.catalogue
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_turn_done(&self, tribe: ActorId) -> bool {
        self.turn_done.get(tribe.index()).copied().unwrap_or(true)
    }

    // =========================================================================
    // Action loop
    // =========================================================================

    /// Rebuilds the catalogue for `tribe` from the current state.
    pub fn compute_player_actions(&mut self, tribe: ActorId) -> &ActionCatalogue {
        self.catalogue = ActionCatalogue::compute(self, tribe);
        &self.catalogue
    }

    /// Whether the catalogue offers anything besides ending the turn.
    pub fn exist_available_actions(&self) -> bool {
        self.catalogue.has_playable_actions()
    }

    /// Re-validates `action` against the current state and applies it. On error nothing changed
    /// and the caller should choose again. The catalogue is refreshed after every applied action.
    pub fn next(&mut self, action: &Action) -> Result<Vec<Event>, ActionError> {
        let events = action.execute(self)?;
        if events
            .iter()
            .any(|e| matches!(e, Event::TribeEliminated { .. }))
        {
            self.game_over_check();
        }
        if self.phase == TurnPhase::ActionLoop && !self.game_over {
            self.compute_player_actions(self.active_tribe);
        } else {
            self.catalogue = ActionCatalogue::default();
        }
        Ok(events)
    }

    /// Like `next`, reporting only whether the action was applied.
    pub fn apply(&mut self, action: &Action) -> bool {
        self.next(action).is_ok()
    }

    // =========================================================================
    // Turn hooks
    // =========================================================================

    /// Starts `tribe`'s turn: collects star income from every city, refreshes its units and
    /// opens the action loop. A tribe that already lost only gets marked done.
    pub fn init_turn(&mut self, tribe: ActorId) -> Vec<Event> {
        let Some(t) = self.board.tribe(tribe) else {
            return Vec::new();
        };
        if self.game_over || t.result == GameResult::Loss {
            self.mark_done(tribe);
            return Vec::new();
        }

        let income: i32 = t
            .cities()
            .iter()
            .filter_map(|&c| self.board.city(c))
            .map(|c| c.production())
            .sum();
        if let Some(t) = self.board.tribe_mut(tribe) {
            t.add_stars(income);
            t.clear_gifts();
        }
        for unit in self.board.units_mut().filter(|u| u.tribe_id == tribe) {
            unit.status = TurnStatus::Fresh;
        }

        self.active_tribe = tribe;
        self.phase = TurnPhase::ActionLoop;
        self.compute_player_actions(tribe);
        debug!(?tribe, tick = self.tick, income, "turn started");

        let mut events = Vec::new();
        if income > 0 {
            events.push(Event::StarsGained {
                tribe,
                amount: income,
            });
        }
        events
    }

    /// Whether one of `tribe`'s cities is ready to level up and has not yet.
    pub fn growth_pending(&self, tribe: ActorId) -> bool {
        self.board.tribe(tribe).is_some_and(|t| {
            t.cities()
                .iter()
                .filter_map(|&c| self.board.city(c))
                .any(|c| c.can_level_up())
        })
    }

    /// Closes `tribe`'s turn: units that did nothing recover, the turn's city points and every
    /// city's long-term points go to the score, and the tribe is done for this tick. Refused
    /// while a city still has to level up.
    pub fn end_turn(&mut self, tribe: ActorId) -> Result<Vec<Event>, ActionError> {
        if self.growth_pending(tribe) {
            return Err(ActionError::CannotEndTurn);
        }
        Ok(self.force_end_turn(tribe))
    }

    /// `end_turn` without the growth check, for drivers whose turn budget ran out.
    pub fn force_end_turn(&mut self, tribe: ActorId) -> Vec<Event> {
        let mut events = Vec::new();

        let resting: Vec<(ActorId, i32)> = self
            .board
            .units_of(tribe)
            .into_iter()
            .filter_map(|id| self.board.unit(id))
            .filter(|u| u.status == TurnStatus::Fresh && u.is_injured())
            .map(|u| (u.id(), recover_amount(self, u)))
            .collect();
        for (id, amount) in resting {
            if let Some(unit) = self.board.unit_mut(id) {
                let healed = unit.heal(amount);
                if healed > 0 {
                    events.push(Event::UnitHealed {
                        unit: id,
                        amount: healed,
                    });
                }
            }
        }

        let cities: Vec<ActorId> = self
            .board
            .tribe(tribe)
            .map(|t| t.cities().to_vec())
            .unwrap_or_default();
        let mut points = 0;
        for id in cities {
            if let Some(city) = self.board.city_mut(id) {
                points += city.take_points() + city.long_term_points();
            }
        }
        if let Some(t) = self.board.tribe_mut(tribe) {
            t.score += points;
        }

        self.mark_done(tribe);
        self.phase = TurnPhase::AwaitingInit;
        self.catalogue = ActionCatalogue::default();
        debug!(?tribe, points, "turn ended");
        events
    }

    fn mark_done(&mut self, tribe: ActorId) {
        if let Some(done) = self.turn_done.get_mut(tribe.index()) {
            *done = true;
        }
    }

    /// The next tribe to play this tick, skipping tribes that are done or out of the game.
    pub fn next_active_tribe(&self) -> Option<ActorId> {
        self.board.tribe_ids().find(|&id| {
            !self.is_turn_done(id)
                && self
                    .board
                    .tribe(id)
                    .is_some_and(|t| t.result != GameResult::Loss)
        })
    }

    pub fn inc_tick(&mut self) {
        self.tick += 1;
        self.turn_done.fill(false);
    }

    /// Marks tribes without cities as lost and decides whether the game is over. Once over, the
    /// highest scores among the surviving tribes win; tied scores all win.
    pub fn game_over_check(&mut self) -> bool {
        if self.game_over {
            return true;
        }

        let ids: Vec<ActorId> = self.board.tribe_ids().collect();
        for &id in &ids {
            if let Some(t) = self.board.tribe_mut(id) {
                if t.result != GameResult::Loss && t.cities().is_empty() {
                    t.result = GameResult::Loss;
                    info!(tribe = ?id, "tribe has no cities left");
                }
            }
        }

        let alive: Vec<ActorId> = ids
            .into_iter()
            .filter(|&id| {
                self.board
                    .tribe(id)
                    .is_some_and(|t| t.result != GameResult::Loss)
            })
            .collect();
        if alive.len() > 1 && self.tick < self.rules.game.max_ticks {
            return false;
        }

        self.game_over = true;
        self.phase = TurnPhase::AwaitingInit;
        self.catalogue = ActionCatalogue::default();

        let best = alive
            .iter()
            .filter_map(|&id| self.board.tribe(id))
            .map(|t| t.score)
            .max();
        for id in alive {
            if let Some(t) = self.board.tribe_mut(id) {
                t.result = if Some(t.score) == best {
                    GameResult::Win
                } else {
                    GameResult::Loss
                };
            }
        }
        info!(tick = self.tick, winners = ?self.winners(), "game over");
        true
    }

    pub fn scores(&self) -> Vec<(ActorId, i32)> {
        self.board
            .tribe_ids()
            .filter_map(|id| self.board.tribe(id).map(|t| (id, t.score)))
            .collect()
    }

    pub fn winner_status(&self) -> Vec<(ActorId, GameResult)> {
        self.board
            .tribe_ids()
            .filter_map(|id| self.board.tribe(id).map(|t| (id, t.result)))
            .collect()
    }

    fn winners(&self) -> Vec<ActorId> {
        self.winner_status()
            .into_iter()
            .filter(|&(_, result)| result == GameResult::Win)
            .map(|(id, _)| id)
            .collect()
    }

    // =========================================================================
    // Forward model
    // =========================================================================

    /// Independent copy for lookahead. With an observer, cells that tribe cannot see are
    /// redacted and the catalogue is rebuilt from the redacted board. The copy's random stream
    /// is forked from this one, so two copies made from the same state replay identically.
    pub fn copy(&self, observer: Option<ActorId>) -> GameState {
        let salt = observer.map_or(u64::MAX, |t| u64::from(t.0));
        self.copy_with_rng(observer, self.rng.fork(salt))
    }

    /// Like `copy`, with the copy's random stream seeded explicitly.
    pub fn copy_with_seed(&self, observer: Option<ActorId>, seed: u64) -> GameState {
        self.copy_with_rng(observer, GameRng::seed_from_u64(seed))
    }

    fn copy_with_rng(&self, observer: Option<ActorId>, rng: GameRng) -> GameState {
        let mut copy = GameState {
            rules: Arc::clone(&self.rules),
            board: self.board.copy(observer.is_some(), observer),
            tick: self.tick,
            active_tribe: self.active_tribe,
            phase: self.phase,
            turn_done: self.turn_done.clone(),
            catalogue: ActionCatalogue::default(),
            rng,
            game_over: self.game_over,
        };
        copy.catalogue = if observer.is_some() && copy.phase == TurnPhase::ActionLoop {
            ActionCatalogue::compute(&copy, copy.active_tribe)
        } else {
            self.catalogue.clone()
        };
        copy
    }

    /// Export view of the board and every actor.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::capture(self)
    }
}
