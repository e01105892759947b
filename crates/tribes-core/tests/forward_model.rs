use std::sync::Arc;
use std::thread;

use tribes_core::{
    play_tick, ActorId, Agent, GameState, LevelData, RandomAgent, Rules, Terrain, Tribe,
    TribeKind, TurnBudget, TurnPhase, SKIRMISH_LEVEL,
};

fn agents(seed: u64) -> Vec<Box<dyn Agent>> {
    (0..4)
        .map(|i| Box::new(RandomAgent::new(seed + i)) as Box<dyn Agent>)
        .collect()
}

/// A skirmish after `ticks` rounds of random play, between turns.
fn midgame(seed: u64, ticks: u32) -> GameState {
    let level = LevelData::parse(SKIRMISH_LEVEL).expect("level");
    let tribes = vec![
        Tribe::new(TribeKind::XinXi),
        Tribe::new(TribeKind::Imperius),
        Tribe::new(TribeKind::Bardur),
        Tribe::new(TribeKind::Oumaji),
    ];
    let mut state = GameState::new(tribes, &level, Arc::new(Rules::default()), seed).expect("game");
    let mut players = agents(seed);
    let budget = TurnBudget::default();
    for _ in 0..ticks {
        play_tick(&mut state, &mut players, &budget);
    }
    state
}

#[test]
fn full_copy_matches_and_then_diverges_alone() {
    let mut state = midgame(5, 3);
    let tribe = state.next_active_tribe().unwrap_or(ActorId(0));
    state.init_turn(tribe);
    if state.phase() != TurnPhase::ActionLoop {
        return;
    }
    let pristine = state.clone();

    let mut copy = state.copy(None);
    assert_eq!(copy, state);

    let action = *copy.catalogue().iter().next().expect("an action");
    copy.next(&action).expect("listed action applies");
    assert_ne!(copy, state);
    assert_eq!(state, pristine);
}

#[test]
fn observer_copy_hides_the_unseen() {
    let mut state = midgame(9, 4);
    if state.is_game_over() {
        return;
    }
    let observer = state.next_active_tribe().expect("a tribe to play");
    state.init_turn(observer);

    let copy = state.copy(Some(observer));
    let seen = state.board().tribe(observer).expect("tribe").visibility().to_vec();
    let board = copy.board();
    for (index, tile) in board.tiles().iter().enumerate() {
        if seen[index] {
            assert_eq!(tile.terrain, state.board().tiles()[index].terrain);
            continue;
        }
        assert_eq!(tile.terrain, Terrain::Fog);
        assert_eq!(tile.resource, None);
        assert_eq!(tile.building, None);
        assert!(!tile.road);
        if let Some(unit) = tile.unit.and_then(|id| board.unit(id)) {
            assert_eq!(unit.tribe_id, observer);
        }
    }
    for unit in state.board().units_of(observer) {
        assert!(board.unit(unit).is_some(), "own unit {unit:?} vanished");
    }

    assert_eq!(copy.phase(), TurnPhase::ActionLoop);
    for action in copy.catalogue().iter() {
        assert!(action.is_feasible(&copy), "{action:?} offered on the redacted board");
    }
}

#[test]
fn parallel_rollouts_leave_the_source_untouched() {
    let state = midgame(21, 2);
    let pristine = state.clone();
    let seeds = [1_u64, 1, 2, 3];

    let finished: Vec<GameState> = thread::scope(|scope| {
        let handles: Vec<_> = seeds
            .iter()
            .map(|&seed| {
                let source = &state;
                scope.spawn(move || {
                    let mut rollout = source.copy_with_seed(None, seed);
                    let mut players = agents(seed * 100);
                    let budget = TurnBudget::default();
                    for _ in 0..3 {
                        play_tick(&mut rollout, &mut players, &budget);
                    }
                    rollout
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("rollout thread"))
            .collect()
    });

    assert_eq!(state, pristine);
    assert_eq!(finished[0], finished[1]);
    assert!(finished.iter().all(|s| s.tick() >= state.tick()));
}
