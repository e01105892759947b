use std::sync::Arc;

use tribes_core::{
    Action, GameRng, GameState, LevelData, Rules, Tribe, TribeKind, TurnPhase, SKIRMISH_LEVEL,
};

const TICKS: u32 = 6;
const ACTIONS_PER_TURN: usize = 30;
const SEEDS: u64 = 8;

fn skirmish(seed: u64) -> GameState {
    let level = LevelData::parse(SKIRMISH_LEVEL).expect("level");
    let tribes = vec![
        Tribe::new(TribeKind::XinXi),
        Tribe::new(TribeKind::Imperius),
        Tribe::new(TribeKind::Bardur),
        Tribe::new(TribeKind::Oumaji),
    ];
    GameState::new(tribes, &level, Arc::new(Rules::default()), seed).expect("game")
}

/// Registry, tiles, rosters and diplomacy all tell the same story.
fn assert_consistent(state: &GameState) {
    let board = state.board();
    let actors = board.actors();

    for unit in actors.units() {
        let id = unit.id();
        assert_eq!(board.unit_at(unit.position), Some(id), "{id:?} is off its tile");
        assert!(unit.hp() > 0 && unit.hp() <= unit.max_hp(), "{id:?} has hp {}", unit.hp());
        let owner = board.tribe(unit.tribe_id).expect("owner exists");
        match unit.city_id {
            Some(city) => {
                let home = board.city(city).expect("home city exists");
                assert!(home.units().contains(&id), "{id:?} missing from its roster");
                assert_eq!(home.tribe_id, unit.tribe_id);
            }
            None => assert!(owner.extra_units().contains(&id), "{id:?} is unaccounted for"),
        }
    }

    for (index, tile) in board.tiles().iter().enumerate() {
        if let Some(id) = tile.unit {
            let unit = board.unit(id).expect("tile points at a live unit");
            assert_eq!(board.position_of(index), Some(unit.position));
        }
    }

    for city in actors.cities() {
        assert_eq!(board.city_at(city.position), Some(city.id()));
        assert!(city.units().len() <= city.level() as usize);
        assert!(board
            .tribe(city.tribe_id)
            .is_some_and(|t| t.cities().contains(&city.id())));
    }

    let diplomacy = board.diplomacy();
    let bounds = &state.rules().diplomacy;
    for id in board.tribe_ids() {
        let tribe = board.tribe(id).expect("tribe");
        assert!(tribe.stars() >= 0, "{id:?} is in debt");
        for &city in tribe.cities() {
            assert_eq!(board.city(city).map(|c| c.tribe_id), Some(id));
        }
        for other in board.tribe_ids() {
            let value = diplomacy.allegiance(id, other);
            assert_eq!(value, diplomacy.allegiance(other, id));
            assert!((bounds.min_allegiance..=bounds.max_allegiance).contains(&value));
        }
    }
}

/// Random playout that checks the action contract after every step.
fn play(seed: u64) -> GameState {
    let mut state = skirmish(seed);
    let mut rng = GameRng::seed_from_u64(seed.wrapping_add(1000));
    assert_consistent(&state);

    while state.tick() < TICKS && !state.is_game_over() {
        while let Some(tribe) = state.next_active_tribe() {
            state.init_turn(tribe);
            let mut taken = 0;
            while state.phase() == TurnPhase::ActionLoop && taken < ACTIONS_PER_TURN {
                let offered: Vec<Action> = state.catalogue().iter().copied().collect();
                for action in &offered {
                    assert_eq!(action.check(&state), Ok(()), "{action:?} listed but illegal");
                }
                let Some(&action) = rng.choose(&offered) else {
                    break;
                };

                if let Err(err) = state.next(&action) {
                    panic!("{action:?} was listed but rejected: {err}");
                }
                taken += 1;
                assert_consistent(&state);

                // A city with surplus population may grow twice in a row.
                if !matches!(action, Action::LevelUp { .. }) {
                    assert!(!action.is_feasible(&state), "{action:?} can be repeated");
                }

                if let Some(stale) = offered.iter().find(|a| !a.is_feasible(&state)) {
                    let before = state.clone();
                    assert!(state.next(stale).is_err());
                    assert_eq!(state, before, "rejected {stale:?} changed the state");
                }
            }
            if state.is_game_over() {
                break;
            }
            match state.phase() {
                TurnPhase::TurnEnding => {
                    state.end_turn(tribe).expect("requested end goes through");
                }
                TurnPhase::ActionLoop => {
                    if state.end_turn(tribe).is_err() {
                        assert!(state.growth_pending(tribe));
                        assert_eq!(state.phase(), TurnPhase::ActionLoop);
                        state.force_end_turn(tribe);
                    }
                }
                TurnPhase::AwaitingInit => {}
            }
            assert!(state.catalogue().is_empty());
            assert_consistent(&state);
        }
        state.inc_tick();
        state.game_over_check();
    }
    state
}

#[test]
fn random_playouts_keep_the_action_contract() {
    for seed in 0..SEEDS {
        let state = play(seed);
        assert!(state.tick() > 0 || state.is_game_over());
    }
}

#[test]
fn playouts_are_reproducible() {
    assert_eq!(play(11), play(11));
}
