use std::sync::Arc;

use tribes_core::{
    Action, ActionError, ActorId, BuildingKind, Event, ExamineReward, GameResult, GameState,
    LevelData, LevelUpBonus, Position, Relationship, ResourceKind, Rules, Technology, Terrain,
    Tribe, TribeKind, TurnStatus, UnitKind,
};

// Imperius (tribe 0) in the north-west, Bardur (tribe 1) in the south-east.
const ARENA: &str = "
.:f  .   .:r  .  .   .   .
.    c0  f    .  .   .   .
.    .   .:c  .  v   .   .
.    m:o .    .  .   .   .
.    .   .    .  .   .   .
.    .   .    .  .   c1  .
.    .   .    .  .   .   .
";

const IMPERIUS: ActorId = ActorId(0);
const BARDUR: ActorId = ActorId(1);
const CAPITAL: ActorId = ActorId(2);
const WARRIOR: ActorId = ActorId(3);
const ENEMY_CAPITAL: ActorId = ActorId(4);
const ENEMY_WARRIOR: ActorId = ActorId(5);

/// Tribe 0's turn is open with 7 stars: 5 to start plus 2 capital income.
fn arena() -> GameState {
    arena_seeded(3)
}

fn arena_seeded(seed: u64) -> GameState {
    let level = LevelData::parse(ARENA).expect("level");
    let tribes = vec![Tribe::new(TribeKind::Imperius), Tribe::new(TribeKind::Bardur)];
    let mut state = GameState::new(tribes, &level, Arc::new(Rules::default()), seed).expect("game");
    state.init_turn(IMPERIUS);
    state
}

fn grant(state: &mut GameState, tribe: ActorId, techs: &[Technology]) {
    let t = state.board_mut().tribe_mut(tribe).expect("tribe");
    for &tech in techs {
        t.tech.research(tech).expect("researchable");
    }
}

fn place(state: &mut GameState, kind: UnitKind, pos: Position, tribe: ActorId) -> ActorId {
    let stats = state.rules().unit(kind).stats;
    state
        .board_mut()
        .add_unit(kind, stats, pos, tribe, None)
        .expect("free cell")
}

fn stars(state: &GameState, tribe: ActorId) -> i32 {
    state.board().tribe(tribe).expect("tribe").stars()
}

fn hp(state: &GameState, unit: ActorId) -> i32 {
    state.board().unit(unit).expect("unit").hp()
}

fn population(state: &GameState, city: ActorId) -> i32 {
    state.board().city(city).expect("city").population()
}

// =============================================================================
// Combat and diplomacy
// =============================================================================

#[test]
fn attack_exchanges_damage_and_sours_relations() {
    let mut state = arena();
    let enemy = place(&mut state, UnitKind::Warrior, Position::new(1, 2), BARDUR);

    let events = state
        .next(&Action::Attack {
            unit: WARRIOR,
            target: enemy,
        })
        .expect("attack");

    assert!(events.contains(&Event::UnitDamaged { unit: enemy, hp: 5 }));
    assert_eq!(hp(&state, enemy), 5);
    assert_eq!(hp(&state, WARRIOR), 5);
    assert_eq!(
        state.board().unit(WARRIOR).map(|u| u.status),
        Some(TurnStatus::Attacked)
    );
    assert_eq!(state.board().diplomacy().allegiance(IMPERIUS, BARDUR), -2);
    assert!(state.catalogue().unit_actions(WARRIOR).is_empty());
}

#[test]
fn meeting_a_tribe_allows_declaring_war() {
    let mut state = arena();
    let war = Action::DeclareWar {
        tribe: IMPERIUS,
        target: BARDUR,
    };
    assert!(matches!(war.check(&state), Err(ActionError::NotMet(..))));

    assert!(state.board_mut().move_unit(WARRIOR, Position::new(3, 2)));
    let events = state
        .next(&Action::Move {
            unit: WARRIOR,
            destination: Position::new(3, 3),
        })
        .expect("move");
    assert!(events.contains(&Event::TribesMet {
        a: IMPERIUS,
        b: BARDUR
    }));
    assert!(state
        .board()
        .tribe(BARDUR)
        .is_some_and(|t| t.has_met(IMPERIUS)));

    let events = state.next(&war).expect("declare war");
    assert_eq!(
        events,
        vec![Event::RelationshipChanged {
            a: IMPERIUS,
            b: BARDUR,
            relationship: Relationship::War,
        }]
    );
    assert!(state.board().diplomacy().is_at_war(BARDUR, IMPERIUS));
    assert_eq!(war.check(&state), Err(ActionError::NothingToDo));
}

#[test]
fn gifts_need_diplomacy_and_go_once_per_turn() {
    let mut state = arena();
    let gift = Action::SendStars {
        tribe: IMPERIUS,
        target: BARDUR,
        amount: 5,
    };
    assert_eq!(
        gift.check(&state),
        Err(ActionError::MissingTechnology(Technology::Diplomacy))
    );

    grant(&mut state, IMPERIUS, &[Technology::Shields, Technology::Diplomacy]);
    state.board_mut().reveal(IMPERIUS, Position::new(5, 5), 1);
    let odd = Action::SendStars {
        tribe: IMPERIUS,
        target: BARDUR,
        amount: 3,
    };
    assert_eq!(odd.check(&state), Err(ActionError::InvalidTarget));

    state.next(&gift).expect("gift");
    assert_eq!(stars(&state, IMPERIUS), 2);
    assert_eq!(stars(&state, BARDUR), 10);
    assert_eq!(state.board().diplomacy().allegiance(IMPERIUS, BARDUR), 5);
    let again = Action::SendStars {
        tribe: IMPERIUS,
        target: BARDUR,
        amount: 1,
    };
    assert_eq!(again.check(&state), Err(ActionError::NothingToDo));
}

// =============================================================================
// Capture
// =============================================================================

#[test]
fn capturing_a_village_founds_a_city() {
    let mut state = arena();
    assert!(state.board_mut().move_unit(WARRIOR, Position::new(4, 2)));

    let events = state
        .next(&Action::Capture { unit: WARRIOR })
        .expect("capture");

    let Some(Event::CityFounded { city, tribe, .. }) = events.first().cloned() else {
        panic!("expected a founded city, got {events:?}");
    };
    assert_eq!(tribe, IMPERIUS);
    let board = state.board();
    assert_eq!(board.terrain_at(Position::new(4, 2)), Some(Terrain::City));
    assert_eq!(board.city_at(Position::new(5, 3)), Some(city));
    let founded = board.city(city).expect("city");
    assert!(founded.is_village());
    assert!(!founded.is_capital());
    assert_eq!(board.tribe(IMPERIUS).map(|t| t.cities().len()), Some(2));
    assert_eq!(
        board.unit(WARRIOR).map(|u| u.status),
        Some(TurnStatus::Finished)
    );
    // The wider view from the new city reaches Bardur's border.
    assert!(board.tribe(IMPERIUS).is_some_and(|t| t.has_met(BARDUR)));

    state.end_turn(IMPERIUS).expect("turn ends");
    assert_eq!(state.board().tribe(IMPERIUS).map(|t| t.score), Some(100));
}

#[test]
fn taking_the_last_city_ends_the_game() {
    let mut state = arena();
    assert!(state
        .board_mut()
        .move_unit(ENEMY_WARRIOR, Position::new(6, 6)));
    assert!(state.board_mut().move_unit(WARRIOR, Position::new(5, 5)));

    let events = state
        .next(&Action::Capture { unit: WARRIOR })
        .expect("capture");

    assert!(events.contains(&Event::CityCaptured {
        city: ENEMY_CAPITAL,
        from: BARDUR,
        to: IMPERIUS,
    }));
    assert!(events.contains(&Event::TribeEliminated { tribe: BARDUR }));
    assert!(state.is_game_over());
    assert_eq!(
        state.winner_status(),
        vec![(IMPERIUS, GameResult::Win), (BARDUR, GameResult::Loss)]
    );
    // The old garrison stays with Bardur, homeless.
    let garrison = state.board().unit(ENEMY_WARRIOR).expect("unit");
    assert_eq!(garrison.tribe_id, BARDUR);
    assert_eq!(garrison.city_id, None);

    let end = Action::EndTurn { tribe: IMPERIUS };
    assert_eq!(end.check(&state), Err(ActionError::GameOver));
}

// =============================================================================
// Research and economy
// =============================================================================

#[test]
fn research_costs_scale_with_tier() {
    let mut state = arena();
    state
        .next(&Action::ResearchTech {
            tribe: IMPERIUS,
            tech: Technology::Farming,
        })
        .expect("research");

    let tribe = state.board().tribe(IMPERIUS).expect("tribe");
    assert!(tribe.tech.is_researched(Technology::Farming));
    assert_eq!(tribe.stars(), 1);
    assert_eq!(tribe.score, 200);

    let next = Action::ResearchTech {
        tribe: IMPERIUS,
        tech: Technology::Construction,
    };
    assert_eq!(
        next.check(&state),
        Err(ActionError::InsufficientStars {
            needed: 7,
            available: 1
        })
    );
}

#[test]
fn farm_and_windmill_yields_come_and_go_with_the_buildings() {
    let mut state = arena();
    grant(&mut state, IMPERIUS, &[Technology::Farming, Technology::Construction]);
    state
        .board_mut()
        .tribe_mut(IMPERIUS)
        .expect("tribe")
        .add_stars(20);

    let farm = Position::new(2, 2);
    let windmill = Position::new(1, 2);
    state
        .next(&Action::Build {
            city: CAPITAL,
            target: farm,
            building: BuildingKind::Farm,
        })
        .expect("farm");
    assert_eq!(population(&state, CAPITAL), 2);

    state
        .next(&Action::Build {
            city: CAPITAL,
            target: windmill,
            building: BuildingKind::Windmill,
        })
        .expect("windmill");
    assert_eq!(population(&state, CAPITAL), 3);
    assert_eq!(stars(&state, IMPERIUS), 17);

    let second = Action::Build {
        city: CAPITAL,
        target: Position::new(0, 2),
        building: BuildingKind::Windmill,
    };
    assert_eq!(
        second.check(&state),
        Err(ActionError::DuplicateBuilding(BuildingKind::Windmill))
    );

    state
        .next(&Action::Destroy {
            city: CAPITAL,
            target: windmill,
        })
        .expect("destroy windmill");
    assert_eq!(population(&state, CAPITAL), 2);
    state
        .next(&Action::Destroy {
            city: CAPITAL,
            target: farm,
        })
        .expect("destroy farm");
    assert_eq!(population(&state, CAPITAL), 0);
    assert_eq!(state.board().building_at(farm), None);
}

#[test]
fn gathering_fruit_grows_the_city() {
    let mut state = arena();
    state
        .next(&Action::ResourceGathering {
            city: CAPITAL,
            target: Position::new(0, 0),
            resource: ResourceKind::Fruit,
        })
        .expect("gather");
    assert_eq!(population(&state, CAPITAL), 1);
    assert_eq!(stars(&state, IMPERIUS), 5);
    assert_eq!(state.board().resource_at(Position::new(0, 0)), None);
}

#[test]
fn pending_growth_blocks_the_end_of_turn() {
    let mut state = arena();
    state
        .board_mut()
        .city_mut(CAPITAL)
        .expect("city")
        .add_population(2);
    state.compute_player_actions(IMPERIUS);

    let catalogue = state.catalogue();
    assert!(!catalogue.can_end_turn());
    assert_eq!(catalogue.city_actions(CAPITAL).len(), 2);
    assert!(catalogue
        .city_actions(CAPITAL)
        .iter()
        .all(|a| matches!(a, Action::LevelUp { .. })));
    let end = Action::EndTurn { tribe: IMPERIUS };
    assert_eq!(end.check(&state), Err(ActionError::CannotEndTurn));

    state
        .next(&Action::LevelUp {
            city: CAPITAL,
            bonus: LevelUpBonus::Workshop,
        })
        .expect("level up");
    let city = state.board().city(CAPITAL).expect("city");
    assert_eq!(city.level(), 2);
    assert_eq!(city.production(), 3);
    assert!(state.catalogue().can_end_turn());
    assert!(end.is_feasible(&state));
}

#[test]
fn spawning_needs_room_in_the_city() {
    let mut state = arena();
    let spawn = Action::Spawn {
        city: CAPITAL,
        unit: UnitKind::Warrior,
    };
    assert_eq!(spawn.check(&state), Err(ActionError::CityFull(CAPITAL)));

    state
        .board_mut()
        .city_mut(CAPITAL)
        .expect("city")
        .add_population(2);
    state
        .next(&Action::LevelUp {
            city: CAPITAL,
            bonus: LevelUpBonus::Workshop,
        })
        .expect("level up");
    assert_eq!(
        spawn.check(&state),
        Err(ActionError::Occupied(Position::new(1, 1)))
    );

    state
        .next(&Action::Move {
            unit: WARRIOR,
            destination: Position::new(1, 2),
        })
        .expect("move out");
    let events = state.next(&spawn).expect("spawn");
    let Some(Event::UnitSpawned { unit, .. }) = events.first().cloned() else {
        panic!("expected a spawned unit, got {events:?}");
    };
    assert_eq!(stars(&state, IMPERIUS), 5);
    assert_eq!(
        state.board().unit(unit).map(|u| u.status),
        Some(TurnStatus::Finished)
    );
    assert_eq!(state.board().city(CAPITAL).map(|c| c.units().len()), Some(2));
}

#[test]
fn roads_go_on_visible_land_only() {
    let mut state = arena();
    grant(&mut state, IMPERIUS, &[Technology::Riding, Technology::Roads]);
    let road = |x, y| Action::BuildRoad {
        tribe: IMPERIUS,
        target: Position::new(x, y),
    };

    state.next(&road(2, 2)).expect("road");
    assert!(state.board().has_road(Position::new(2, 2)));
    assert_eq!(stars(&state, IMPERIUS), 5);

    assert_eq!(road(2, 2).check(&state), Err(ActionError::NothingToDo));
    assert!(matches!(
        road(1, 3).check(&state),
        Err(ActionError::WrongTerrain { .. })
    ));
    assert_eq!(road(5, 5).check(&state), Err(ActionError::InvalidTarget));
    assert_eq!(
        road(9, 9).check(&state),
        Err(ActionError::OutOfBounds(Position::new(9, 9)))
    );
}

#[test]
fn forests_can_be_cleared_regrown_and_burnt() {
    let mut state = arena();
    let forest = Position::new(2, 1);
    grant(
        &mut state,
        IMPERIUS,
        &[
            Technology::Hunting,
            Technology::Forestry,
            Technology::Archery,
            Technology::Spiritualism,
            Technology::Riding,
            Technology::FreeSpirit,
            Technology::Chivalry,
        ],
    );

    state
        .next(&Action::ClearForest {
            city: CAPITAL,
            target: forest,
        })
        .expect("clear");
    assert_eq!(state.board().terrain_at(forest), Some(Terrain::Plain));
    assert_eq!(stars(&state, IMPERIUS), 8);

    state
        .next(&Action::GrowForest {
            city: CAPITAL,
            target: forest,
        })
        .expect("grow");
    assert_eq!(state.board().terrain_at(forest), Some(Terrain::Forest));
    assert_eq!(stars(&state, IMPERIUS), 3);

    let burn = Action::BurnForest {
        city: CAPITAL,
        target: forest,
    };
    assert!(matches!(
        burn.check(&state),
        Err(ActionError::InsufficientStars { needed: 5, .. })
    ));
    state
        .board_mut()
        .tribe_mut(IMPERIUS)
        .expect("tribe")
        .add_stars(2);
    state.next(&burn).expect("burn");
    assert_eq!(state.board().terrain_at(forest), Some(Terrain::Plain));
    assert_eq!(state.board().resource_at(forest), Some(ResourceKind::Crops));
    assert_eq!(stars(&state, IMPERIUS), 0);
}

// =============================================================================
// Unit abilities
// =============================================================================

#[test]
fn examining_ruins_consumes_them() {
    let mut state = arena();
    let ruins = Position::new(2, 0);
    assert!(state.board_mut().move_unit(WARRIOR, ruins));

    let events = state
        .next(&Action::Examine { unit: WARRIOR })
        .expect("examine");
    let examined = events
        .iter()
        .filter(|e| matches!(e, Event::RuinsExamined { unit, .. } if *unit == WARRIOR))
        .count();
    assert_eq!(examined, 1);
    assert_eq!(state.board().resource_at(ruins), None);
    assert_eq!(
        Action::Examine { unit: WARRIOR }.check(&state),
        Err(ActionError::UnitStatus(TurnStatus::Finished))
    );
}

fn examine_reward(events: &[Event]) -> ExamineReward {
    events
        .iter()
        .find_map(|e| match e {
            Event::RuinsExamined { reward, .. } => Some(*reward),
            _ => None,
        })
        .expect("ruins examined")
}

#[test]
fn ruins_never_offer_research_once_the_tree_is_done() {
    for seed in 0..40 {
        let mut state = arena_seeded(seed);
        let tech = &mut state.board_mut().tribe_mut(IMPERIUS).expect("tribe").tech;
        for t in Technology::ALL {
            if tech.is_researchable(t) {
                tech.research(t).expect("researchable");
            }
        }
        assert!(tech.is_everything_researched());
        assert!(state.board_mut().move_unit(WARRIOR, Position::new(2, 0)));

        let events = state
            .next(&Action::Examine { unit: WARRIOR })
            .expect("examine");

        assert_ne!(examine_reward(&events), ExamineReward::Research, "seed {seed}");
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::TechResearched { .. })));
    }
}

#[test]
fn super_unit_from_ruins_pushes_the_capital_guard_aside() {
    let capital = Position::new(1, 1);
    let mut drawn = Vec::new();
    for seed in 0..40 {
        let mut state = arena_seeded(seed);
        assert!(state.board_mut().move_unit(WARRIOR, Position::new(2, 0)));
        let guard = place(&mut state, UnitKind::Warrior, capital, IMPERIUS);

        let events = state
            .next(&Action::Examine { unit: WARRIOR })
            .expect("examine");
        let reward = examine_reward(&events);
        drawn.push(reward);
        if reward != ExamineReward::SuperUnit {
            continue;
        }

        let spawned = state.board().unit_at(capital).expect("super unit");
        assert_ne!(spawned, guard);
        assert_eq!(
            state.board().unit(spawned).map(|u| u.kind()),
            Some(UnitKind::SuperUnit)
        );
        let moved_to = state.board().unit(guard).expect("guard").position;
        assert_eq!(moved_to.distance(capital), 1);
        assert!(events.contains(&Event::UnitMoved {
            unit: guard,
            from: capital,
            to: moved_to,
        }));
    }
    for reward in [
        ExamineReward::SuperUnit,
        ExamineReward::Research,
        ExamineReward::PopulationGrowth,
        ExamineReward::Explorer,
        ExamineReward::Resources,
    ] {
        assert!(drawn.contains(&reward), "{reward:?} never drawn");
    }
}

#[test]
fn disbanding_refunds_half_the_cost() {
    let mut state = arena();
    let disband = Action::Disband { unit: WARRIOR };
    assert_eq!(
        disband.check(&state),
        Err(ActionError::MissingTechnology(Technology::FreeSpirit))
    );

    grant(&mut state, IMPERIUS, &[Technology::Riding, Technology::FreeSpirit]);
    let events = state.next(&disband).expect("disband");
    assert_eq!(
        events,
        vec![Event::UnitDisbanded {
            unit: WARRIOR,
            refund: 1
        }]
    );
    assert_eq!(stars(&state, IMPERIUS), 8);
    assert!(state.board().unit(WARRIOR).is_none());
    assert_eq!(state.board().unit_at(Position::new(1, 1)), None);
    assert_eq!(state.board().city(CAPITAL).map(|c| c.units().len()), Some(0));
}

#[test]
fn recovering_heals_more_at_home() {
    let mut state = arena();
    state.board_mut().unit_mut(WARRIOR).expect("unit").set_hp(4);
    state
        .next(&Action::Recover { unit: WARRIOR })
        .expect("recover");
    assert_eq!(hp(&state, WARRIOR), 8);

    let scout = place(&mut state, UnitKind::Warrior, Position::new(3, 3), IMPERIUS);
    state.board_mut().unit_mut(scout).expect("unit").set_hp(4);
    state.next(&Action::Recover { unit: scout }).expect("recover");
    assert_eq!(hp(&state, scout), 6);

    assert_eq!(
        Action::Recover { unit: scout }.check(&state),
        Err(ActionError::UnitStatus(TurnStatus::Finished))
    );
}

#[test]
fn mind_bender_converts_instead_of_attacking() {
    let mut state = arena();
    let bender = place(&mut state, UnitKind::MindBender, Position::new(1, 2), IMPERIUS);
    let enemy = place(&mut state, UnitKind::Warrior, Position::new(2, 3), BARDUR);

    assert_eq!(
        Action::Attack {
            unit: bender,
            target: enemy
        }
        .check(&state),
        Err(ActionError::UnitKind(UnitKind::MindBender))
    );
    state
        .next(&Action::Convert {
            unit: bender,
            target: enemy,
        })
        .expect("convert");

    let converted = state.board().unit(enemy).expect("unit");
    assert_eq!(converted.tribe_id, IMPERIUS);
    assert_eq!(converted.status, TurnStatus::Finished);
    assert!(state
        .board()
        .tribe(IMPERIUS)
        .is_some_and(|t| t.extra_units().contains(&enemy)));
    assert!(state
        .board()
        .tribe(BARDUR)
        .is_some_and(|t| !t.extra_units().contains(&enemy)));
    assert_eq!(state.board().diplomacy().allegiance(IMPERIUS, BARDUR), -5);
}

fn war_flips(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| {
            matches!(
                e,
                Event::RelationshipChanged {
                    relationship: Relationship::War,
                    ..
                }
            )
        })
        .count()
}

#[test]
fn repeated_conversions_strip_a_city_and_tip_into_war() {
    let mut state = arena();
    let bender = place(&mut state, UnitKind::MindBender, Position::new(4, 4), IMPERIUS);
    state.board_mut().reveal(IMPERIUS, Position::new(5, 5), 1);
    assert!(state
        .board()
        .city(ENEMY_CAPITAL)
        .is_some_and(|c| c.units().contains(&ENEMY_WARRIOR)));

    let convert = |target| Action::Convert {
        unit: bender,
        target,
    };

    let events = state.next(&convert(ENEMY_WARRIOR)).expect("convert");
    let mut wars = war_flips(&events);
    let converted = state.board().unit(ENEMY_WARRIOR).expect("unit");
    assert_eq!(converted.tribe_id, IMPERIUS);
    assert_eq!(converted.city_id, None);
    assert_eq!(converted.status, TurnStatus::Finished);
    assert!(state
        .board()
        .city(ENEMY_CAPITAL)
        .is_some_and(|c| c.units().is_empty()));
    assert_eq!(
        state.board().unit(bender).map(|u| u.status),
        Some(TurnStatus::Attacked)
    );

    for n in 2..=14 {
        state.board_mut().unit_mut(bender).expect("unit").status = TurnStatus::Fresh;
        let victim = place(&mut state, UnitKind::Warrior, Position::new(5, 4), BARDUR);
        let events = state.next(&convert(victim)).expect("convert");
        wars += war_flips(&events);
        assert_eq!(
            state.board().diplomacy().allegiance(IMPERIUS, BARDUR),
            (-5 * n).clamp(-60, 60)
        );
        state.board_mut().remove_unit(victim).expect("converted unit");
    }
    assert_eq!(wars, 1);
    assert!(state.board().diplomacy().is_at_war(IMPERIUS, BARDUR));
}

#[test]
fn mind_bender_heals_injured_neighbours() {
    let mut state = arena();
    let bender = place(&mut state, UnitKind::MindBender, Position::new(1, 2), IMPERIUS);
    let heal = Action::HealOthers { unit: bender };
    assert_eq!(heal.check(&state), Err(ActionError::NothingToDo));

    state.board_mut().unit_mut(WARRIOR).expect("unit").set_hp(3);
    let events = state.next(&heal).expect("heal");
    assert_eq!(
        events,
        vec![Event::UnitHealed {
            unit: WARRIOR,
            amount: 4
        }]
    );
    assert_eq!(hp(&state, WARRIOR), 7);
}

#[test]
fn three_kills_make_a_veteran() {
    let mut state = arena();
    let promote = Action::MakeVeteran { unit: WARRIOR };
    assert_eq!(promote.check(&state), Err(ActionError::NothingToDo));

    state.board_mut().unit_mut(WARRIOR).expect("unit").kills = 3;
    state.next(&promote).expect("promote");
    let unit = state.board().unit(WARRIOR).expect("unit");
    assert!(unit.is_veteran());
    assert_eq!(unit.max_hp(), 15);
    assert_eq!(unit.hp(), 15);
    assert_eq!(promote.check(&state), Err(ActionError::NothingToDo));
}

#[test]
fn grow_forest_is_offered_once_per_plain_tile() {
    let mut state = arena();
    grant(
        &mut state,
        IMPERIUS,
        &[Technology::Hunting, Technology::Archery, Technology::Spiritualism],
    );
    state.compute_player_actions(IMPERIUS);

    let targets: Vec<Position> = state
        .catalogue()
        .city_actions(CAPITAL)
        .iter()
        .filter_map(|a| match *a {
            Action::GrowForest { target, .. } => Some(target),
            _ => None,
        })
        .collect();
    let plains = Position::new(1, 1)
        .square(1)
        .filter(|&p| state.board().terrain_at(p) == Some(Terrain::Plain))
        .count();
    assert_eq!(targets.len(), plains);
    assert_eq!(plains, 7);

    let grow = Action::GrowForest {
        city: CAPITAL,
        target: targets[0],
    };
    state.next(&grow).expect("grow");
    assert_eq!(state.board().terrain_at(targets[0]), Some(Terrain::Forest));
    assert_eq!(stars(&state, IMPERIUS), 2);
    assert!(!grow.is_feasible(&state));
}
