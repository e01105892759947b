use serde::{Deserialize, Serialize};

use crate::{Board, CombatRules, Terrain, Unit};

/// Damage exchanged by one attack. Purely computed; the caller applies it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatPreview {
    pub damage_to_defender: i32,
    /// Zero when the defender dies or the attacker is out of its range.
    pub retaliation: i32,
    pub defender_hp_after: i32,
    pub attacker_hp_after: i32,
}

impl CombatPreview {
    pub fn defender_dies(&self) -> bool {
        self.defender_hp_after <= 0
    }

    pub fn attacker_dies(&self) -> bool {
        self.attacker_hp_after <= 0
    }
}

/// Multiplier applied to the defender's force for the cell it stands on.
pub fn defence_bonus(board: &Board, defender: &Unit, rules: &CombatRules) -> f64 {
    let pos = defender.position;
    match board.terrain_at(pos) {
        Some(Terrain::City) => {
            let walled = board
                .city_at(pos)
                .and_then(|c| board.city(c))
                .is_some_and(|c| c.position == pos && c.walls);
            if walled {
                rules.wall_defence
            } else {
                rules.terrain_defence
            }
        }
        Some(Terrain::Forest | Terrain::Mountain) => rules.terrain_defence,
        _ => 1.0,
    }
}

/// Forces scale with remaining health; damage splits the total in proportion to them.
pub fn calculate_combat_preview(
    attacker: &Unit,
    defender: &Unit,
    board: &Board,
    rules: &CombatRules,
) -> CombatPreview {
    let bonus = defence_bonus(board, defender, rules);
    resolve(attacker, defender, bonus, rules.damage_factor)
}

fn resolve(attacker: &Unit, defender: &Unit, bonus: f64, damage_factor: f64) -> CombatPreview {
    let atk = attacker.stats().attack as f64;
    let def = defender.stats().defence as f64;
    let attack_force = atk * health_ratio(attacker);
    let defence_force = def * health_ratio(defender) * bonus;
    let total = attack_force + defence_force;

    if total <= 0.0 {
        return CombatPreview {
            damage_to_defender: 0,
            retaliation: 0,
            defender_hp_after: defender.hp(),
            attacker_hp_after: attacker.hp(),
        };
    }

    let damage = (attack_force / total * atk * damage_factor).round() as i32;
    let defender_hp_after = (defender.hp() - damage).max(0);

    let in_range = defender.position.distance(attacker.position) <= defender.stats().range;
    let retaliation = if defender_hp_after > 0 && in_range {
        (defence_force / total * def * damage_factor).round() as i32
    } else {
        0
    };

    CombatPreview {
        damage_to_defender: damage,
        retaliation,
        defender_hp_after,
        attacker_hp_after: (attacker.hp() - retaliation).max(0),
    }
}

fn health_ratio(unit: &Unit) -> f64 {
    if unit.max_hp() <= 0 {
        return 0.0;
    }
    unit.hp() as f64 / unit.max_hp() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActorId, Position, Rules, Tribe, TribeKind, UnitKind};

    fn unit(kind: UnitKind, pos: Position, tribe: u32) -> Unit {
        let stats = Rules::default().unit(kind).stats;
        Unit::new(ActorId(10 + tribe), kind, stats, pos, ActorId(tribe), None)
    }

    fn board() -> Board {
        let tribes = vec![Tribe::new(TribeKind::Imperius), Tribe::new(TribeKind::Bardur)];
        Board::new(5, tribes, Rules::default().diplomacy)
    }

    #[test]
    fn even_warriors_trade_blows() {
        let rules = Rules::default();
        let a = unit(UnitKind::Warrior, Position::new(1, 1), 0);
        let d = unit(UnitKind::Warrior, Position::new(2, 1), 1);
        let preview = calculate_combat_preview(&a, &d, &board(), &rules.combat);
        // Equal forces: each side deals half of 2 * 4.5.
        assert_eq!(preview.damage_to_defender, 5);
        assert_eq!(preview.defender_hp_after, 5);
        assert_eq!(preview.retaliation, 5);
        assert_eq!(preview.attacker_hp_after, 5);
    }

    #[test]
    fn no_retaliation_outside_defender_range() {
        let rules = Rules::default();
        let a = unit(UnitKind::Archer, Position::new(0, 0), 0);
        let d = unit(UnitKind::Warrior, Position::new(2, 0), 1);
        let preview = calculate_combat_preview(&a, &d, &board(), &rules.combat);
        assert!(preview.damage_to_defender > 0);
        assert_eq!(preview.retaliation, 0);
        assert_eq!(preview.attacker_hp_after, a.hp());
    }

    #[test]
    fn forests_help_the_defender() {
        let rules = Rules::default();
        let mut b = board();
        let a = unit(UnitKind::Warrior, Position::new(1, 1), 0);
        let d = unit(UnitKind::Warrior, Position::new(2, 1), 1);
        let open = calculate_combat_preview(&a, &d, &b, &rules.combat);
        b.set_terrain(Position::new(2, 1), Terrain::Forest).expect("in bounds");
        let forest = calculate_combat_preview(&a, &d, &b, &rules.combat);
        assert!(forest.damage_to_defender < open.damage_to_defender);
        assert!(forest.retaliation >= open.retaliation);
    }

    #[test]
    fn dead_defenders_do_not_strike_back() {
        let rules = Rules::default();
        let a = unit(UnitKind::Catapult, Position::new(1, 1), 0);
        let mut d = unit(UnitKind::Warrior, Position::new(2, 1), 1);
        d.set_hp(2);
        let preview = calculate_combat_preview(&a, &d, &board(), &rules.combat);
        assert!(preview.defender_dies());
        assert_eq!(preview.retaliation, 0);
    }
}
