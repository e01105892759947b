use serde::{Deserialize, Serialize};

use crate::{ActorId, Position, TurnStatus, UnitKind, UnitStats};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: ActorId,
    kind: UnitKind,
    stats: UnitStats,
    hp: i32,
    max_hp: i32,
    pub position: Position,
    pub kills: u32,
    veteran: bool,
    /// Home city. `None` for a tribe's extra units.
    pub city_id: Option<ActorId>,
    pub tribe_id: ActorId,
    pub status: TurnStatus,
}

impl Unit {
    pub fn new(
        id: ActorId,
        kind: UnitKind,
        stats: UnitStats,
        position: Position,
        tribe_id: ActorId,
        city_id: Option<ActorId>,
    ) -> Self {
        Self {
            id,
            kind,
            stats,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            position,
            kills: 0,
            veteran: false,
            city_id,
            tribe_id,
            status: TurnStatus::Fresh,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn stats(&self) -> &UnitStats {
        &self.stats
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    /// Base max HP, raised once by promotion.
    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn is_veteran(&self) -> bool {
        self.veteran
    }

    pub fn is_injured(&self) -> bool {
        self.hp > 0 && self.hp < self.max_hp
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_fresh(&self) -> bool {
        self.status == TurnStatus::Fresh
    }

    pub fn can_move(&self) -> bool {
        self.status == TurnStatus::Fresh
    }

    pub fn can_attack(&self) -> bool {
        matches!(self.status, TurnStatus::Fresh | TurnStatus::Moved)
    }

    pub fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.max_hp);
    }

    /// Returns the HP actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.set_hp(self.hp.saturating_add(amount.max(0)));
        self.hp - before
    }

    /// Returns the remaining HP.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        self.set_hp(self.hp - amount.max(0));
        self.hp
    }

    pub fn promote(&mut self, hp_bonus: i32) {
        self.veteran = true;
        self.max_hp += hp_bonus.max(0);
        self.hp = self.max_hp;
    }

    pub fn transition(&mut self, next: TurnStatus) {
        self.status = self.status.transition(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rules;

    fn warrior() -> Unit {
        let stats = Rules::default().unit(UnitKind::Warrior).stats;
        Unit::new(
            ActorId(5),
            UnitKind::Warrior,
            stats,
            Position::new(1, 1),
            ActorId(0),
            Some(ActorId(3)),
        )
    }

    #[test]
    fn hp_stays_within_bounds() {
        let mut unit = warrior();
        assert_eq!(unit.hp(), 10);
        assert_eq!(unit.heal(5), 0);
        assert_eq!(unit.take_damage(14), 0);
        assert!(!unit.is_alive());
        unit.set_hp(-3);
        assert_eq!(unit.hp(), 0);
    }

    #[test]
    fn promotion_raises_max_hp_and_heals() {
        let mut unit = warrior();
        unit.take_damage(6);
        unit.promote(5);
        assert!(unit.is_veteran());
        assert_eq!(unit.max_hp(), 15);
        assert_eq!(unit.hp(), 15);
        assert_eq!(unit.stats().max_hp, 10);
    }

    #[test]
    fn moved_units_may_still_attack_once() {
        let mut unit = warrior();
        unit.transition(TurnStatus::Moved);
        assert!(!unit.can_move());
        assert!(unit.can_attack());
        unit.transition(TurnStatus::Attacked);
        assert_eq!(unit.status, TurnStatus::Finished);
    }
}
