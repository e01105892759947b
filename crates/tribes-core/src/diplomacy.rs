use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ActorId, DiplomacyRules};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    #[default]
    Peace,
    War,
}

/// Pairwise allegiance between tribes. Both directions of a pair always hold the same value.
///
/// Tribe ids double as matrix indices: tribes are registered first, so they own ids `0..n`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diplomacy {
    tribe_count: usize,
    allegiance: Vec<i32>,               // len = n*n
    relationships: Vec<Relationship>, // len = n*n
    rules: DiplomacyRules,
}

impl Diplomacy {
    pub fn new(tribe_count: usize, rules: DiplomacyRules) -> Self {
        let n = tribe_count;
        Self {
            tribe_count: n,
            allegiance: vec![rules.initial_allegiance; n * n],
            relationships: vec![Relationship::Peace; n * n],
            rules,
        }
    }

    pub fn tribe_count(&self) -> usize {
        self.tribe_count
    }

    fn idx(&self, a: ActorId, b: ActorId) -> Option<usize> {
        let n = self.tribe_count;
        let ai = a.index();
        let bi = b.index();
        if ai >= n || bi >= n || ai == bi {
            None
        } else {
            Some(ai * n + bi)
        }
    }

    pub fn allegiance(&self, a: ActorId, b: ActorId) -> i32 {
        self.idx(a, b)
            .and_then(|i| self.allegiance.get(i).copied())
            .unwrap_or(self.rules.initial_allegiance)
    }

    pub fn relationship(&self, a: ActorId, b: ActorId) -> Relationship {
        self.idx(a, b)
            .and_then(|i| self.relationships.get(i).copied())
            .unwrap_or_default()
    }

    pub fn is_at_war(&self, a: ActorId, b: ActorId) -> bool {
        self.relationship(a, b) == Relationship::War
    }

    /// Adds `delta` to the pair's allegiance, clamped to the configured bounds.
    /// Returns the new value.
    pub fn update_allegiance(&mut self, delta: i32, a: ActorId, b: ActorId) -> i32 {
        let (Some(i1), Some(i2)) = (self.idx(a, b), self.idx(b, a)) else {
            return self.rules.initial_allegiance;
        };
        let current = self.allegiance[i1];
        let new = current
            .saturating_add(delta)
            .clamp(self.rules.min_allegiance, self.rules.max_allegiance);
        self.allegiance[i1] = new;
        self.allegiance[i2] = new;
        new
    }

    /// Flips the pair's relationship if the current allegiance crossed a threshold in the
    /// direction of `delta`. Must run right after `update_allegiance`.
    ///
    /// Returns the new relationship when a flip happened.
    pub fn check_consequences(
        &mut self,
        delta: i32,
        a: ActorId,
        b: ActorId,
    ) -> Option<Relationship> {
        let value = self.allegiance(a, b);
        let next = match self.relationship(a, b) {
            Relationship::Peace if delta < 0 && value <= self.rules.war_threshold => {
                Relationship::War
            }
            Relationship::War if delta > 0 && value >= self.rules.peace_threshold => {
                Relationship::Peace
            }
            _ => return None,
        };
        self.set_relationship(a, b, next);
        info!(?a, ?b, allegiance = value, relationship = ?next, "relationship changed");
        Some(next)
    }

    /// Explicit declaration. Allegiance drops to the war threshold if it was above it.
    pub fn declare_war(&mut self, a: ActorId, b: ActorId) -> bool {
        if self.idx(a, b).is_none() || self.is_at_war(a, b) {
            return false;
        }
        let value = self.allegiance(a, b);
        if value > self.rules.war_threshold {
            self.update_allegiance(self.rules.war_threshold - value, a, b);
        }
        self.set_relationship(a, b, Relationship::War);
        info!(?a, ?b, "war declared");
        true
    }

    fn set_relationship(&mut self, a: ActorId, b: ActorId, relationship: Relationship) {
        let (Some(i1), Some(i2)) = (self.idx(a, b), self.idx(b, a)) else {
            return;
        };
        self.relationships[i1] = relationship;
        self.relationships[i2] = relationship;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rules;

    fn diplomacy() -> Diplomacy {
        Diplomacy::new(3, Rules::default().diplomacy)
    }

    #[test]
    fn allegiance_is_symmetric_and_clamped() {
        let mut d = diplomacy();
        let (a, b) = (ActorId(0), ActorId(2));

        assert_eq!(d.update_allegiance(-25, a, b), -25);
        assert_eq!(d.allegiance(b, a), -25);
        assert_eq!(d.update_allegiance(-100, a, b), -60);
        assert_eq!(d.update_allegiance(500, b, a), 60);
        assert_eq!(d.allegiance(a, ActorId(1)), 0);
    }

    #[test]
    fn war_flips_once_then_stays() {
        let mut d = diplomacy();
        let (a, b) = (ActorId(0), ActorId(1));
        let mut flips = 0;
        for _ in 0..12 {
            d.update_allegiance(-5, a, b);
            if d.check_consequences(-5, a, b).is_some() {
                flips += 1;
            }
        }
        assert_eq!(flips, 1);
        assert!(d.is_at_war(a, b));
        assert!(d.is_at_war(b, a));
        assert_eq!(d.allegiance(a, b), -60);
    }

    #[test]
    fn peace_returns_after_reconciliation() {
        let mut d = diplomacy();
        let (a, b) = (ActorId(0), ActorId(1));
        assert!(d.declare_war(a, b));
        assert!(!d.declare_war(b, a));
        assert_eq!(d.allegiance(a, b), -30);

        d.update_allegiance(59, a, b);
        assert_eq!(d.check_consequences(59, a, b), None);
        d.update_allegiance(1, a, b);
        assert_eq!(d.check_consequences(1, a, b), Some(Relationship::Peace));
    }

    #[test]
    fn self_pairs_and_unknown_tribes_are_inert() {
        let mut d = diplomacy();
        assert_eq!(d.update_allegiance(-10, ActorId(1), ActorId(1)), 0);
        assert_eq!(d.update_allegiance(-10, ActorId(0), ActorId(9)), 0);
        assert_eq!(d.check_consequences(-10, ActorId(0), ActorId(9)), None);
    }
}
