use serde::{Deserialize, Serialize};

use crate::{City, Tribe, Unit};

/// Registry id shared by every actor kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u32);

impl ActorId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Tribe,
    City,
    Unit,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "actor", rename_all = "snake_case")]
pub enum Actor {
    Tribe(Tribe),
    City(City),
    Unit(Unit),
}

impl Actor {
    pub fn kind(&self) -> ActorKind {
        match self {
            Actor::Tribe(_) => ActorKind::Tribe,
            Actor::City(_) => ActorKind::City,
            Actor::Unit(_) => ActorKind::Unit,
        }
    }

    /// Tribe that owns this actor; a tribe owns itself.
    pub fn tribe_id(&self) -> ActorId {
        match self {
            Actor::Tribe(tribe) => tribe.id(),
            Actor::City(city) => city.tribe_id,
            Actor::Unit(unit) => unit.tribe_id,
        }
    }
}

/// Deterministic storage for all actors of one board.
///
/// - Ids are slot indices handed out in ascending order and never reused.
/// - Stable iteration order: ascending id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorRegistry {
    slots: Vec<Option<Actor>>,
}

impl ActorRegistry {
    pub fn next_id(&self) -> ActorId {
        ActorId(self.slots.len() as u32)
    }

    /// Registers the actor built by `make`, which receives the id assigned to it.
    pub fn insert_with(&mut self, make: impl FnOnce(ActorId) -> Actor) -> ActorId {
        let id = self.next_id();
        self.slots.push(Some(make(id)));
        id
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.slots.get(id.index())?.as_ref()
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        self.slots.get_mut(id.index())?.take()
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter_ordered(&self) -> impl Iterator<Item = (ActorId, &Actor)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| Some((ActorId(index as u32), slot.as_ref()?)))
    }

    pub fn tribe(&self, id: ActorId) -> Option<&Tribe> {
        match self.get(id)? {
            Actor::Tribe(tribe) => Some(tribe),
            _ => None,
        }
    }

    pub fn tribe_mut(&mut self, id: ActorId) -> Option<&mut Tribe> {
        match self.get_mut(id)? {
            Actor::Tribe(tribe) => Some(tribe),
            _ => None,
        }
    }

    pub fn city(&self, id: ActorId) -> Option<&City> {
        match self.get(id)? {
            Actor::City(city) => Some(city),
            _ => None,
        }
    }

    pub fn city_mut(&mut self, id: ActorId) -> Option<&mut City> {
        match self.get_mut(id)? {
            Actor::City(city) => Some(city),
            _ => None,
        }
    }

    pub fn unit(&self, id: ActorId) -> Option<&Unit> {
        match self.get(id)? {
            Actor::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn unit_mut(&mut self, id: ActorId) -> Option<&mut Unit> {
        match self.get_mut(id)? {
            Actor::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.slots.iter().filter_map(|slot| match slot {
            Some(Actor::Unit(unit)) => Some(unit),
            _ => None,
        })
    }

    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.slots.iter_mut().filter_map(|slot| match slot {
            Some(Actor::Unit(unit)) => Some(unit),
            _ => None,
        })
    }

    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.slots.iter().filter_map(|slot| match slot {
            Some(Actor::City(city)) => Some(city),
            _ => None,
        })
    }
}
