use serde::{Deserialize, Serialize};

use crate::{ActorId, GameResult, Technology, TechnologyTree, UnitKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TribeKind {
    XinXi,
    Imperius,
    Bardur,
    Oumaji,
}

impl TribeKind {
    pub fn starting_tech(self) -> Technology {
        match self {
            TribeKind::XinXi => Technology::Climbing,
            TribeKind::Imperius => Technology::Organization,
            TribeKind::Bardur => Technology::Hunting,
            TribeKind::Oumaji => Technology::Riding,
        }
    }

    pub fn starting_unit(self) -> UnitKind {
        match self {
            TribeKind::Oumaji => UnitKind::Rider,
            _ => UnitKind::Warrior,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tribe {
    id: ActorId,
    kind: TribeKind,
    stars: i32,
    cities: Vec<ActorId>,
    pub capital: Option<ActorId>,
    /// Units that belong to the tribe but to none of its cities.
    extra_units: Vec<ActorId>,
    pub tech: TechnologyTree,
    /// Cells this tribe has seen, row-major over the board.
    visibility: Vec<bool>,
    pub result: GameResult,
    pub score: i32,
    pub kills: u32,
    tribes_met: Vec<ActorId>,
    /// Tribes that received stars from this one during the current turn.
    #[serde(default)]
    gifts_sent: Vec<ActorId>,
}

impl Tribe {
    /// A tribe ready to be handed to `GameState::new`, which assigns its id.
    pub fn new(kind: TribeKind) -> Self {
        Self::with_id(ActorId(0), kind)
    }

    pub fn with_id(id: ActorId, kind: TribeKind) -> Self {
        Self {
            id,
            kind,
            stars: 0,
            cities: Vec::new(),
            capital: None,
            extra_units: Vec::new(),
            tech: TechnologyTree::new(),
            visibility: Vec::new(),
            result: GameResult::Incomplete,
            score: 0,
            kills: 0,
            tribes_met: Vec::new(),
            gifts_sent: Vec::new(),
        }
    }

    pub(crate) fn set_id(&mut self, id: ActorId) {
        self.id = id;
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn kind(&self) -> TribeKind {
        self.kind
    }

    pub fn stars(&self) -> i32 {
        self.stars
    }

    pub fn add_stars(&mut self, amount: i32) {
        self.stars = (self.stars + amount).max(0);
    }

    pub fn can_afford(&self, cost: i32) -> bool {
        cost <= self.stars
    }

    /// Deducts `cost` if affordable. Stars never go negative.
    pub fn spend(&mut self, cost: i32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.stars -= cost.max(0);
        true
    }

    pub fn cities(&self) -> &[ActorId] {
        &self.cities
    }

    pub fn add_city(&mut self, city: ActorId) {
        if !self.cities.contains(&city) {
            self.cities.push(city);
        }
    }

    pub fn remove_city(&mut self, city: ActorId) -> bool {
        let before = self.cities.len();
        self.cities.retain(|&id| id != city);
        if self.capital == Some(city) {
            self.capital = None;
        }
        self.cities.len() != before
    }

    pub fn extra_units(&self) -> &[ActorId] {
        &self.extra_units
    }

    pub fn add_extra_unit(&mut self, unit: ActorId) {
        if !self.extra_units.contains(&unit) {
            self.extra_units.push(unit);
        }
    }

    pub fn remove_extra_unit(&mut self, unit: ActorId) -> bool {
        let before = self.extra_units.len();
        self.extra_units.retain(|&id| id != unit);
        self.extra_units.len() != before
    }

    pub(crate) fn reset_visibility(&mut self, cells: usize) {
        self.visibility = vec![false; cells];
    }

    pub fn visibility(&self) -> &[bool] {
        &self.visibility
    }

    pub fn sees_index(&self, index: usize) -> bool {
        self.visibility.get(index).copied().unwrap_or(false)
    }

    pub(crate) fn reveal_index(&mut self, index: usize) {
        if let Some(cell) = self.visibility.get_mut(index) {
            *cell = true;
        }
    }

    pub fn has_met(&self, other: ActorId) -> bool {
        self.tribes_met.contains(&other)
    }

    pub fn tribes_met(&self) -> &[ActorId] {
        &self.tribes_met
    }

    pub(crate) fn meet(&mut self, other: ActorId) -> bool {
        if other == self.id || self.has_met(other) {
            return false;
        }
        self.tribes_met.push(other);
        true
    }

    pub fn has_gifted(&self, other: ActorId) -> bool {
        self.gifts_sent.contains(&other)
    }

    pub(crate) fn record_gift(&mut self, other: ActorId) {
        if !self.has_gifted(other) {
            self.gifts_sent.push(other);
        }
    }

    pub(crate) fn clear_gifts(&mut self) {
        self.gifts_sent.clear();
    }
}
