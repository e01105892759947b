use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::GameRng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technology {
    // Tier 1
    Climbing,
    Fishing,
    Hunting,
    Organization,
    Riding,
    // Tier 2
    Mining,
    Meditation,
    Sailing,
    Whaling,
    Archery,
    Forestry,
    Farming,
    Shields,
    Roads,
    FreeSpirit,
    // Tier 3
    Smithery,
    Philosophy,
    Navigation,
    Aquatism,
    Spiritualism,
    Mathematics,
    Construction,
    Diplomacy,
    Trade,
    Chivalry,
}

impl Technology {
    pub const ALL: [Technology; 25] = [
        Technology::Climbing,
        Technology::Fishing,
        Technology::Hunting,
        Technology::Organization,
        Technology::Riding,
        Technology::Mining,
        Technology::Meditation,
        Technology::Sailing,
        Technology::Whaling,
        Technology::Archery,
        Technology::Forestry,
        Technology::Farming,
        Technology::Shields,
        Technology::Roads,
        Technology::FreeSpirit,
        Technology::Smithery,
        Technology::Philosophy,
        Technology::Navigation,
        Technology::Aquatism,
        Technology::Spiritualism,
        Technology::Mathematics,
        Technology::Construction,
        Technology::Diplomacy,
        Technology::Trade,
        Technology::Chivalry,
    ];

    pub fn prerequisite(self) -> Option<Technology> {
        use Technology::*;
        match self {
            Climbing | Fishing | Hunting | Organization | Riding => None,
            Mining | Meditation => Some(Climbing),
            Sailing | Whaling => Some(Fishing),
            Archery | Forestry => Some(Hunting),
            Farming | Shields => Some(Organization),
            Roads | FreeSpirit => Some(Riding),
            Smithery => Some(Mining),
            Philosophy => Some(Meditation),
            Navigation => Some(Sailing),
            Aquatism => Some(Whaling),
            Spiritualism => Some(Archery),
            Mathematics => Some(Forestry),
            Construction => Some(Farming),
            Diplomacy => Some(Shields),
            Trade => Some(Roads),
            Chivalry => Some(FreeSpirit),
        }
    }

    pub fn tier(self) -> u32 {
        match self.prerequisite() {
            None => 1,
            Some(parent) => parent.tier() + 1,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResearchError {
    #[error("{0:?} is already researched")]
    AlreadyResearched(Technology),
    #[error("{0:?} is locked behind {1:?}")]
    Locked(Technology, Technology),
}

/// Per-tribe research state. Technologies move from locked to researchable to researched
/// and never back.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologyTree {
    researched: BTreeSet<Technology>,
}

impl TechnologyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_researched(&self, tech: Technology) -> bool {
        self.researched.contains(&tech)
    }

    pub fn is_researchable(&self, tech: Technology) -> bool {
        !self.is_researched(tech)
            && tech
                .prerequisite()
                .map_or(true, |parent| self.is_researched(parent))
    }

    pub fn is_everything_researched(&self) -> bool {
        self.researched.len() == Technology::ALL.len()
    }

    pub fn researched(&self) -> impl Iterator<Item = Technology> + '_ {
        self.researched.iter().copied()
    }

    pub fn researchable(&self) -> Vec<Technology> {
        Technology::ALL
            .into_iter()
            .filter(|&tech| self.is_researchable(tech))
            .collect()
    }

    pub fn research(&mut self, tech: Technology) -> Result<(), ResearchError> {
        if self.is_researched(tech) {
            return Err(ResearchError::AlreadyResearched(tech));
        }
        if let Some(parent) = tech.prerequisite() {
            if !self.is_researched(parent) {
                return Err(ResearchError::Locked(tech, parent));
            }
        }
        self.researched.insert(tech);
        Ok(())
    }

    /// Researches a uniformly chosen researchable technology, if any is left.
    pub fn research_at_random(&mut self, rng: &mut GameRng) -> Option<Technology> {
        let options = self.researchable();
        let tech = *rng.choose(&options)?;
        self.researched.insert(tech);
        Some(tech)
    }
}
