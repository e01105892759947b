use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{Actor, ActorId, Board, City, Position, ResourceKind, Rules, Terrain, Tribe};

#[derive(Debug, Error)]
pub enum InitError {
    #[error("level is empty")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    NotSquare {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("unknown cell `{token}` at row {row}, column {column}")]
    UnknownCell {
        token: String,
        row: usize,
        column: usize,
    },
    #[error("level of size {size} declares {cells} cells")]
    CellCount { size: usize, cells: usize },
    #[error("at least one tribe is required")]
    NoTribes,
    #[error("level places capitals for {capitals} tribes but {tribes} tribes were given")]
    TribeCountMismatch { tribes: usize, capitals: usize },
    #[error("tribe {0} has more than one capital")]
    DuplicateCapital(usize),
    #[error("capital of tribe {tribe} sits on water at {position:?}")]
    CapitalOnWater { tribe: usize, position: Position },
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCell {
    pub terrain: Terrain,
    #[serde(default)]
    pub resource: Option<ResourceKind>,
    /// Index of the tribe whose capital stands here.
    #[serde(default)]
    pub capital_of: Option<usize>,
}

/// Two tribes on a 6x6 island.
pub const DUEL_LEVEL: &str = include_str!("../data/levels/duel.txt");
/// Four tribes around a lake on a 10x10 map.
pub const SKIRMISH_LEVEL: &str = include_str!("../data/levels/skirmish.txt");

/// Raw level data: a square grid in row-major order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
    pub size: usize,
    pub cells: Vec<LevelCell>,
}

impl LevelData {
    pub fn from_yaml(yaml: &str) -> Result<Self, InitError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parses the compact text form: one row per line, whitespace separated cells.
    ///
    /// A cell is a terrain character optionally followed by `:` and a resource character.
    /// Terrain: `.` plain, `s` shallow water, `d` deep water, `m` mountain, `f` forest,
    /// `v` village, `c<n>` capital of tribe `n`. Resources: `h` fish, `f` fruit, `a` animal,
    /// `w` whales, `o` ore, `c` crops, `r` ruins. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, InitError> {
        let rows: Vec<Vec<&str>> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| line.split_whitespace().collect())
            .collect();
        let size = rows.len();
        if size == 0 {
            return Err(InitError::Empty);
        }

        let mut cells = Vec::with_capacity(size * size);
        for (row, tokens) in rows.iter().enumerate() {
            if tokens.len() != size {
                return Err(InitError::NotSquare {
                    row,
                    found: tokens.len(),
                    expected: size,
                });
            }
            for (column, token) in tokens.iter().enumerate() {
                let cell = parse_cell(token).ok_or_else(|| InitError::UnknownCell {
                    token: token.to_string(),
                    row,
                    column,
                })?;
                cells.push(cell);
            }
        }
        Ok(Self { size, cells })
    }

    /// Capital positions indexed by tribe.
    pub fn capitals(&self) -> Result<Vec<(usize, Position)>, InitError> {
        let mut capitals: Vec<(usize, Position)> = Vec::new();
        for (index, cell) in self.cells.iter().enumerate() {
            let Some(tribe) = cell.capital_of else {
                continue;
            };
            if capitals.iter().any(|&(t, _)| t == tribe) {
                return Err(InitError::DuplicateCapital(tribe));
            }
            let position = Position::new((index % self.size) as i32, (index / self.size) as i32);
            if cell.terrain.is_water() {
                return Err(InitError::CapitalOnWater { tribe, position });
            }
            capitals.push((tribe, position));
        }
        capitals.sort_by_key(|&(tribe, _)| tribe);
        Ok(capitals)
    }
}

fn parse_cell(token: &str) -> Option<LevelCell> {
    let mut chars = token.chars();
    let terrain_char = chars.next()?;
    let rest = chars.as_str();

    if terrain_char == 'c' {
        let tribe = rest.parse::<usize>().ok()?;
        return Some(LevelCell {
            terrain: Terrain::City,
            resource: None,
            capital_of: Some(tribe),
        });
    }

    let terrain = match terrain_char {
        '.' => Terrain::Plain,
        's' => Terrain::ShallowWater,
        'd' => Terrain::DeepWater,
        'm' => Terrain::Mountain,
        'f' => Terrain::Forest,
        'v' => Terrain::Village,
        _ => return None,
    };
    let resource = match rest {
        "" => None,
        _ => {
            let mut r = rest.strip_prefix(':')?.chars();
            let resource = match r.next()? {
                'h' => ResourceKind::Fish,
                'f' => ResourceKind::Fruit,
                'a' => ResourceKind::Animal,
                'w' => ResourceKind::Whales,
                'o' => ResourceKind::Ore,
                'c' => ResourceKind::Crops,
                'r' => ResourceKind::Ruins,
                _ => return None,
            };
            if r.next().is_some() {
                return None;
            }
            Some(resource)
        }
    };
    Some(LevelCell {
        terrain,
        resource,
        capital_of: None,
    })
}

/// Builds the opening board: terrain from the level, one capital, starting unit, starting
/// technology and starting stars per tribe, and initial vision around each capital.
pub fn build_board(tribes: Vec<Tribe>, level: &LevelData, rules: &Rules) -> Result<Board, InitError> {
    if tribes.is_empty() {
        return Err(InitError::NoTribes);
    }
    if level.size == 0 {
        return Err(InitError::Empty);
    }
    if level.cells.len() != level.size * level.size {
        return Err(InitError::CellCount {
            size: level.size,
            cells: level.cells.len(),
        });
    }
    let capitals = level.capitals()?;
    let in_range = capitals
        .iter()
        .enumerate()
        .all(|(i, &(tribe, _))| i == tribe);
    if capitals.len() != tribes.len() || !in_range {
        return Err(InitError::TribeCountMismatch {
            tribes: tribes.len(),
            capitals: capitals.len(),
        });
    }

    let mut board = Board::new(level.size, tribes, rules.diplomacy);
    for (index, cell) in level.cells.iter().enumerate() {
        let Some(pos) = board.position_of(index) else {
            continue;
        };
        if let Some(tile) = board.tile_mut(pos) {
            tile.terrain = cell.terrain;
            tile.resource = cell.resource;
        }
    }

    for &(index, pos) in &capitals {
        let tribe_id = ActorId(index as u32);
        if let Some(tile) = board.tile_mut(pos) {
            tile.terrain = Terrain::City;
            tile.resource = None;
        }
        let city_id = board.add_actor(|id| {
            Actor::City(City::new(id, tribe_id, pos, true, false, &rules.city))
        });
        board.claim_territory(city_id, pos, 1);

        let Some(tribe) = board.tribe_mut(tribe_id) else {
            continue;
        };
        tribe.add_city(city_id);
        tribe.capital = Some(city_id);
        tribe.tech.research(tribe.kind().starting_tech()).ok();
        tribe.add_stars(rules.game.starting_stars);
        let unit_kind = tribe.kind().starting_unit();

        board.add_unit(
            unit_kind,
            rules.unit(unit_kind).stats,
            pos,
            tribe_id,
            Some(city_id),
        );
    }

    for &(index, pos) in &capitals {
        board.reveal(ActorId(index as u32), pos, rules.vision.city);
    }

    debug!(size = level.size, tribes = capitals.len(), "board built");
    Ok(board)
}
