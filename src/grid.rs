// Driver pool: the draftable grid and the sources that provide it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tiers::tier_for_position;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read grid file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: csv::Error,
    },

    #[error("grid is empty")]
    Empty,

    #[error("duplicate driver id `{id}` in grid")]
    DuplicateDriver { id: String },

    #[error("duplicate start position P{position} in grid")]
    DuplicatePosition { position: u32 },

    #[error("start positions must form 1..{expected}, got P{position}")]
    PositionOutOfRange { position: u32, expected: u32 },
}

/// A single draftable driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    /// Stable identifier, the three-letter code (e.g. "VER").
    pub id: String,
    /// Full display name.
    pub name: String,
    /// Car number.
    pub number: u32,
    /// Constructor name.
    pub team: String,
    /// Qualifying/grid position, 1-based, distinct per driver.
    pub start_position: u32,
    /// Tier derived from the start position at load time.
    pub tier: u8,
}

impl Driver {
    pub fn new(id: &str, name: &str, number: u32, team: &str, start_position: u32) -> Self {
        Driver {
            id: id.to_string(),
            name: name.to_string(),
            number,
            team: team.to_string(),
            start_position,
            tier: tier_for_position(start_position),
        }
    }
}

/// Something that can provide the full draftable grid before a draft starts.
///
/// The engine never cares whether the grid came from a built-in table, a
/// file, or a live timing feed; it only sees validated `Driver` rows.
pub trait GridSource {
    fn starting_grid(&self) -> Result<Vec<Driver>, GridError>;
}

/// Validate the uniqueness invariants on a grid: non-empty, distinct ids,
/// and start positions forming exactly 1..=N.
///
/// Violations are fatal configuration errors caught before a draft is
/// allowed to start, never mid-draft.
pub fn validate_grid(drivers: &[Driver]) -> Result<(), GridError> {
    if drivers.is_empty() {
        return Err(GridError::Empty);
    }

    let mut ids = HashSet::new();
    let mut positions = HashSet::new();
    let n = drivers.len() as u32;

    for driver in drivers {
        if !ids.insert(driver.id.as_str()) {
            return Err(GridError::DuplicateDriver {
                id: driver.id.clone(),
            });
        }
        if driver.start_position < 1 || driver.start_position > n {
            return Err(GridError::PositionOutOfRange {
                position: driver.start_position,
                expected: n,
            });
        }
        if !positions.insert(driver.start_position) {
            return Err(GridError::DuplicatePosition {
                position: driver.start_position,
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Static grid adapter
// ---------------------------------------------------------------------------

/// Built-in driver table for the current season, in championship order.
/// Used when no qualifying data has been loaded yet.
pub struct StaticGrid;

impl GridSource for StaticGrid {
    fn starting_grid(&self) -> Result<Vec<Driver>, GridError> {
        let mut drivers = vec![
            Driver::new("VER", "Max Verstappen", 1, "Red Bull Racing", 1),
            Driver::new("NOR", "Lando Norris", 4, "McLaren", 2),
            Driver::new("LEC", "Charles Leclerc", 16, "Ferrari", 3),
            Driver::new("PIA", "Oscar Piastri", 81, "McLaren", 4),
            Driver::new("SAI", "Carlos Sainz", 55, "Williams", 5),
            Driver::new("HAM", "Lewis Hamilton", 44, "Ferrari", 6),
            Driver::new("RUS", "George Russell", 63, "Mercedes", 7),
            Driver::new("ALO", "Fernando Alonso", 14, "Aston Martin", 8),
            Driver::new("GAS", "Pierre Gasly", 10, "Alpine", 9),
            Driver::new("TSU", "Yuki Tsunoda", 22, "Racing Bulls", 10),
            Driver::new("ALB", "Alex Albon", 23, "Williams", 11),
            Driver::new("ANT", "Kimi Antonelli", 12, "Mercedes", 12),
            Driver::new("STR", "Lance Stroll", 18, "Aston Martin", 13),
            Driver::new("HUL", "Nico Hulkenberg", 27, "Kick Sauber", 14),
            Driver::new("OCO", "Esteban Ocon", 31, "Haas", 15),
            Driver::new("LAW", "Liam Lawson", 30, "Red Bull Racing", 16),
            Driver::new("HAD", "Isack Hadjar", 21, "Racing Bulls", 17),
            Driver::new("BEA", "Oliver Bearman", 87, "Haas", 18),
            Driver::new("BOR", "Gabriel Bortoleto", 5, "Kick Sauber", 19),
            Driver::new("COL", "Franco Colapinto", 43, "Alpine", 20),
        ];
        drivers.sort_by_key(|d| d.start_position);
        validate_grid(&drivers)?;
        Ok(drivers)
    }
}

// ---------------------------------------------------------------------------
// CSV grid adapter
// ---------------------------------------------------------------------------

/// Row shape for a CSV grid file: `code,name,number,team,start_position`.
#[derive(Debug, Deserialize)]
struct GridRow {
    code: String,
    name: String,
    number: u32,
    team: String,
    start_position: u32,
}

/// Grid loaded from a qualifying-results CSV, one row per driver.
pub struct CsvGrid {
    path: PathBuf,
}

impl CsvGrid {
    pub fn new(path: impl AsRef<Path>) -> Self {
        CsvGrid {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl GridSource for CsvGrid {
    fn starting_grid(&self) -> Result<Vec<Driver>, GridError> {
        if !self.path.exists() {
            return Err(GridError::FileNotFound {
                path: self.path.clone(),
            });
        }

        let mut reader =
            csv::Reader::from_path(&self.path).map_err(|source| GridError::ReadError {
                path: self.path.clone(),
                source,
            })?;

        let mut drivers = Vec::new();
        for row in reader.deserialize::<GridRow>() {
            let row = row.map_err(|source| GridError::ReadError {
                path: self.path.clone(),
                source,
            })?;
            drivers.push(Driver::new(
                &row.code,
                &row.name,
                row.number,
                &row.team,
                row.start_position,
            ));
        }

        drivers.sort_by_key(|d| d.start_position);
        validate_grid(&drivers)?;
        Ok(drivers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> Vec<Driver> {
        vec![
            Driver::new("VER", "Max Verstappen", 1, "Red Bull Racing", 1),
            Driver::new("NOR", "Lando Norris", 4, "McLaren", 2),
            Driver::new("LEC", "Charles Leclerc", 16, "Ferrari", 3),
        ]
    }

    #[test]
    fn static_grid_is_valid_and_sorted() {
        let drivers = StaticGrid.starting_grid().unwrap();
        assert_eq!(drivers.len(), 20);
        for (idx, driver) in drivers.iter().enumerate() {
            assert_eq!(driver.start_position, idx as u32 + 1);
        }
    }

    #[test]
    fn static_grid_tiers_assigned() {
        let drivers = StaticGrid.starting_grid().unwrap();
        assert_eq!(drivers[0].tier, 1);
        assert_eq!(drivers[5].tier, 2);
        assert_eq!(drivers[10].tier, 3);
        assert_eq!(drivers[19].tier, 4);
    }

    #[test]
    fn validate_accepts_small_grid() {
        assert!(validate_grid(&small_grid()).is_ok());
    }

    #[test]
    fn validate_rejects_empty() {
        assert!(matches!(validate_grid(&[]), Err(GridError::Empty)));
    }

    #[test]
    fn validate_rejects_duplicate_id() {
        let mut drivers = small_grid();
        drivers[2].id = "VER".to_string();
        assert!(matches!(
            validate_grid(&drivers),
            Err(GridError::DuplicateDriver { .. })
        ));
    }

    #[test]
    fn validate_rejects_duplicate_position() {
        let mut drivers = small_grid();
        drivers[2].start_position = 2;
        assert!(matches!(
            validate_grid(&drivers),
            Err(GridError::DuplicatePosition { position: 2 })
        ));
    }

    #[test]
    fn validate_rejects_gapped_positions() {
        let mut drivers = small_grid();
        drivers[2].start_position = 7; // grid of 3 must cover 1..=3
        assert!(matches!(
            validate_grid(&drivers),
            Err(GridError::PositionOutOfRange { position: 7, .. })
        ));
    }

    #[test]
    fn csv_grid_missing_file() {
        let grid = CsvGrid::new("/nonexistent/quali.csv");
        assert!(matches!(
            grid.starting_grid(),
            Err(GridError::FileNotFound { .. })
        ));
    }

    #[test]
    fn csv_grid_parses_rows() {
        let dir = std::env::temp_dir().join("gridpick_csv_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("quali.csv");
        std::fs::write(
            &path,
            "code,name,number,team,start_position\n\
             NOR,Lando Norris,4,McLaren,2\n\
             VER,Max Verstappen,1,Red Bull Racing,1\n",
        )
        .unwrap();

        let drivers = CsvGrid::new(&path).starting_grid().unwrap();
        assert_eq!(drivers.len(), 2);
        // Sorted by start position regardless of file order.
        assert_eq!(drivers[0].id, "VER");
        assert_eq!(drivers[1].id, "NOR");
        assert_eq!(drivers[0].tier, 1);
    }
}
