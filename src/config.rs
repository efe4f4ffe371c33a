// Configuration loading and parsing (league.toml).

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::draft::{Player, Roster, RosterError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {source}")]
    ParseError { source: toml::de::Error },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

/// Raw deserialization target for the entire league.toml file.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueSection,
    #[serde(default)]
    teams: Vec<TeamConfig>,
    #[serde(default)]
    database: Option<DatabaseSection>,
    #[serde(default)]
    grid: Option<GridSection>,
}

#[derive(Debug, Clone, Deserialize)]
struct LeagueSection {
    name: String,
    /// Rounds in the snake draft: how many drivers each team ends up with.
    drivers_per_team: usize,
    /// Variant rule: each team may hold at most one driver per tier.
    #[serde(default)]
    one_per_tier: bool,
}

/// One team entry from `[[teams]]`. Draft slots are assigned from the
/// order teams appear in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "#607D8B".to_string()
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GridSection {
    /// Path to a qualifying-results CSV. When absent the built-in grid
    /// is used.
    csv: Option<String>,
}

/// The assembled, validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub league_name: String,
    pub drivers_per_team: usize,
    pub one_per_tier: bool,
    pub teams: Vec<TeamConfig>,
    pub db_path: String,
    pub grid_csv: Option<PathBuf>,
}

impl Config {
    /// Load and validate `league.toml` from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a league config from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let file: LeagueFile =
            toml::from_str(contents).map_err(|source| ConfigError::ParseError { source })?;
        let config = Config {
            league_name: file.league.name,
            drivers_per_team: file.league.drivers_per_team,
            one_per_tier: file.league.one_per_tier,
            teams: file.teams,
            db_path: file
                .database
                .map(|d| d.path)
                .unwrap_or_else(default_db_path),
            grid_csv: file.grid.and_then(|g| g.csv).map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.league_name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "league.name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.drivers_per_team < 1 {
            return Err(ConfigError::ValidationError {
                field: "league.drivers_per_team".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.teams.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "teams".to_string(),
                message: "at least one [[teams]] entry is required".to_string(),
            });
        }
        for (idx, team) in self.teams.iter().enumerate() {
            if team.name.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    field: format!("teams[{idx}].name"),
                    message: "must not be empty".to_string(),
                });
            }
            if self.teams[..idx].iter().any(|t| t.name == team.name) {
                return Err(ConfigError::ValidationError {
                    field: format!("teams[{idx}].name"),
                    message: format!("duplicate team name `{}`", team.name),
                });
            }
        }
        Ok(())
    }

    /// Build the draft roster: slots assigned from file order, ids derived
    /// from team names. The roster constructor re-checks the permutation
    /// invariant, but slots built here are 1..=N by construction.
    pub fn roster(&self) -> Result<Roster, RosterError> {
        let players = self
            .teams
            .iter()
            .enumerate()
            .map(|(idx, team)| Player {
                id: team_id(&team.name),
                display_name: team.name.clone(),
                color: team.color.clone(),
                draft_slot: idx as u32 + 1,
            })
            .collect();
        Roster::new(players)
    }
}

/// Derive a stable player id from a team name ("Red Five" -> "red-five").
pub fn team_id(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Default database location: the platform data directory, falling back
/// to the working directory.
fn default_db_path() -> String {
    if let Some(dirs) = ProjectDirs::from("", "", "gridpick") {
        let dir = dirs.data_dir();
        if std::fs::create_dir_all(dir).is_ok() {
            return dir.join("gridpick.db").to_string_lossy().into_owned();
        }
    }
    "gridpick.db".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Double-hash delimiters: the hex colors contain `"#`.
    const SAMPLE: &str = r##"
        [league]
        name = "Sunday Grand Prix League"
        drivers_per_team = 3

        [[teams]]
        name = "Red Five"
        color = "#F44336"

        [[teams]]
        name = "Box Box Box"

        [database]
        path = "test.db"

        [grid]
        csv = "quali.csv"
    "##;

    #[test]
    fn parses_full_config() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.league_name, "Sunday Grand Prix League");
        assert_eq!(config.drivers_per_team, 3);
        assert!(!config.one_per_tier);
        assert_eq!(config.teams.len(), 2);
        assert_eq!(config.teams[0].color, "#F44336");
        // Missing color falls back to the default.
        assert_eq!(config.teams[1].color, "#607D8B");
        assert_eq!(config.db_path, "test.db");
        assert_eq!(config.grid_csv.as_deref(), Some(Path::new("quali.csv")));
    }

    #[test]
    fn roster_from_file_order() {
        let config = Config::from_toml(SAMPLE).unwrap();
        let roster = config.roster().unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.player_at(0).id, "red-five");
        assert_eq!(roster.player_at(0).draft_slot, 1);
        assert_eq!(roster.player_at(1).id, "box-box-box");
        assert_eq!(roster.player_at(1).draft_slot, 2);
    }

    #[test]
    fn one_per_tier_flag() {
        let toml = r#"
            [league]
            name = "Tiered"
            drivers_per_team = 4
            one_per_tier = true

            [[teams]]
            name = "A"
        "#;
        let config = Config::from_toml(toml).unwrap();
        assert!(config.one_per_tier);
    }

    #[test]
    fn rejects_zero_rounds() {
        let toml = r#"
            [league]
            name = "L"
            drivers_per_team = 0

            [[teams]]
            name = "A"
        "#;
        assert!(matches!(
            Config::from_toml(toml),
            Err(ConfigError::ValidationError { field, .. }) if field == "league.drivers_per_team"
        ));
    }

    #[test]
    fn rejects_no_teams() {
        let toml = r#"
            [league]
            name = "L"
            drivers_per_team = 2
        "#;
        assert!(matches!(
            Config::from_toml(toml),
            Err(ConfigError::ValidationError { field, .. }) if field == "teams"
        ));
    }

    #[test]
    fn rejects_duplicate_team_names() {
        let toml = r#"
            [league]
            name = "L"
            drivers_per_team = 2

            [[teams]]
            name = "A"

            [[teams]]
            name = "A"
        "#;
        assert!(matches!(
            Config::from_toml(toml),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Config::load("/definitely/not/league.toml"),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn team_id_slugging() {
        assert_eq!(team_id("Red Five"), "red-five");
        assert_eq!(team_id("  Box  Box Box "), "box-box-box");
    }
}
