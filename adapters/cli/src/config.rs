use std::{fs, path::Path};

use anyhow::{Context, Result};
use maze_chase_system_maze_generation::GenerationConfig;
use maze_chase_world::Rules;
use serde::Deserialize;

/// Settings file with optional `[generation]` and `[rules]` tables.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    /// Maze generation constants.
    pub generation: GenerationConfig,
    /// Scoring and pacing rules.
    pub rules: Rules,
}

impl Settings {
    /// Loads settings from `path`, or defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(contents).context("failed to parse settings toml contents")?;
        settings
            .generation
            .validate()
            .context("generation table describes an unbuildable maze")?;
        Ok(settings)
    }
}
