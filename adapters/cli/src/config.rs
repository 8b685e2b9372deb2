use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use urban_brush_core::GridConfig;
use urban_brush_system_brush::BrushSettings;

/// Settings read from the optional TOML configuration file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CliConfig {
    /// Construction parameters of new grids.
    pub(crate) grid: GridConfig,
    /// Default brush dimensions.
    pub(crate) brush: BrushSettings,
}

/// Loads the configuration at `path`, or the defaults when no path is given.
pub(crate) fn load(path: Option<&Path>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid config at {}", path.display()))
}

fn parse(contents: &str) -> Result<CliConfig> {
    let config: CliConfig =
        toml::from_str(contents).context("failed to parse config toml contents")?;
    if config.grid.lot_size <= 0.0 || !config.grid.lot_size.is_finite() {
        anyhow::bail!("lot_size must be a positive number, got {}", config.grid.lot_size);
    }
    Ok(config)
}
