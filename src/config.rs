use crate::render::{ColorMode, RenderMode};
use crate::sim::Settings;
use crate::sim::settings::requested_count;
use serde::Deserialize;
use std::path::PathBuf;

/// User configuration loaded from the config file.
/// Every key is optional: CLI flags override config, config overrides defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: Option<RenderModeConfig>,
    pub color: Option<ColorModeConfig>,
    /// Target FPS (1-120)
    pub fps: Option<u32>,
    /// Hide status bar
    pub clean: Option<bool>,
    /// Color quantization step (0 = off)
    pub color_quant: Option<u8>,
    pub rows: Option<usize>,
    pub columns: Option<usize>,
    pub octaves: Option<usize>,
    pub falloff: Option<f64>,
    pub xy_increment: Option<f64>,
    pub z_increment: Option<f64>,
    pub count: Option<usize>,
    pub seed: Option<u32>,
    /// Fraction of the previous frame kept each frame
    pub fade: Option<f64>,
    pub min_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub particle_size: Option<f64>,
    /// tracing filter directive, e.g. "debug" or "flowfield=trace"
    pub log_level: Option<String>,
}

impl Config {
    /// Overlay the simulation keys onto `base`.
    pub fn apply_to(&self, mut base: Settings) -> Settings {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if let Some(v) = self.$field {
                    base.$field = v;
                })*
            };
        }
        overlay!(
            rows,
            columns,
            octaves,
            falloff,
            xy_increment,
            z_increment,
            count,
            seed,
            fade,
            min_speed,
            max_speed,
            particle_size
        );
        base.count = requested_count(base.count);
        base
    }
}

/// Render mode names for config file (kebab-case friendly)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderModeConfig {
    Braille,
    HalfBlock,
    Ascii,
}

impl From<RenderModeConfig> for RenderMode {
    fn from(c: RenderModeConfig) -> Self {
        match c {
            RenderModeConfig::Braille => RenderMode::Braille,
            RenderModeConfig::HalfBlock => RenderMode::HalfBlock,
            RenderModeConfig::Ascii => RenderMode::Ascii,
        }
    }
}

/// Color mode names for config file (kebab-case friendly)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorModeConfig {
    Mono,
    Ansi16,
    Ansi256,
    TrueColor,
}

impl From<ColorModeConfig> for ColorMode {
    fn from(c: ColorModeConfig) -> Self {
        match c {
            ColorModeConfig::Mono => ColorMode::Mono,
            ColorModeConfig::Ansi16 => ColorMode::Ansi16,
            ColorModeConfig::Ansi256 => ColorMode::Ansi256,
            ColorModeConfig::TrueColor => ColorMode::TrueColor,
        }
    }
}

/// ~/.config/flowfield/config.toml (platform equivalent elsewhere)
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("flowfield").join("config.toml"))
}

pub fn parse_config(contents: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(contents)
}

/// Load config from file. A missing file gives the default config; a file
/// that fails to parse is reported so the caller can warn and fall back.
pub fn load_config() -> Result<Config, String> {
    let Some(path) = config_path() else {
        return Ok(Config::default());
    };
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    parse_config(&contents).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
}

/// Write the commented default config. Refuses to overwrite an existing file.
pub fn init_config() -> std::io::Result<PathBuf> {
    let path = config_path()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no config directory"))?;
    if path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists", path.display()),
        ));
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, default_config_string())?;
    Ok(path)
}

/// Default config file with every option commented out
pub fn default_config_string() -> String {
    r#"# flowfield configuration
# CLI flags override these settings.

# Render mode: braille, half-block, ascii
# render = "braille"

# Color mode: mono, ansi16, ansi256, true-color
# color = "true-color"

# Target FPS (1-120)
# fps = 30

# Hide status bar
# clean = false

# Color quantization step (0 = off, 4/8/16 = coarser colors, less output)
# color_quant = 0

# Flow field grid (1-50 each)
# rows = 15
# columns = 15

# Noise detail: octave count (1-10) and per-octave falloff (0-1)
# octaves = 4
# falloff = 0.65

# Noise step between neighbouring cells (0-0.2) and per frame (0-0.05)
# xy_increment = 0.05
# z_increment = 0.001

# Particle count at start
# count = 300

# Noise seed (random when unset)
# seed = 0

# Trail length: fraction of the previous frame kept (0-1)
# fade = 0.8

# Per-particle speed cap is drawn from min_speed..max_speed (pixels per frame)
# min_speed = 0.5
# max_speed = 1.75
# particle_size = 1.0

# Log filter, overridden by RUST_LOG
# log_level = "info"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::settings::MAX_COUNT;

    #[test]
    fn empty_config_is_all_none() {
        let c = parse_config("").unwrap();
        assert!(c.render.is_none());
        assert!(c.rows.is_none());
        assert!(c.log_level.is_none());
    }

    #[test]
    fn default_config_string_parses_to_defaults() {
        let c = parse_config(&default_config_string()).unwrap();
        assert_eq!(c.apply_to(Settings::default()), Settings::default());
    }

    #[test]
    fn reads_modes_and_sim_keys() {
        let c = parse_config(
            r#"
render = "half-block"
color = "ansi256"
fps = 60
rows = 8
falloff = 0.3
seed = 17
"#,
        )
        .unwrap();
        assert_eq!(c.render, Some(RenderModeConfig::HalfBlock));
        assert_eq!(ColorMode::from(c.color.unwrap()), ColorMode::Ansi256);
        assert_eq!(c.fps, Some(60));
        let s = c.apply_to(Settings::default());
        assert_eq!(s.rows, 8);
        assert_eq!(s.falloff, 0.3);
        assert_eq!(s.seed, 17);
        assert_eq!(s.columns, 15);
    }

    #[test]
    fn huge_count_is_capped() {
        let c = parse_config("count = 200000").unwrap();
        assert_eq!(c.apply_to(Settings::default()).count, MAX_COUNT);
        let c = parse_config("count = 0").unwrap();
        assert_eq!(c.apply_to(Settings::default()).count, 1);
    }

    #[test]
    fn bad_value_is_an_error() {
        assert!(parse_config(r#"render = "sixel""#).is_err());
        assert!(parse_config("rows = -2").is_err());
    }
}
