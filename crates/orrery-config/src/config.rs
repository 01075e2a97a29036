//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level body configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Texture and mesh level-of-detail settings.
    pub lod: LodConfig,
    /// Change-detection thresholds for the shader sync step.
    pub sync: SyncConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Texture-detail strategy. Exactly one is active at a time.
///
/// The `*Separate` variants keep independent resolutions for the body-wide
/// ("common") texture family and the per-material family.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TextureLodStrategy {
    /// Fixed resolution from configuration.
    Static,
    /// Fixed resolutions, one per texture family.
    StaticSeparate,
    /// Step through a resolution table, one step per tick.
    #[default]
    Progressive,
    /// Step through one resolution table per texture family.
    ProgressiveSeparate,
    /// Resolution looked up from the on-screen size each tick.
    DistanceBased,
    /// On-screen size lookup with one table per texture family.
    DistanceBasedSeparate,
}

impl TextureLodStrategy {
    /// Returns `true` for the variants that track two resolutions.
    pub fn is_separate(self) -> bool {
        matches!(
            self,
            Self::StaticSeparate | Self::ProgressiveSeparate | Self::DistanceBasedSeparate
        )
    }
}

/// One row of a screen-size resolution table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResolutionBand {
    /// Smallest normalized on-screen size (0..1) that selects this band.
    pub min_screen_size: f32,
    /// Texture resolution in pixels.
    pub resolution: u32,
}

/// Level-of-detail configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Active texture strategy.
    pub strategy: TextureLodStrategy,
    /// Static resolution for the common texture family.
    pub static_common_resolution: u32,
    /// Static resolution for the material family (separate strategies only).
    pub static_material_resolution: u32,
    /// Progressive resolution steps for the common family, strictly increasing.
    pub progressive_common_steps: Vec<u32>,
    /// Progressive resolution steps for the material family, strictly increasing.
    pub progressive_material_steps: Vec<u32>,
    /// Screen-size bands for the common family, largest `min_screen_size` first.
    pub distance_common: Vec<ResolutionBand>,
    /// Screen-size bands for the material family, largest `min_screen_size` first.
    pub distance_material: Vec<ResolutionBand>,
    /// Screen-size thresholds for mesh LOD, strictly decreasing.
    /// `mesh_thresholds[i]` is the smallest screen size that still selects level `i`.
    pub mesh_thresholds: Vec<f32>,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            strategy: TextureLodStrategy::default(),
            static_common_resolution: 1024,
            static_material_resolution: 512,
            progressive_common_steps: vec![64, 128, 256, 512, 1024],
            progressive_material_steps: vec![32, 64, 128, 256, 512],
            distance_common: vec![
                ResolutionBand { min_screen_size: 0.5, resolution: 2048 },
                ResolutionBand { min_screen_size: 0.2, resolution: 1024 },
                ResolutionBand { min_screen_size: 0.05, resolution: 512 },
                ResolutionBand { min_screen_size: 0.0, resolution: 128 },
            ],
            distance_material: vec![
                ResolutionBand { min_screen_size: 0.5, resolution: 1024 },
                ResolutionBand { min_screen_size: 0.2, resolution: 512 },
                ResolutionBand { min_screen_size: 0.0, resolution: 64 },
            ],
            mesh_thresholds: vec![0.6, 0.3, 0.1, 0.02],
        }
    }
}

/// Shader sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Minimum change in a light field before it is re-pushed.
    pub light_epsilon: f32,
    /// Minimum owner movement before the light position is re-pushed.
    pub position_epsilon: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            light_epsilon: 1e-4,
            position_epsilon: 1e-4,
        }
    }
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Emit a log line for every texture group rebuilt.
    pub trace_rebuilds: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            trace_rebuilds: false,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Platform default config directory (`<config_dir>/orrery`).
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("orrery"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
