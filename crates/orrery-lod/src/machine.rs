//! Texture-resolution strategy state machine and mesh LOD tracking.
//!
//! The machine never rebuilds anything itself. It reports [`LodEvent`]s that the
//! owning body feeds into the same dirty set property edits use.

use orrery_config::{LodConfig, TextureLodStrategy};
use tracing::debug;

use crate::error::LodError;
use crate::table::{ResolutionTable, ScreenSizeThresholds, StepTable};

/// Texture family a group belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureFamily {
    /// Body-wide textures shared by every surface material.
    Common,
    /// Textures specific to the gas/solid surface material.
    Material,
}

/// Synthetic invalidation emitted when the texture resolution changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LodEvent {
    /// Every texture group must be rebuilt.
    RebuildAll,
    /// Only groups of one family must be rebuilt.
    RebuildFamily(TextureFamily),
}

/// Current LOD state of a body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LodState {
    /// Index into the shared LOD mesh table; `None` until a mesh was adopted.
    pub mesh_level: Option<usize>,
    /// Current step of the progressive strategies.
    pub progressive_step: usize,
    /// Resolution of the common texture family.
    pub common_resolution: u32,
    /// Resolution of the material texture family.
    pub material_resolution: u32,
}

/// Cached distance-table levels, `None` right after entering the strategy.
#[derive(Clone, Copy, Debug, Default)]
struct DistanceCache {
    common: Option<usize>,
    material: Option<usize>,
}

/// Tracks mesh LOD and the active texture strategy.
#[derive(Clone, Debug)]
pub struct LodMachine {
    strategy: TextureLodStrategy,
    state: LodState,
    mesh_thresholds: ScreenSizeThresholds,
    static_common: u32,
    static_material: u32,
    progressive_common: StepTable,
    progressive_material: StepTable,
    distance_common: ResolutionTable,
    distance_material: ResolutionTable,
    distance_cache: DistanceCache,
}

impl LodMachine {
    /// Build and validate the machine from configuration, entering the configured strategy.
    pub fn from_config(config: &LodConfig) -> Result<Self, LodError> {
        if config.static_common_resolution == 0 || config.static_material_resolution == 0 {
            return Err(LodError::ZeroResolution("static"));
        }
        let mut machine = Self {
            strategy: config.strategy,
            state: LodState::default(),
            mesh_thresholds: ScreenSizeThresholds::new(config.mesh_thresholds.clone())?,
            static_common: config.static_common_resolution,
            static_material: config.static_material_resolution,
            progressive_common: StepTable::new(
                "progressive_common",
                config.progressive_common_steps.clone(),
            )?,
            progressive_material: StepTable::new(
                "progressive_material",
                config.progressive_material_steps.clone(),
            )?,
            distance_common: ResolutionTable::new(
                "distance_common",
                config.distance_common.clone(),
            )?,
            distance_material: ResolutionTable::new(
                "distance_material",
                config.distance_material.clone(),
            )?,
            distance_cache: DistanceCache::default(),
        };
        machine.enter(config.strategy);
        Ok(machine)
    }

    /// Active texture strategy.
    pub fn strategy(&self) -> TextureLodStrategy {
        self.strategy
    }

    /// Current LOD state.
    pub fn state(&self) -> &LodState {
        &self.state
    }

    /// Resolution currently assigned to a texture family.
    pub fn resolution(&self, family: TextureFamily) -> u32 {
        match family {
            TextureFamily::Common => self.state.common_resolution,
            TextureFamily::Material => self.state.material_resolution,
        }
    }

    /// Number of steps of the active progressive tables.
    pub fn step_count(&self) -> usize {
        if self.strategy.is_separate() {
            self.progressive_common
                .len()
                .max(self.progressive_material.len())
        } else {
            self.progressive_common.len()
        }
    }

    /// Switch (or re-enter) a strategy, resetting its cached state.
    ///
    /// Static and progressive strategies adopt their base resolution
    /// immediately and request a full rebuild. Distance-based strategies defer
    /// to the next [`LodMachine::update_textures`] call, which has the metric.
    pub fn set_strategy(&mut self, strategy: TextureLodStrategy) -> Option<LodEvent> {
        debug!(from = ?self.strategy, to = ?strategy, "texture LOD strategy change");
        self.strategy = strategy;
        self.enter(strategy)
    }

    /// Replace the static resolutions. Takes effect on the next update.
    pub fn set_static_resolutions(&mut self, common: u32, material: u32) {
        self.static_common = common.max(1);
        self.static_material = material.max(1);
    }

    fn enter(&mut self, strategy: TextureLodStrategy) -> Option<LodEvent> {
        self.state.progressive_step = 0;
        self.distance_cache = DistanceCache::default();
        match strategy {
            TextureLodStrategy::Static | TextureLodStrategy::StaticSeparate => {
                let (common, material) = self.static_targets();
                self.adopt(common, material);
                Some(LodEvent::RebuildAll)
            }
            TextureLodStrategy::Progressive | TextureLodStrategy::ProgressiveSeparate => {
                let (common, material) = self.progressive_targets(0);
                self.adopt(common, material);
                Some(LodEvent::RebuildAll)
            }
            TextureLodStrategy::DistanceBased | TextureLodStrategy::DistanceBasedSeparate => None,
        }
    }

    fn adopt(&mut self, common: u32, material: u32) {
        self.state.common_resolution = common;
        self.state.material_resolution = material;
    }

    fn static_targets(&self) -> (u32, u32) {
        if self.strategy.is_separate() {
            (self.static_common, self.static_material)
        } else {
            (self.static_common, self.static_common)
        }
    }

    fn progressive_targets(&self, step: usize) -> (u32, u32) {
        let common = self.progressive_common.resolution(step);
        if self.strategy.is_separate() {
            (common, self.progressive_material.resolution(step))
        } else {
            (common, common)
        }
    }

    /// Apply new resolutions and describe which families changed.
    fn transition(&mut self, common: u32, material: u32) -> Option<LodEvent> {
        let common_changed = common != self.state.common_resolution;
        let material_changed = material != self.state.material_resolution;
        self.adopt(common, material);

        match (common_changed, material_changed) {
            (false, false) => None,
            _ if !self.strategy.is_separate() => Some(LodEvent::RebuildAll),
            (true, true) => Some(LodEvent::RebuildAll),
            (true, false) => Some(LodEvent::RebuildFamily(TextureFamily::Common)),
            (false, true) => Some(LodEvent::RebuildFamily(TextureFamily::Material)),
        }
    }

    /// Advance the texture strategy by one tick.
    ///
    /// `build_in_flight` blocks progressive advancement so the machine never
    /// runs more than one step ahead of the last completed build.
    pub fn update_textures(&mut self, metric: f32, build_in_flight: bool) -> Option<LodEvent> {
        match self.strategy {
            TextureLodStrategy::Static | TextureLodStrategy::StaticSeparate => {
                let (common, material) = self.static_targets();
                let changed = common != self.state.common_resolution
                    || material != self.state.material_resolution;
                self.adopt(common, material);
                changed.then_some(LodEvent::RebuildAll)
            }
            TextureLodStrategy::Progressive | TextureLodStrategy::ProgressiveSeparate => {
                if build_in_flight {
                    return None;
                }
                let last = self.step_count() - 1;
                if self.state.progressive_step >= last {
                    return None;
                }
                self.state.progressive_step += 1;
                let (common, material) = self.progressive_targets(self.state.progressive_step);
                debug!(
                    step = self.state.progressive_step,
                    common, material, "progressive texture step"
                );
                self.transition(common, material)
            }
            TextureLodStrategy::DistanceBased | TextureLodStrategy::DistanceBasedSeparate => {
                let common_level = self.distance_common.level(metric);
                let material_level = if self.strategy.is_separate() {
                    self.distance_material.level(metric)
                } else {
                    common_level
                };
                let first = self.distance_cache.common.is_none();
                let unchanged = self.distance_cache.common == Some(common_level)
                    && self.distance_cache.material == Some(material_level);
                if unchanged {
                    return None;
                }
                self.distance_cache = DistanceCache {
                    common: Some(common_level),
                    material: Some(material_level),
                };

                let common = self.distance_common.resolution(common_level);
                let material = if self.strategy.is_separate() {
                    self.distance_material.resolution(material_level)
                } else {
                    common
                };
                debug!(common_level, material_level, common, material, "distance texture level");
                let event = self.transition(common, material);
                if first { Some(LodEvent::RebuildAll) } else { event }
            }
        }
    }

    /// Mesh level for a metric if it differs from the adopted one.
    pub fn mesh_change(&self, metric: f32) -> Option<usize> {
        let level = self.mesh_thresholds.select(metric);
        (self.state.mesh_level != Some(level)).then_some(level)
    }

    /// Record that the mesh for `level` was swapped in.
    pub fn adopt_mesh_level(&mut self, level: usize) {
        self.state.mesh_level = Some(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_config::ResolutionBand;

    fn config(strategy: TextureLodStrategy) -> LodConfig {
        LodConfig {
            strategy,
            static_common_resolution: 1024,
            static_material_resolution: 256,
            progressive_common_steps: vec![64, 128, 256, 512],
            progressive_material_steps: vec![32, 64],
            distance_common: vec![
                ResolutionBand { min_screen_size: 0.5, resolution: 2048 },
                ResolutionBand { min_screen_size: 0.0, resolution: 256 },
            ],
            distance_material: vec![
                ResolutionBand { min_screen_size: 0.8, resolution: 1024 },
                ResolutionBand { min_screen_size: 0.0, resolution: 128 },
            ],
            mesh_thresholds: vec![0.5, 0.1],
        }
    }

    fn machine(strategy: TextureLodStrategy) -> LodMachine {
        LodMachine::from_config(&config(strategy)).unwrap()
    }

    #[test]
    fn test_progressive_advances_one_step_per_tick() {
        let mut lod = machine(TextureLodStrategy::Progressive);
        assert_eq!(lod.state().progressive_step, 0);
        assert_eq!(lod.resolution(TextureFamily::Common), 64);

        for n in 1..=2 {
            assert_eq!(lod.update_textures(1.0, false), Some(LodEvent::RebuildAll));
            assert_eq!(lod.state().progressive_step, n);
        }
        assert_eq!(lod.resolution(TextureFamily::Common), 256);
        assert_eq!(lod.resolution(TextureFamily::Material), 256);
    }

    #[test]
    fn test_progressive_caps_at_last_step() {
        let mut lod = machine(TextureLodStrategy::Progressive);
        for _ in 0..10 {
            lod.update_textures(0.5, false);
        }
        assert_eq!(lod.state().progressive_step, 3);
        assert_eq!(lod.update_textures(0.5, false), None);
        assert_eq!(lod.state().progressive_step, 3);
        assert_eq!(lod.resolution(TextureFamily::Common), 512);
    }

    #[test]
    fn test_progressive_waits_for_in_flight_build() {
        let mut lod = machine(TextureLodStrategy::Progressive);
        assert_eq!(lod.update_textures(1.0, true), None);
        assert_eq!(lod.state().progressive_step, 0);
        lod.update_textures(1.0, false);
        assert_eq!(lod.state().progressive_step, 1);
    }

    #[test]
    fn test_reentering_progressive_resets_step() {
        let mut lod = machine(TextureLodStrategy::Progressive);
        lod.update_textures(1.0, false);
        lod.update_textures(1.0, false);
        assert_eq!(
            lod.set_strategy(TextureLodStrategy::Progressive),
            Some(LodEvent::RebuildAll)
        );
        assert_eq!(lod.state().progressive_step, 0);
        assert_eq!(lod.resolution(TextureFamily::Common), 64);
    }

    #[test]
    fn test_progressive_separate_tracks_two_tables() {
        let mut lod = machine(TextureLodStrategy::ProgressiveSeparate);
        assert_eq!(lod.resolution(TextureFamily::Material), 32);
        assert_eq!(lod.update_textures(1.0, false), Some(LodEvent::RebuildAll));
        assert_eq!(lod.resolution(TextureFamily::Material), 64);

        // Material table is exhausted; only the common family keeps stepping.
        assert_eq!(
            lod.update_textures(1.0, false),
            Some(LodEvent::RebuildFamily(TextureFamily::Common))
        );
        assert_eq!(lod.resolution(TextureFamily::Common), 256);
        assert_eq!(lod.resolution(TextureFamily::Material), 64);
        assert_eq!(lod.step_count(), 4);
    }

    #[test]
    fn test_static_rebuilds_only_on_config_change() {
        let mut lod = machine(TextureLodStrategy::Static);
        assert_eq!(lod.resolution(TextureFamily::Common), 1024);
        assert_eq!(lod.resolution(TextureFamily::Material), 1024);
        assert_eq!(lod.update_textures(0.1, false), None);
        assert_eq!(lod.update_textures(0.9, false), None);

        lod.set_static_resolutions(2048, 256);
        assert_eq!(lod.update_textures(0.9, false), Some(LodEvent::RebuildAll));
        assert_eq!(lod.resolution(TextureFamily::Common), 2048);
        assert_eq!(lod.update_textures(0.9, false), None);
    }

    #[test]
    fn test_static_separate_keeps_families_apart() {
        let mut lod = machine(TextureLodStrategy::StaticSeparate);
        assert_eq!(lod.resolution(TextureFamily::Common), 1024);
        assert_eq!(lod.resolution(TextureFamily::Material), 256);

        lod.set_static_resolutions(1024, 512);
        assert_eq!(lod.update_textures(0.5, false), Some(LodEvent::RebuildAll));
        assert_eq!(lod.resolution(TextureFamily::Material), 512);
    }

    #[test]
    fn test_distance_based_rebuilds_on_level_change_only() {
        let mut lod = machine(TextureLodStrategy::DistanceBased);
        assert_eq!(lod.update_textures(0.9, false), Some(LodEvent::RebuildAll));
        assert_eq!(lod.resolution(TextureFamily::Common), 2048);
        assert_eq!(lod.update_textures(0.7, false), None);
        assert_eq!(lod.update_textures(0.2, false), Some(LodEvent::RebuildAll));
        assert_eq!(lod.resolution(TextureFamily::Common), 256);
        assert_eq!(lod.resolution(TextureFamily::Material), 256);
    }

    #[test]
    fn test_distance_based_separate_reports_family() {
        let mut lod = machine(TextureLodStrategy::DistanceBasedSeparate);
        assert_eq!(lod.update_textures(0.9, false), Some(LodEvent::RebuildAll));
        assert_eq!(lod.resolution(TextureFamily::Material), 1024);

        // 0.6 keeps the common band but drops the material band.
        assert_eq!(
            lod.update_textures(0.6, false),
            Some(LodEvent::RebuildFamily(TextureFamily::Material))
        );
        assert_eq!(lod.resolution(TextureFamily::Common), 2048);
        assert_eq!(lod.resolution(TextureFamily::Material), 128);
    }

    #[test]
    fn test_switching_to_distance_defers_to_next_tick() {
        let mut lod = machine(TextureLodStrategy::Static);
        assert_eq!(lod.set_strategy(TextureLodStrategy::DistanceBased), None);
        assert_eq!(lod.update_textures(0.1, false), Some(LodEvent::RebuildAll));
        assert_eq!(lod.resolution(TextureFamily::Common), 256);
    }

    #[test]
    fn test_mesh_change_reported_until_adopted() {
        let mut lod = machine(TextureLodStrategy::Static);
        assert_eq!(lod.mesh_change(0.9), Some(0));
        // Not adopted (mesh unavailable): still reported next tick.
        assert_eq!(lod.mesh_change(0.9), Some(0));
        lod.adopt_mesh_level(0);
        assert_eq!(lod.mesh_change(0.9), None);
        assert_eq!(lod.mesh_change(0.2), Some(1));
        assert_eq!(lod.mesh_change(0.01), Some(2));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = config(TextureLodStrategy::Progressive);
        cfg.progressive_common_steps = vec![];
        assert_eq!(
            LodMachine::from_config(&cfg).unwrap_err(),
            LodError::EmptyTable("progressive_common")
        );
    }
}
