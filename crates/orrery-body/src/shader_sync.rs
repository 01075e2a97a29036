//! Shader-state cache: pushes light and property uniforms only when they changed.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use orrery_config::SyncConfig;
use tracing::debug;

use crate::registry::{PropertyId, PropertyRegistry};
use crate::services::{ChannelValue, LightDirectory, LightId, LightSource, MaterialSink};
use crate::value::TargetKind;

/// Light position relative to the body.
pub const LIGHT_POSITION_UNIFORM: &str = "_LightPosition";
/// Light color.
pub const LIGHT_COLOR_UNIFORM: &str = "_LightColor";
/// Direct light intensity.
pub const LIGHT_INTENSITY_UNIFORM: &str = "_LightIntensity";
/// Ambient light intensity.
pub const AMBIENT_INTENSITY_UNIFORM: &str = "_AmbientIntensity";

/// Light state as a single uniform block, 48 bytes, std140-compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    /// xyz = body-relative light position, w = direct intensity.
    pub position_intensity: [f32; 4],
    /// Linear RGBA color.
    pub color: [f32; 4],
    /// x = ambient intensity, yzw = padding.
    pub ambient: [f32; 4],
}

/// Last values pushed to the shader.
#[derive(Clone, Copy, Debug, PartialEq)]
struct LightSnapshot {
    position: Vec3,
    color: Vec4,
    intensity: f32,
    ambient_intensity: f32,
}

impl From<LightSource> for LightSnapshot {
    fn from(light: LightSource) -> Self {
        Self {
            position: light.position,
            color: light.color,
            intensity: light.intensity,
            ambient_intensity: light.ambient_intensity,
        }
    }
}

/// Cached light relation and uniform snapshot of one body.
#[derive(Clone, Debug)]
pub struct ShaderSyncCache {
    light_epsilon: f32,
    position_epsilon: f32,
    light: Option<LightId>,
    snapshot: Option<LightSnapshot>,
    owner_position: Option<Vec3>,
    scans: usize,
}

impl ShaderSyncCache {
    /// Empty cache using the configured epsilons.
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            light_epsilon: config.light_epsilon,
            position_epsilon: config.position_epsilon,
            light: None,
            snapshot: None,
            owner_position: None,
            scans: 0,
        }
    }

    /// Nearest light to `owner`.
    ///
    /// The cached light is reused as long as the directory still knows it; the
    /// directory is scanned only when nothing is cached.
    pub fn resolve_light<L: LightDirectory + ?Sized>(
        &mut self,
        lights: &L,
        owner: Vec3,
    ) -> Option<(LightId, LightSource)> {
        if let Some(id) = self.light {
            if let Some(light) = lights.light(id) {
                return Some((id, light));
            }
            debug!(light = id.0, "cached light vanished");
            self.light = None;
        }

        self.scans += 1;
        let nearest = lights.lights().into_iter().min_by(|(_, a), (_, b)| {
            a.position
                .distance_squared(owner)
                .total_cmp(&b.position.distance_squared(owner))
        })?;
        self.light = Some(nearest.0);
        Some(nearest)
    }

    /// Push the light uniforms that differ from the snapshot.
    ///
    /// `force` pushes all four. The light position is also re-pushed when the
    /// owner moved, since the shader receives it relative to the owner.
    /// Returns the number of uniforms pushed.
    pub fn sync<L, S>(&mut self, lights: &L, owner: Vec3, sink: &mut S, force: bool) -> usize
    where
        L: LightDirectory + ?Sized,
        S: MaterialSink + ?Sized,
    {
        let Some((_, light)) = self.resolve_light(lights, owner) else {
            return 0;
        };
        let live = LightSnapshot::from(light);
        let cached = if force { None } else { self.snapshot };

        let owner_moved = self
            .owner_position
            .is_none_or(|last| last.distance(owner) > self.position_epsilon);
        let eps = self.light_epsilon;
        let mut pushes = 0;

        if owner_moved || cached.is_none_or(|c| c.position.distance(live.position) > eps) {
            sink.set_uniform(LIGHT_POSITION_UNIFORM, ChannelValue::Vec3(live.position - owner));
            pushes += 1;
        }
        if cached.is_none_or(|c| c.color.distance(live.color) > eps) {
            sink.set_uniform(LIGHT_COLOR_UNIFORM, ChannelValue::Vec4(live.color));
            pushes += 1;
        }
        if cached.is_none_or(|c| (c.intensity - live.intensity).abs() > eps) {
            sink.set_uniform(LIGHT_INTENSITY_UNIFORM, ChannelValue::Float(live.intensity));
            pushes += 1;
        }
        if cached.is_none_or(|c| (c.ambient_intensity - live.ambient_intensity).abs() > eps) {
            sink.set_uniform(AMBIENT_INTENSITY_UNIFORM, ChannelValue::Float(live.ambient_intensity));
            pushes += 1;
        }

        self.snapshot = Some(live);
        self.owner_position = Some(owner);
        pushes
    }

    /// Forget the snapshot so the next sync pushes everything.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
        self.owner_position = None;
    }

    /// Forget the cached light as well as the snapshot.
    pub fn reset(&mut self) {
        self.invalidate();
        self.light = None;
    }

    /// Number of directory scans performed.
    pub fn scan_count(&self) -> usize {
        self.scans
    }

    /// Last pushed light state as a uniform block.
    pub fn uniform_block(&self) -> Option<LightUniform> {
        let snapshot = self.snapshot?;
        let owner = self.owner_position.unwrap_or(Vec3::ZERO);
        let relative = snapshot.position - owner;
        Some(LightUniform {
            position_intensity: relative.extend(snapshot.intensity).to_array(),
            color: snapshot.color.to_array(),
            ambient: [snapshot.ambient_intensity, 0.0, 0.0, 0.0],
        })
    }
}

/// Write the shader-uniform targets of `ids` with their effective values.
///
/// Returns the number of uniforms written.
pub fn push_property_uniforms<S: MaterialSink + ?Sized>(
    registry: &PropertyRegistry,
    ids: &[PropertyId],
    sink: &mut S,
) -> usize {
    let mut pushes = 0;
    for &id in ids {
        for (channel, value) in registry.channel_values(id, TargetKind::ShaderUniform) {
            sink.set_uniform(channel, value);
            pushes += 1;
        }
    }
    pushes
}
