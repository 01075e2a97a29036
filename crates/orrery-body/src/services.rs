//! Collaborator interfaces: geometry, procedural-texture backend, material sink,
//! and the scene's light directory.

use std::collections::HashMap;

use glam::{Vec3, Vec4};

use crate::error::BackendError;

/// Bitmap produced by the texture backend.
pub type Bitmap = image::RgbaImage;

/// A value written to a shader uniform or a backend input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChannelValue {
    /// Scalar float.
    Float(f32),
    /// Scalar integer (rounded numeric properties, selections).
    Int(i32),
    /// Three-component vector.
    Vec3(Vec3),
    /// Four-component vector (colors).
    Vec4(Vec4),
}

/// Supplies meshes for each LOD level.
pub trait GeometryProvider {
    /// Mesh handle type.
    type Mesh;

    /// Mesh for `level`, or `None` if it is not available yet.
    fn mesh_for_lod(&mut self, level: usize) -> Option<Self::Mesh>;
}

/// Opaque procedural-texture generator.
pub trait TextureBackend {
    /// Set a named generator input.
    fn set_input(&mut self, name: &str, value: ChannelValue);

    /// Generate all outputs of a texture group synchronously.
    fn generate(
        &mut self,
        group: &str,
        resolution: u32,
    ) -> Result<HashMap<String, Bitmap>, BackendError>;
}

/// Shader/material system receiving uniforms and textures.
pub trait MaterialSink {
    /// Upload a uniform value.
    fn set_uniform(&mut self, name: &str, value: ChannelValue);

    /// Bind a bitmap to a texture slot.
    fn set_texture(&mut self, slot: &str, bitmap: &Bitmap);
}

/// Stable identifier of a light inside a [`LightDirectory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LightId(pub u64);

/// Observable state of a dynamic light source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSource {
    /// World-space position.
    pub position: Vec3,
    /// Linear RGBA color.
    pub color: Vec4,
    /// Direct intensity multiplier.
    pub intensity: f32,
    /// Ambient term intensity.
    pub ambient_intensity: f32,
}

/// Lookup of the scene's active dynamic lights. The body never owns lights.
pub trait LightDirectory {
    /// Every active light.
    fn lights(&self) -> Vec<(LightId, LightSource)>;

    /// Current state of a light, `None` if it no longer exists.
    fn light(&self, id: LightId) -> Option<LightSource>;
}

/// The collaborators a body drives.
pub struct Services<G, B, S, L> {
    /// Mesh provider.
    pub geometry: G,
    /// Procedural-texture backend.
    pub backend: B,
    /// Shader/material sink.
    pub sink: S,
    /// Scene light directory.
    pub lights: L,
}
