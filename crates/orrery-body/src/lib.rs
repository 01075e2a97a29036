//! Property and LOD synchronization engine for a procedurally generated
//! celestial body.
//!
//! A [`PlanetBody`] holds the typed property registry of its blueprint, maps
//! value changes onto dirty texture groups, chooses texture resolutions through
//! the LOD state machine, and keeps shader uniforms in sync with the nearest
//! light. Meshes, texture synthesis, materials and lights are collaborators
//! reached through the traits in [`services`].

mod animation;
mod blueprint;
mod body;
mod error;
mod group;
mod registry;
mod scheduler;
mod seed;
mod serial;
pub mod services;
mod shader_sync;
mod value;

#[cfg(test)]
mod fixtures;

pub use animation::PropertyAnimator;
pub use blueprint::{Blueprint, BlueprintLibrary, BlueprintSelection};
pub use body::{PlanetBody, TickReport};
pub use error::{BackendError, BodyError, DeserializationError, PropertyError};
pub use group::{DirtySet, GroupId, GroupTable, TextureGroupDef, TextureRoute};
pub use orrery_lod::{LodEvent, LodState, TextureFamily, TextureLodStrategy};
pub use registry::{CHANGE_EPSILON, PropertyDefinition, PropertyId, PropertyKind, PropertyRegistry};
pub use scheduler::{BuildEvent, RebuildScheduler};
pub use seed::{
    AmbientRng, SeededScope, derive_blueprint_index, draw_blueprint_index, draw_defaults,
    resolve_defaults, resolve_selection, seed_rng,
};
pub use serial::{CacheDocument, decode_blueprint_index, decode_properties, encode_value};
pub use services::{
    Bitmap, ChannelValue, GeometryProvider, LightDirectory, LightId, LightSource, MaterialSink,
    Services, TextureBackend,
};
pub use shader_sync::{
    AMBIENT_INTENSITY_UNIFORM, LIGHT_COLOR_UNIFORM, LIGHT_INTENSITY_UNIFORM,
    LIGHT_POSITION_UNIFORM, LightUniform, ShaderSyncCache, push_property_uniforms,
};
pub use value::{NumericType, PropertyTarget, PropertyValue, TargetKind, UpdateMethod};
