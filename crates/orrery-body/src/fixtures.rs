//! Shared test blueprints and recording collaborators.

use std::collections::{HashMap, HashSet};

use glam::{Vec3, Vec4};
use orrery_config::{Config, LodConfig};
use orrery_lod::{LodMachine, TextureFamily};

use crate::blueprint::{Blueprint, BlueprintLibrary};
use crate::body::PlanetBody;
use crate::error::BackendError;
use crate::group::TextureGroupDef;
use crate::registry::PropertyDefinition;
use crate::seed::seed_rng;
use crate::services::{
    Bitmap, ChannelValue, GeometryProvider, LightDirectory, LightId, LightSource, MaterialSink,
    Services, TextureBackend,
};
use crate::value::PropertyTarget;

// ---------------------------------------------------------------------------
// Blueprints
// ---------------------------------------------------------------------------

fn rocky_named(name: &str) -> Blueprint {
    Blueprint::new(name)
        .group(
            TextureGroupDef::new("Maps", TextureFamily::Common)
                .route("height", "_HeightMap")
                .route("color", "_MainTex"),
        )
        .group(TextureGroupDef::new("Surface", TextureFamily::Material).route("albedo", "_SurfaceTex"))
        .property(
            PropertyDefinition::numeric("brightness", 0, 0.0, 2.0, 1.0)
                .affects(&["Maps"])
                .target(PropertyTarget::uniform("_Brightness"))
                .target(PropertyTarget::backend("brightness")),
        )
        .property(
            PropertyDefinition::numeric("continent_scale", 1, 0.0, 10.0, 2.0)
                .randomized()
                .affects(&["Maps"])
                .target(PropertyTarget::backend("scale").lerp(0.0, 1.0)),
        )
        .property(
            PropertyDefinition::numeric("crater_count", 2, 0.0, 50.0, 10.0)
                .integer()
                .randomized()
                .affects(&["Maps"])
                .target(PropertyTarget::backend("crater_count")),
        )
        .property(
            PropertyDefinition::material_selection("surface_material", 3, ["rock", "ice", "lava"], 0)
                .randomized()
                .affects(&["Surface"])
                .target(PropertyTarget::backend("material")),
        )
        .property(
            PropertyDefinition::color("surface_color", 4, [0.5, 0.4, 0.3, 1.0])
                .randomized()
                .affects(&["Surface"])
                .target(PropertyTarget::uniform("_SurfaceColor"))
                .target(PropertyTarget::backend("tint")),
        )
}

/// Rocky planet: a common "Maps" group and a material "Surface" group.
pub fn rocky_blueprint() -> Blueprint {
    rocky_named("rocky")
}

fn gas_giant() -> Blueprint {
    Blueprint::new("gas_giant")
        .group(TextureGroupDef::new("Maps", TextureFamily::Common).route("color", "_MainTex"))
        .group(TextureGroupDef::new("StormMask", TextureFamily::Material).route("storm", "_StormMask"))
        .property(
            PropertyDefinition::numeric("brightness", 0, 0.0, 2.0, 1.0)
                .affects(&["Maps"])
                .target(PropertyTarget::uniform("_Brightness")),
        )
        .property(
            PropertyDefinition::numeric("band_count", 1, 2.0, 24.0, 8.0)
                .integer()
                .randomized()
                .affects(&["Maps"])
                .target(PropertyTarget::backend("bands")),
        )
        .property(
            PropertyDefinition::numeric("storm_intensity", 2, 0.0, 1.0, 0.3)
                .randomized()
                .affects(&["StormMask"])
                .target(PropertyTarget::backend("storms")),
        )
}

/// Six blueprints; every one defines `brightness` affecting "Maps".
pub fn library() -> BlueprintLibrary {
    let extra = |name: &str, def: PropertyDefinition| rocky_named(name).property(def);
    BlueprintLibrary::new(vec![
        rocky_blueprint(),
        extra(
            "icy",
            PropertyDefinition::numeric("frost_cover", 5, 0.0, 1.0, 0.6)
                .randomized()
                .affects(&["Surface"])
                .target(PropertyTarget::backend("frost")),
        ),
        gas_giant(),
        extra(
            "volcanic",
            PropertyDefinition::numeric("magma_glow", 5, 0.0, 4.0, 1.0)
                .target(PropertyTarget::uniform("_MagmaGlow")),
        ),
        extra(
            "ocean",
            PropertyDefinition::numeric("ocean_level", 5, 0.0, 1.0, 0.4)
                .randomized()
                .affects(&["Maps"])
                .target(PropertyTarget::backend("sea_level")),
        ),
        rocky_named("barren"),
    ])
    .expect("fixture library is valid")
}

/// LOD machine built from the default configuration.
pub fn lod() -> LodMachine {
    LodMachine::from_config(&LodConfig::default()).expect("default LOD config is valid")
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Backend recording inputs and generate calls.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub inputs: Vec<(String, ChannelValue)>,
    pub generated: Vec<(String, u32)>,
    pub fail_on: Option<String>,
}

impl RecordingBackend {
    pub fn failing_on(group: &str) -> Self {
        Self {
            fail_on: Some(group.to_string()),
            ..Self::default()
        }
    }
}

impl TextureBackend for RecordingBackend {
    fn set_input(&mut self, name: &str, value: ChannelValue) {
        self.inputs.push((name.to_string(), value));
    }

    fn generate(
        &mut self,
        group: &str,
        resolution: u32,
    ) -> Result<HashMap<String, Bitmap>, BackendError> {
        if self.fail_on.as_deref() == Some(group) {
            return Err(BackendError::new(group, "synthetic failure"));
        }
        self.generated.push((group.to_string(), resolution));
        Ok(["height", "color", "albedo", "storm"]
            .into_iter()
            .map(|name| (name.to_string(), Bitmap::new(1, 1)))
            .collect())
    }
}

/// Sink recording uniform writes and bound texture slots.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub uniforms: Vec<(String, ChannelValue)>,
    pub textures: Vec<String>,
}

impl RecordingSink {
    pub fn uniform_count(&self, name: &str) -> usize {
        self.uniforms.iter().filter(|(n, _)| n == name).count()
    }
}

impl MaterialSink for RecordingSink {
    fn set_uniform(&mut self, name: &str, value: ChannelValue) {
        self.uniforms.push((name.to_string(), value));
    }

    fn set_texture(&mut self, slot: &str, _bitmap: &Bitmap) {
        self.textures.push(slot.to_string());
    }
}

/// Geometry provider whose meshes are just their level, available on demand.
#[derive(Debug, Default)]
pub struct LodMeshes {
    pub unavailable: HashSet<usize>,
    pub requests: Vec<usize>,
}

impl GeometryProvider for LodMeshes {
    type Mesh = usize;

    fn mesh_for_lod(&mut self, level: usize) -> Option<usize> {
        self.requests.push(level);
        (!self.unavailable.contains(&level)).then_some(level)
    }
}

/// Mutable list of scene lights.
#[derive(Debug, Default)]
pub struct SceneLights {
    lights: Vec<(LightId, LightSource)>,
}

impl SceneLights {
    pub fn new(lights: Vec<(LightId, LightSource)>) -> Self {
        Self { lights }
    }

    pub fn update(&mut self, id: LightId, f: impl FnOnce(&mut LightSource)) {
        if let Some((_, light)) = self.lights.iter_mut().find(|(i, _)| *i == id) {
            f(light);
        }
    }

    pub fn remove(&mut self, id: LightId) {
        self.lights.retain(|(i, _)| *i != id);
    }
}

impl LightDirectory for SceneLights {
    fn lights(&self) -> Vec<(LightId, LightSource)> {
        self.lights.clone()
    }

    fn light(&self, id: LightId) -> Option<LightSource> {
        self.lights.iter().find(|(i, _)| *i == id).map(|(_, l)| *l)
    }
}

/// A distant warm star.
pub fn sun() -> LightSource {
    LightSource {
        position: Vec3::new(100.0, 0.0, 0.0),
        color: Vec4::new(1.0, 0.95, 0.9, 1.0),
        intensity: 1.5,
        ambient_intensity: 0.1,
    }
}

pub type TestBody = PlanetBody<LodMeshes, RecordingBackend, RecordingSink, SceneLights>;

/// Body over the six-blueprint library with one sun, using `config`.
pub fn body_with(config: Config, seed: i64) -> TestBody {
    let services = Services {
        geometry: LodMeshes::default(),
        backend: RecordingBackend::default(),
        sink: RecordingSink::default(),
        lights: SceneLights::new(vec![(LightId(1), sun())]),
    };
    PlanetBody::new(config, library(), services, seed_rng(1234), seed).expect("fixture body")
}

/// Body with the default configuration.
pub fn body(seed: i64) -> TestBody {
    body_with(Config::default(), seed)
}
