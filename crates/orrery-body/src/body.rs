//! The planet body: owns the registry, LOD machine, overlays and caches of one
//! celestial body and drives them from a single per-frame tick.

use glam::Vec3;
use orrery_config::Config;
use orrery_lod::{LodEvent, LodMachine, LodState, TextureLodStrategy};
use rand::Rng;
use tracing::{debug, info, trace_span};

use crate::animation::PropertyAnimator;
use crate::blueprint::{Blueprint, BlueprintLibrary, BlueprintSelection};
use crate::error::{BodyError, PropertyError};
use crate::group::GroupId;
use crate::registry::PropertyRegistry;
use crate::scheduler::{BuildEvent, RebuildScheduler};
use crate::seed::{AmbientRng, derive_blueprint_index, resolve_selection};
use crate::serial::{CacheDocument, decode_blueprint_index, decode_properties};
use crate::services::{GeometryProvider, LightDirectory, MaterialSink, Services, TextureBackend};
use crate::shader_sync::{LightUniform, ShaderSyncCache, push_property_uniforms};
use crate::value::PropertyValue;

/// What a tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Mesh LOD level swapped in this tick.
    pub mesh_swapped: Option<usize>,
    /// Texture groups regenerated.
    pub groups_rebuilt: usize,
    /// Uniforms written to the material sink.
    pub uniform_pushes: usize,
}

/// One procedurally generated celestial body.
pub struct PlanetBody<G: GeometryProvider, B, S, L> {
    config: Config,
    library: BlueprintLibrary,
    services: Services<G, B, S, L>,
    ambient: AmbientRng,
    selection: BlueprintSelection,
    installed: usize,
    registry: PropertyRegistry,
    animator: PropertyAnimator,
    scheduler: RebuildScheduler,
    lod: LodMachine,
    shader_sync: ShaderSyncCache,
    mesh: Option<G::Mesh>,
    position: Vec3,
    force_sync: bool,
}

impl<G, B, S, L> PlanetBody<G, B, S, L>
where
    G: GeometryProvider,
    B: TextureBackend,
    S: MaterialSink,
    L: LightDirectory,
{
    /// Create a body for `seed`, installing the blueprint the seed selects.
    pub fn new(
        config: Config,
        library: BlueprintLibrary,
        services: Services<G, B, S, L>,
        mut ambient: AmbientRng,
        seed: i64,
    ) -> Result<Self, BodyError> {
        let lod = LodMachine::from_config(&config.lod)?;
        let selection = BlueprintSelection::from_seed(seed);
        let mut registry = PropertyRegistry::default();
        let installed =
            resolve_selection(&library, &mut registry, &mut ambient, &selection, None, false)?;
        info!(
            seed,
            blueprint = installed,
            strategy = ?lod.strategy(),
            "planet body created"
        );

        Ok(Self {
            shader_sync: ShaderSyncCache::new(&config.sync),
            config,
            library,
            services,
            ambient,
            selection,
            installed,
            registry,
            animator: PropertyAnimator::new(),
            scheduler: RebuildScheduler::new(),
            lod,
            mesh: None,
            position: Vec3::ZERO,
            force_sync: true,
        })
    }

    // -- accessors ----------------------------------------------------------

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Seed and blueprint selection.
    pub fn selection(&self) -> &BlueprintSelection {
        &self.selection
    }

    /// Index of the installed blueprint.
    pub fn blueprint_index(&self) -> usize {
        self.installed
    }

    /// The installed blueprint.
    pub fn blueprint(&self) -> Option<&Blueprint> {
        self.library.get(self.installed)
    }

    /// The property registry.
    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    /// Current LOD state.
    pub fn lod_state(&self) -> &LodState {
        self.lod.state()
    }

    /// Active texture strategy.
    pub fn strategy(&self) -> TextureLodStrategy {
        self.lod.strategy()
    }

    /// The collaborators.
    pub fn services(&self) -> &Services<G, B, S, L> {
        &self.services
    }

    /// Mutable access to the collaborators.
    pub fn services_mut(&mut self) -> &mut Services<G, B, S, L> {
        &mut self.services
    }

    /// Mesh currently in use, if any was available yet.
    pub fn mesh(&self) -> Option<&G::Mesh> {
        self.mesh.as_ref()
    }

    /// World-space position of the body.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Last pushed light state as a uniform block.
    pub fn light_uniform(&self) -> Option<LightUniform> {
        self.shader_sync.uniform_block()
    }

    // -- properties ---------------------------------------------------------

    /// Effective value of a property.
    pub fn get_value(&self, key: &str) -> Result<PropertyValue, PropertyError> {
        self.registry.get_value(key)
    }

    /// Clamp and store a property value. Returns whether it changed.
    pub fn set_value(
        &mut self,
        key: &str,
        value: impl Into<PropertyValue>,
        trigger_rebuild: bool,
    ) -> Result<bool, PropertyError> {
        self.registry.set_value(key, value, trigger_rebuild)
    }

    /// Select a material option by name.
    pub fn select_option(&mut self, key: &str, option: &str) -> Result<bool, PropertyError> {
        self.registry.select_option(key, option)
    }

    /// Restore a property's explicit default.
    pub fn reset_value(&mut self, key: &str) -> Result<bool, PropertyError> {
        self.registry.reset_value(key)
    }

    /// Animate a numeric property towards `target` over `duration` seconds.
    pub fn override_property(
        &mut self,
        key: &str,
        target: f32,
        duration: f64,
        now: f64,
    ) -> Result<(), PropertyError> {
        self.animator
            .override_to(&mut self.registry, key, target, duration, now)
    }

    /// Returns `true` while an overlay animates `key`.
    pub fn is_overridden(&self, key: &str) -> Result<bool, PropertyError> {
        Ok(self.animator.is_active(self.registry.id(key)?))
    }

    /// Cancel an active overlay. Returns whether one was active.
    pub fn cancel_override(&mut self, key: &str) -> Result<bool, PropertyError> {
        self.animator.cancel(&mut self.registry, key)
    }

    // -- seed and blueprint -------------------------------------------------

    fn resolve(&mut self, leave_overrides: bool) -> Result<(), BodyError> {
        let index = resolve_selection(
            &self.library,
            &mut self.registry,
            &mut self.ambient,
            &self.selection,
            Some(self.installed),
            leave_overrides,
        )?;
        if index != self.installed {
            self.animator.clear();
            info!(from = self.installed, to = index, "blueprint switched");
            self.installed = index;
        }
        Ok(())
    }

    /// Replace the seed and re-resolve defaults. A pinned blueprint is kept.
    pub fn reseed(&mut self, seed: i64, leave_overrides: bool) -> Result<(), BodyError> {
        self.selection.seed = seed;
        if !self.selection.override_flag {
            self.selection.blueprint_index = None;
        }
        debug!(seed, leave_overrides, "reseeding body");
        self.resolve(leave_overrides)
    }

    /// Draw a fresh seed from the ambient generator and reseed.
    pub fn randomize_seed(&mut self, leave_overrides: bool) -> Result<i64, BodyError> {
        let seed = self.ambient.random::<i64>();
        self.reseed(seed, leave_overrides)?;
        Ok(seed)
    }

    /// Pin a blueprint index so it survives reseeding.
    pub fn pin_blueprint(&mut self, index: usize) -> Result<(), BodyError> {
        self.library.check(index)?;
        self.selection.pin(index);
        if index != self.installed {
            self.resolve(false)?;
        }
        Ok(())
    }

    /// Unpin the blueprint; the seed selects it again.
    pub fn clear_blueprint_override(&mut self) -> Result<(), BodyError> {
        self.selection.clear_override();
        let derived = derive_blueprint_index(self.selection.seed, self.library.len());
        if derived != self.installed {
            self.resolve(false)?;
        }
        Ok(())
    }

    // -- LOD ----------------------------------------------------------------

    fn apply_lod_event(&mut self, event: LodEvent) {
        let groups: Vec<GroupId> = match event {
            LodEvent::RebuildAll => self.registry.groups().ids().collect(),
            LodEvent::RebuildFamily(family) => self.registry.groups().family_ids(family).collect(),
        };
        debug!(?event, groups = groups.len(), "LOD invalidated texture groups");
        self.registry.dirty_mut().mark_all(groups);
    }

    /// Switch the texture strategy; re-entering resets it.
    pub fn set_strategy(&mut self, strategy: TextureLodStrategy) {
        if let Some(event) = self.lod.set_strategy(strategy) {
            self.apply_lod_event(event);
        }
    }

    /// Change the static-strategy resolutions; applied on the next tick.
    pub fn set_static_resolutions(&mut self, common: u32, material: u32) {
        self.lod.set_static_resolutions(common, material);
    }

    /// Move the body.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    // -- rebuild ------------------------------------------------------------

    /// Returns `true` if any texture group is dirty.
    pub fn needs_rebuild(&self) -> bool {
        self.scheduler.needs_rebuild(&self.registry)
    }

    /// Returns `true` while a texture build is in flight.
    pub fn is_building(&self) -> bool {
        self.scheduler.is_building()
    }

    /// Report an adapter-driven build as in flight (or finished).
    pub fn set_external_build_in_flight(&mut self, in_flight: bool) {
        self.scheduler.set_external_build_in_flight(in_flight);
    }

    /// Regenerate dirty texture groups, or all of them when `force` is set.
    pub fn rebuild(&mut self, force: bool) -> Result<usize, BodyError> {
        let rebuilt = self.scheduler.rebuild(
            force,
            &mut self.registry,
            &self.lod,
            &mut self.services.backend,
            &mut self.services.sink,
        )?;
        if self.config.debug.trace_rebuilds {
            info!(rebuilt, force, "texture groups rebuilt");
        }
        Ok(rebuilt)
    }

    /// Take the build start/complete events recorded since the last call.
    pub fn drain_build_events(&mut self) -> Vec<BuildEvent> {
        self.scheduler.drain_events()
    }

    /// Push every uniform on the next sync, e.g. after a material was bound.
    pub fn bind_material(&mut self) {
        self.registry.mark_all_uniforms_pending();
        self.shader_sync.invalidate();
        self.force_sync = true;
    }

    // -- persistence --------------------------------------------------------

    /// Snapshot of the selection and stored property values.
    pub fn export_document(&self) -> CacheDocument {
        CacheDocument::export(&self.selection, &self.registry)
    }

    /// [`PlanetBody::export_document`] as JSON text.
    pub fn export_cache(&self) -> Result<String, BodyError> {
        self.export_document().to_json().map_err(BodyError::Export)
    }

    /// Restore state from a cache document.
    ///
    /// The whole document is validated against the blueprint it selects before
    /// anything changes. With `overwrite_all`, properties absent from the
    /// document return to their seeded defaults; otherwise only present keys
    /// are applied.
    pub fn import_cache(&mut self, text: &str, overwrite_all: bool) -> Result<(), BodyError> {
        let doc = CacheDocument::parse(text)?;

        let mut selection = self.selection;
        if let Some(seed) = doc.seed {
            selection.seed = seed;
        }
        if let Some(flag) = doc.override_flag {
            selection.override_flag = flag;
        }
        if let Some(raw) = doc.blueprint_index {
            selection.blueprint_index = decode_blueprint_index(raw, self.library.len())?;
        }
        selection.blueprint_index = selection.pinned();

        let derived = derive_blueprint_index(selection.seed, self.library.len());
        let target = selection.effective_index(derived);
        let blueprint = self.library.get(target).ok_or(BodyError::UnknownBlueprint {
            index: target,
            count: self.library.len(),
        })?;
        let values = decode_properties(&blueprint.properties, &doc.properties)?;

        self.selection = selection;
        if overwrite_all || target != self.installed {
            self.resolve(false)?;
        }
        for (key, value) in values {
            let id = self.registry.id(&key)?;
            self.registry.store(id, value, true, true)?;
        }
        debug!(blueprint = self.installed, overwrite_all, "cache imported");
        Ok(())
    }

    // -- tick ---------------------------------------------------------------

    /// Advance one frame.
    ///
    /// Order: overlays, mesh LOD, texture LOD, rebuild of dirty groups, then
    /// shader sync of pending property uniforms and the light.
    pub fn on_tick(
        &mut self,
        delta_time: f32,
        now: f64,
        screen_metric: f32,
    ) -> Result<TickReport, BodyError> {
        let _span = trace_span!("body_tick", delta_time, now, screen_metric).entered();
        let mut report = TickReport::default();

        self.animator.tick(&mut self.registry, now);

        if let Some(level) = self.lod.mesh_change(screen_metric) {
            match self.services.geometry.mesh_for_lod(level) {
                Some(mesh) => {
                    self.mesh = Some(mesh);
                    self.lod.adopt_mesh_level(level);
                    report.mesh_swapped = Some(level);
                    debug!(level, "mesh LOD swapped");
                }
                None => debug!(level, "mesh LOD unavailable, retrying next tick"),
            }
        }

        if let Some(event) = self
            .lod
            .update_textures(screen_metric, self.scheduler.is_building())
        {
            self.apply_lod_event(event);
        }

        self.scheduler.observe(&self.registry);
        if self.needs_rebuild() && !self.scheduler.is_building() {
            report.groups_rebuilt = self.rebuild(false)?;
        }

        let pending = self.registry.take_pending_uniforms();
        report.uniform_pushes =
            push_property_uniforms(&self.registry, &pending, &mut self.services.sink);
        report.uniform_pushes += self.shader_sync.sync(
            &self.services.lights,
            self.position,
            &mut self.services.sink,
            self.force_sync,
        );
        self.force_sync = false;

        Ok(report)
    }
}

#[cfg(test)]
#[path = "body_tests.rs"]
mod tests;
