//! Rebuild scheduler: turns dirty texture groups into backend invocations.

use std::time::{Duration, Instant};

use orrery_lod::LodMachine;
use tracing::{debug, info, warn};

use crate::error::BackendError;
use crate::group::GroupId;
use crate::registry::PropertyRegistry;
use crate::services::{MaterialSink, TextureBackend};

/// Observable transitions of the pending-rebuild state.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildEvent {
    /// A rebuild became pending.
    Started {
        /// Dirty groups at the time of the transition.
        groups: usize,
    },
    /// No rebuild is pending anymore.
    Completed {
        /// Wall time since the matching `Started`.
        elapsed: Duration,
    },
}

/// Drives regeneration of dirty texture groups.
#[derive(Debug, Default)]
pub struct RebuildScheduler {
    pending_since: Option<Instant>,
    building: bool,
    external_in_flight: bool,
    events: Vec<BuildEvent>,
}

impl RebuildScheduler {
    /// Idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if any group is dirty.
    pub fn needs_rebuild(&self, registry: &PropertyRegistry) -> bool {
        !registry.dirty().is_empty()
    }

    /// Returns `true` while a build is running or an adapter reported one in flight.
    pub fn is_building(&self) -> bool {
        self.building || self.external_in_flight
    }

    /// Mark an externally driven build as in flight (or finished).
    pub fn set_external_build_in_flight(&mut self, in_flight: bool) {
        self.external_in_flight = in_flight;
    }

    /// Update the build timer for the current pending state.
    pub fn observe(&mut self, registry: &PropertyRegistry) {
        let pending = self.needs_rebuild(registry);
        match (pending, self.pending_since) {
            (true, None) => {
                let groups = registry.dirty().len();
                debug!(groups, "texture rebuild pending");
                self.pending_since = Some(Instant::now());
                self.events.push(BuildEvent::Started { groups });
            }
            (false, Some(since)) => {
                let elapsed = since.elapsed();
                info!(elapsed_ms = elapsed.as_secs_f64() * 1000.0, "texture build complete");
                self.pending_since = None;
                self.events.push(BuildEvent::Completed { elapsed });
            }
            _ => {}
        }
    }

    /// Regenerate dirty groups, or every group when `force` is set.
    ///
    /// Groups are rebuilt in declaration order and leave the dirty set one at
    /// a time. A backend failure stops the pass: groups rebuilt before it stay
    /// clean, the failing group and the rest stay dirty. Returns the number of
    /// groups rebuilt.
    pub fn rebuild<B, S>(
        &mut self,
        force: bool,
        registry: &mut PropertyRegistry,
        lod: &LodMachine,
        backend: &mut B,
        sink: &mut S,
    ) -> Result<usize, BackendError>
    where
        B: TextureBackend + ?Sized,
        S: MaterialSink + ?Sized,
    {
        if force {
            let all: Vec<GroupId> = registry.groups().ids().collect();
            registry.dirty_mut().mark_all(all);
        }
        self.observe(registry);

        let pending: Vec<GroupId> = registry.dirty().iter().collect();
        self.building = true;
        let mut rebuilt = 0;
        let mut outcome = Ok(());
        for group in pending {
            if let Err(err) = regenerate(group, registry, lod, backend, sink) {
                warn!(group = %err.group, error = %err.message, "texture group rebuild failed");
                outcome = Err(err);
                break;
            }
            registry.dirty_mut().remove(group);
            rebuilt += 1;
        }
        self.building = false;

        self.observe(registry);
        outcome.map(|()| rebuilt)
    }

    /// Take the build events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<BuildEvent> {
        std::mem::take(&mut self.events)
    }
}

fn regenerate<B, S>(
    group: GroupId,
    registry: &PropertyRegistry,
    lod: &LodMachine,
    backend: &mut B,
    sink: &mut S,
) -> Result<(), BackendError>
where
    B: TextureBackend + ?Sized,
    S: MaterialSink + ?Sized,
{
    let def = registry.groups().get(group);
    for (name, value) in registry.backend_inputs(group) {
        backend.set_input(name, value);
    }

    let resolution = lod.resolution(def.family);
    debug!(group = %def.name, resolution, "generating texture group");
    let outputs = backend.generate(&def.name, resolution)?;

    for route in &def.routes {
        match outputs.get(&route.output) {
            Some(bitmap) => sink.set_texture(&route.slot, bitmap),
            None => warn!(group = %def.name, output = %route.output, "backend produced no such output"),
        }
    }
    Ok(())
}
