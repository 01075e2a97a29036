//! Time-bounded overrides of numeric property values.
//!
//! An overlay writes the registry's animated value, never the stored one. Once
//! it expires the property falls back to whatever value is stored.

use crate::error::PropertyError;
use crate::registry::{PropertyId, PropertyRegistry};

// ---------------------------------------------------------------------------
// Overlay (internal)
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct Overlay {
    id: PropertyId,
    start: f32,
    end: f32,
    start_time: f64,
    duration: f64,
}

impl Overlay {
    fn progress(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start_time) / self.duration).clamp(0.0, 1.0) as f32
    }

    fn value(&self, now: f64) -> f32 {
        self.start + (self.end - self.start) * self.progress(now)
    }

    fn expired(&self, now: f64) -> bool {
        now - self.start_time >= self.duration
    }
}

// ---------------------------------------------------------------------------
// PropertyAnimator
// ---------------------------------------------------------------------------

/// Active overlays in insertion order.
///
/// Property ids are only valid for the installed blueprint; call
/// [`PropertyAnimator::clear`] whenever a blueprint is installed.
#[derive(Clone, Debug, Default)]
pub struct PropertyAnimator {
    overlays: Vec<Overlay>,
}

impl PropertyAnimator {
    /// No active overlays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Animate `key` from its current effective value to `target` over `duration` seconds.
    ///
    /// Replaces any overlay already active on `key`. The target is clamped to
    /// the property's range.
    pub fn override_to(
        &mut self,
        registry: &mut PropertyRegistry,
        key: &str,
        target: f32,
        duration: f64,
        now: f64,
    ) -> Result<(), PropertyError> {
        let id = registry.id(key)?;
        let (min, max) = registry
            .numeric_range(id)
            .ok_or_else(|| PropertyError::NotNumeric(key.to_string()))?;
        if !target.is_finite() || !duration.is_finite() {
            return Err(PropertyError::NonFinite(key.to_string()));
        }
        let start = registry
            .effective_by_id(id)
            .as_number()
            .ok_or_else(|| PropertyError::NotNumeric(key.to_string()))?;

        self.overlays.retain(|o| o.id != id);
        self.overlays.push(Overlay {
            id,
            start,
            end: target.clamp(min, max),
            start_time: now,
            duration: duration.max(0.0),
        });
        registry.set_animated(id, Some(start));
        Ok(())
    }

    /// Push interpolated values for every overlay and drop expired ones.
    ///
    /// Returns the number of overlays still active.
    pub fn tick(&mut self, registry: &mut PropertyRegistry, now: f64) -> usize {
        for i in (0..self.overlays.len()).rev() {
            let overlay = &self.overlays[i];
            if overlay.expired(now) {
                registry.set_animated(overlay.id, None);
                self.overlays.remove(i);
            } else {
                registry.set_animated(overlay.id, Some(overlay.value(now)));
            }
        }
        self.overlays.len()
    }

    /// Drop the overlay on `key`, returning whether one was active.
    pub fn cancel(&mut self, registry: &mut PropertyRegistry, key: &str) -> Result<bool, PropertyError> {
        let id = registry.id(key)?;
        let before = self.overlays.len();
        self.overlays.retain(|o| o.id != id);
        let removed = self.overlays.len() != before;
        if removed {
            registry.set_animated(id, None);
        }
        Ok(removed)
    }

    /// Forget every overlay without touching the registry.
    pub fn clear(&mut self) {
        self.overlays.clear();
    }

    /// Returns `true` if `id` has an active overlay.
    pub fn is_active(&self, id: PropertyId) -> bool {
        self.overlays.iter().any(|o| o.id == id)
    }

    /// Number of active overlays.
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// Returns `true` if no overlay is active.
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}
