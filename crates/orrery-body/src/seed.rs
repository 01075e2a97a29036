//! Seed-driven default values and blueprint selection.
//!
//! All draws come from a stream reseeded from the body's seed. The ambient
//! generator is swapped out for the duration of a [`SeededScope`] and put back
//! when the scope drops, so code sharing the ambient generator never observes
//! the seeded draws.

use std::ops::{Deref, DerefMut};

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::blueprint::{BlueprintLibrary, BlueprintSelection};
use crate::error::PropertyError;
use crate::registry::{PropertyDefinition, PropertyKind, PropertyRegistry};
use crate::value::PropertyValue;

/// The shared pseudo-random generator a body borrows from.
pub type AmbientRng = ChaCha8Rng;

/// Deterministic generator for a seed.
pub fn seed_rng(seed: i64) -> AmbientRng {
    ChaCha8Rng::seed_from_u64(seed as u64)
}

/// Reseeds the ambient generator and restores its previous state on drop.
pub struct SeededScope<'a> {
    ambient: &'a mut AmbientRng,
    saved: AmbientRng,
}

impl<'a> SeededScope<'a> {
    /// Save `ambient` and replace it with the stream for `seed`.
    pub fn new(ambient: &'a mut AmbientRng, seed: i64) -> Self {
        let saved = std::mem::replace(ambient, seed_rng(seed));
        Self { ambient, saved }
    }
}

impl Deref for SeededScope<'_> {
    type Target = AmbientRng;

    fn deref(&self) -> &AmbientRng {
        self.ambient
    }
}

impl DerefMut for SeededScope<'_> {
    fn deref_mut(&mut self) -> &mut AmbientRng {
        self.ambient
    }
}

impl Drop for SeededScope<'_> {
    fn drop(&mut self) {
        std::mem::swap(self.ambient, &mut self.saved);
    }
}

// ---------------------------------------------------------------------------
// Draws
// ---------------------------------------------------------------------------

/// Choose a blueprint index in `[0, count)`.
///
/// Consumes exactly one word from `rng` regardless of `count`.
pub fn draw_blueprint_index(rng: &mut impl RngCore, count: usize) -> usize {
    let word = rng.next_u64();
    if count == 0 {
        0
    } else {
        (word % count as u64) as usize
    }
}

/// The blueprint index a seed derives for a library of `count` blueprints.
pub fn derive_blueprint_index(seed: i64, count: usize) -> usize {
    draw_blueprint_index(&mut seed_rng(seed), count)
}

fn draw_value(def: &PropertyDefinition, rng: &mut impl Rng) -> PropertyValue {
    match &def.kind {
        PropertyKind::Numeric { min, max, .. } => {
            PropertyValue::Number(rng.random_range(*min..=*max))
        }
        PropertyKind::Color { default } => PropertyValue::Color([
            rng.random::<f32>(),
            rng.random::<f32>(),
            rng.random::<f32>(),
            default[3],
        ]),
        PropertyKind::MaterialSelection { options, .. } => {
            PropertyValue::Selection(rng.random_range(0..options.len()))
        }
    }
}

/// Assign seeded defaults to every property in `(display_order, key)` order.
///
/// Randomized properties draw from `rng`. The others return to their explicit
/// default, unless `leave_overrides` is set and a caller explicitly set them.
pub fn draw_defaults(
    registry: &mut PropertyRegistry,
    rng: &mut impl Rng,
    leave_overrides: bool,
) -> Result<(), PropertyError> {
    for id in registry.ids_in_display_order() {
        let def = registry.definition_by_id(id);
        let value = if def.randomize_on_seed {
            draw_value(def, rng)
        } else if leave_overrides && registry.is_explicit_id(id) {
            continue;
        } else {
            def.default_value()
        };
        registry.store(id, value, true, false)?;
    }
    Ok(())
}

/// Seed the current blueprint's properties without disturbing `ambient`.
///
/// The blueprint draw is consumed first so the property draws line up with
/// [`resolve_selection`].
pub fn resolve_defaults(
    registry: &mut PropertyRegistry,
    ambient: &mut AmbientRng,
    seed: i64,
    leave_overrides: bool,
) -> Result<(), PropertyError> {
    let mut scope = SeededScope::new(ambient, seed);
    scope.next_u64();
    draw_defaults(registry, &mut *scope, leave_overrides)
}

/// Resolve the blueprint index for `selection`, install it if it is not the
/// `installed` one, and seed its defaults.
///
/// The index draw is always consumed, even when the index is pinned, so
/// property draws never depend on the pin. Returns the active index.
pub fn resolve_selection(
    library: &BlueprintLibrary,
    registry: &mut PropertyRegistry,
    ambient: &mut AmbientRng,
    selection: &BlueprintSelection,
    installed: Option<usize>,
    leave_overrides: bool,
) -> Result<usize, PropertyError> {
    let mut scope = SeededScope::new(ambient, selection.seed);
    let derived = draw_blueprint_index(&mut *scope, library.len());
    let index = selection.effective_index(derived);
    if installed != Some(index) {
        library.install_into(index, registry)?;
    }
    draw_defaults(registry, &mut *scope, leave_overrides)?;
    Ok(index)
}
