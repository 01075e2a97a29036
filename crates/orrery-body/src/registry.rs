//! Property registry: typed definitions, stored values, animated overrides,
//! and the dirty-group bookkeeping driven by value changes.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::blueprint::Blueprint;
use crate::error::PropertyError;
use crate::group::{DirtySet, GroupId, GroupTable};
use crate::services::ChannelValue;
use crate::value::{NumericType, PropertyTarget, PropertyValue, TargetKind, color_output, numeric_output};

/// Smallest numeric change that counts as a new value.
pub const CHANGE_EPSILON: f32 = 1e-4;

/// Index of a property inside the installed blueprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(pub(crate) usize);

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Kind-specific part of a definition.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyKind {
    /// Number clamped to `[min, max]`.
    Numeric {
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
        /// Explicit default.
        default: f32,
        /// Rounding applied on output.
        data_type: NumericType,
    },
    /// Linear RGBA color, components clamped to `[0, 1]`.
    Color {
        /// Explicit default.
        default: [f32; 4],
    },
    /// One entry of a fixed option list.
    MaterialSelection {
        /// Option names.
        options: Vec<String>,
        /// Default option index.
        default: usize,
    },
}

/// Declarative description of one tunable property.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDefinition {
    /// Unique key within the blueprint.
    pub key: String,
    /// Seeding order; lower values draw first.
    pub display_order: i32,
    /// Whether the seeded resolver draws a random value.
    pub randomize_on_seed: bool,
    /// Names of the texture groups invalidated by a change.
    pub affected_groups: Vec<String>,
    /// Where the value is written.
    pub targets: Vec<PropertyTarget>,
    /// Kind, range, and default.
    pub kind: PropertyKind,
}

impl PropertyDefinition {
    fn with_kind(key: impl Into<String>, display_order: i32, kind: PropertyKind) -> Self {
        Self {
            key: key.into(),
            display_order,
            randomize_on_seed: false,
            affected_groups: Vec::new(),
            targets: Vec::new(),
            kind,
        }
    }

    /// Float property in `[min, max]`.
    pub fn numeric(
        key: impl Into<String>,
        display_order: i32,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::with_kind(
            key,
            display_order,
            PropertyKind::Numeric {
                min,
                max,
                default,
                data_type: NumericType::Float,
            },
        )
    }

    /// Color property.
    pub fn color(key: impl Into<String>, display_order: i32, default: [f32; 4]) -> Self {
        Self::with_kind(key, display_order, PropertyKind::Color { default })
    }

    /// Material-selection property over `options`.
    pub fn material_selection<S: Into<String>>(
        key: impl Into<String>,
        display_order: i32,
        options: impl IntoIterator<Item = S>,
        default: usize,
    ) -> Self {
        Self::with_kind(
            key,
            display_order,
            PropertyKind::MaterialSelection {
                options: options.into_iter().map(Into::into).collect(),
                default,
            },
        )
    }

    /// Draw a random value when seeding.
    pub fn randomized(mut self) -> Self {
        self.randomize_on_seed = true;
        self
    }

    /// Round numeric output to integers.
    pub fn integer(mut self) -> Self {
        if let PropertyKind::Numeric { data_type, .. } = &mut self.kind {
            *data_type = NumericType::Integer;
        }
        self
    }

    /// Invalidate these groups on change.
    pub fn affects(mut self, groups: &[&str]) -> Self {
        self.affected_groups
            .extend(groups.iter().map(|g| g.to_string()));
        self
    }

    /// Add a write target.
    pub fn target(mut self, target: PropertyTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// The explicit default value.
    pub fn default_value(&self) -> PropertyValue {
        match &self.kind {
            PropertyKind::Numeric { default, .. } => PropertyValue::Number(*default),
            PropertyKind::Color { default } => PropertyValue::Color(*default),
            PropertyKind::MaterialSelection { default, .. } => PropertyValue::Selection(*default),
        }
    }

    /// Clamp a value into this definition's range.
    ///
    /// Fails on a kind mismatch or a non-finite number; out-of-range values are
    /// clamped silently.
    pub fn clamp(&self, value: PropertyValue) -> Result<PropertyValue, PropertyError> {
        match (&self.kind, value) {
            (PropertyKind::Numeric { min, max, data_type, .. }, PropertyValue::Number(v)) => {
                if !v.is_finite() {
                    return Err(PropertyError::NonFinite(self.key.clone()));
                }
                let v = v.clamp(*min, *max);
                Ok(PropertyValue::Number(match data_type {
                    NumericType::Integer => v.round().clamp(min.ceil(), max.floor()),
                    NumericType::Float => v,
                }))
            }
            (PropertyKind::Color { .. }, PropertyValue::Color(c)) => {
                if c.iter().any(|v| !v.is_finite()) {
                    return Err(PropertyError::NonFinite(self.key.clone()));
                }
                Ok(PropertyValue::Color(c.map(|v| v.clamp(0.0, 1.0))))
            }
            (PropertyKind::MaterialSelection { options, .. }, PropertyValue::Selection(i)) => {
                Ok(PropertyValue::Selection(i.min(options.len().saturating_sub(1))))
            }
            (kind, _) => Err(PropertyError::TypeMismatch {
                key: self.key.clone(),
                expected: match kind {
                    PropertyKind::Numeric { .. } => "number",
                    PropertyKind::Color { .. } => "color",
                    PropertyKind::MaterialSelection { .. } => "selection",
                },
            }),
        }
    }

    /// Index of a named option, for material selections.
    pub fn option_index(&self, name: &str) -> Option<usize> {
        match &self.kind {
            PropertyKind::MaterialSelection { options, .. } => {
                options.iter().position(|o| o == name)
            }
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), PropertyError> {
        let invalid = |reason| PropertyError::InvalidDefinition {
            key: self.key.clone(),
            reason,
        };
        if self.key.is_empty() {
            return Err(invalid("key must not be empty"));
        }
        match &self.kind {
            PropertyKind::Numeric { min, max, default, data_type } => {
                if !(min.is_finite() && max.is_finite() && default.is_finite()) {
                    return Err(invalid("range and default must be finite"));
                }
                if min > max {
                    return Err(invalid("min must not exceed max"));
                }
                if !(max - min).is_finite() {
                    return Err(invalid("range width must be finite"));
                }
                if *data_type == NumericType::Integer && min.ceil() > max.floor() {
                    return Err(invalid("integer range contains no integer"));
                }
            }
            PropertyKind::Color { default } => {
                if default.iter().any(|c| !c.is_finite()) {
                    return Err(invalid("default color must be finite"));
                }
            }
            PropertyKind::MaterialSelection { options, .. } => {
                if options.is_empty() {
                    return Err(invalid("option list must not be empty"));
                }
            }
        }
        let feeds_backend = self
            .targets
            .iter()
            .any(|t| t.kind == TargetKind::BackendInput);
        if feeds_backend && self.affected_groups.is_empty() {
            return Err(invalid("backend targets require at least one affected group"));
        }
        Ok(())
    }
}

/// Compare two values with the registry's change semantics.
fn differs(a: &PropertyValue, b: &PropertyValue) -> bool {
    match (a, b) {
        (PropertyValue::Number(x), PropertyValue::Number(y)) => (x - y).abs() > CHANGE_EPSILON,
        _ => a != b,
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct PropertyEntry {
    def: PropertyDefinition,
    groups: Vec<GroupId>,
}

#[derive(Clone, Debug)]
struct PropertyState {
    stored: PropertyValue,
    animated: Option<f32>,
    explicit: bool,
}

impl PropertyState {
    fn effective(&self) -> PropertyValue {
        match self.animated {
            Some(v) => PropertyValue::Number(v),
            None => self.stored,
        }
    }
}

/// Registry of the installed blueprint's properties and their values.
#[derive(Clone, Debug, Default)]
pub struct PropertyRegistry {
    groups: GroupTable,
    entries: Vec<PropertyEntry>,
    states: Vec<PropertyState>,
    index: HashMap<String, PropertyId>,
    dirty: DirtySet,
    pending_uniforms: BTreeSet<PropertyId>,
}

impl PropertyRegistry {
    /// Empty registry over a group table.
    pub fn new(groups: GroupTable) -> Self {
        Self {
            groups,
            ..Self::default()
        }
    }

    /// Replace every group and definition with a blueprint's.
    ///
    /// The blueprint is validated completely before the registry changes. All
    /// groups end up dirty and every value is at its default.
    pub fn install(&mut self, blueprint: &Blueprint) -> Result<(), PropertyError> {
        let mut staged = Self::new(GroupTable::new(blueprint.groups.clone())?);
        for def in &blueprint.properties {
            staged.define(def.clone())?;
        }
        staged.dirty.mark_all(staged.groups.ids());
        debug!(
            blueprint = %blueprint.name,
            properties = staged.entries.len(),
            groups = staged.groups.len(),
            "installed blueprint"
        );
        *self = staged;
        Ok(())
    }

    /// Remove every definition and value; groups are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.states.clear();
        self.index.clear();
        self.dirty.clear();
        self.pending_uniforms.clear();
    }

    /// Define a property, replacing any previous definition with the same key.
    ///
    /// The value resets to the (clamped) default and the affected groups are marked dirty.
    pub fn define(&mut self, def: PropertyDefinition) -> Result<PropertyId, PropertyError> {
        def.validate()?;
        let groups = def
            .affected_groups
            .iter()
            .map(|name| self.groups.id(name))
            .collect::<Result<Vec<_>, _>>()?;
        let stored = def.clamp(def.default_value())?;
        let state = PropertyState {
            stored,
            animated: None,
            explicit: false,
        };

        let id = match self.index.get(&def.key) {
            Some(&id) => {
                self.entries[id.0] = PropertyEntry { def, groups };
                self.states[id.0] = state;
                id
            }
            None => {
                let id = PropertyId(self.entries.len());
                self.index.insert(def.key.clone(), id);
                self.entries.push(PropertyEntry { def, groups });
                self.states.push(state);
                id
            }
        };
        self.dirty.mark_all(self.entries[id.0].groups.iter().copied());
        self.pending_uniforms.insert(id);
        Ok(id)
    }

    /// Define a numeric property.
    pub fn define_numeric(&mut self, def: PropertyDefinition) -> Result<PropertyId, PropertyError> {
        self.define_kind(def, "numeric", |k| matches!(k, PropertyKind::Numeric { .. }))
    }

    /// Define a color property.
    pub fn define_color(&mut self, def: PropertyDefinition) -> Result<PropertyId, PropertyError> {
        self.define_kind(def, "color", |k| matches!(k, PropertyKind::Color { .. }))
    }

    /// Define a material-selection property.
    pub fn define_material_selection(
        &mut self,
        def: PropertyDefinition,
    ) -> Result<PropertyId, PropertyError> {
        self.define_kind(def, "material selection", |k| {
            matches!(k, PropertyKind::MaterialSelection { .. })
        })
    }

    fn define_kind(
        &mut self,
        def: PropertyDefinition,
        expected: &'static str,
        is_kind: impl Fn(&PropertyKind) -> bool,
    ) -> Result<PropertyId, PropertyError> {
        if !is_kind(&def.kind) {
            return Err(PropertyError::TypeMismatch {
                key: def.key,
                expected,
            });
        }
        self.define(def)
    }

    /// Resolve a key.
    pub fn id(&self, key: &str) -> Result<PropertyId, PropertyError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| PropertyError::UnknownProperty(key.to_string()))
    }

    /// Definition of a property.
    pub fn definition(&self, key: &str) -> Result<&PropertyDefinition, PropertyError> {
        Ok(&self.entries[self.id(key)?.0].def)
    }

    pub(crate) fn definition_by_id(&self, id: PropertyId) -> &PropertyDefinition {
        &self.entries[id.0].def
    }

    /// Effective value: the animated value while an overlay is active, else the stored one.
    pub fn get_value(&self, key: &str) -> Result<PropertyValue, PropertyError> {
        Ok(self.states[self.id(key)?.0].effective())
    }

    pub(crate) fn effective_by_id(&self, id: PropertyId) -> PropertyValue {
        self.states[id.0].effective()
    }

    /// Stored value, ignoring any active overlay.
    pub fn stored_value(&self, key: &str) -> Result<PropertyValue, PropertyError> {
        Ok(self.states[self.id(key)?.0].stored)
    }

    /// Returns `true` if a caller explicitly set this value since the last install.
    pub fn is_explicit(&self, key: &str) -> Result<bool, PropertyError> {
        Ok(self.states[self.id(key)?.0].explicit)
    }

    pub(crate) fn is_explicit_id(&self, id: PropertyId) -> bool {
        self.states[id.0].explicit
    }

    /// Clamp and store a value.
    ///
    /// Returns whether the stored value changed. When it changed and
    /// `trigger_rebuild` is set, the affected groups are marked dirty. Shader
    /// targets are written later, during the sync step.
    pub fn set_value(
        &mut self,
        key: &str,
        value: impl Into<PropertyValue>,
        trigger_rebuild: bool,
    ) -> Result<bool, PropertyError> {
        let id = self.id(key)?;
        self.store(id, value.into(), trigger_rebuild, true)
    }

    /// Select a material option by name.
    pub fn select_option(&mut self, key: &str, option: &str) -> Result<bool, PropertyError> {
        let def = self.definition(key)?;
        let index = def.option_index(option).ok_or(PropertyError::TypeMismatch {
            key: key.to_string(),
            expected: "known option name",
        })?;
        self.set_value(key, index, true)
    }

    /// Restore the definition default.
    pub fn reset_value(&mut self, key: &str) -> Result<bool, PropertyError> {
        let id = self.id(key)?;
        let default = self.entries[id.0].def.default_value();
        self.store(id, default, true, false)
    }

    pub(crate) fn store(
        &mut self,
        id: PropertyId,
        value: PropertyValue,
        trigger_rebuild: bool,
        explicit: bool,
    ) -> Result<bool, PropertyError> {
        let value = self.entries[id.0].def.clamp(value)?;
        let state = &mut self.states[id.0];
        let changed = differs(&state.stored, &value);
        state.stored = value;
        state.explicit = explicit;

        if changed {
            self.pending_uniforms.insert(id);
            if trigger_rebuild {
                self.dirty.mark_all(self.entries[id.0].groups.iter().copied());
            }
        }
        Ok(changed)
    }

    /// Install, update, or remove the animated value of a numeric property.
    ///
    /// The stored value is never touched. A change of the effective value marks
    /// the affected groups dirty.
    pub(crate) fn set_animated(&mut self, id: PropertyId, animated: Option<f32>) {
        let animated = match self.entries[id.0].def.kind {
            PropertyKind::Numeric {
                data_type: NumericType::Integer,
                ..
            } => animated.map(f32::round),
            _ => animated,
        };
        let state = &mut self.states[id.0];
        let before = state.effective();
        state.animated = animated;
        if differs(&before, &state.effective()) {
            self.pending_uniforms.insert(id);
            self.dirty.mark_all(self.entries[id.0].groups.iter().copied());
        }
    }

    /// Numeric range of a property.
    pub(crate) fn numeric_range(&self, id: PropertyId) -> Option<(f32, f32)> {
        match self.entries[id.0].def.kind {
            PropertyKind::Numeric { min, max, .. } => Some((min, max)),
            _ => None,
        }
    }

    /// Property ids ordered by `(display_order, key)`.
    pub fn ids_in_display_order(&self) -> Vec<PropertyId> {
        let mut ids: Vec<PropertyId> = (0..self.entries.len()).map(PropertyId).collect();
        ids.sort_by(|a, b| {
            let (da, db) = (&self.entries[a.0].def, &self.entries[b.0].def);
            da.display_order
                .cmp(&db.display_order)
                .then_with(|| da.key.cmp(&db.key))
        });
        ids
    }

    /// Keys ordered by `(display_order, key)`.
    pub fn keys(&self) -> Vec<&str> {
        self.ids_in_display_order()
            .into_iter()
            .map(|id| self.entries[id.0].def.key.as_str())
            .collect()
    }

    /// Number of defined properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no properties are defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The installed group table.
    pub fn groups(&self) -> &GroupTable {
        &self.groups
    }

    /// Groups awaiting regeneration.
    pub fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    /// Mutable access to the dirty set, used for synthetic LOD invalidations.
    pub fn dirty_mut(&mut self) -> &mut DirtySet {
        &mut self.dirty
    }

    /// Returns `true` if a group is marked dirty, by name.
    pub fn is_group_dirty(&self, name: &str) -> Result<bool, PropertyError> {
        Ok(self.dirty.contains(self.groups.id(name)?))
    }

    /// Properties whose shader targets must be written, in id order.
    pub(crate) fn take_pending_uniforms(&mut self) -> Vec<PropertyId> {
        std::mem::take(&mut self.pending_uniforms)
            .into_iter()
            .collect()
    }

    /// Queue every property's shader targets for the next sync.
    pub(crate) fn mark_all_uniforms_pending(&mut self) {
        let count = self.entries.len();
        self.pending_uniforms.extend((0..count).map(PropertyId));
    }

    /// Target writes of one kind for a property, using its effective value.
    pub(crate) fn channel_values(
        &self,
        id: PropertyId,
        kind: TargetKind,
    ) -> Vec<(&str, ChannelValue)> {
        let def = &self.entries[id.0].def;
        let value = self.states[id.0].effective();
        def.targets
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| {
                let out = match (&def.kind, value) {
                    (
                        PropertyKind::Numeric { min, max, data_type, .. },
                        PropertyValue::Number(v),
                    ) => numeric_output(v, *min, *max, *data_type, t.method),
                    (_, PropertyValue::Color(c)) => color_output(c),
                    (_, PropertyValue::Selection(i)) => ChannelValue::Int(i as i32),
                    (_, PropertyValue::Number(v)) => ChannelValue::Float(v),
                };
                (t.channel.as_str(), out)
            })
            .collect()
    }

    /// Backend input writes for every property affecting `group`.
    pub(crate) fn backend_inputs(&self, group: GroupId) -> Vec<(&str, ChannelValue)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.groups.contains(&group))
            .flat_map(|(i, _)| self.channel_values(PropertyId(i), TargetKind::BackendInput))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn registry() -> PropertyRegistry {
        let mut registry = PropertyRegistry::default();
        registry.install(&fixtures::rocky_blueprint()).unwrap();
        registry.dirty_mut().clear();
        registry.take_pending_uniforms();
        registry
    }

    #[test]
    fn test_defaults_applied_on_install() {
        let registry = registry();
        assert_eq!(
            registry.get_value("brightness").unwrap(),
            PropertyValue::Number(1.0)
        );
        assert_eq!(
            registry.get_value("surface_material").unwrap(),
            PropertyValue::Selection(0)
        );
    }

    #[test]
    fn test_unknown_property_fails() {
        let mut registry = registry();
        assert_eq!(
            registry.get_value("nope"),
            Err(PropertyError::UnknownProperty("nope".to_string()))
        );
        assert!(registry.set_value("nope", 1.0, true).is_err());
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let mut registry = registry();
        registry.set_value("brightness", 7.5, true).unwrap();
        assert_eq!(registry.get_value("brightness").unwrap(), PropertyValue::Number(2.0));
        registry.set_value("brightness", -3.0, true).unwrap();
        assert_eq!(registry.get_value("brightness").unwrap(), PropertyValue::Number(0.0));

        registry.set_value("surface_material", 99usize, true).unwrap();
        assert_eq!(
            registry.get_value("surface_material").unwrap(),
            PropertyValue::Selection(2)
        );

        registry
            .set_value("surface_color", [2.0, -1.0, 0.5, 1.0], true)
            .unwrap();
        assert_eq!(
            registry.get_value("surface_color").unwrap(),
            PropertyValue::Color([1.0, 0.0, 0.5, 1.0])
        );
    }

    #[test]
    fn test_integer_property_rounds_stored_value() {
        let mut registry = registry();
        registry.set_value("crater_count", 12.6, true).unwrap();
        assert_eq!(
            registry.get_value("crater_count").unwrap(),
            PropertyValue::Number(13.0)
        );
    }

    #[test]
    fn test_change_marks_only_affected_groups() {
        let mut registry = registry();
        assert!(registry.set_value("brightness", 1.5, true).unwrap());
        assert!(registry.is_group_dirty("Maps").unwrap());
        assert!(!registry.is_group_dirty("Surface").unwrap());
    }

    #[test]
    fn test_tiny_change_is_not_a_change() {
        let mut registry = registry();
        assert!(!registry.set_value("brightness", 1.0 + 5e-5, true).unwrap());
        assert!(registry.dirty().is_empty());
    }

    #[test]
    fn test_no_rebuild_when_not_triggered() {
        let mut registry = registry();
        assert!(registry.set_value("brightness", 0.5, false).unwrap());
        assert!(registry.dirty().is_empty());
        assert_eq!(registry.take_pending_uniforms().len(), 1);
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut registry = registry();
        assert_eq!(
            registry.set_value("brightness", [1.0; 4], true),
            Err(PropertyError::TypeMismatch {
                key: "brightness".to_string(),
                expected: "number",
            })
        );
        assert!(matches!(
            registry.set_value("brightness", f32::NAN, true),
            Err(PropertyError::NonFinite(_))
        ));
    }

    #[test]
    fn test_redefining_key_replaces_definition() {
        let mut registry = registry();
        let before = registry.len();
        registry
            .define(PropertyDefinition::numeric("brightness", 0, 0.0, 10.0, 5.0).affects(&["Maps"]))
            .unwrap();
        assert_eq!(registry.len(), before);
        assert_eq!(registry.get_value("brightness").unwrap(), PropertyValue::Number(5.0));
        registry.set_value("brightness", 8.0, true).unwrap();
        assert_eq!(registry.get_value("brightness").unwrap(), PropertyValue::Number(8.0));
    }

    #[test]
    fn test_definition_validation() {
        let mut registry = registry();
        assert!(matches!(
            registry.define(PropertyDefinition::numeric("bad", 0, 2.0, 1.0, 1.5)),
            Err(PropertyError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            registry.define(PropertyDefinition::material_selection::<&str>("empty", 0, [], 0)),
            Err(PropertyError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            registry.define(
                PropertyDefinition::numeric("orphan", 0, 0.0, 1.0, 0.5)
                    .target(PropertyTarget::backend("orphan"))
            ),
            Err(PropertyError::InvalidDefinition { .. })
        ));
        assert_eq!(
            registry.define(PropertyDefinition::numeric("x", 0, 0.0, 1.0, 0.5).affects(&["Clouds"])),
            Err(PropertyError::UnknownGroup("Clouds".to_string()))
        );
    }

    #[test]
    fn test_overflowing_range_width_rejected() {
        let mut registry = registry();
        assert!(matches!(
            registry.define(PropertyDefinition::numeric("wide", 0, -3.0e38, 3.0e38, 0.0).randomized()),
            Err(PropertyError::InvalidDefinition { .. })
        ));
        assert!(registry
            .define(PropertyDefinition::numeric("broad", 0, -1.0e38, 1.0e38, 0.0))
            .is_ok());
    }

    #[test]
    fn test_kind_specific_define_checks_kind() {
        let mut registry = registry();
        assert!(registry
            .define_color(PropertyDefinition::color("haze", 9, [0.1, 0.2, 0.3, 1.0]))
            .is_ok());
        assert!(matches!(
            registry.define_numeric(PropertyDefinition::color("tint", 9, [0.0; 4])),
            Err(PropertyError::TypeMismatch { .. })
        ));
        assert!(matches!(
            registry.define_material_selection(PropertyDefinition::numeric("n", 9, 0.0, 1.0, 0.5)),
            Err(PropertyError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_select_option_by_name() {
        let mut registry = registry();
        registry.select_option("surface_material", "lava").unwrap();
        assert_eq!(
            registry.get_value("surface_material").unwrap(),
            PropertyValue::Selection(2)
        );
        assert!(registry.select_option("surface_material", "cheese").is_err());
    }

    #[test]
    fn test_reset_restores_default_and_clears_explicit() {
        let mut registry = registry();
        registry.set_value("brightness", 0.2, true).unwrap();
        assert!(registry.is_explicit("brightness").unwrap());
        registry.reset_value("brightness").unwrap();
        assert_eq!(registry.get_value("brightness").unwrap(), PropertyValue::Number(1.0));
        assert!(!registry.is_explicit("brightness").unwrap());
    }

    #[test]
    fn test_animated_value_overrides_without_storing() {
        let mut registry = registry();
        let id = registry.id("brightness").unwrap();
        registry.set_animated(id, Some(1.8));
        assert_eq!(registry.get_value("brightness").unwrap(), PropertyValue::Number(1.8));
        assert_eq!(registry.stored_value("brightness").unwrap(), PropertyValue::Number(1.0));
        assert!(registry.is_group_dirty("Maps").unwrap());

        registry.set_animated(id, None);
        assert_eq!(registry.get_value("brightness").unwrap(), PropertyValue::Number(1.0));
    }

    #[test]
    fn test_animated_value_on_integer_property_rounds() {
        let mut registry = registry();
        let id = registry.id("crater_count").unwrap();
        registry.set_animated(id, Some(12.6));
        assert_eq!(registry.get_value("crater_count").unwrap(), PropertyValue::Number(13.0));
        assert_eq!(registry.stored_value("crater_count").unwrap(), PropertyValue::Number(10.0));
    }

    #[test]
    fn test_keys_sorted_by_display_order() {
        let registry = registry();
        let keys = registry.keys();
        let orders: Vec<i32> = keys
            .iter()
            .map(|k| registry.definition(k).unwrap().display_order)
            .collect();
        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(orders, sorted);
    }

    #[test]
    fn test_channel_values_use_target_mapping() {
        let mut registry = registry();
        registry.set_value("continent_scale", 5.0, true).unwrap();
        let id = registry.id("continent_scale").unwrap();
        let writes = registry.channel_values(id, TargetKind::BackendInput);
        assert_eq!(writes, vec![("scale", ChannelValue::Float(0.5))]);

        let maps = registry.groups().id("Maps").unwrap();
        let inputs = registry.backend_inputs(maps);
        assert!(inputs.iter().any(|(name, _)| *name == "crater_count"));
        assert!(!inputs.iter().any(|(name, _)| *name == "material"));
    }
}
