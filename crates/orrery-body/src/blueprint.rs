//! Blueprints and the seed-driven blueprint selection.

use crate::error::{BodyError, PropertyError};
use crate::group::TextureGroupDef;
use crate::registry::{PropertyDefinition, PropertyRegistry};

/// Named template: the texture groups and property set a body exposes.
#[derive(Clone, Debug, PartialEq)]
pub struct Blueprint {
    /// Display name.
    pub name: String,
    /// Texture groups, in rebuild order.
    pub groups: Vec<TextureGroupDef>,
    /// Property definitions.
    pub properties: Vec<PropertyDefinition>,
}

impl Blueprint {
    /// An empty blueprint.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Add a texture group.
    pub fn group(mut self, group: TextureGroupDef) -> Self {
        self.groups.push(group);
        self
    }

    /// Add a property definition.
    pub fn property(mut self, def: PropertyDefinition) -> Self {
        self.properties.push(def);
        self
    }
}

/// Ordered, validated set of blueprints a body can choose from.
#[derive(Clone, Debug)]
pub struct BlueprintLibrary {
    blueprints: Vec<Blueprint>,
}

impl BlueprintLibrary {
    /// Validate every blueprint by installing it into a scratch registry.
    pub fn new(blueprints: Vec<Blueprint>) -> Result<Self, BodyError> {
        if blueprints.is_empty() {
            return Err(BodyError::EmptyLibrary);
        }
        let mut scratch = PropertyRegistry::default();
        for blueprint in &blueprints {
            scratch.install(blueprint)?;
        }
        Ok(Self { blueprints })
    }

    /// Blueprint at `index`.
    pub fn get(&self, index: usize) -> Option<&Blueprint> {
        self.blueprints.get(index)
    }

    /// Number of blueprints.
    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    /// Always `false`; an empty library cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }

    /// Check an index against the library size.
    pub fn check(&self, index: usize) -> Result<(), BodyError> {
        if index < self.blueprints.len() {
            Ok(())
        } else {
            Err(BodyError::UnknownBlueprint {
                index,
                count: self.blueprints.len(),
            })
        }
    }

    pub(crate) fn install_into(
        &self,
        index: usize,
        registry: &mut PropertyRegistry,
    ) -> Result<(), PropertyError> {
        match self.blueprints.get(index) {
            Some(blueprint) => registry.install(blueprint),
            None => Ok(()),
        }
    }
}

/// Seed and blueprint choice of a body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlueprintSelection {
    /// Seed driving defaults and the derived blueprint index.
    pub seed: i64,
    /// Active blueprint index; `None` means "derive from the seed".
    pub blueprint_index: Option<usize>,
    /// Set once a caller pinned the index; a pinned index survives reseeding.
    pub override_flag: bool,
}

impl BlueprintSelection {
    /// Selection derived entirely from `seed`.
    pub fn from_seed(seed: i64) -> Self {
        Self {
            seed,
            blueprint_index: None,
            override_flag: false,
        }
    }

    /// Pin `index`.
    pub fn pin(&mut self, index: usize) {
        self.blueprint_index = Some(index);
        self.override_flag = true;
    }

    /// Drop the pin; the next resolution derives the index from the seed again.
    pub fn clear_override(&mut self) {
        self.override_flag = false;
        self.blueprint_index = None;
    }

    /// The pinned index, if any. An index without the override flag is not a pin.
    pub fn pinned(&self) -> Option<usize> {
        self.blueprint_index.filter(|_| self.override_flag)
    }

    /// The index to use: the pinned one, or `derived`.
    pub fn effective_index(&self, derived: usize) -> usize {
        self.pinned().unwrap_or(derived)
    }
}
