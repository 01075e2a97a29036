//! Texture groups and the dirty set that tracks which of them need regenerating.

use std::collections::{BTreeSet, HashMap};

use orrery_lod::TextureFamily;

use crate::error::PropertyError;

/// Validated texture-group identifier, assigned when a blueprint is installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    /// Position of the group in its blueprint's declaration order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Routes one backend output bitmap to a material texture slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureRoute {
    /// Backend output name.
    pub output: String,
    /// Material slot receiving the bitmap.
    pub slot: String,
}

impl TextureRoute {
    /// Route `output` to `slot`.
    pub fn new(output: impl Into<String>, slot: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            slot: slot.into(),
        }
    }
}

/// A bundle of backend outputs regenerated together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureGroupDef {
    /// Group name passed to the backend (e.g. "Maps", "StormMask").
    pub name: String,
    /// Resolution family the group is built at.
    pub family: TextureFamily,
    /// Output-to-slot routes.
    pub routes: Vec<TextureRoute>,
}

impl TextureGroupDef {
    /// A group with no routes yet.
    pub fn new(name: impl Into<String>, family: TextureFamily) -> Self {
        Self {
            name: name.into(),
            family,
            routes: Vec::new(),
        }
    }

    /// Add an output-to-slot route.
    pub fn route(mut self, output: impl Into<String>, slot: impl Into<String>) -> Self {
        self.routes.push(TextureRoute::new(output, slot));
        self
    }
}

// ---------------------------------------------------------------------------
// GroupTable
// ---------------------------------------------------------------------------

/// Closed set of texture groups declared by the installed blueprint.
#[derive(Clone, Debug, Default)]
pub struct GroupTable {
    groups: Vec<TextureGroupDef>,
    by_name: HashMap<String, GroupId>,
}

impl GroupTable {
    /// Validate group names and assign ids in declaration order.
    pub fn new(groups: Vec<TextureGroupDef>) -> Result<Self, PropertyError> {
        let mut by_name = HashMap::with_capacity(groups.len());
        for (i, group) in groups.iter().enumerate() {
            if by_name.insert(group.name.clone(), GroupId(i)).is_some() {
                return Err(PropertyError::DuplicateGroup(group.name.clone()));
            }
        }
        Ok(Self { groups, by_name })
    }

    /// Resolve a group name.
    pub fn id(&self, name: &str) -> Result<GroupId, PropertyError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| PropertyError::UnknownGroup(name.to_string()))
    }

    /// Definition of a group.
    pub fn get(&self, id: GroupId) -> &TextureGroupDef {
        &self.groups[id.index()]
    }

    /// All group ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = GroupId> + '_ {
        (0..self.groups.len()).map(GroupId)
    }

    /// Ids of the groups in one family.
    pub fn family_ids(&self, family: TextureFamily) -> impl Iterator<Item = GroupId> + '_ {
        self.ids().filter(move |&id| self.get(id).family == family)
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if no groups are declared.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DirtySet
// ---------------------------------------------------------------------------

/// Texture groups awaiting regeneration. Iterates in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtySet {
    groups: BTreeSet<GroupId>,
}

impl DirtySet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a group dirty. Idempotent.
    pub fn mark(&mut self, group: GroupId) {
        self.groups.insert(group);
    }

    /// Mark several groups dirty.
    pub fn mark_all(&mut self, groups: impl IntoIterator<Item = GroupId>) {
        self.groups.extend(groups);
    }

    /// Remove a group once it has been rebuilt. Returns whether it was dirty.
    pub fn remove(&mut self, group: GroupId) -> bool {
        self.groups.remove(&group)
    }

    /// Returns `true` if the group awaits regeneration.
    pub fn contains(&self, group: GroupId) -> bool {
        self.groups.contains(&group)
    }

    /// Returns `true` if nothing needs rebuilding.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of dirty groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Dirty groups in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.groups.iter().copied()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> GroupTable {
        GroupTable::new(vec![
            TextureGroupDef::new("Maps", TextureFamily::Common).route("height", "_HeightMap"),
            TextureGroupDef::new("Surface", TextureFamily::Material),
            TextureGroupDef::new("StormMask", TextureFamily::Common),
        ])
        .unwrap()
    }

    #[test]
    fn test_ids_follow_declaration_order() {
        let table = table();
        assert_eq!(table.id("Maps").unwrap().index(), 0);
        assert_eq!(table.id("StormMask").unwrap().index(), 2);
        assert_eq!(table.get(table.id("Maps").unwrap()).routes.len(), 1);
    }

    #[test]
    fn test_unknown_group_rejected() {
        assert_eq!(
            table().id("Clouds"),
            Err(PropertyError::UnknownGroup("Clouds".to_string()))
        );
    }

    #[test]
    fn test_duplicate_group_rejected() {
        let result = GroupTable::new(vec![
            TextureGroupDef::new("Maps", TextureFamily::Common),
            TextureGroupDef::new("Maps", TextureFamily::Material),
        ]);
        assert_eq!(
            result.unwrap_err(),
            PropertyError::DuplicateGroup("Maps".to_string())
        );
    }

    #[test]
    fn test_family_filter() {
        let table = table();
        let common: Vec<_> = table.family_ids(TextureFamily::Common).collect();
        assert_eq!(common, vec![GroupId(0), GroupId(2)]);
    }

    #[test]
    fn test_large_tables_keep_distinct_ids() {
        let groups: Vec<_> = (0..70_000)
            .map(|i| TextureGroupDef::new(format!("g{i}"), TextureFamily::Common))
            .collect();
        let table = GroupTable::new(groups).unwrap();
        assert_eq!(table.id("g65536").unwrap().index(), 65_536);
        assert_ne!(table.id("g65536").unwrap(), table.id("g0").unwrap());
        assert_eq!(table.ids().last(), Some(GroupId(69_999)));
    }

    #[test]
    fn test_dirty_insertion_is_idempotent() {
        let mut dirty = DirtySet::new();
        dirty.mark(GroupId(1));
        dirty.mark(GroupId(1));
        assert_eq!(dirty.len(), 1);
        assert!(dirty.remove(GroupId(1)));
        assert!(!dirty.remove(GroupId(1)));
        assert!(dirty.is_empty());
    }

    #[test]
    fn test_dirty_iterates_in_group_order() {
        let mut dirty = DirtySet::new();
        dirty.mark_all([GroupId(2), GroupId(0), GroupId(1)]);
        let order: Vec<_> = dirty.iter().collect();
        assert_eq!(order, vec![GroupId(0), GroupId(1), GroupId(2)]);
    }
}
