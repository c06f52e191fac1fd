// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cycle-safe traversal of the spatial structure
//!
//! Aggregation and containment relations are not guaranteed to form a tree.
//! Every traversal owns a [`VisitedSet`] and works off an explicit stack, so
//! a cyclic or diamond-shaped model converts in linear time without
//! recursing on the host stack.

use crate::document::{EntityNode, HierarchyNode};
use crate::serializer::EntitySerializer;
use ifc_json_model::{DecodedEntity, EntityId};
use rustc_hash::FxHashSet;

/// Identifiers already converted in one traversal
#[derive(Debug, Default)]
pub struct VisitedSet {
    ids: FxHashSet<u32>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as visited, `false` if it already was
    pub fn insert(&mut self, id: EntityId) -> bool {
        self.ids.insert(id.0)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id.0)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Drives entity conversion over the spatial relations
pub struct GraphWalker<'a> {
    serializer: EntitySerializer<'a>,
    tree_serializer: EntitySerializer<'a>,
}

impl<'a> GraphWalker<'a> {
    /// Walker attaching geometry in both flat lists and trees
    pub fn new(serializer: EntitySerializer<'a>) -> Self {
        Self {
            tree_serializer: serializer.clone(),
            serializer,
        }
    }

    /// Whether hierarchy nodes carry geometry
    pub fn with_tree_geometry(mut self, enabled: bool) -> Self {
        self.tree_serializer = if enabled {
            self.serializer.clone()
        } else {
            self.serializer.without_geometry()
        };
        self
    }

    /// Convert one entity unless it is absent or already visited
    pub fn convert(
        &self,
        entity: Option<&DecodedEntity>,
        visited: &mut VisitedSet,
    ) -> Option<EntityNode> {
        convert_with(&self.serializer, entity, visited)
    }

    /// Flat list of everything reachable from `roots`, each entity once
    pub fn walk_flat(&self, roots: &[EntityId]) -> Vec<EntityNode> {
        let model = self.serializer.model();
        let resolver = model.resolver();
        let spatial = model.spatial();

        let mut visited = VisitedSet::new();
        let mut nodes = Vec::new();
        let mut stack: Vec<EntityId> = roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if visited.contains(id) {
                continue;
            }
            let entity = resolver.get(id);
            let Some(node) = self.convert(entity.as_deref(), &mut visited) else {
                continue;
            };
            nodes.push(node);
            stack.extend(
                spatial
                    .children(id)
                    .into_iter()
                    .rev()
                    .filter(|child| !visited.contains(*child)),
            );
        }

        log::debug!("Flat walk from {} roots: {} entities", roots.len(), nodes.len());
        nodes
    }

    /// Spatial subtree below `root`, `None` if the root does not resolve
    ///
    /// Depth-first pre-order: an entity reachable through several parents
    /// is placed under the first one visited.
    pub fn walk_tree(&self, root: EntityId) -> Option<HierarchyNode> {
        let model = self.serializer.model();
        let resolver = model.resolver();
        let spatial = model.spatial();

        let mut visited = VisitedSet::new();
        // arena of (node, child slots); a child's slot is always after its parent's
        let mut arena: Vec<(EntityNode, Vec<usize>)> = Vec::new();
        let mut stack: Vec<(EntityId, Option<usize>)> = vec![(root, None)];

        while let Some((id, parent)) = stack.pop() {
            let entity = resolver.get(id);
            let Some(node) = convert_with(&self.tree_serializer, entity.as_deref(), &mut visited)
            else {
                continue;
            };

            let slot = arena.len();
            arena.push((node, Vec::new()));
            if let Some(parent) = parent {
                arena[parent].1.push(slot);
            }

            stack.extend(
                spatial
                    .children(id)
                    .into_iter()
                    .rev()
                    .filter(|child| !visited.contains(*child))
                    .map(|child| (child, Some(slot))),
            );
        }

        let mut built: Vec<Option<HierarchyNode>> = Vec::with_capacity(arena.len());
        built.resize_with(arena.len(), || None);
        for (slot, (node, children)) in arena.into_iter().enumerate().rev() {
            let mut tree = HierarchyNode::new(node);
            tree.children = children
                .into_iter()
                .filter_map(|child| built[child].take())
                .collect();
            built[slot] = Some(tree);
        }

        built.into_iter().next().flatten()
    }
}

fn convert_with(
    serializer: &EntitySerializer<'_>,
    entity: Option<&DecodedEntity>,
    visited: &mut VisitedSet,
) -> Option<EntityNode> {
    let entity = entity?;
    if !visited.insert(entity.id) {
        log::debug!("Skipping already visited {}", entity.id);
        return None;
    }
    Some(serializer.serialize(entity))
}
