// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial structure relations
//!
//! The spatial tree of an IFC model is not stored on the entities; it is
//! spread over objectified relationships. `IfcRelAggregates` decomposes a
//! whole into parts (project → site → building → storey) and
//! `IfcRelContainedInSpatialStructure` places elements in a structure.

use crate::EntityId;
use serde::{Deserialize, Serialize};

/// How a child is attached to its parent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Containment {
    /// Decomposition via IfcRelAggregates
    Aggregates,
    /// Spatial containment via IfcRelContainedInSpatialStructure
    Contains,
}

/// A parent/child edge in the spatial structure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpatialLink {
    pub parent: EntityId,
    pub child: EntityId,
    pub kind: Containment,
}

/// Spatial query interface
///
/// Relations are reported as written in the file. Nothing here guarantees
/// the graph is a tree: a malformed model can aggregate an entity into
/// itself or attach one element to several structures, so every caller
/// walking these relations must track what it already visited.
///
/// # Example
///
/// ```ignore
/// use ifc_json_model::SpatialQuery;
///
/// fn print_top_level(spatial: &dyn SpatialQuery) {
///     if let Some(project) = spatial.project() {
///         for child in spatial.children(project) {
///             println!("{}", child);
///         }
///     }
/// }
/// ```
pub trait SpatialQuery: Send + Sync {
    /// The project entity, if the model has one
    fn project(&self) -> Option<EntityId>;

    /// Parts aggregated by `id`, in relation order
    fn aggregated(&self, id: EntityId) -> Vec<EntityId>;

    /// Elements contained in the spatial structure `id`, in relation order
    fn contained(&self, id: EntityId) -> Vec<EntityId>;

    /// The first structure that aggregates or contains `id`
    fn parent(&self, id: EntityId) -> Option<SpatialLink>;

    /// Children of `id`: aggregated parts first, then contained elements
    fn children(&self, id: EntityId) -> Vec<EntityId> {
        let mut children = self.aggregated(id);
        children.extend(self.contained(id));
        children
    }

    /// Spatial structure directly holding `id`
    fn containing_structure(&self, id: EntityId) -> Option<EntityId> {
        self.parent(id).map(|link| link.parent)
    }
}
