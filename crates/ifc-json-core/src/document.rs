// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Converted document types
//!
//! These serialize to the JSON handed to templates. Absent optional fields
//! are omitted rather than written as `null`.

use ifc_json_model::ModelMetadata;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One mesh of a geometry fragment
///
/// Face indices refer to this mesh's own `vertices`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshFragment {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Vec<usize>>,
}

impl MeshFragment {
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// Placement and meshes of one entity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryFragment {
    /// Row-major 4x4 transform
    pub transform: [[f64; 4]; 4],
    /// One mesh per geometric item
    pub meshes: Vec<MeshFragment>,
}

/// A converted entity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityNode {
    pub id: u32,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<GeometryFragment>,
}

/// Entity node with its spatial children
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    #[serde(flatten)]
    pub node: EntityNode,
    #[serde(default)]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn new(node: EntityNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    /// Depth-first search for a node by ID
    pub fn find(&self, id: u32) -> Option<&HierarchyNode> {
        let mut stack = vec![self];
        while let Some(current) = stack.pop() {
            if current.node.id == id {
                return Some(current);
            }
            stack.extend(current.children.iter().rev());
        }
        None
    }

    /// Number of nodes in this subtree
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(current) = stack.pop() {
            count += 1;
            stack.extend(&current.children);
        }
        count
    }
}

/// A whole converted model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<EntityNode>,
    pub entities: Vec<EntityNode>,
    pub hierarchy: Option<HierarchyNode>,
    pub metadata: ModelMetadata,
}
