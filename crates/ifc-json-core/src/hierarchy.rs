// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial hierarchy and read-only model queries

use crate::document::{EntityNode, GeometryFragment, HierarchyNode};
use crate::geometry::GeometryExtractor;
use crate::walker::{GraphWalker, VisitedSet};
use ifc_json_model::{EntityId, IfcModel, IfcType, ShapeIndex};

/// Answers hierarchy, type and geometry queries over one model
pub struct HierarchyBuilder<'a> {
    model: &'a dyn IfcModel,
    walker: GraphWalker<'a>,
    shapes: Option<&'a ShapeIndex>,
    extractor: GeometryExtractor,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(
        model: &'a dyn IfcModel,
        walker: GraphWalker<'a>,
        shapes: Option<&'a ShapeIndex>,
        extractor: GeometryExtractor,
    ) -> Self {
        Self {
            model,
            walker,
            shapes,
            extractor,
        }
    }

    /// Project → site → building → storey → element tree, `None` without a project
    pub fn build_hierarchy(&self) -> Option<HierarchyNode> {
        let project = self.model.spatial().project()?;
        self.walker.walk_tree(project)
    }

    /// Object entities of a type, ascending by ID
    ///
    /// `tag` may be the label (`Wall`), the class name (`IfcWall`) or the
    /// STEP tag (`IFCWALL`). Unrecognized tags match nothing.
    pub fn entities_by_type(&self, tag: &str) -> Vec<EntityNode> {
        let ifc_type = IfcType::from_label(tag);
        if matches!(ifc_type, IfcType::Unknown(_)) || !ifc_type.is_object() {
            return Vec::new();
        }

        self.model
            .resolver()
            .entities_by_type(&ifc_type)
            .iter()
            .filter_map(|entity| {
                self.walker
                    .convert(Some(entity.as_ref()), &mut VisitedSet::new())
            })
            .collect()
    }

    /// Geometry by raw shape-index key
    pub fn entity_geometry(&self, id: &str) -> Option<GeometryFragment> {
        let shape = self.shapes?.get_by_key(id)?;
        self.extractor.extract(Some(shape.as_ref()))
    }

    /// Spatial structure directly holding `id`
    pub fn containing_structure(&self, id: EntityId) -> Option<EntityNode> {
        let structure = self.model.spatial().containing_structure(id)?;
        let entity = self.model.resolver().get(structure);
        self.walker.convert(entity.as_deref(), &mut VisitedSet::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::EntitySerializer;
    use ifc_json_model::{GeometricItem, HalfEdgeMesh, IfcParser, ProductShape};
    use ifc_json_parser::StepParser;
    use std::sync::Arc;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('1234567890123456',$,'Test Project',$,$,$,$,$,$);
#2=IFCSITE('s',$,'Site',$,$,$,$,$,.ELEMENT.,$,$,$,$,$);
#3=IFCBUILDINGSTOREY('b',$,'Level 1',$,$,$,$,$,.ELEMENT.,0.);
#4=IFCWALL('w1',$,'Wall B',$,$,$,$,$);
#5=IFCWALL('w2',$,'Wall A',$,$,$,$,$);
#6=IFCPROPERTYSET('ps',$,'Pset',$,());
#10=IFCRELAGGREGATES('r1',$,$,$,#1,(#2));
#11=IFCRELAGGREGATES('r2',$,$,$,#2,(#3));
#12=IFCRELCONTAINEDINSPATIALSTRUCTURE('r3',$,$,$,(#5,#4),#3);
ENDSEC;
END-ISO-10303-21;
"#;

    fn shapes() -> ShapeIndex {
        let mut mesh = HalfEdgeMesh::new();
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            mesh.add_vertex(p);
        }
        mesh.add_face(&[0, 1, 2]);
        let mut shape = ProductShape::new(EntityId(4));
        shape.items.push(GeometricItem::from_meshes(EntityId(40), vec![mesh]));
        std::iter::once(shape).collect()
    }

    fn with_builder<R>(f: impl FnOnce(&HierarchyBuilder<'_>) -> R) -> R {
        let model: Arc<dyn IfcModel> = StepParser::new().parse(TEST_IFC).unwrap();
        let shapes = shapes();
        let serializer = EntitySerializer::new(model.as_ref()).with_shapes(Some(&shapes));
        let builder = HierarchyBuilder::new(
            model.as_ref(),
            GraphWalker::new(serializer),
            Some(&shapes),
            GeometryExtractor::default(),
        );
        f(&builder)
    }

    #[test]
    fn test_build_hierarchy() {
        with_builder(|builder| {
            let root = builder.build_hierarchy().unwrap();
            assert_eq!(root.node.entity_type, "Project");
            assert_eq!(root.node.name.as_deref(), Some("Test Project"));

            let storey = &root.children[0].children[0];
            assert_eq!(storey.node.entity_type, "BuildingStorey");
            let names: Vec<_> = storey
                .children
                .iter()
                .map(|c| c.node.name.as_deref().unwrap_or_default())
                .collect();
            assert_eq!(names, vec!["Wall A", "Wall B"]);
            assert!(root.find(4).and_then(|n| n.node.geometry.as_ref()).is_some());
        });
    }

    #[test]
    fn test_entities_by_type_spellings() {
        with_builder(|builder| {
            let walls = builder.entities_by_type("Wall");
            assert_eq!(walls.iter().map(|n| n.id).collect::<Vec<_>>(), vec![4, 5]);
            assert_eq!(builder.entities_by_type("IfcWall"), walls);
            assert_eq!(builder.entities_by_type("IFCWALL"), walls);
            assert_eq!(builder.entities_by_type("wall"), walls);
            // second call sees no residue from the first
            assert_eq!(builder.entities_by_type("Wall"), walls);
        });
    }

    #[test]
    fn test_entities_by_type_misses() {
        with_builder(|builder| {
            assert!(builder.entities_by_type("Door").is_empty());
            assert!(builder.entities_by_type("NotAType").is_empty());
            assert!(builder.entities_by_type("PropertySet").is_empty());
        });
    }

    #[test]
    fn test_entity_geometry_by_key() {
        with_builder(|builder| {
            let geometry = builder.entity_geometry("4").unwrap();
            assert_eq!(geometry.meshes[0].faces, vec![vec![0, 1, 2]]);
            assert!(builder.entity_geometry("5").is_none());
            assert!(builder.entity_geometry("#4").is_none());
            assert!(builder.entity_geometry("").is_none());
        });
    }

    #[test]
    fn test_containing_structure() {
        with_builder(|builder| {
            let storey = builder.containing_structure(EntityId(4)).unwrap();
            assert_eq!(storey.id, 3);
            assert_eq!(builder.containing_structure(EntityId(2)).map(|n| n.id), Some(1));
            assert!(builder.containing_structure(EntityId(1)).is_none());
        });
    }

    #[test]
    fn test_absent_project() {
        let model: Arc<dyn IfcModel> = StepParser::new()
            .parse(&TEST_IFC.replace("#1=IFCPROJECT", "#1=IFCBUILDING"))
            .unwrap();
        let builder = HierarchyBuilder::new(
            model.as_ref(),
            GraphWalker::new(EntitySerializer::new(model.as_ref())),
            None,
            GeometryExtractor::default(),
        );
        assert!(builder.build_hierarchy().is_none());
        assert!(builder.entity_geometry("4").is_none());
    }
}
