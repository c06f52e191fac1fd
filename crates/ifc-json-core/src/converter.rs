// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model loading and document conversion

use crate::document::ModelDocument;
use crate::error::Result;
use crate::geometry::GeometryExtractor;
use crate::hierarchy::HierarchyBuilder;
use crate::options::ConverterOptions;
use crate::serializer::EntitySerializer;
use crate::walker::{GraphWalker, VisitedSet};
use ifc_json_geometry::ShapeKernel;
use ifc_json_model::{EntityId, IfcModel, IfcParser, ShapeIndex};
use ifc_json_parser::StepParser;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Loads IFC files and prepares them for conversion
pub struct Converter {
    options: ConverterOptions,
    parser: StepParser,
    kernel: ShapeKernel,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConverterOptions::default())
    }
}

impl Converter {
    pub fn new(options: ConverterOptions) -> Self {
        Self {
            parser: StepParser::new().with_properties(options.properties),
            kernel: ShapeKernel::new()
                .with_circle_segments(options.circle_segments)
                .with_parallel(options.parallel),
            options,
        }
    }

    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    /// Parse a file and build its shapes
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadedModel> {
        let path = path.as_ref();
        let model = self.parser.parse_file(path)?;
        Ok(self.prepare(path.display().to_string(), model))
    }

    /// Parse in-memory content registered under `source`
    pub fn load_str(&self, source: impl Into<String>, content: &str) -> Result<LoadedModel> {
        let model = self.parser.parse(content)?;
        Ok(self.prepare(source.into(), model))
    }

    fn prepare(&self, source: String, model: Arc<dyn IfcModel>) -> LoadedModel {
        let shapes = if self.options.geometry {
            let start = Instant::now();
            let shapes = self.kernel.build_index(model.as_ref());
            log::info!(
                "Built {} shapes for {} in {:?}",
                shapes.len(),
                source,
                start.elapsed()
            );
            Some(shapes)
        } else {
            None
        };

        LoadedModel {
            source,
            model,
            shapes,
            options: self.options.clone(),
        }
    }
}

/// A parsed model with its shape index
pub struct LoadedModel {
    source: String,
    model: Arc<dyn IfcModel>,
    shapes: Option<ShapeIndex>,
    options: ConverterOptions,
}

impl LoadedModel {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn model(&self) -> &dyn IfcModel {
        self.model.as_ref()
    }

    pub fn shapes(&self) -> Option<&ShapeIndex> {
        self.shapes.as_ref()
    }

    pub fn entity_count(&self) -> usize {
        self.model.resolver().entity_count()
    }

    fn extractor(&self) -> GeometryExtractor {
        GeometryExtractor::new(self.options.shared_vertices)
    }

    fn walker(&self) -> GraphWalker<'_> {
        let serializer = EntitySerializer::new(self.model())
            .with_shapes(self.shapes())
            .with_extractor(self.extractor())
            .with_properties(self.options.properties);
        GraphWalker::new(serializer).with_tree_geometry(self.options.hierarchy_geometry)
    }

    /// Hierarchy, type and geometry queries
    pub fn queries(&self) -> HierarchyBuilder<'_> {
        HierarchyBuilder::new(self.model(), self.walker(), self.shapes(), self.extractor())
    }

    /// Convert the whole model
    ///
    /// The flat list starts with the project and what it reaches, followed
    /// by every other object entity (unassigned elements, type objects)
    /// ascending by ID.
    pub fn document(&self) -> ModelDocument {
        let start = Instant::now();
        let resolver = self.model.resolver();
        let walker = self.walker();

        let project_id = self.model.spatial().project();
        let project = project_id.and_then(|id| {
            let entity = resolver.get(id);
            walker.convert(entity.as_deref(), &mut VisitedSet::new())
        });

        let roots: Vec<EntityId> = project_id
            .into_iter()
            .chain(
                resolver
                    .all_ids()
                    .into_iter()
                    .filter(|&id| Some(id) != project_id)
                    .filter(|&id| resolver.type_of(id).is_some_and(|t| t.is_object())),
            )
            .collect();
        let entities = walker.walk_flat(&roots);
        let hierarchy = self.queries().build_hierarchy();

        log::info!(
            "Converted {}: {} entities in {:?}",
            self.source,
            entities.len(),
            start.elapsed()
        );

        ModelDocument {
            project,
            entities,
            hierarchy,
            metadata: self.model.metadata().clone(),
        }
    }

    /// Whole-model document as JSON
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.document())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use crate::testing::ROUND_TRIP;

    fn serial() -> Converter {
        Converter::new(ConverterOptions::default().with_parallel(false))
    }

    #[test]
    fn test_round_trip_document() {
        let loaded = serial().load_str("test.ifc", ROUND_TRIP).unwrap();
        let doc = loaded.document();

        let project = doc.project.as_ref().unwrap();
        assert_eq!(project.name.as_deref(), Some("Test Project"));
        assert_eq!(project.global_id.as_deref(), Some("1234567890123456"));
        assert_eq!(doc.entities.len(), 4);
        assert_eq!(doc.metadata.schema_version, "IFC4");

        let root = doc.hierarchy.as_ref().unwrap();
        assert_eq!(root.node.entity_type, "Project");
        let wall = root.find(30).unwrap();
        assert_eq!(wall.node.entity_type, "Wall");
        assert_eq!(wall.node.name.as_deref(), Some("Test Wall"));
        assert!(wall.node.geometry.is_some());
    }

    #[test]
    fn test_face_indices_in_range() {
        let loaded = serial().load_str("test.ifc", ROUND_TRIP).unwrap();
        let doc = loaded.document();
        let geometry = doc
            .entities
            .iter()
            .find(|n| n.id == 30)
            .and_then(|n| n.geometry.as_ref())
            .unwrap();

        let mesh = &geometry.meshes[0];
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.vertices.len(), 24);
        for face in &mesh.faces {
            assert!(face.iter().all(|&i| i < mesh.vertices.len()));
        }
    }

    #[test]
    fn test_without_geometry_or_tree_geometry() {
        let converter = Converter::new(ConverterOptions::default().with_geometry(false));
        let doc = converter.load_str("a", ROUND_TRIP).unwrap().document();
        assert!(doc.entities.iter().all(|n| n.geometry.is_none()));

        let converter = Converter::new(
            ConverterOptions::default()
                .with_parallel(false)
                .with_hierarchy_geometry(false),
        );
        let loaded = converter.load_str("b", ROUND_TRIP).unwrap();
        let doc = loaded.document();
        assert!(doc.hierarchy.unwrap().find(30).unwrap().node.geometry.is_none());
        assert!(doc.entities.iter().any(|n| n.geometry.is_some()));
        assert!(loaded.queries().entity_geometry("30").is_some());
    }

    #[test]
    fn test_shared_vertices_option() {
        let converter = Converter::new(
            ConverterOptions::default()
                .with_parallel(false)
                .with_shared_vertices(true),
        );
        let loaded = converter.load_str("a", ROUND_TRIP).unwrap();
        let geometry = loaded.queries().entity_geometry("30").unwrap();
        assert_eq!(geometry.meshes[0].vertices.len(), 8);
    }

    #[test]
    fn test_model_without_project() {
        let content = ROUND_TRIP.replace("#1=IFCPROJECT", "#1=IFCBUILDING");
        let loaded = serial().load_str("a", &content).unwrap();
        let doc = loaded.document();

        assert!(doc.project.is_none());
        assert!(doc.hierarchy.is_none());
        let ids: Vec<u32> = doc.entities.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 4, 5, 30]);

        let value = loaded.to_value().unwrap();
        assert!(value.get("project").is_none());
        assert_eq!(value["hierarchy"], Value::Null);
    }

    #[test]
    fn test_unassigned_objects_are_listed() {
        let content = ROUND_TRIP.replace(
            "ENDSEC;\nEND-ISO",
            "#40=IFCWALL('loose',$,'Loose Wall',$,$,$,$,$);\n\
             #41=IFCWALLTYPE('type',$,'Basic Wall',$,$,$,$,$,$,.STANDARD.);\n\
             ENDSEC;\nEND-ISO",
        );
        let loaded = serial().load_str("a", &content).unwrap();
        let doc = loaded.document();

        let ids: Vec<u32> = doc.entities.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 4, 5, 30, 40, 41]);
        assert_eq!(doc.entities[5].entity_type, "WallType");
        assert!(doc.hierarchy.as_ref().unwrap().find(40).is_none());

        let walls: Vec<u32> = loaded
            .queries()
            .entities_by_type("Wall")
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(walls, vec![30, 40]);
        assert!(walls.iter().all(|id| ids.contains(id)));
    }

    #[test]
    fn test_idempotent_documents() {
        let loaded = serial().load_str("a", ROUND_TRIP).unwrap();
        assert_eq!(loaded.document(), loaded.document());
        assert_eq!(
            loaded.queries().entities_by_type("Wall"),
            loaded.queries().entities_by_type("Wall")
        );
    }

    #[test]
    fn test_load_failures() {
        let err = serial().load("/nonexistent/model.ifc").err().unwrap();
        assert!(matches!(err, ConvertError::Load(_)));

        let err = serial().load_str("x", "not a model").err().unwrap();
        assert!(err.to_string().contains("ISO-10303-21"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.ifc");
        std::fs::write(&path, ROUND_TRIP).unwrap();

        let loaded = serial().load(&path).unwrap();
        assert_eq!(loaded.source(), path.display().to_string());
        assert_eq!(loaded.entity_count(), 17);
    }
}
