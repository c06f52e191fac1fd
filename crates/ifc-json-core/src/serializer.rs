// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity serialization

use crate::document::EntityNode;
use crate::geometry::GeometryExtractor;
use ifc_json_model::{DecodedEntity, IfcModel, ShapeIndex};
use serde_json::{json, Map, Value};

/// Converts single entities into document nodes
#[derive(Clone)]
pub struct EntitySerializer<'a> {
    model: &'a dyn IfcModel,
    shapes: Option<&'a ShapeIndex>,
    extractor: GeometryExtractor,
    properties: bool,
}

impl<'a> EntitySerializer<'a> {
    pub fn new(model: &'a dyn IfcModel) -> Self {
        Self {
            model,
            shapes: None,
            extractor: GeometryExtractor::default(),
            properties: true,
        }
    }

    /// Attach geometry from a shape index
    pub fn with_shapes(mut self, shapes: Option<&'a ShapeIndex>) -> Self {
        self.shapes = shapes;
        self
    }

    pub fn with_extractor(mut self, extractor: GeometryExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_properties(mut self, properties: bool) -> Self {
        self.properties = properties;
        self
    }

    /// Same serializer without geometry
    pub fn without_geometry(&self) -> Self {
        Self {
            model: self.model,
            shapes: None,
            extractor: self.extractor,
            properties: self.properties,
        }
    }

    pub fn model(&self) -> &'a dyn IfcModel {
        self.model
    }

    /// Convert one entity into a node
    pub fn serialize(&self, entity: &DecodedEntity) -> EntityNode {
        let geometry = self
            .shapes
            .and_then(|shapes| shapes.get(entity.id))
            .and_then(|shape| self.extractor.extract(Some(shape.as_ref())));

        EntityNode {
            id: entity.id.0,
            entity_type: entity.ifc_type.label().to_string(),
            global_id: entity.global_id().map(str::to_string),
            name: entity.name().map(str::to_string),
            description: entity.description().map(str::to_string),
            properties: self.properties_of(entity),
            geometry,
        }
    }

    fn properties_of(&self, entity: &DecodedEntity) -> Map<String, Value> {
        let mut properties = Map::new();
        properties.insert("entityId".into(), json!(entity.id.0));
        properties.insert("className".into(), json!(entity.ifc_type.class_name()));
        if !self.properties {
            return properties;
        }

        let reader = self.model.properties();

        let psets: Map<String, Value> = reader
            .property_sets(entity.id)
            .into_iter()
            .map(|pset| {
                let values: Map<String, Value> = pset
                    .properties
                    .into_iter()
                    .map(|p| (p.name, serde_json::to_value(p.value).unwrap_or(Value::Null)))
                    .collect();
                (pset.name, Value::Object(values))
            })
            .collect();
        if !psets.is_empty() {
            properties.insert("propertySets".into(), Value::Object(psets));
        }

        let quantities: Map<String, Value> = reader
            .quantities(entity.id)
            .into_iter()
            .map(|q| (q.name, json!({ "value": q.value, "unit": q.unit })))
            .collect();
        if !quantities.is_empty() {
            properties.insert("quantities".into(), Value::Object(quantities));
        }

        if let Some(object_type) = reader.object_type(entity.id).filter(|s| !s.is_empty()) {
            properties.insert("objectType".into(), json!(object_type));
        }
        if let Some(tag) = reader.tag(entity.id).filter(|s| !s.is_empty()) {
            properties.insert("tag".into(), json!(tag));
        }

        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_json_model::{EntityId, GeometricItem, HalfEdgeMesh, IfcParser, ProductShape};
    use ifc_json_parser::StepParser;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCWALL('0abc',$,'Wall',$,'Basic Wall',$,$,'W-1');
#2=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);
#3=IFCPROPERTYSET('ps',$,'Pset_WallCommon',$,(#2));
#4=IFCRELDEFINESBYPROPERTIES('r',$,$,$,(#1),#3);
#5=IFCQUANTITYLENGTH('Length',$,$,4.5,$);
#6=IFCELEMENTQUANTITY('q',$,'Qto',$,$,(#5));
#7=IFCRELDEFINESBYPROPERTIES('r2',$,$,$,(#1),#6);
#8=IFCSLAB('',$,$,'',$,$,$,$,$);
#9=IFCFOOBAR('x',$,'Unknown thing',$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_serialize_with_properties() {
        let model = StepParser::new().parse(TEST_IFC).unwrap();
        let serializer = EntitySerializer::new(model.as_ref());
        let wall = model.resolver().get(EntityId(1)).unwrap();
        let node = serializer.serialize(&wall);

        assert_eq!(node.id, 1);
        assert_eq!(node.entity_type, "Wall");
        assert_eq!(node.global_id.as_deref(), Some("0abc"));
        assert_eq!(node.name.as_deref(), Some("Wall"));
        assert_eq!(node.description, None);
        assert_eq!(node.properties["entityId"], json!(1));
        assert_eq!(node.properties["className"], json!("IfcWall"));
        assert_eq!(
            node.properties["propertySets"]["Pset_WallCommon"]["IsExternal"],
            json!(true)
        );
        assert_eq!(
            node.properties["quantities"]["Length"],
            json!({"value": 4.5, "unit": "m"})
        );
        assert_eq!(node.properties["objectType"], json!("Basic Wall"));
        assert_eq!(node.properties["tag"], json!("W-1"));
        assert!(node.geometry.is_none());
    }

    #[test]
    fn test_empty_strings_kept_and_optional_keys_skipped() {
        let model = StepParser::new().parse(TEST_IFC).unwrap();
        let serializer = EntitySerializer::new(model.as_ref());
        let slab = model.resolver().get(EntityId(8)).unwrap();
        let node = serializer.serialize(&slab);

        assert_eq!(node.global_id.as_deref(), Some(""));
        assert_eq!(node.description.as_deref(), Some(""));
        assert_eq!(node.name, None);
        assert_eq!(node.properties.len(), 2);
    }

    #[test]
    fn test_unknown_type_keeps_raw_tag() {
        let model = StepParser::new().parse(TEST_IFC).unwrap();
        let serializer = EntitySerializer::new(model.as_ref()).with_properties(false);
        let entity = model.resolver().get(EntityId(9)).unwrap();
        let node = serializer.serialize(&entity);
        assert_eq!(node.entity_type, "IFCFOOBAR");
        assert_eq!(node.properties["className"], json!("IFCFOOBAR"));
    }

    #[test]
    fn test_geometry_attached_by_key() {
        let model = StepParser::new().parse(TEST_IFC).unwrap();
        let mut mesh = HalfEdgeMesh::new();
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            mesh.add_vertex(p);
        }
        mesh.add_face(&[0, 1, 2]);
        let mut shape = ProductShape::new(EntityId(1));
        shape.items.push(GeometricItem::from_meshes(EntityId(50), vec![mesh]));
        let shapes: ShapeIndex = std::iter::once(shape).collect();

        let serializer = EntitySerializer::new(model.as_ref()).with_shapes(Some(&shapes));
        let wall = model.resolver().get(EntityId(1)).unwrap();
        let geometry = serializer.serialize(&wall).geometry.unwrap();
        assert_eq!(geometry.meshes[0].faces, vec![vec![0, 1, 2]]);

        let bare = serializer.without_geometry().serialize(&wall);
        assert!(bare.geometry.is_none());
    }
}
