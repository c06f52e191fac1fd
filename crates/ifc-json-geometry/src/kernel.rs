// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shape kernel - dispatches representation items to processors
//!
//! Resolves a product's body representation into a [`ProductShape`]: the
//! world placement of the product plus one [`GeometricItem`] per
//! representation item that could be tessellated.

use crate::halfedge::scale_mesh;
use crate::placement::{resolve_placement, to_rows};
use crate::processors::{
    BooleanProcessor, ExtrudedAreaSolidProcessor, FaceSetProcessor, FacetedBrepProcessor,
    GeometryProcessor, MappedItemProcessor,
};
use crate::{Error, Result};
use ifc_json_model::{
    DecodedEntity, EntityId, EntityResolver, EntityResolverExt, GeometricItem, HalfEdgeMesh,
    IfcModel, IfcType, ProductShape, ShapeIndex,
};
use nalgebra::Matrix4;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Nesting limit for mapped items and boolean operands
pub const MAX_ITEM_DEPTH: usize = 32;

/// Representation identifiers that carry body geometry
const BODY_IDENTIFIERS: [&str; 2] = ["Body", "Facetation"];

/// Geometry kernel
pub struct ShapeKernel {
    /// Registered processors by type
    processors: HashMap<IfcType, Arc<dyn GeometryProcessor>>,
    /// Segments used to sample circles
    circle_segments: usize,
    /// Build shape indices on the rayon pool
    parallel: bool,
}

impl ShapeKernel {
    /// Kernel with the default processors registered
    pub fn new() -> Self {
        let mut kernel = Self::empty();
        kernel.register(Arc::new(ExtrudedAreaSolidProcessor::new()));
        kernel.register(Arc::new(FacetedBrepProcessor::new()));
        kernel.register(Arc::new(FaceSetProcessor::new()));
        kernel.register(Arc::new(MappedItemProcessor::new()));
        kernel.register(Arc::new(BooleanProcessor::new()));
        kernel
    }

    /// Kernel without any processors
    pub fn empty() -> Self {
        Self {
            processors: HashMap::new(),
            circle_segments: 24,
            parallel: true,
        }
    }

    pub fn with_circle_segments(mut self, segments: usize) -> Self {
        self.circle_segments = segments.max(3);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn circle_segments(&self) -> usize {
        self.circle_segments
    }

    /// Register a geometry processor for all its supported types
    pub fn register(&mut self, processor: Arc<dyn GeometryProcessor>) {
        for ifc_type in processor.supported_types() {
            self.processors.insert(ifc_type, Arc::clone(&processor));
        }
    }

    /// Check if a type has a registered processor
    pub fn has_processor(&self, ifc_type: &IfcType) -> bool {
        self.processors.contains_key(ifc_type)
    }

    /// Tessellate one representation item in its own coordinates
    pub fn process_item(
        &self,
        item: &DecodedEntity,
        resolver: &dyn EntityResolver,
        depth: usize,
    ) -> Result<Vec<HalfEdgeMesh>> {
        if depth > MAX_ITEM_DEPTH {
            return Err(Error::TooDeep(MAX_ITEM_DEPTH));
        }
        let processor = self
            .processors
            .get(&item.ifc_type)
            .ok_or_else(|| Error::unsupported_type(item.ifc_type.class_name()))?;
        processor.process(item, self, resolver, depth)
    }

    /// Body representation items of a product
    fn body_items(
        &self,
        product: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Vec<Arc<DecodedEntity>> {
        // IfcProduct(..., ObjectPlacement, Representation)
        let Some(definition) = resolver.follow(product, 6) else {
            return Vec::new();
        };
        // IfcProductDefinitionShape(Name, Description, Representations)
        definition
            .get_refs(2)
            .into_iter()
            .filter_map(|id| resolver.get(id))
            .filter(|rep| {
                // IfcShapeRepresentation(ContextOfItems, Identifier, Type, Items)
                rep.get_string(1)
                    .map_or(true, |identifier| BODY_IDENTIFIERS.contains(&identifier))
            })
            .flat_map(|rep| rep.get_refs(3))
            .filter_map(|id| resolver.get(id))
            .collect()
    }

    /// Shape of a product, `None` when it has no tessellated body
    ///
    /// Items that fail to process are skipped with a warning. Vertices and
    /// the placement translation are scaled to meters.
    pub fn product_shape(
        &self,
        model: &dyn IfcModel,
        product_id: EntityId,
    ) -> Result<Option<ProductShape>> {
        let resolver = model.resolver();
        let product = resolver
            .get(product_id)
            .ok_or_else(|| Error::entity_not_found(product_id.0))?;

        let scale = model.unit_scale();
        let mut shape = ProductShape::new(product_id);
        for item in self.body_items(&product, resolver) {
            match self.process_item(&item, resolver, 0) {
                Ok(mut meshes) => {
                    meshes.retain(|mesh| !mesh.is_empty());
                    if meshes.is_empty() {
                        continue;
                    }
                    for mesh in &mut meshes {
                        scale_mesh(mesh, scale);
                    }
                    shape.items.push(GeometricItem::from_meshes(item.id, meshes));
                }
                Err(e) => log::warn!(
                    "Skipping {} ({}) of product {}: {}",
                    item.id,
                    item.ifc_type.class_name(),
                    product_id,
                    e
                ),
            }
        }
        if shape.items.is_empty() {
            return Ok(None);
        }

        // IfcProduct.ObjectPlacement at index 5
        let mut placement = match product.get_ref(5) {
            Some(id) => resolve_placement(id, resolver)?,
            None => Matrix4::identity(),
        };
        for row in 0..3 {
            placement[(row, 3)] *= scale;
        }
        shape.transform = to_rows(&placement);

        Ok(Some(shape))
    }

    /// Shapes of every product in a model
    pub fn build_index(&self, model: &dyn IfcModel) -> ShapeIndex {
        let resolver = model.resolver();
        let products: Vec<EntityId> = resolver
            .all_ids()
            .into_iter()
            .filter(|&id| resolver.type_of(id).is_some_and(|t| t.is_product()))
            .collect();

        let shape_of = |id: EntityId| match self.product_shape(model, id) {
            Ok(shape) => shape,
            Err(e) => {
                log::warn!("No geometry for product {}: {}", id, e);
                None
            }
        };

        let index: ShapeIndex = if self.parallel {
            let shapes: Vec<ProductShape> =
                products.par_iter().filter_map(|&id| shape_of(id)).collect();
            shapes.into_iter().collect()
        } else {
            products.iter().filter_map(|&id| shape_of(id)).collect()
        };

        log::info!(
            "Built shapes for {} of {} products",
            index.len(),
            products.len()
        );
        index
    }
}

impl Default for ShapeKernel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifc_json_model::IfcParser;
    use ifc_json_parser::StepParser;

    const WALL_MODEL: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('p',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#10=IFCCARTESIANPOINT((1000.,0.,0.));
#11=IFCAXIS2PLACEMENT3D(#10,$,$);
#12=IFCLOCALPLACEMENT($,#11);
#20=IFCRECTANGLEPROFILEDEF(.AREA.,$,$,4000.,200.);
#21=IFCDIRECTION((0.,0.,1.));
#22=IFCEXTRUDEDAREASOLID(#20,$,#21,3000.);
#23=IFCCARTESIANPOINT((0.,0.,0.));
#24=IFCCARTESIANPOINT((4000.,0.,0.));
#25=IFCPOLYLINE((#23,#24));
#26=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#22));
#27=IFCSHAPEREPRESENTATION($,'Axis','Curve2D',(#25));
#28=IFCPRODUCTDEFINITIONSHAPE($,$,(#27,#26));
#30=IFCWALL('w',$,'Wall',$,$,#12,#28,$);
#31=IFCWALL('w2',$,'Bare wall',$,$,#12,$,$);
#32=IFCBLOCK($,1.,1.,1.);
#33=IFCSHAPEREPRESENTATION($,'Body','CSG',(#32));
#34=IFCPRODUCTDEFINITIONSHAPE($,$,(#33));
#35=IFCSLAB('s',$,'Unsupported',$,$,$,#34,$,$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_product_shape_in_meters() {
        let model = StepParser::new().parse(WALL_MODEL).unwrap();
        let kernel = ShapeKernel::new();
        let shape = kernel
            .product_shape(model.as_ref(), EntityId(30))
            .unwrap()
            .unwrap();

        // axis representation is ignored
        assert_eq!(shape.items.len(), 1);
        assert_eq!(shape.items[0].item_id, EntityId(22));
        assert_eq!(shape.items[0].face_count(), 6);

        assert_relative_eq!(shape.transform[0][3], 1.0, epsilon = 1e-9);
        let z_max = shape.items[0].meshsets[0].meshes[0]
            .vertices
            .iter()
            .map(|v| v[2])
            .fold(f64::MIN, f64::max);
        assert_relative_eq!(z_max, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_products_without_body() {
        let model = StepParser::new().parse(WALL_MODEL).unwrap();
        let kernel = ShapeKernel::new();
        assert!(kernel.product_shape(model.as_ref(), EntityId(31)).unwrap().is_none());
        // unsupported items are skipped, not fatal
        assert!(kernel.product_shape(model.as_ref(), EntityId(35)).unwrap().is_none());
        assert!(matches!(
            kernel.product_shape(model.as_ref(), EntityId(999)),
            Err(Error::EntityNotFound(999))
        ));
    }

    #[test]
    fn test_build_index_parallel_matches_serial() {
        let model = StepParser::new().parse(WALL_MODEL).unwrap();
        let parallel = ShapeKernel::new().build_index(model.as_ref());
        let serial = ShapeKernel::new()
            .with_parallel(false)
            .build_index(model.as_ref());

        assert_eq!(parallel.len(), 1);
        assert_eq!(serial.len(), 1);
        assert_eq!(parallel.get(EntityId(30)), serial.get(EntityId(30)));
        assert!(parallel.get_by_key("30").is_some());
    }

    #[test]
    fn test_registration() {
        let kernel = ShapeKernel::empty().with_circle_segments(1);
        assert!(!kernel.has_processor(&IfcType::IfcExtrudedAreaSolid));
        assert_eq!(kernel.circle_segments(), 3);
        assert!(ShapeKernel::new().has_processor(&IfcType::IfcMappedItem));
    }
}
