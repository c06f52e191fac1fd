// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial relation index and query implementation

use ifc_json_model::{Containment, EntityId, EntityResolver, IfcType, SpatialLink, SpatialQuery};
use rustc_hash::FxHashMap;

/// Spatial query over the aggregation and containment relations
#[derive(Debug, Default)]
pub struct SpatialQueryImpl {
    project: Option<EntityId>,
    /// whole -> parts (IfcRelAggregates)
    aggregates: FxHashMap<u32, Vec<EntityId>>,
    /// structure -> elements (IfcRelContainedInSpatialStructure)
    contains: FxHashMap<u32, Vec<EntityId>>,
    /// child -> first parent link seen
    parents: FxHashMap<u32, SpatialLink>,
}

impl SpatialQueryImpl {
    /// Index the spatial relations of a model
    ///
    /// Relations are read in ascending ID order so child order is stable.
    pub fn build(resolver: &dyn EntityResolver) -> Self {
        let mut index = Self {
            project: resolver
                .ids_by_type(&IfcType::IfcProject)
                .first()
                .copied(),
            ..Self::default()
        };

        // IfcRelAggregates(GlobalId, OwnerHistory, Name, Description, RelatingObject, RelatedObjects)
        for rel in resolver.entities_by_type(&IfcType::IfcRelAggregates) {
            if let Some(whole) = rel.get_ref(4) {
                index.link(whole, rel.get_refs(5), Containment::Aggregates);
            }
        }

        // IfcRelContainedInSpatialStructure(GlobalId, OwnerHistory, Name, Description, RelatedElements, RelatingStructure)
        for rel in resolver.entities_by_type(&IfcType::IfcRelContainedInSpatialStructure) {
            if let Some(structure) = rel.get_ref(5) {
                index.link(structure, rel.get_refs(4), Containment::Contains);
            }
        }

        log::debug!(
            "Spatial index: {} aggregating, {} containing, {} linked children",
            index.aggregates.len(),
            index.contains.len(),
            index.parents.len()
        );

        index
    }

    /// An index without relations
    pub fn empty() -> Self {
        Self::default()
    }

    fn link(&mut self, parent: EntityId, children: Vec<EntityId>, kind: Containment) {
        for &child in &children {
            self.parents.entry(child.0).or_insert(SpatialLink {
                parent,
                child,
                kind,
            });
        }
        let target = match kind {
            Containment::Aggregates => &mut self.aggregates,
            Containment::Contains => &mut self.contains,
        };
        target.entry(parent.0).or_default().extend(children);
    }
}

impl SpatialQuery for SpatialQueryImpl {
    fn project(&self) -> Option<EntityId> {
        self.project
    }

    fn aggregated(&self, id: EntityId) -> Vec<EntityId> {
        self.aggregates.get(&id.0).cloned().unwrap_or_default()
    }

    fn contained(&self, id: EntityId) -> Vec<EntityId> {
        self.contains.get(&id.0).cloned().unwrap_or_default()
    }

    fn parent(&self, id: EntityId) -> Option<SpatialLink> {
        self.parents.get(&id.0).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverImpl;
    use crate::scanner::EntityScanner;

    const TEST_IFC: &str = r#"DATA;
#1=IFCPROJECT('g1',$,'Project',$,$,$,$,$,$);
#2=IFCSITE('g2',$,'Site',$,$,$,$,$,.ELEMENT.,$,$,$,$,$);
#3=IFCBUILDING('g3',$,'Building',$,$,$,$,$,.ELEMENT.,$,$,$);
#4=IFCBUILDINGSTOREY('g4',$,'Level 1',$,$,$,$,$,.ELEMENT.,0.);
#5=IFCWALL('g5',$,'Wall A',$,$,$,$,$);
#6=IFCSLAB('g6',$,'Slab',$,$,$,$,$,$);
#10=IFCRELAGGREGATES('r1',$,$,$,#1,(#2));
#11=IFCRELAGGREGATES('r2',$,$,$,#2,(#3));
#12=IFCRELAGGREGATES('r3',$,$,$,#3,(#4));
#13=IFCRELCONTAINEDINSPATIALSTRUCTURE('r4',$,$,$,(#5,#6),#4);
#14=IFCRELCONTAINEDINSPATIALSTRUCTURE('r5',$,$,$,(#5),#3);
ENDSEC;
"#;

    fn spatial() -> SpatialQueryImpl {
        let index = EntityScanner::build_index(TEST_IFC);
        let resolver = ResolverImpl::new(TEST_IFC.to_string(), index);
        SpatialQueryImpl::build(&resolver)
    }

    #[test]
    fn test_project_and_children() {
        let spatial = spatial();
        assert_eq!(spatial.project(), Some(EntityId(1)));
        assert_eq!(spatial.children(EntityId(1)), vec![EntityId(2)]);
        assert_eq!(spatial.children(EntityId(4)), vec![EntityId(5), EntityId(6)]);
    }

    #[test]
    fn test_aggregated_before_contained() {
        let spatial = spatial();
        assert_eq!(spatial.children(EntityId(3)), vec![EntityId(4), EntityId(5)]);
    }

    #[test]
    fn test_containing_structure_keeps_first_relation() {
        let spatial = spatial();
        assert_eq!(spatial.containing_structure(EntityId(5)), Some(EntityId(4)));
        let link = spatial.parent(EntityId(2)).unwrap();
        assert_eq!(link.kind, Containment::Aggregates);
        assert_eq!(spatial.containing_structure(EntityId(1)), None);
    }

    #[test]
    fn test_empty() {
        let spatial = SpatialQueryImpl::empty();
        assert_eq!(spatial.project(), None);
        assert!(spatial.children(EntityId(1)).is_empty());
    }
}
