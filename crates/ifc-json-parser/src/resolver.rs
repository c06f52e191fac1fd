// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! EntityResolver trait implementation
//!
//! Entities are decoded lazily from their byte span on first access and
//! cached behind a lock, so a model only pays for what is looked at.

use crate::scanner::EntityIndex;
use crate::tokenizer::parse_entity_at;
use ifc_json_model::{DecodedEntity, EntityId, EntityResolver, IfcType};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe entity resolver implementation
pub struct ResolverImpl {
    /// Raw IFC content (owned for thread safety)
    content: String,
    index: EntityIndex,
    /// Decoded entity cache
    cache: RwLock<FxHashMap<u32, Arc<DecodedEntity>>>,
}

impl ResolverImpl {
    pub fn new(content: String, index: EntityIndex) -> Self {
        Self {
            content,
            index,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Decode and cache an entity
    fn decode_and_cache(&self, id: u32) -> Option<Arc<DecodedEntity>> {
        {
            let cache = self.cache.read().ok()?;
            if let Some(cached) = cache.get(&id) {
                return Some(Arc::clone(cached));
            }
        }

        let entry = self.index.get(id)?;
        let entity = match parse_entity_at(&self.content, entry.start, entry.end) {
            Ok(entity) => entity,
            Err(e) => {
                log::debug!("Skipping undecodable entity #{}: {}", id, e);
                return None;
            }
        };
        let arc = Arc::new(entity);

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(id, Arc::clone(&arc));
        }

        Some(arc)
    }
}

impl EntityResolver for ResolverImpl {
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        self.decode_and_cache(id.0)
    }

    fn ids_by_type(&self, ifc_type: &IfcType) -> Vec<EntityId> {
        self.index.ids_of(ifc_type).to_vec()
    }

    fn all_ids(&self) -> Vec<EntityId> {
        self.index.ids().to_vec()
    }

    fn type_of(&self, id: EntityId) -> Option<IfcType> {
        self.index.get(id.0).map(|entry| entry.ifc_type.clone())
    }

    fn entity_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::EntityScanner;
    use ifc_json_model::EntityResolverExt;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCWALL('guid2',$,'Wall 1',$,$,$,$,$);
#5=IFCWALL('guid3',$,'Broken',$,$,$,$,$;
ENDSEC;
END-ISO-10303-21;
"#;

    fn resolver() -> ResolverImpl {
        ResolverImpl::new(TEST_IFC.to_string(), EntityScanner::build_index(TEST_IFC))
    }

    #[test]
    fn test_resolver_get() {
        let resolver = resolver();
        let entity = resolver.get(EntityId(1)).unwrap();
        assert_eq!(entity.id, EntityId(1));
        assert_eq!(entity.name(), Some("Project"));
        assert!(resolver.get(EntityId(99)).is_none());
    }

    #[test]
    fn test_resolver_follows_references() {
        let resolver = resolver();
        let project = resolver.get(EntityId(1)).unwrap();
        let units = resolver.follow(&project, 8).unwrap();
        assert_eq!(units.ifc_type, IfcType::IfcUnitAssignment);
        let list = resolver.resolve_ref_list(units.get(0).unwrap());
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].ifc_type, IfcType::IfcSIUnit);
    }

    #[test]
    fn test_undecodable_entity_is_indexed_but_unresolvable() {
        let resolver = resolver();
        assert_eq!(resolver.type_of(EntityId(5)), Some(IfcType::IfcWall));
        assert!(resolver.get(EntityId(5)).is_none());

        let walls = resolver.entities_by_type(&IfcType::IfcWall);
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].id, EntityId(4));
    }

    #[test]
    fn test_resolver_thread_safe() {
        use std::thread;

        let resolver = Arc::new(resolver());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                thread::spawn(move || {
                    (1..=4)
                        .filter(|&id| resolver.get(EntityId(id)).is_some())
                        .count()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 4);
        }
    }
}
