// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PropertyReader trait implementation

use crate::units::unit_label;
use ifc_json_model::{
    AttributeValue, DecodedEntity, EntityId, EntityResolver, IfcType, Property, PropertyReader,
    PropertySet, PropertyValue, Quantity, QuantitySet, QuantityType,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Property reader backed by an IfcRelDefinesByProperties index
pub struct PropertyReaderImpl {
    resolver: Arc<dyn EntityResolver>,
    /// entity ID -> property set IDs
    pset_index: FxHashMap<u32, Vec<EntityId>>,
    /// entity ID -> element quantity IDs
    qset_index: FxHashMap<u32, Vec<EntityId>>,
}

impl PropertyReaderImpl {
    pub fn new(resolver: Arc<dyn EntityResolver>) -> Self {
        let mut pset_index: FxHashMap<u32, Vec<EntityId>> = FxHashMap::default();
        let mut qset_index: FxHashMap<u32, Vec<EntityId>> = FxHashMap::default();

        for rel in resolver.entities_by_type(&IfcType::IfcRelDefinesByProperties) {
            // RelatedObjects at index 4, RelatingPropertyDefinition at index 5
            let related = rel.get_refs(4);
            let Some(definition_id) = rel.get_ref(5) else {
                continue;
            };

            let index = match resolver.type_of(definition_id) {
                Some(IfcType::IfcPropertySet) => &mut pset_index,
                Some(IfcType::IfcElementQuantity) => &mut qset_index,
                _ => continue,
            };

            for object in related {
                index.entry(object.0).or_default().push(definition_id);
            }
        }

        Self {
            resolver,
            pset_index,
            qset_index,
        }
    }

    /// A reader that knows no relations
    pub fn empty(resolver: Arc<dyn EntityResolver>) -> Self {
        Self {
            resolver,
            pset_index: FxHashMap::default(),
            qset_index: FxHashMap::default(),
        }
    }

    fn read_property(&self, prop: &DecodedEntity) -> Option<Property> {
        let name = prop.get_string(0)?.to_string();

        let (value, unit_attr) = match prop.ifc_type {
            // IfcPropertySingleValue(Name, Description, NominalValue, Unit)
            IfcType::IfcPropertySingleValue => (to_value(prop.get(2)?), prop.get(3)),
            // IfcPropertyEnumeratedValue(Name, Description, EnumerationValues, ...)
            IfcType::IfcPropertyEnumeratedValue => (to_value(prop.get(2)?), None),
            // IfcPropertyListValue(Name, Description, ListValues, Unit)
            IfcType::IfcPropertyListValue => (to_value(prop.get(2)?), prop.get(3)),
            // IfcPropertyBoundedValue(Name, Description, Upper, Lower, Unit, ...)
            IfcType::IfcPropertyBoundedValue => {
                let upper = prop.get(2).map(to_value).unwrap_or(PropertyValue::Null);
                let lower = prop.get(3).map(to_value).unwrap_or(PropertyValue::Null);
                (PropertyValue::List(vec![lower, upper]), prop.get(4))
            }
            _ => return None,
        };

        let unit = unit_attr
            .and_then(|attr| self.resolver.resolve_ref(attr))
            .and_then(|unit| unit_label(&unit));

        Some(Property { name, value, unit })
    }

    fn read_quantity(&self, qty: &DecodedEntity) -> Option<Quantity> {
        // IfcQuantityXxx(Name, Description, Unit, Value, Formula)
        let name = qty.get_string(0)?;
        let quantity_type = match qty.ifc_type {
            IfcType::IfcQuantityLength => QuantityType::Length,
            IfcType::IfcQuantityArea => QuantityType::Area,
            IfcType::IfcQuantityVolume => QuantityType::Volume,
            IfcType::IfcQuantityCount => QuantityType::Count,
            IfcType::IfcQuantityWeight => QuantityType::Weight,
            IfcType::IfcQuantityTime => QuantityType::Time,
            _ => return None,
        };

        let mut quantity = Quantity::new(name, qty.get_float(3)?, quantity_type);
        if let Some(label) = qty
            .get(2)
            .and_then(|attr| self.resolver.resolve_ref(attr))
            .and_then(|unit| unit_label(&unit))
        {
            quantity.unit = label;
        }
        Some(quantity)
    }

    fn definitions(
        &self,
        index: &FxHashMap<u32, Vec<EntityId>>,
        id: EntityId,
    ) -> Vec<Arc<DecodedEntity>> {
        index
            .get(&id.0)
            .map(|ids| ids.iter().filter_map(|id| self.resolver.get(*id)).collect())
            .unwrap_or_default()
    }
}

/// Convert a nominal value attribute to a property value
fn to_value(attr: &AttributeValue) -> PropertyValue {
    match attr {
        AttributeValue::TypedValue(name, args) => match args.first() {
            Some(AttributeValue::Enum(e))
                if name.eq_ignore_ascii_case("IFCBOOLEAN")
                    || name.eq_ignore_ascii_case("IFCLOGICAL") =>
            {
                attr.as_bool()
                    .map(PropertyValue::Boolean)
                    .unwrap_or_else(|| PropertyValue::Text(e.clone()))
            }
            Some(inner) => to_value(inner),
            None => PropertyValue::Null,
        },
        AttributeValue::String(s) => PropertyValue::Text(s.clone()),
        AttributeValue::Integer(i) => PropertyValue::Integer(*i),
        AttributeValue::Float(f) => PropertyValue::Number(*f),
        AttributeValue::Enum(e) => PropertyValue::Text(e.clone()),
        AttributeValue::List(items) => PropertyValue::List(items.iter().map(to_value).collect()),
        AttributeValue::EntityRef(id) => PropertyValue::Text(id.to_string()),
        AttributeValue::Null | AttributeValue::Derived => PropertyValue::Null,
    }
}

impl PropertyReader for PropertyReaderImpl {
    fn property_sets(&self, id: EntityId) -> Vec<PropertySet> {
        self.definitions(&self.pset_index, id)
            .into_iter()
            .map(|pset| {
                // IfcPropertySet(GlobalId, OwnerHistory, Name, Description, HasProperties)
                let mut set = PropertySet::new(pset.get_string(2).unwrap_or("Unknown"));
                let props = pset
                    .get(4)
                    .map(|a| self.resolver.resolve_ref_list(a))
                    .unwrap_or_default();
                for prop in props {
                    if let Some(property) = self.read_property(&prop) {
                        set.add(property);
                    }
                }
                set
            })
            .filter(|set| !set.properties.is_empty())
            .collect()
    }

    fn quantity_sets(&self, id: EntityId) -> Vec<QuantitySet> {
        self.definitions(&self.qset_index, id)
            .into_iter()
            .map(|qset| {
                // IfcElementQuantity(GlobalId, OwnerHistory, Name, Description, MethodOfMeasurement, Quantities)
                let quantities = qset
                    .get(5)
                    .map(|a| self.resolver.resolve_ref_list(a))
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|q| self.read_quantity(q))
                    .collect();
                QuantitySet {
                    name: qset.get_string(2).unwrap_or("Unknown").to_string(),
                    quantities,
                }
            })
            .filter(|set| !set.quantities.is_empty())
            .collect()
    }

    fn object_type(&self, id: EntityId) -> Option<String> {
        let entity = self.resolver.get(id)?;
        if !entity.ifc_type.is_object() {
            return None;
        }
        // ObjectType at index 4 for every IfcObject
        entity.get_string(4).map(str::to_string)
    }

    fn tag(&self, id: EntityId) -> Option<String> {
        let entity = self.resolver.get(id)?;
        if entity.ifc_type.kind() != ifc_json_model::TypeKind::Element {
            return None;
        }
        // IfcElement(..., ObjectPlacement, Representation, Tag)
        entity.get_string(7).map(str::to_string)
    }
}
