// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property and quantity access for IFC entities

use crate::EntityId;
use serde::{Deserialize, Serialize};

/// Nominal value of a property
///
/// Serializes untagged so documents carry plain JSON scalars.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    List(Vec<PropertyValue>),
    Null,
}

/// A single property value with optional unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Property value
    pub value: PropertyValue,
    /// Unit of measurement (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Property {
    /// Create a new property
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
            unit: None,
        }
    }
}

/// A property set containing multiple properties
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    /// Property set name (e.g., "Pset_WallCommon")
    pub name: String,
    /// Properties in this set, file order
    pub properties: Vec<Property>,
}

impl PropertySet {
    /// Create a new property set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Add a property to this set
    pub fn add(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Get a property by name
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Quantity types supported in IFC
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantityType {
    Length,
    Area,
    Volume,
    Count,
    Weight,
    Time,
}

impl QuantityType {
    /// Default SI unit for this quantity type
    pub fn default_unit(&self) -> &'static str {
        match self {
            QuantityType::Length => "m",
            QuantityType::Area => "m²",
            QuantityType::Volume => "m³",
            QuantityType::Count => "",
            QuantityType::Weight => "kg",
            QuantityType::Time => "s",
        }
    }
}

/// A quantity value with type and unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub quantity_type: QuantityType,
}

impl Quantity {
    /// Create a new quantity with the default unit of its type
    pub fn new(name: impl Into<String>, value: f64, quantity_type: QuantityType) -> Self {
        Self {
            name: name.into(),
            value,
            unit: quantity_type.default_unit().to_string(),
            quantity_type,
        }
    }
}

/// Named quantity set (IfcElementQuantity)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantitySet {
    pub name: String,
    pub quantities: Vec<Quantity>,
}

/// Property and quantity reader trait
///
/// Property sets come from IfcPropertySet entities linked via
/// IfcRelDefinesByProperties. Quantities come from IfcElementQuantity
/// entities linked the same way.
pub trait PropertyReader: Send + Sync {
    /// All property sets associated with an entity, relation order
    fn property_sets(&self, id: EntityId) -> Vec<PropertySet>;

    /// All quantity sets associated with an entity, relation order
    fn quantity_sets(&self, id: EntityId) -> Vec<QuantitySet>;

    /// Flattened quantities of every quantity set
    fn quantities(&self, id: EntityId) -> Vec<Quantity> {
        self.quantity_sets(id)
            .into_iter()
            .flat_map(|set| set.quantities)
            .collect()
    }

    /// First property with the given name across all sets
    fn get_property(&self, id: EntityId, name: &str) -> Option<Property> {
        self.property_sets(id)
            .into_iter()
            .flat_map(|pset| pset.properties)
            .find(|p| p.name == name)
    }

    /// Entity's ObjectType attribute
    fn object_type(&self, _id: EntityId) -> Option<String> {
        None
    }

    /// Entity's Tag attribute
    fn tag(&self, _id: EntityId) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_serializes_as_plain_json() {
        let values = vec![
            PropertyValue::Boolean(true),
            PropertyValue::Integer(3),
            PropertyValue::Number(0.25),
            PropertyValue::Text("EI 60".into()),
            PropertyValue::Null,
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[true,3,0.25,"EI 60",null]"#);
    }

    #[test]
    fn test_property_lookup() {
        let mut pset = PropertySet::new("Pset_WallCommon");
        pset.add(Property::new("IsExternal", PropertyValue::Boolean(true)));
        assert_eq!(
            pset.get("IsExternal").map(|p| &p.value),
            Some(&PropertyValue::Boolean(true))
        );
        assert!(pset.get("LoadBearing").is_none());
    }
}
