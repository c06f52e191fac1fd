// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length unit scale and unit labels

use ifc_json_model::{DecodedEntity, EntityResolver, EntityResolverExt, IfcType};

/// Length scale of the project (file units to meters), 1.0 when undeclared
///
/// Follows IfcProject.UnitsInContext (attribute 8) to the unit assignment
/// and picks its first length unit.
pub fn extract_unit_scale(resolver: &dyn EntityResolver) -> f64 {
    let Some(project) = resolver.entities_by_type(&IfcType::IfcProject).into_iter().next() else {
        return 1.0;
    };
    let Some(assignment) = resolver.follow(&project, 8) else {
        return 1.0;
    };

    assignment
        .get(0)
        .map(|units| resolver.resolve_ref_list(units))
        .unwrap_or_default()
        .iter()
        .find_map(|unit| length_unit_scale(unit, resolver))
        .unwrap_or(1.0)
}

fn length_unit_scale(unit: &DecodedEntity, resolver: &dyn EntityResolver) -> Option<f64> {
    if unit.get_enum(1)? != "LENGTHUNIT" {
        return None;
    }

    match unit.ifc_type {
        // IFCSIUNIT(*, UnitType, Prefix, Name)
        IfcType::IfcSIUnit => {
            if unit.get_enum(3)? != "METRE" {
                return None;
            }
            Some(unit.get_enum(2).map(prefix_scale).unwrap_or(1.0))
        }
        // IFCCONVERSIONBASEDUNIT(Dimensions, UnitType, Name, ConversionFactor)
        IfcType::IfcConversionBasedUnit => {
            let factor = resolver.follow(unit, 3)?;
            if factor.ifc_type != IfcType::IfcMeasureWithUnit {
                return None;
            }
            let value = factor.get_float(0)?;
            let base = resolver
                .follow(&factor, 1)
                .and_then(|base| length_unit_scale(&base, resolver))
                .unwrap_or(1.0);
            Some(value * base)
        }
        _ => None,
    }
}

fn prefix_scale(prefix: &str) -> f64 {
    match prefix {
        "EXA" => 1e18,
        "PETA" => 1e15,
        "TERA" => 1e12,
        "GIGA" => 1e9,
        "MEGA" => 1e6,
        "KILO" => 1e3,
        "HECTO" => 1e2,
        "DECA" => 1e1,
        "DECI" => 1e-1,
        "CENTI" => 1e-2,
        "MILLI" => 1e-3,
        "MICRO" => 1e-6,
        "NANO" => 1e-9,
        "PICO" => 1e-12,
        "FEMTO" => 1e-15,
        "ATTO" => 1e-18,
        _ => 1.0,
    }
}

/// Short label of a unit entity, e.g. `mm` or `m²`
pub fn unit_label(unit: &DecodedEntity) -> Option<String> {
    match unit.ifc_type {
        IfcType::IfcSIUnit => {
            let prefix = match unit.get_enum(2).unwrap_or("") {
                "MILLI" => "m",
                "CENTI" => "c",
                "DECI" => "d",
                "KILO" => "k",
                _ => "",
            };
            let name = unit.get_enum(3)?;
            let base = match name {
                "METRE" => "m",
                "SQUARE_METRE" => "m²",
                "CUBIC_METRE" => "m³",
                "GRAM" => "g",
                "SECOND" => "s",
                "KELVIN" => "K",
                "DEGREE_CELSIUS" => "°C",
                "AMPERE" => "A",
                "WATT" => "W",
                "PASCAL" => "Pa",
                "NEWTON" => "N",
                _ => name,
            };
            Some(format!("{}{}", prefix, base))
        }
        IfcType::IfcConversionBasedUnit => unit.get_string(2).map(str::to_string),
        _ => None,
    }
}
