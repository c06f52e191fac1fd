// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for IFC data representation
//!
//! Entity kinds are a closed enumeration generated from one table, so the
//! STEP tag, the IFC class name, the short label used in documents and the
//! kind classification can never drift apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type-safe entity identifier
///
/// Wraps the raw IFC entity ID (e.g., #123 becomes EntityId(123))
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Broad classification of an entity kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// IfcProject
    Project,
    /// Spatial structure elements (site, building, storey, space, facility)
    Spatial,
    /// Physical and virtual elements placed in the spatial structure
    Element,
    /// Type objects (IfcWallType, ...)
    TypeObject,
    /// Objectified relationships
    Relationship,
    /// Property sets, properties and quantities
    PropertyDefinition,
    /// Shape representations and representation items
    Representation,
    /// Profile definitions
    Profile,
    /// Placements, points, curves, units, actors, materials
    Resource,
    /// Anything the table does not know
    Other,
}

macro_rules! ifc_types {
    ($( $variant:ident = $step:literal => $kind:ident ),* $(,)?) => {
        /// IFC entity type enumeration
        ///
        /// Covers the entity kinds the converter and geometry kernel work with.
        /// Unknown types are captured with their original STEP tag.
        #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub enum IfcType {
            $( $variant, )*
            /// Entity kind not covered by the table (raw STEP tag)
            Unknown(String),
        }

        impl IfcType {
            /// Parse a STEP type tag (case-insensitive)
            pub fn parse(s: &str) -> Self {
                let upper = s.to_ascii_uppercase();
                match upper.as_str() {
                    $( $step => IfcType::$variant, )*
                    _ => IfcType::Unknown(s.to_string()),
                }
            }

            /// STEP tag as written in files, e.g. `IFCWALL`
            pub fn name(&self) -> &str {
                match self {
                    $( IfcType::$variant => $step, )*
                    IfcType::Unknown(s) => s,
                }
            }

            /// IFC class name, e.g. `IfcWall`
            pub fn class_name(&self) -> &str {
                match self {
                    $( IfcType::$variant => stringify!($variant), )*
                    IfcType::Unknown(s) => s,
                }
            }

            /// Classification of this entity kind
            pub fn kind(&self) -> TypeKind {
                match self {
                    $( IfcType::$variant => TypeKind::$kind, )*
                    IfcType::Unknown(_) => TypeKind::Other,
                }
            }
        }
    };
}

ifc_types! {
    // Project and spatial structure
    IfcProject = "IFCPROJECT" => Project,
    IfcSite = "IFCSITE" => Spatial,
    IfcBuilding = "IFCBUILDING" => Spatial,
    IfcBuildingStorey = "IFCBUILDINGSTOREY" => Spatial,
    IfcSpace = "IFCSPACE" => Spatial,
    IfcFacility = "IFCFACILITY" => Spatial,
    IfcFacilityPart = "IFCFACILITYPART" => Spatial,
    IfcBridge = "IFCBRIDGE" => Spatial,
    IfcRoad = "IFCROAD" => Spatial,
    IfcRailway = "IFCRAILWAY" => Spatial,
    IfcSpatialZone = "IFCSPATIALZONE" => Spatial,
    IfcExternalSpatialElement = "IFCEXTERNALSPATIALELEMENT" => Spatial,

    // Building elements
    IfcWall = "IFCWALL" => Element,
    IfcWallStandardCase = "IFCWALLSTANDARDCASE" => Element,
    IfcCurtainWall = "IFCCURTAINWALL" => Element,
    IfcSlab = "IFCSLAB" => Element,
    IfcRoof = "IFCROOF" => Element,
    IfcBeam = "IFCBEAM" => Element,
    IfcColumn = "IFCCOLUMN" => Element,
    IfcDoor = "IFCDOOR" => Element,
    IfcWindow = "IFCWINDOW" => Element,
    IfcStair = "IFCSTAIR" => Element,
    IfcStairFlight = "IFCSTAIRFLIGHT" => Element,
    IfcRamp = "IFCRAMP" => Element,
    IfcRampFlight = "IFCRAMPFLIGHT" => Element,
    IfcRailing = "IFCRAILING" => Element,
    IfcCovering = "IFCCOVERING" => Element,
    IfcPlate = "IFCPLATE" => Element,
    IfcMember = "IFCMEMBER" => Element,
    IfcFooting = "IFCFOOTING" => Element,
    IfcPile = "IFCPILE" => Element,
    IfcChimney = "IFCCHIMNEY" => Element,
    IfcShadingDevice = "IFCSHADINGDEVICE" => Element,
    IfcBuildingElementProxy = "IFCBUILDINGELEMENTPROXY" => Element,
    IfcElementAssembly = "IFCELEMENTASSEMBLY" => Element,

    // Distribution elements (MEP)
    IfcDistributionElement = "IFCDISTRIBUTIONELEMENT" => Element,
    IfcDistributionFlowElement = "IFCDISTRIBUTIONFLOWELEMENT" => Element,
    IfcFlowTerminal = "IFCFLOWTERMINAL" => Element,
    IfcFlowSegment = "IFCFLOWSEGMENT" => Element,
    IfcFlowFitting = "IFCFLOWFITTING" => Element,
    IfcFlowController = "IFCFLOWCONTROLLER" => Element,
    IfcFlowMovingDevice = "IFCFLOWMOVINGDEVICE" => Element,
    IfcFlowStorageDevice = "IFCFLOWSTORAGEDEVICE" => Element,
    IfcFlowTreatmentDevice = "IFCFLOWTREATMENTDEVICE" => Element,
    IfcEnergyConversionDevice = "IFCENERGYCONVERSIONDEVICE" => Element,
    IfcDistributionControlElement = "IFCDISTRIBUTIONCONTROLELEMENT" => Element,

    // Furnishing, openings and the rest
    IfcFurnishingElement = "IFCFURNISHINGELEMENT" => Element,
    IfcFurniture = "IFCFURNITURE" => Element,
    IfcSystemFurnitureElement = "IFCSYSTEMFURNITUREELEMENT" => Element,
    IfcOpeningElement = "IFCOPENINGELEMENT" => Element,
    IfcOpeningStandardCase = "IFCOPENINGSTANDARDCASE" => Element,
    IfcVoidingFeature = "IFCVOIDINGFEATURE" => Element,
    IfcProjectionElement = "IFCPROJECTIONELEMENT" => Element,
    IfcReinforcingBar = "IFCREINFORCINGBAR" => Element,
    IfcDiscreteAccessory = "IFCDISCRETEACCESSORY" => Element,
    IfcMechanicalFastener = "IFCMECHANICALFASTENER" => Element,
    IfcTransportElement = "IFCTRANSPORTELEMENT" => Element,
    IfcVirtualElement = "IFCVIRTUALELEMENT" => Element,
    IfcAnnotation = "IFCANNOTATION" => Element,
    IfcGrid = "IFCGRID" => Element,

    // Type objects
    IfcWallType = "IFCWALLTYPE" => TypeObject,
    IfcSlabType = "IFCSLABTYPE" => TypeObject,
    IfcBeamType = "IFCBEAMTYPE" => TypeObject,
    IfcColumnType = "IFCCOLUMNTYPE" => TypeObject,
    IfcDoorType = "IFCDOORTYPE" => TypeObject,
    IfcWindowType = "IFCWINDOWTYPE" => TypeObject,
    IfcMemberType = "IFCMEMBERTYPE" => TypeObject,
    IfcPlateType = "IFCPLATETYPE" => TypeObject,
    IfcCoveringType = "IFCCOVERINGTYPE" => TypeObject,
    IfcFurnitureType = "IFCFURNITURETYPE" => TypeObject,
    IfcBuildingElementProxyType = "IFCBUILDINGELEMENTPROXYTYPE" => TypeObject,

    // Relationships
    IfcRelAggregates = "IFCRELAGGREGATES" => Relationship,
    IfcRelContainedInSpatialStructure = "IFCRELCONTAINEDINSPATIALSTRUCTURE" => Relationship,
    IfcRelDefinesByProperties = "IFCRELDEFINESBYPROPERTIES" => Relationship,
    IfcRelDefinesByType = "IFCRELDEFINESBYTYPE" => Relationship,
    IfcRelAssociatesMaterial = "IFCRELASSOCIATESMATERIAL" => Relationship,
    IfcRelVoidsElement = "IFCRELVOIDSELEMENT" => Relationship,
    IfcRelFillsElement = "IFCRELFILLSELEMENT" => Relationship,
    IfcRelNests = "IFCRELNESTS" => Relationship,
    IfcRelSpaceBoundary = "IFCRELSPACEBOUNDARY" => Relationship,
    IfcRelConnectsPathElements = "IFCRELCONNECTSPATHELEMENTS" => Relationship,

    // Properties and quantities
    IfcPropertySet = "IFCPROPERTYSET" => PropertyDefinition,
    IfcElementQuantity = "IFCELEMENTQUANTITY" => PropertyDefinition,
    IfcPropertySingleValue = "IFCPROPERTYSINGLEVALUE" => PropertyDefinition,
    IfcPropertyEnumeratedValue = "IFCPROPERTYENUMERATEDVALUE" => PropertyDefinition,
    IfcPropertyBoundedValue = "IFCPROPERTYBOUNDEDVALUE" => PropertyDefinition,
    IfcPropertyListValue = "IFCPROPERTYLISTVALUE" => PropertyDefinition,
    IfcQuantityLength = "IFCQUANTITYLENGTH" => PropertyDefinition,
    IfcQuantityArea = "IFCQUANTITYAREA" => PropertyDefinition,
    IfcQuantityVolume = "IFCQUANTITYVOLUME" => PropertyDefinition,
    IfcQuantityCount = "IFCQUANTITYCOUNT" => PropertyDefinition,
    IfcQuantityWeight = "IFCQUANTITYWEIGHT" => PropertyDefinition,
    IfcQuantityTime = "IFCQUANTITYTIME" => PropertyDefinition,

    // Representations and representation items
    IfcProductDefinitionShape = "IFCPRODUCTDEFINITIONSHAPE" => Representation,
    IfcShapeRepresentation = "IFCSHAPEREPRESENTATION" => Representation,
    IfcMappedItem = "IFCMAPPEDITEM" => Representation,
    IfcRepresentationMap = "IFCREPRESENTATIONMAP" => Representation,
    IfcExtrudedAreaSolid = "IFCEXTRUDEDAREASOLID" => Representation,
    IfcRevolvedAreaSolid = "IFCREVOLVEDAREASOLID" => Representation,
    IfcSweptDiskSolid = "IFCSWEPTDISKSOLID" => Representation,
    IfcFacetedBrep = "IFCFACETEDBREP" => Representation,
    IfcFacetedBrepWithVoids = "IFCFACETEDBREPWITHVOIDS" => Representation,
    IfcAdvancedBrep = "IFCADVANCEDBREP" => Representation,
    IfcShellBasedSurfaceModel = "IFCSHELLBASEDSURFACEMODEL" => Representation,
    IfcFaceBasedSurfaceModel = "IFCFACEBASEDSURFACEMODEL" => Representation,
    IfcClosedShell = "IFCCLOSEDSHELL" => Representation,
    IfcOpenShell = "IFCOPENSHELL" => Representation,
    IfcConnectedFaceSet = "IFCCONNECTEDFACESET" => Representation,
    IfcFace = "IFCFACE" => Representation,
    IfcFaceOuterBound = "IFCFACEOUTERBOUND" => Representation,
    IfcFaceBound = "IFCFACEBOUND" => Representation,
    IfcPolyLoop = "IFCPOLYLOOP" => Representation,
    IfcTriangulatedFaceSet = "IFCTRIANGULATEDFACESET" => Representation,
    IfcPolygonalFaceSet = "IFCPOLYGONALFACESET" => Representation,
    IfcIndexedPolygonalFace = "IFCINDEXEDPOLYGONALFACE" => Representation,
    IfcIndexedPolygonalFaceWithVoids = "IFCINDEXEDPOLYGONALFACEWITHVOIDS" => Representation,
    IfcCartesianPointList3D = "IFCCARTESIANPOINTLIST3D" => Representation,
    IfcBooleanResult = "IFCBOOLEANRESULT" => Representation,
    IfcBooleanClippingResult = "IFCBOOLEANCLIPPINGRESULT" => Representation,
    IfcHalfSpaceSolid = "IFCHALFSPACESOLID" => Representation,
    IfcPolygonalBoundedHalfSpace = "IFCPOLYGONALBOUNDEDHALFSPACE" => Representation,
    IfcBlock = "IFCBLOCK" => Representation,
    IfcStyledItem = "IFCSTYLEDITEM" => Representation,

    // Profiles
    IfcRectangleProfileDef = "IFCRECTANGLEPROFILEDEF" => Profile,
    IfcRectangleHollowProfileDef = "IFCRECTANGLEHOLLOWPROFILEDEF" => Profile,
    IfcCircleProfileDef = "IFCCIRCLEPROFILEDEF" => Profile,
    IfcCircleHollowProfileDef = "IFCCIRCLEHOLLOWPROFILEDEF" => Profile,
    IfcArbitraryClosedProfileDef = "IFCARBITRARYCLOSEDPROFILEDEF" => Profile,
    IfcArbitraryProfileDefWithVoids = "IFCARBITRARYPROFILEDEFWITHVOIDS" => Profile,
    IfcIShapeProfileDef = "IFCISHAPEPROFILEDEF" => Profile,
    IfcLShapeProfileDef = "IFCLSHAPEPROFILEDEF" => Profile,

    // Geometry resources
    IfcCartesianPoint = "IFCCARTESIANPOINT" => Resource,
    IfcDirection = "IFCDIRECTION" => Resource,
    IfcPolyline = "IFCPOLYLINE" => Resource,
    IfcIndexedPolyCurve = "IFCINDEXEDPOLYCURVE" => Resource,
    IfcCartesianPointList2D = "IFCCARTESIANPOINTLIST2D" => Resource,
    IfcCompositeCurve = "IFCCOMPOSITECURVE" => Resource,
    IfcCompositeCurveSegment = "IFCCOMPOSITECURVESEGMENT" => Resource,
    IfcTrimmedCurve = "IFCTRIMMEDCURVE" => Resource,
    IfcCircle = "IFCCIRCLE" => Resource,
    IfcLine = "IFCLINE" => Resource,
    IfcAxis2Placement2D = "IFCAXIS2PLACEMENT2D" => Resource,
    IfcAxis2Placement3D = "IFCAXIS2PLACEMENT3D" => Resource,
    IfcLocalPlacement = "IFCLOCALPLACEMENT" => Resource,
    IfcGridPlacement = "IFCGRIDPLACEMENT" => Resource,
    IfcCartesianTransformationOperator3D = "IFCCARTESIANTRANSFORMATIONOPERATOR3D" => Resource,
    IfcCartesianTransformationOperator3DnonUniform = "IFCCARTESIANTRANSFORMATIONOPERATOR3DNONUNIFORM" => Resource,
    IfcGeometricRepresentationContext = "IFCGEOMETRICREPRESENTATIONCONTEXT" => Resource,
    IfcGeometricRepresentationSubContext = "IFCGEOMETRICREPRESENTATIONSUBCONTEXT" => Resource,

    // Units, actors and materials
    IfcUnitAssignment = "IFCUNITASSIGNMENT" => Resource,
    IfcSIUnit = "IFCSIUNIT" => Resource,
    IfcConversionBasedUnit = "IFCCONVERSIONBASEDUNIT" => Resource,
    IfcMeasureWithUnit = "IFCMEASUREWITHUNIT" => Resource,
    IfcDimensionalExponents = "IFCDIMENSIONALEXPONENTS" => Resource,
    IfcOwnerHistory = "IFCOWNERHISTORY" => Resource,
    IfcPerson = "IFCPERSON" => Resource,
    IfcOrganization = "IFCORGANIZATION" => Resource,
    IfcPersonAndOrganization = "IFCPERSONANDORGANIZATION" => Resource,
    IfcApplication = "IFCAPPLICATION" => Resource,
    IfcMaterial = "IFCMATERIAL" => Resource,
    IfcMaterialList = "IFCMATERIALLIST" => Resource,
    IfcMaterialLayer = "IFCMATERIALLAYER" => Resource,
    IfcMaterialLayerSet = "IFCMATERIALLAYERSET" => Resource,
    IfcMaterialLayerSetUsage = "IFCMATERIALLAYERSETUSAGE" => Resource,
}

impl IfcType {
    /// Short label used in converted documents, e.g. `Wall` for `IfcWall`
    ///
    /// Unknown types keep their raw STEP tag.
    pub fn label(&self) -> &str {
        match self {
            IfcType::Unknown(s) => s,
            _ => {
                let class = self.class_name();
                class.strip_prefix("Ifc").unwrap_or(class)
            }
        }
    }

    /// Resolve a user-supplied type filter
    ///
    /// Accepts the label (`Wall`), the class name (`IfcWall`) or the STEP
    /// tag (`IFCWALL`), case-insensitively.
    pub fn from_label(s: &str) -> Self {
        let trimmed = s.trim();
        let bare = match trimmed.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("ifc") => &trimmed[3..],
            _ => trimmed,
        };
        match IfcType::parse(&format!("IFC{}", bare)) {
            IfcType::Unknown(_) => IfcType::parse(trimmed),
            known => known,
        }
    }

    /// Check if this type is an object definition (project, spatial
    /// structure, element or type object)
    pub fn is_object(&self) -> bool {
        matches!(
            self.kind(),
            TypeKind::Project | TypeKind::Spatial | TypeKind::Element | TypeKind::TypeObject
        )
    }

    /// Check if this type is a spatial structure element (project included)
    pub fn is_spatial(&self) -> bool {
        matches!(self.kind(), TypeKind::Project | TypeKind::Spatial)
    }

    /// Check if this type is a product that may carry a shape representation
    pub fn is_product(&self) -> bool {
        matches!(self.kind(), TypeKind::Spatial | TypeKind::Element)
    }
}

impl FromStr for IfcType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(IfcType::parse(s))
    }
}

impl Default for IfcType {
    fn default() -> Self {
        IfcType::Unknown(String::new())
    }
}

impl fmt::Display for IfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Decoded attribute value
///
/// Represents any value that can appear in an IFC entity's attribute list.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AttributeValue {
    /// Null value ($)
    #[default]
    Null,
    /// Derived value (*)
    Derived,
    /// Entity reference (#123)
    EntityRef(EntityId),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value, STEP escapes already resolved
    String(String),
    /// Enumeration value (.VALUE.)
    Enum(String),
    /// List of values
    List(Vec<AttributeValue>),
    /// Typed value like IFCLABEL('text')
    TypedValue(String, Vec<AttributeValue>),
}

impl AttributeValue {
    /// Try to get as entity reference
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::TypedValue(_, args) => args.first().and_then(|a| a.as_string()),
            _ => None,
        }
    }

    /// Try to get as float (integers widen)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::TypedValue(_, args) => args.first().and_then(|a| a.as_float()),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            AttributeValue::TypedValue(_, args) => args.first().and_then(|a| a.as_integer()),
            _ => None,
        }
    }

    /// Try to get as boolean (.T. / .F.)
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Enum(s) => match s.to_ascii_uppercase().as_str() {
                "TRUE" | "T" => Some(true),
                "FALSE" | "F" => Some(false),
                _ => None,
            },
            AttributeValue::TypedValue(_, args) => args.first().and_then(|a| a.as_bool()),
            _ => None,
        }
    }

    /// Try to get as enum string
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as list
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(list) => Some(list),
            _ => None,
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// Decoded IFC entity
#[derive(Clone, Debug)]
pub struct DecodedEntity {
    /// Entity ID
    pub id: EntityId,
    /// Entity type
    pub ifc_type: IfcType,
    /// Attribute values in order
    pub attributes: Vec<AttributeValue>,
}

impl DecodedEntity {
    /// Get attribute at index
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    /// Get entity reference at index
    pub fn get_ref(&self, index: usize) -> Option<EntityId> {
        self.get(index).and_then(|v| v.as_entity_ref())
    }

    /// Get string at index
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_string())
    }

    /// Get float at index
    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(|v| v.as_float())
    }

    /// Get list at index
    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.get(index).and_then(|v| v.as_list())
    }

    /// Get boolean at index
    pub fn get_bool(&self, index: usize) -> Option<bool> {
        self.get(index).and_then(|v| v.as_bool())
    }

    /// Get enum string at index
    pub fn get_enum(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_enum())
    }

    /// Get list of entity references at index
    pub fn get_refs(&self, index: usize) -> Vec<EntityId> {
        self.get_list(index)
            .map(|list| list.iter().filter_map(|v| v.as_entity_ref()).collect())
            .unwrap_or_default()
    }

    /// GlobalId of a rooted entity (attribute 0)
    pub fn global_id(&self) -> Option<&str> {
        self.get_string(0)
    }

    /// Name of a rooted entity (attribute 2)
    pub fn name(&self) -> Option<&str> {
        self.get_string(2)
    }

    /// Description of a rooted entity (attribute 3)
    pub fn description(&self) -> Option<&str> {
        self.get_string(3)
    }
}

/// Model metadata extracted from the STEP header
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    /// IFC schema version (e.g., "IFC2X3", "IFC4", "IFC4X3")
    pub schema_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preprocessor_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub originating_system: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown() {
        assert_eq!(IfcType::parse("IFCWALL"), IfcType::IfcWall);
        assert_eq!(IfcType::parse("IfcWall"), IfcType::IfcWall);
        assert_eq!(
            IfcType::parse("IFCSOMETHINGNEW"),
            IfcType::Unknown("IFCSOMETHINGNEW".to_string())
        );
    }

    #[test]
    fn test_names_and_labels() {
        let wall = IfcType::IfcBuildingStorey;
        assert_eq!(wall.name(), "IFCBUILDINGSTOREY");
        assert_eq!(wall.class_name(), "IfcBuildingStorey");
        assert_eq!(wall.label(), "BuildingStorey");

        let unknown = IfcType::Unknown("IFCFOO".to_string());
        assert_eq!(unknown.label(), "IFCFOO");
        assert_eq!(unknown.kind(), TypeKind::Other);
    }

    #[test]
    fn test_from_label_accepts_all_spellings() {
        for spelling in ["Wall", "wall", "IfcWall", "IFCWALL", " Wall "] {
            assert_eq!(IfcType::from_label(spelling), IfcType::IfcWall, "{spelling}");
        }
        assert!(matches!(IfcType::from_label("Nope"), IfcType::Unknown(_)));
    }

    #[test]
    fn test_kind_classification() {
        assert!(IfcType::IfcProject.is_object());
        assert!(IfcType::IfcWallType.is_object());
        assert!(!IfcType::IfcRelAggregates.is_object());
        assert!(!IfcType::IfcPropertySet.is_object());
        assert!(IfcType::IfcBuildingStorey.is_spatial());
        assert!(IfcType::IfcSlab.is_product());
        assert!(!IfcType::IfcProject.is_product());
    }

    #[test]
    fn test_attribute_accessors() {
        let entity = DecodedEntity {
            id: EntityId(7),
            ifc_type: IfcType::IfcWall,
            attributes: vec![
                AttributeValue::String("2O2Fr$t4X7Zf8NOew3FLOH".into()),
                AttributeValue::Null,
                AttributeValue::TypedValue(
                    "IFCLABEL".into(),
                    vec![AttributeValue::String("Wall A".into())],
                ),
                AttributeValue::Null,
                AttributeValue::List(vec![
                    AttributeValue::EntityRef(EntityId(1)),
                    AttributeValue::Integer(3),
                    AttributeValue::EntityRef(EntityId(2)),
                ]),
            ],
        };

        assert_eq!(entity.global_id(), Some("2O2Fr$t4X7Zf8NOew3FLOH"));
        assert_eq!(entity.name(), Some("Wall A"));
        assert_eq!(entity.description(), None);
        assert_eq!(entity.get_refs(4), vec![EntityId(1), EntityId(2)]);
        assert!(entity.get_refs(9).is_empty());
    }
}
