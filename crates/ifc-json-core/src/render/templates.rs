// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in Jsonnet templates

use ifc_json_model::IfcType;

const PRELUDE: &str = r#"local ifcData = std.parseJson(std.extVar('ifcData'));
local field(obj, key, default) = if std.objectHas(obj, key) then obj[key] else default;
local entities = field(ifcData, 'entities', []);
"#;

const DEFAULT_BODY: &str = r#"
local types = std.set([e.type for e in entities]);

{
  metadata: {
    elements_count: std.length(entities),
    project_info: field(ifcData, 'project', null),
    schema: field(field(ifcData, 'metadata', {}), 'schemaVersion', null),
  },
  elements: [
    {
      id: e.id,
      type: e.type,
      name: field(e, 'name', null),
      description: field(e, 'description', null),
      properties: field(e, 'properties', {}),
      geometry: field(e, 'geometry', null),
    }
    for e in entities
  ],
  summary: {
    by_type: {
      [t]: std.length([e for e in entities if e.type == t])
      for t in types
    },
  },
}
"#;

const ELEMENT_BODY: &str = r#"
local matches = [e for e in entities if e.type == elementType];
local total(meshes, key) = std.foldl(function(acc, m) acc + std.length(m[key]), meshes, 0);

{
  element_type: elementType,
  count: std.length(matches),
  elements: [
    {
      id: e.id,
      name: field(e, 'name', null),
      description: field(e, 'description', null),
      properties: field(e, 'properties', {}),
      geometry: if std.objectHas(e, 'geometry') then {
        meshes_count: std.length(e.geometry.meshes),
        vertices_count: total(e.geometry.meshes, 'vertices'),
        faces_count: total(e.geometry.meshes, 'faces'),
      } else null,
    }
    for e in matches
  ],
  metadata: {
    query_type: 'element_type_filter',
    filter: elementType,
  },
}
"#;

/// Whole-model summary: project, every element, counts by type
pub fn default_template() -> String {
    format!("{}{}", PRELUDE, DEFAULT_BODY)
}

/// Elements of one type with mesh statistics
///
/// `element_type` accepts the same spellings as type queries and is
/// normalized to the document label; the value is embedded as a string
/// literal, never as code.
pub fn element_type_template(element_type: &str) -> String {
    let label = match IfcType::from_label(element_type) {
        IfcType::Unknown(_) => element_type.trim().to_string(),
        known => known.label().to_string(),
    };
    let literal = serde_json::Value::String(label).to_string();
    format!(
        "{}local elementType = {};\n{}",
        PRELUDE, literal, ELEMENT_BODY
    )
}
