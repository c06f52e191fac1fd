// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fast entity scanner using SIMD-accelerated byte searching
//!
//! Discovers entity instances and their byte spans without decoding
//! attributes, and reads the header records.

use crate::tokenizer::{decode_step_string, parse_record, Token};
use ifc_json_model::{EntityId, IfcType, ModelMetadata};
use memchr::{memchr, memmem};
use rustc_hash::FxHashMap;

/// Location and type of one entity instance
#[derive(Clone, Debug, PartialEq)]
pub struct IndexEntry {
    pub start: usize,
    pub end: usize,
    pub ifc_type: IfcType,
}

/// Entity index: ID -> span and type, plus per-type ID lists
#[derive(Debug, Default)]
pub struct EntityIndex {
    entries: FxHashMap<u32, IndexEntry>,
    by_type: FxHashMap<IfcType, Vec<EntityId>>,
    ids: Vec<EntityId>,
}

impl EntityIndex {
    pub fn get(&self, id: u32) -> Option<&IndexEntry> {
        self.entries.get(&id)
    }

    /// IDs of one type, ascending
    pub fn ids_of(&self, ifc_type: &IfcType) -> &[EntityId] {
        self.by_type.get(ifc_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All IDs, ascending
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fast entity scanner for IFC files
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    /// Create a scanner positioned after the `DATA;` marker
    pub fn new(content: &'a str) -> Self {
        let pos = memmem::find(content.as_bytes(), b"DATA;")
            .map(|p| p + 5)
            .unwrap_or(0);

        Self { content, pos }
    }

    /// Scan to the next entity instance
    ///
    /// Returns (id, type_name, start_byte, end_byte)
    pub fn next_entity(&mut self) -> Option<(u32, &'a str, usize, usize)> {
        let bytes = self.content.as_bytes();

        while self.pos < bytes.len() {
            let hash_pos = memchr(b'#', &bytes[self.pos..])?;
            self.pos += hash_pos;

            // Instance names start a statement; a '#' inside parameters is a reference
            let starts_statement = self.pos == 0
                || bytes[self.pos - 1].is_ascii_whitespace()
                || bytes[self.pos - 1] == b';';

            if !starts_statement {
                self.pos += 1;
                continue;
            }

            let start = self.pos;
            self.pos += 1;
            let id_start = self.pos;

            while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }

            if self.pos == id_start {
                continue;
            }

            let id: u32 = match self.content[id_start..self.pos].parse() {
                Ok(id) => id,
                Err(_) => continue,
            };

            self.skip_blanks();
            if self.pos >= bytes.len() || bytes[self.pos] != b'=' {
                continue;
            }
            self.pos += 1;
            self.skip_blanks();

            let type_start = self.pos;
            while self.pos < bytes.len()
                && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }

            if self.pos == type_start {
                continue;
            }

            let type_name = &self.content[type_start..self.pos];
            let end = statement_end(bytes, self.pos)?;
            self.pos = end;

            return Some((id, type_name, start, end));
        }

        None
    }

    fn skip_blanks(&mut self) {
        let bytes = self.content.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Build the entity index in a single pass
    pub fn build_index(content: &'a str) -> EntityIndex {
        let mut scanner = Self::new(content);
        let mut index = EntityIndex::default();

        while let Some((id, type_name, start, end)) = scanner.next_entity() {
            let ifc_type = IfcType::parse(type_name);
            index
                .by_type
                .entry(ifc_type.clone())
                .or_default()
                .push(EntityId(id));
            index.entries.insert(
                id,
                IndexEntry {
                    start,
                    end,
                    ifc_type,
                },
            );
        }

        // Files are usually written in ID order, but nothing requires it
        for ids in index.by_type.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }
        index.ids = index.entries.keys().map(|&id| EntityId(id)).collect();
        index.ids.sort_unstable();

        index
    }

    /// Count entities by STEP tag
    pub fn count_by_type(content: &'a str) -> FxHashMap<String, usize> {
        let mut scanner = Self::new(content);
        let mut counts: FxHashMap<String, usize> = FxHashMap::default();

        while let Some((_, type_name, _, _)) = scanner.next_entity() {
            *counts.entry(type_name.to_ascii_uppercase()).or_insert(0) += 1;
        }

        counts
    }
}

/// End of the statement starting before `from` (one past its `;`),
/// skipping semicolons inside string literals
fn statement_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    let mut in_string = false;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\'' => {
                if in_string && bytes.get(pos + 1) == Some(&b'\'') {
                    pos += 2;
                    continue;
                }
                in_string = !in_string;
            }
            b';' if !in_string => return Some(pos + 1),
            _ => {}
        }
        pos += 1;
    }

    None
}

/// Read FILE_NAME and FILE_SCHEMA from the header section
///
/// Missing or malformed records leave the corresponding fields empty.
pub fn parse_header(content: &str) -> ModelMetadata {
    let mut metadata = ModelMetadata::default();
    let bytes = content.as_bytes();

    let Some(header_start) = memmem::find(bytes, b"HEADER;").map(|p| p + 7) else {
        return metadata;
    };
    let header_end = memmem::find(&bytes[header_start..], b"ENDSEC;")
        .map(|p| header_start + p)
        .unwrap_or(bytes.len());

    let mut pos = header_start;
    while pos < header_end {
        let Some(end) = statement_end(&bytes[..header_end], pos) else {
            break;
        };
        if let Ok((keyword, params)) = parse_record(&content[pos..end]) {
            match keyword.to_ascii_uppercase().as_str() {
                "FILE_NAME" => apply_file_name(&mut metadata, &params),
                "FILE_SCHEMA" => {
                    if let Some(schema) = params.first().and_then(first_text) {
                        metadata.schema_version = schema;
                    }
                }
                _ => {}
            }
        }
        pos = end;
    }

    metadata
}

/// FILE_NAME(name, time_stamp, (author), (organization),
///           preprocessor_version, originating_system, authorization)
fn apply_file_name(metadata: &mut ModelMetadata, params: &[Token<'_>]) {
    let field = |i: usize| params.get(i).and_then(first_text);
    metadata.file_name = field(0);
    metadata.timestamp = field(1);
    metadata.author = field(2);
    metadata.organization = field(3);
    metadata.preprocessor_version = field(4);
    metadata.originating_system = field(5);
}

/// First non-empty string of a token (itself, or the first list item)
fn first_text(token: &Token<'_>) -> Option<String> {
    let text = match token {
        Token::String(s) => Some(decode_step_string(s).into_owned()),
        Token::List(items) => items.iter().find_map(first_text),
        _ => None,
    }?;
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('test.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','App','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
  #3 = IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCWALL('guid;with;semicolons',$,'Wall 1',$,$,#5,#6,$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_scanner_finds_entities() {
        let mut scanner = EntityScanner::new(TEST_IFC);
        let mut entities = Vec::new();

        while let Some((id, type_name, _, _)) = scanner.next_entity() {
            entities.push((id, type_name.to_string()));
        }

        assert_eq!(entities.len(), 4);
        assert_eq!(entities[0], (1, "IFCPROJECT".to_string()));
        assert_eq!(entities[2], (3, "IFCSIUNIT".to_string()));
        assert_eq!(entities[3], (4, "IFCWALL".to_string()));
    }

    #[test]
    fn test_build_index() {
        let index = EntityScanner::build_index(TEST_IFC);
        assert_eq!(index.len(), 4);
        assert_eq!(index.ids_of(&IfcType::IfcWall), &[EntityId(4)]);
        assert_eq!(
            index.ids(),
            &[EntityId(1), EntityId(2), EntityId(3), EntityId(4)]
        );

        let wall = index.get(4).unwrap();
        assert!(TEST_IFC[wall.start..wall.end].ends_with("$);"));
    }

    #[test]
    fn test_count_by_type() {
        let counts = EntityScanner::count_by_type(TEST_IFC);
        assert_eq!(counts.get("IFCPROJECT"), Some(&1));
        assert_eq!(counts.get("IFCWALL"), Some(&1));
    }

    #[test]
    fn test_parse_header() {
        let info = parse_header(TEST_IFC);
        assert_eq!(info.schema_version, "IFC2X3");
        assert_eq!(info.file_name.as_deref(), Some("test.ifc"));
        assert_eq!(info.timestamp.as_deref(), Some("2024-01-01T00:00:00"));
        assert_eq!(info.author.as_deref(), Some("Author"));
        assert_eq!(info.organization.as_deref(), Some("Org"));
        assert_eq!(info.originating_system.as_deref(), Some("App"));
    }

    #[test]
    fn test_parse_header_missing() {
        let info = parse_header("DATA;\n#1=IFCWALL($);\nENDSEC;");
        assert_eq!(info, ModelMetadata::default());
    }
}
