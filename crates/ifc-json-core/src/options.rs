// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Conversion settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConverterOptions {
    /// Build shapes and attach `geometry` to entity nodes
    pub geometry: bool,
    /// Attach property sets, quantities, object type and tag
    pub properties: bool,
    /// Attach geometry to hierarchy nodes as well as to the flat list
    pub hierarchy_geometry: bool,
    /// Weld identical vertices within a mesh instead of one per face corner
    pub shared_vertices: bool,
    /// Segments used to sample circular profiles
    pub circle_segments: usize,
    /// Build shapes on the rayon pool
    pub parallel: bool,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            geometry: true,
            properties: true,
            hierarchy_geometry: true,
            shared_vertices: false,
            circle_segments: 24,
            parallel: true,
        }
    }
}

impl ConverterOptions {
    pub fn with_geometry(mut self, geometry: bool) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_properties(mut self, properties: bool) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_hierarchy_geometry(mut self, hierarchy_geometry: bool) -> Self {
        self.hierarchy_geometry = hierarchy_geometry;
        self
    }

    pub fn with_shared_vertices(mut self, shared_vertices: bool) -> Self {
        self.shared_vertices = shared_vertices;
        self
    }

    pub fn with_circle_segments(mut self, segments: usize) -> Self {
        self.circle_segments = segments;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
