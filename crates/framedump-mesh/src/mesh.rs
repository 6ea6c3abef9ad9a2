//! Renderer-agnostic mesh representation plus the dump metadata needed to
//! re-encode it byte-compatibly.

use framedump_buffers::{InputLayout, Topology};
use std::collections::BTreeMap;

/// Scene axis convention, carried as metadata for the host application.
///
/// The reconstruction itself never bakes an axis transform into positions;
/// whoever displays the mesh owns the object transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisConvention {
    pub forward: String,
    pub up: String,
}

impl Default for AxisConvention {
    fn default() -> Self {
        Self {
            forward: String::from("-Z"),
            up: String::from("Y"),
        }
    }
}

/// One named UV layer holding one or two components per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct UvLayer {
    pub data: Vec<Vec<f32>>,
    /// V was flipped (1 - v) on import and must be flipped back on export.
    pub flipped_v: bool,
}

/// Weighted bone-group memberships per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexGroups {
    /// Group names, initially the stringified bone indices.
    pub names: Vec<String>,
    /// Per vertex: (group index, weight) pairs, zero weights omitted.
    pub weights: Vec<Vec<(usize, f32)>>,
}

impl VertexGroups {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Memberships of one vertex sorted by descending weight, the order
    /// blend windows are filled in on export.
    pub fn sorted_weights(&self, vertex: usize) -> Vec<(usize, f32)> {
        let mut w = self.weights.get(vertex).cloned().unwrap_or_default();
        w.sort_by(|a, b| b.1.total_cmp(&a.1));
        w
    }
}

/// A reconstructed mesh, independent of any renderer or DCC tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub faces: Vec<[u32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    /// UV layers keyed `TEXCOORD<i>.<components>` (`TEXCOORD.xy`,
    /// `TEXCOORD1.zw`, ...).
    pub uv_layers: BTreeMap<String, UvLayer>,
    /// Color layers keyed by semantic, all channels kept together.
    pub color_layers: BTreeMap<String, Vec<Vec<f32>>>,
    pub groups: VertexGroups,
    /// Scalar float layers (`POSITION.w`, `NORMAL.w`, unknown float
    /// semantics split per component).
    pub float_layers: BTreeMap<String, Vec<f32>>,
    /// Scalar integer layers for unknown integer semantics. Unsigned values
    /// past `i32::MAX` are stored bit-reinterpreted.
    pub int_layers: BTreeMap<String, Vec<i32>>,
    /// Per-vertex tangent with bitangent sign, when the dump carried one.
    pub tangents: Option<Vec<([f32; 3], f32)>>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Everything the exporter needs to reproduce the original byte layout.
#[derive(Debug, Clone)]
pub struct DumpMetadata {
    pub layout: InputLayout,
    pub topology: Topology,
    /// Stride per populated slot.
    pub strides: BTreeMap<u32, u32>,
    pub first_vertex: u32,
    pub first_index: u32,
    /// Index format string, absent when the draw call was not indexed.
    pub index_format: Option<String>,
    pub flip_winding: bool,
    pub flip_normal: bool,
    pub flip_mesh: bool,
    pub axis: AxisConvention,
}
