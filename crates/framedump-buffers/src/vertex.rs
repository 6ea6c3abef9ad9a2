//! Vertex buffer model.
//!
//! A draw call binds one or more physical vertex buffer slots; each slot
//! holds a subset of the semantics described by the shared input layout.
//! [`SlotBuffer`] models one slot, [`VertexBufferGroup`] the merged
//! per-vertex records spanning all slots.

use crate::codec::AttributeData;
use crate::error::{DumpError, Result};
use crate::layout::{InputLayout, Semantic, SlotSelector, Vertex};
use crate::text::LineReader;
use crate::topology::Topology;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Parses the debug-formatted float values frame-analysis dumps emit.
///
/// `1.#INF` and `-1.#INF` are signed infinities. `-1.#IND` is the
/// indeterminate NaN, which keeps its sign bit; every other `.#` suffix
/// (QNAN, SNAN) becomes a plain NaN.
pub fn ms_float(val: &str) -> Result<f32> {
    let (mantissa, suffix) = match val.split_once(".#") {
        Some((m, s)) => (m, Some(s)),
        None => (val, None),
    };
    let s: f32 = mantissa.parse().map_err(|_| DumpError::InvalidNumber {
        field: "vertex-data",
        value: val.to_string(),
    })?;
    Ok(match suffix {
        None => s,
        Some(x) if x.starts_with("INF") => s * f32::INFINITY,
        // Multiplying by the mantissa does not preserve a NaN's sign.
        Some(_) if s == -1.0 => -f32::NAN,
        Some(_) => f32::NAN,
    })
}

/// One physical vertex buffer slot.
///
/// Multiple slots may each carry a few semantics which together make up a
/// complete vertex buffer group.
#[derive(Debug, Clone)]
pub struct SlotBuffer {
    pub slot: u32,
    pub vertices: Vec<Vertex>,
    pub first: u32,
    pub vertex_count: u32,
    pub offset: u64,
    pub topology: Topology,
    pub stride: u32,
}

impl SlotBuffer {
    pub fn new(slot: u32) -> Self {
        Self {
            slot,
            vertices: Vec::new(),
            first: 0,
            vertex_count: 0,
            offset: 0,
            topology: Topology::TriangleList,
            stride: 0,
        }
    }

    /// Parses a `vbN.txt` dump (or a `.fmt` header, with `load_vertices`
    /// false). Element blocks feed the shared `layout`.
    pub fn from_text(
        slot: u32,
        text: &str,
        layout: &mut InputLayout,
        load_vertices: bool,
    ) -> Result<Self> {
        let mut buf = Self::new(slot);
        let split_stride = format!("vb{slot} stride:");
        let mut lines = LineReader::new(text);
        while let Some(line) = lines.next() {
            if let Some(v) = line.strip_prefix("byte offset:") {
                buf.offset = parse_num("byte offset", v)?;
            } else if let Some(v) = line.strip_prefix("first vertex:") {
                buf.first = parse_num("first vertex", v)?;
            } else if let Some(v) = line.strip_prefix("vertex count:") {
                buf.vertex_count = parse_num("vertex count", v)?;
            } else if let Some(v) = line.strip_prefix(&split_stride) {
                // Flat .fmt files written by a previous export declare each
                // slot's stride separately.
                buf.stride = parse_num("stride", v)?;
            } else if let Some(v) = line.strip_prefix("stride:") {
                buf.stride = parse_num("stride", v)?;
            } else if line.starts_with("element[") {
                layout.parse_element(&mut lines)?;
            } else if let Some(v) = line.strip_prefix("topology:") {
                buf.topology = v.trim().parse()?;
            } else if line.starts_with("vertex-data:") {
                if !load_vertices {
                    return Ok(buf);
                }
                buf.parse_vertex_data(&mut lines, layout)?;
            }
        }
        // A slot holding only per-instance elements legitimately has no
        // vertices; otherwise the record count must match the header.
        if !buf.vertices.is_empty() && buf.vertices.len() != buf.vertex_count as usize {
            return Err(DumpError::VertexCountMismatch {
                declared: buf.vertex_count as usize,
                parsed: buf.vertices.len(),
            });
        }
        Ok(buf)
    }

    fn parse_vertex_data(&mut self, lines: &mut LineReader<'_>, layout: &InputLayout) -> Result<()> {
        let mut vertex = Vertex::new();
        while let Some(line) = lines.next() {
            if line.starts_with("instance-data:") {
                break;
            }
            if let Some((semantic, data)) = split_vertex_line(line) {
                let semantic = Semantic::parse(semantic);
                let value = parse_vertex_element(layout, &semantic, data)?;
                vertex.insert(semantic, value);
            } else if line.is_empty() && !vertex.is_empty() {
                self.vertices.push(std::mem::take(&mut vertex));
            }
        }
        if !vertex.is_empty() {
            self.vertices.push(vertex);
        }
        Ok(())
    }

    /// Decodes raw vertex records from a `.buf` dump.
    ///
    /// The declared vertex count is deliberately disregarded unless
    /// `use_drawcall_range` is set: the text sidecar may describe a partial
    /// dump while the binary file holds the whole buffer.
    pub fn parse_binary(
        &mut self,
        bytes: &[u8],
        layout: &InputLayout,
        use_drawcall_range: bool,
    ) -> Result<()> {
        if self.stride == 0 {
            return Err(DumpError::MalformedLayout {
                expected: "non-zero stride",
                found: String::from("0"),
            });
        }
        let stride = self.stride as usize;
        let mut pos = self.offset as usize;
        if use_drawcall_range {
            pos += self.first as usize * stride;
        } else {
            self.first = 0;
        }
        let mut i = 0u32;
        while pos + stride <= bytes.len() {
            if use_drawcall_range && i == self.vertex_count {
                break;
            }
            self.vertices
                .push(layout.decode(&bytes[pos..pos + stride], self.slot));
            pos += stride;
            i += 1;
        }
        self.vertex_count = self.vertices.len() as u32;
        Ok(())
    }

    pub fn append(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
        self.vertex_count += 1;
    }
}

/// Splits a `vbN[i]+off SEMANTIC: data` vertex-data line.
fn split_vertex_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("vb")?;
    let after_slot = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    if after_slot.len() == rest.len() {
        return None;
    }
    let rest = after_slot.strip_prefix('[')?;
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    let rest = rest.strip_prefix("]+")?;
    let after_offset = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    if after_offset.len() == rest.len() {
        return None;
    }
    let rest = after_offset.strip_prefix(' ')?;
    let (semantic, data) = rest.split_once(": ")?;
    Some((semantic, data))
}

fn parse_vertex_element(layout: &InputLayout, semantic: &Semantic, data: &str) -> Result<AttributeData> {
    let elem = layout.get(semantic).ok_or_else(|| DumpError::MalformedLayout {
        expected: "layout element for vertex-data semantic",
        found: semantic.to_string(),
    })?;
    let fields = data.split(',').map(str::trim);
    if elem.format.ends_with("UINT") {
        let lanes: std::result::Result<Vec<u32>, _> = fields.map(str::parse).collect();
        return Ok(AttributeData::Uint(lanes.map_err(|_| DumpError::InvalidNumber {
            field: "vertex-data",
            value: data.to_string(),
        })?));
    }
    if elem.format.ends_with("SINT") {
        let lanes: std::result::Result<Vec<i32>, _> = fields.map(str::parse).collect();
        return Ok(AttributeData::Sint(lanes.map_err(|_| DumpError::InvalidNumber {
            field: "vertex-data",
            value: data.to_string(),
        })?));
    }
    let lanes: Result<Vec<f32>> = fields.map(ms_float).collect();
    Ok(AttributeData::Float32(lanes?))
}

fn parse_num<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| DumpError::InvalidNumber {
        field,
        value: value.trim().to_string(),
    })
}

/// Extracts the slot index from a dump filename (`...-vb3=hash...txt`).
pub fn slot_from_filename(path: &Path) -> Result<u32> {
    let s = path.to_string_lossy();
    for (i, _) in s.match_indices("vb") {
        if i == 0 {
            continue;
        }
        let prev = s.as_bytes()[i - 1];
        if prev != b'-' && prev != b'.' {
            continue;
        }
        let digits: String = s[i + 2..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            continue;
        }
        return digits.parse().map_err(|_| DumpError::FilenamePattern {
            path: path.to_path_buf(),
        });
    }
    Err(DumpError::FilenamePattern {
        path: path.to_path_buf(),
    })
}

/// All the per-vertex data for one draw call, merged from every bound slot.
#[derive(Debug, Clone, Default)]
pub struct VertexBufferGroup {
    pub vertices: Vec<Vertex>,
    pub layout: InputLayout,
    pub first: u32,
    pub vertex_count: u32,
    pub topology: Topology,
    slots: BTreeMap<u32, SlotBuffer>,
    /// Original BLENDINDICES tuples saved by [`remap_blend_indices`],
    /// one entry per vertex.
    ///
    /// [`remap_blend_indices`]: Self::remap_blend_indices
    saved_blend_indices: Vec<Vec<(Semantic, AttributeData)>>,
}

impl VertexBufferGroup {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            ..Self::default()
        }
    }

    /// Loads a group from per-slot `.txt` dumps.
    pub fn from_text_files(files: &[impl AsRef<Path>], load_vertices: bool) -> Result<Self> {
        let mut group = Self::new(Topology::TriangleList);
        for f in files {
            let f = f.as_ref();
            let slot = slot_from_filename(f)?;
            let text = fs::read_to_string(f)?;
            let vb = SlotBuffer::from_text(slot, &text, &mut group.layout, load_vertices)?;
            if !vb.vertices.is_empty() {
                group.slots.insert(slot, vb);
            }
        }
        group.finish_load(load_vertices)?;
        Ok(group)
    }

    /// Loads a group from `.buf` dumps, each described by a text sidecar.
    pub fn from_binary_files(
        files: &[(impl AsRef<Path>, impl AsRef<Path>)],
        use_drawcall_range: bool,
    ) -> Result<Self> {
        let mut group = Self::new(Topology::TriangleList);
        for (bin_f, fmt_f) in files {
            let (bin_f, fmt_f) = (bin_f.as_ref(), fmt_f.as_ref());
            let slot = match slot_from_filename(bin_f) {
                Ok(slot) => slot,
                Err(_) => {
                    warn!(
                        path = %bin_f.display(),
                        "cannot determine vertex buffer slot from filename, assuming 0"
                    );
                    0
                }
            };
            let fmt_text = fs::read_to_string(fmt_f)?;
            let mut vb = SlotBuffer::from_text(slot, &fmt_text, &mut group.layout, false)?;
            vb.parse_binary(&fs::read(bin_f)?, &group.layout, use_drawcall_range)?;
            if !vb.vertices.is_empty() {
                group.slots.insert(slot, vb);
            }
        }
        group.finish_load(true)?;
        Ok(group)
    }

    fn finish_load(&mut self, merge: bool) -> Result<()> {
        if self.slots.is_empty() {
            return Err(DumpError::MalformedLayout {
                expected: "at least one populated vertex buffer slot",
                found: String::from("none"),
            });
        }
        self.flag_invalid();

        let lowest = *self.slots.keys().next().unwrap_or(&0);
        let base = &self.slots[&lowest];
        self.first = base.first;
        self.vertex_count = base.vertex_count;
        self.topology = base.topology;

        if merge {
            self.merge_slots()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn append(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
        self.vertex_count += 1;
    }

    /// Per-slot strides of every loaded slot.
    pub fn slot_strides(&self) -> BTreeMap<u32, u32> {
        self.slots.iter().map(|(&slot, vb)| (slot, vb.stride)).collect()
    }

    pub fn slots(&self) -> impl Iterator<Item = &SlotBuffer> {
        self.slots.values()
    }

    /// Flags layout elements that cannot be decoded from the loaded slots.
    pub fn flag_invalid(&mut self) {
        let strides = self.slot_strides();
        self.layout.flag_invalid(&strides);
    }

    /// The per-vertex semantics that survived [`flag_invalid`].
    ///
    /// [`flag_invalid`]: Self::flag_invalid
    pub fn valid_semantics(&mut self) -> Vec<Semantic> {
        self.flag_invalid();
        self.layout
            .iter()
            .filter(|e| e.slot_class == crate::layout::SlotClass::PerVertex && !e.invalid)
            .map(|e| e.semantic.clone())
            .collect()
    }

    /// Moves each slot's vertices into the group, merging records by index.
    ///
    /// Vertex ownership transfers from slot to group; the slots keep only
    /// their header metadata afterwards.
    fn merge_slots(&mut self) -> Result<()> {
        let mut slots = self.slots.values_mut();
        let Some(base) = slots.next() else {
            return Ok(());
        };
        self.vertices = std::mem::take(&mut base.vertices);
        if self.vertices.len() != self.vertex_count as usize {
            return Err(DumpError::VertexCountMismatch {
                declared: self.vertex_count as usize,
                parsed: self.vertices.len(),
            });
        }
        for vb in slots {
            if vb.vertices.len() != self.vertex_count as usize {
                return Err(DumpError::VertexCountMismatch {
                    declared: self.vertex_count as usize,
                    parsed: vb.vertices.len(),
                });
            }
            for (i, vertex) in std::mem::take(&mut vb.vertices).into_iter().enumerate() {
                self.vertices[i].extend(vertex);
            }
        }
        Ok(())
    }

    /// Merges another group covering a later draw call of the same buffer.
    ///
    /// Only the tail beyond the current vertex count is appended: split draw
    /// calls re-dump the shared head of the buffer.
    pub fn merge(&mut self, other: Self) -> Result<()> {
        if self.layout != other.layout {
            return Err(DumpError::MergeConflict(
                "vertex buffers have different input layouts, only the same buffer split across draw calls can be merged",
            ));
        }
        if self.first != other.first {
            return Err(DumpError::MergeConflict(
                "vertex buffers have different first vertices",
            ));
        }
        if other.vertex_count > self.vertex_count {
            self.vertices
                .extend_from_slice(&other.vertices[self.vertex_count as usize..]);
            self.vertex_count = other.vertex_count;
        }
        Ok(())
    }

    /// Rewrites every BLENDINDICES lane through `lookup`, saving the
    /// originals so [`revert_blend_indices`] can restore them.
    ///
    /// [`revert_blend_indices`]: Self::revert_blend_indices
    pub fn remap_blend_indices(&mut self, lookup: impl Fn(u32) -> u32) {
        let mut saved = Vec::with_capacity(self.vertices.len());
        for vertex in &mut self.vertices {
            let mut originals = Vec::new();
            for (semantic, data) in vertex.iter_mut() {
                if semantic.name != "BLENDINDICES" {
                    continue;
                }
                originals.push((semantic.clone(), data.clone()));
                let lanes: Vec<u32> = (0..data.len())
                    .map(|i| lookup(data.lane_i64(i).max(0) as u32))
                    .collect();
                *data = AttributeData::Uint(lanes);
            }
            saved.push(originals);
        }
        self.saved_blend_indices = saved;
    }

    /// Restores the BLENDINDICES tuples saved by the last remap.
    pub fn revert_blend_indices(&mut self) {
        for (vertex, originals) in self.vertices.iter_mut().zip(self.saved_blend_indices.drain(..)) {
            for (semantic, data) in originals {
                vertex.insert(semantic, data);
            }
        }
    }

    /// Zeroes every BLENDINDICES tuple, keeping only implicit bone 0.
    pub fn disable_blend_weights(&mut self) {
        for vertex in &mut self.vertices {
            for (semantic, data) in vertex.iter_mut() {
                if semantic.name == "BLENDINDICES" {
                    *data = AttributeData::Uint(vec![0; data.len()]);
                }
            }
        }
    }

    /// Writes one binary buffer per requested slot selector.
    ///
    /// The selector's `Display` is appended to `output_prefix`, matching
    /// the `.vb0`/`.vb1` (or bare `.vb`) naming of the dumps.
    pub fn write(
        &self,
        output_prefix: &Path,
        strides: &BTreeMap<SlotSelector, u32>,
    ) -> Result<()> {
        for (&selector, &stride) in strides {
            let mut name = output_prefix.as_os_str().to_owned();
            name.push(selector.to_string());
            let mut output = fs::File::create(Path::new(&name))?;
            for vertex in &self.vertices {
                output.write_all(&self.layout.encode(vertex, selector, stride))?;
            }
            info!(
                vertices = self.vertices.len(),
                path = %Path::new(&name).display(),
                "wrote vertex buffer"
            );
        }
        Ok(())
    }
}
