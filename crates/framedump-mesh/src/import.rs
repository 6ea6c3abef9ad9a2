//! Mesh reconstruction: draw-call buffer dumps in, [`MeshData`] out.

use crate::error::{MeshError, Result};
use crate::mesh::{AxisConvention, DumpMetadata, MeshData, UvLayer};
use framedump_buffers::{
    AttributeData, DrawCallUse, DumpError, IndexBuffer, LayoutElement, Report, Semantic,
    SlotClass, Topology, VertexBufferGroup,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Import options. One explicit value per import, no ambient state.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub flip_texcoord_v: bool,
    /// Reverse face winding. `flip_mesh` toggles this again internally so a
    /// mirrored mesh keeps its face orientation.
    pub flip_winding: bool,
    /// Mirror the mesh over the X axis.
    pub flip_mesh: bool,
    pub flip_normal: bool,
    pub axis: AxisConvention,
    /// Honor the draw call's first/count range when loading binary buffers
    /// instead of reading whole buffers.
    pub use_drawcall_range: bool,
    /// Semantic renames to apply to the layout before interpretation.
    pub semantic_remaps: Vec<(Semantic, String)>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            flip_texcoord_v: true,
            flip_winding: false,
            flip_mesh: false,
            flip_normal: false,
            axis: AxisConvention::default(),
            use_drawcall_range: false,
            semantic_remaps: Vec::new(),
        }
    }
}

/// The related files of one draw call: every vertex buffer slot plus the
/// index buffer, if any.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DumpGroup {
    pub vb_paths: Vec<PathBuf>,
    pub ib_path: Option<PathBuf>,
}

impl DumpGroup {
    /// A display name for the group, from its first vertex buffer file.
    pub fn name(&self) -> String {
        self.vb_paths
            .first()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Loads and merges the text dumps of one or more draw calls into a single
/// vertex buffer group and optional index buffer.
pub fn load_mesh(groups: &[DumpGroup], report: &mut Report) -> Result<(VertexBufferGroup, Option<IndexBuffer>)> {
    let first = groups.first().ok_or(MeshError::NoFilesSelected)?;

    let mut vb = VertexBufferGroup::from_text_files(&first.vb_paths, true)?;
    for group in &groups[1..] {
        let tmp = VertexBufferGroup::from_text_files(&group.vb_paths, true)?;
        vb.merge(tmp)?;
    }

    let mut ib = None;
    if let Some(ib_path) = &first.ib_path {
        let mut parsed = IndexBuffer::from_text(&fs::read_to_string(ib_path)?, true)?;
        for group in &groups[1..] {
            if let Some(path) = &group.ib_path {
                let tmp = IndexBuffer::from_text(&fs::read_to_string(path)?, true)?;
                parsed.merge(tmp)?;
            }
        }
        if parsed.used_in_drawcall == DrawCallUse::NotUsed {
            report.warning(format!(
                "{}: discarding index buffer not used in draw call",
                basename(ib_path)
            ));
        } else {
            ib = Some(parsed);
        }
    }
    Ok((vb, ib))
}

/// Loads one draw call from raw `.buf` dumps with their text sidecars.
pub fn load_mesh_binary(
    vb_pairs: &[(PathBuf, PathBuf)],
    ib_pair: Option<(PathBuf, PathBuf)>,
    use_drawcall_range: bool,
    report: &mut Report,
) -> Result<(VertexBufferGroup, Option<IndexBuffer>)> {
    let vb = VertexBufferGroup::from_binary_files(vb_pairs, use_drawcall_range)?;

    let mut ib = None;
    if let Some((bin_path, txt_path)) = ib_pair {
        let mut parsed = IndexBuffer::from_text(&fs::read_to_string(&txt_path)?, false)?;
        if parsed.used_in_drawcall == DrawCallUse::NotUsed {
            report.warning(format!(
                "{}: discarding index buffer not used in draw call",
                basename(&bin_path)
            ));
        } else {
            parsed.parse_binary(&fs::read(&bin_path)?, use_drawcall_range)?;
            ib = Some(parsed);
        }
    }
    Ok((vb, ib))
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reconstructs a mesh from loaded buffers.
pub fn import_mesh(
    mut vb: VertexBufferGroup,
    ib: Option<IndexBuffer>,
    options: &ImportOptions,
    report: &mut Report,
) -> Result<(MeshData, DumpMetadata)> {
    let translations = if options.semantic_remaps.is_empty() {
        vb.layout.semantic_remap()
    } else {
        vb.layout.apply_remap(&options.semantic_remaps, report)
    };

    let mut metadata = DumpMetadata {
        layout: vb.layout.clone(),
        topology: vb.topology,
        strides: vb.slot_strides(),
        first_vertex: vb.first,
        first_index: 0,
        index_format: None,
        flip_winding: options.flip_winding,
        flip_normal: options.flip_normal,
        flip_mesh: options.flip_mesh,
        axis: options.axis.clone(),
    };
    // Mirroring the mesh inverts face orientation, so mirror implies an
    // extra winding flip to compensate.
    let flip_winding = options.flip_winding ^ options.flip_mesh;

    let mut mesh = MeshData::default();
    mesh.faces = match &ib {
        Some(ib) => {
            metadata.index_format = Some(ib.format.clone());
            metadata.first_index = ib.first;
            match ib.topology {
                Topology::TriangleList | Topology::TriangleStrip => {
                    faces_from_ib(ib, flip_winding)
                }
                Topology::PointList => {
                    assert_pointlist_ib_is_pointless(ib, &vb)?;
                    Vec::new()
                }
            }
        }
        None => match vb.topology {
            Topology::TriangleList => faces_from_vb_trianglelist(&vb, flip_winding)?,
            Topology::TriangleStrip => faces_from_vb_trianglestrip(&vb, flip_winding)?,
            Topology::PointList => Vec::new(),
        },
    };
    if vb.topology == Topology::PointList {
        report.warning(
            "mesh uses point list topology, which is highly experimental and may have issues \
             with normals/tangents/lighting",
        );
    }

    let state = import_vertices(&vb, &translations, options, report, &mut mesh)?;
    import_uv_layers(&mut mesh, state.texcoords, options.flip_texcoord_v)?;
    if mesh.uv_layers.is_empty() {
        report.warning(
            "no TEXCOORDs / UV layers imported, this may cause issues with normals/tangents/\
             lighting on export",
        );
    }
    import_vertex_layers(&mut mesh, state.vertex_layers);
    import_vertex_groups(&mut mesh, state.blend_indices, state.blend_weights, report);

    Ok((mesh, metadata))
}

fn faces_from_ib(ib: &IndexBuffer, flip_winding: bool) -> Vec<[u32; 3]> {
    ib.faces
        .iter()
        .map(|f| {
            if flip_winding {
                [f[2], f[1], f[0]]
            } else {
                [f[0], f[1], f[2]]
            }
        })
        .collect()
}

fn faces_from_vb_trianglelist(vb: &VertexBufferGroup, flip_winding: bool) -> Result<Vec<[u32; 3]>> {
    if flip_winding {
        return Err(DumpError::WindingFlipUnsupported(
            "triangle lists without an index buffer",
        )
        .into());
    }
    let num_faces = vb.len() as u32 / 3;
    Ok((0..num_faces).map(|i| [i * 3, i * 3 + 1, i * 3 + 2]).collect())
}

fn faces_from_vb_trianglestrip(
    vb: &VertexBufferGroup,
    flip_winding: bool,
) -> Result<Vec<[u32; 3]>> {
    if flip_winding {
        return Err(DumpError::WindingFlipUnsupported(
            "triangle strip topology",
        )
        .into());
    }
    if vb.len() < 3 {
        return Err(DumpError::DegenerateStrip.into());
    }
    let num_faces = (vb.len() - 2) as u32;
    // Every 2nd face has its vertices out of order to keep all faces in the
    // same orientation.
    Ok((0..num_faces)
        .map(|i| {
            if i % 2 == 1 {
                [i, i + 2, i + 1]
            } else {
                [i, i + 1, i + 2]
            }
        })
        .collect())
}

/// Index buffers on point list topologies offer none of their usual
/// advantages, but some engines bind them anyway. Accept only the trivial
/// case that enumerates every vertex in order.
fn assert_pointlist_ib_is_pointless(ib: &IndexBuffer, vb: &VertexBufferGroup) -> Result<()> {
    if vb.len() != ib.logical_index_count() {
        return Err(DumpError::PointListIndexBuffer.into());
    }
    for (i, face) in ib.faces.iter().enumerate() {
        if face.len() != 1 || face[0] as usize != i {
            return Err(DumpError::PointListIndexBuffer.into());
        }
    }
    Ok(())
}

/// Intermediate per-semantic collections gathered while walking the layout.
#[derive(Default)]
struct VertexState {
    blend_indices: BTreeMap<u32, Vec<Vec<u32>>>,
    blend_weights: BTreeMap<u32, Vec<Vec<f32>>>,
    texcoords: BTreeMap<u32, Vec<Vec<f32>>>,
    vertex_layers: BTreeMap<String, Vec<AttributeData>>,
}

fn import_vertices(
    vb: &VertexBufferGroup,
    translations: &std::collections::HashMap<Semantic, Semantic>,
    options: &ImportOptions,
    report: &mut Report,
    mesh: &mut MeshData,
) -> Result<VertexState> {
    let mut state = VertexState::default();
    let strides = vb.slot_strides();
    let mirror = if options.flip_mesh { -1.0 } else { 1.0 };

    for elem in vb.layout.iter() {
        if elem.slot_class != SlotClass::PerVertex || elem.reused_offset {
            continue;
        }
        if !strides.contains_key(&elem.input_slot) {
            // Some engines declare attributes in slots they never bind.
            report.info(format!(
                "vertex semantic {} unavailable due to missing vb{}",
                elem.semantic, elem.input_slot
            ));
            continue;
        }

        let translated = translations.get(&elem.semantic).unwrap_or(&elem.semantic);
        // Some games ignore the official uppercase semantic convention.
        let name = translated.name.to_ascii_uppercase();
        let index = translated.index;

        let data: Vec<&AttributeData> = vb
            .vertices
            .iter()
            .map(|v| {
                v.get(&elem.semantic).ok_or_else(|| DumpError::MalformedLayout {
                    expected: "vertex data for every layout semantic",
                    found: elem.semantic.to_string(),
                })
            })
            .collect::<std::result::Result<_, _>>()?;

        if name == "POSITION" {
            if data.first().is_some_and(|d| d.len() == 4)
                && data.iter().any(|d| d.lane_f32(3) != 1.0)
            {
                report.warning(
                    "positions are 4D, storing W coordinate in POSITION.w vertex layer. Beware \
                     that some types of edits on this mesh may be problematic",
                );
                mesh.float_layers.insert(
                    String::from("POSITION.w"),
                    data.iter().map(|d| d.lane_f32(3)).collect(),
                );
            }
            mesh.positions = data
                .iter()
                .map(|d| [mirror * d.lane_f32(0), d.lane_f32(1), d.lane_f32(2)])
                .collect();
        } else if name.starts_with("COLOR") {
            mesh.color_layers.insert(
                elem.semantic.to_string(),
                data.iter()
                    .map(|d| (0..d.len()).map(|i| d.lane_f32(i)).collect())
                    .collect(),
            );
        } else if name == "NORMAL" {
            if data.first().is_some_and(|d| d.len() == 4)
                && data.iter().any(|d| d.lane_f32(3) != 0.0)
            {
                report.warning(
                    "normals are 4D, storing W coordinate in NORMAL.w vertex layer. Beware that \
                     some types of edits on this mesh may be problematic",
                );
                mesh.float_layers.insert(
                    String::from("NORMAL.w"),
                    data.iter().map(|d| d.lane_f32(3)).collect(),
                );
            }
            let translate = normal_import_translation(elem, options.flip_normal);
            mesh.normals = Some(
                data.iter()
                    .map(|d| {
                        [
                            translate(mirror * d.lane_f32(0)),
                            translate(d.lane_f32(1)),
                            translate(d.lane_f32(2)),
                        ]
                    })
                    .collect(),
            );
        } else if name.starts_with("TANGENT") || name.starts_with("BINORMAL") {
            report.info(format!(
                "skipping import of {} in favour of recalculating on export",
                elem.semantic
            ));
        } else if name.starts_with("BLENDINDICES") {
            state.blend_indices.insert(
                index,
                data.iter()
                    .map(|d| (0..d.len()).map(|i| d.lane_i64(i).max(0) as u32).collect())
                    .collect(),
            );
        } else if name.starts_with("BLENDWEIGHT") {
            state.blend_weights.insert(
                index,
                data.iter()
                    .map(|d| (0..d.len()).map(|i| d.lane_f32(i)).collect())
                    .collect(),
            );
        } else if name.starts_with("TEXCOORD") && elem.is_float() {
            state.texcoords.insert(
                index,
                data.iter()
                    .map(|d| (0..d.len()).map(|i| d.lane_f32(i)).collect())
                    .collect(),
            );
        } else {
            report.info(format!(
                "storing unhandled semantic {} {} as vertex layer",
                elem.semantic, elem.format
            ));
            state
                .vertex_layers
                .insert(elem.semantic.to_string(), data.into_iter().cloned().collect());
        }
    }
    Ok(state)
}

fn normal_import_translation(elem: &LayoutElement, flip: bool) -> impl Fn(f32) -> f32 {
    let unorm = elem.format.ends_with("_UNORM");
    let sign = if flip { -1.0 } else { 1.0 };
    move |x: f32| {
        // Scale UNORM range 0..1 to normal range -1..1.
        let v = if unorm { x * 2.0 - 1.0 } else { x };
        sign * v
    }
}

fn import_uv_layers(
    mesh: &mut MeshData,
    texcoords: BTreeMap<u32, Vec<Vec<f32>>>,
    flip_texcoord_v: bool,
) -> Result<()> {
    for (index, data) in texcoords {
        let dim = data.first().map_or(0, Vec::len);
        let components_list: &[&str] = match dim {
            4 => &["xy", "zw"],
            3 => &["xy", "z"],
            2 => &["xy"],
            1 => &["x"],
            _ => {
                return Err(DumpError::MalformedLayout {
                    expected: "TEXCOORD with 1-4 components",
                    found: format!("TEXCOORD{index} with {dim}"),
                }
                .into())
            }
        };
        for components in components_list {
            let uv_name = format!("{}.{}", Semantic::new("TEXCOORD", index), components);
            let offset = if components.starts_with('z') { 2 } else { 0 };
            let layer = if components.len() == 1 {
                // 1D or the Z of a 3D TEXCOORD, stored as a single component.
                UvLayer {
                    data: data.iter().map(|d| vec![d[offset]]).collect(),
                    flipped_v: false,
                }
            } else if flip_texcoord_v {
                // Record that V was flipped so export can undo it.
                UvLayer {
                    data: data
                        .iter()
                        .map(|d| vec![d[offset], 1.0 - d[offset + 1]])
                        .collect(),
                    flipped_v: true,
                }
            } else {
                UvLayer {
                    data: data.iter().map(|d| vec![d[offset], d[offset + 1]]).collect(),
                    flipped_v: false,
                }
            };
            mesh.uv_layers.insert(uv_name, layer);
        }
    }
    Ok(())
}

/// Stores unknown semantics as per-component scalar layers.
fn import_vertex_layers(mesh: &mut MeshData, vertex_layers: BTreeMap<String, Vec<AttributeData>>) {
    const COMPONENTS: [char; 4] = ['x', 'y', 'z', 'w'];
    for (element_name, data) in vertex_layers {
        let dim = data.first().map_or(0, AttributeData::len);
        for component in 0..dim {
            let layer_name = if dim != 1 || !element_name.contains('.') {
                format!("{}.{}", element_name, COMPONENTS[component])
            } else {
                element_name.clone()
            };
            match data.first() {
                Some(AttributeData::Float32(_)) => {
                    mesh.float_layers.insert(
                        layer_name,
                        data.iter().map(|d| d.lane_f32(component)).collect(),
                    );
                }
                _ => {
                    // Integer layers are 32-bit signed; unsigned values that
                    // cannot fit are reinterpreted.
                    mesh.int_layers.insert(
                        layer_name,
                        data.iter()
                            .map(|d| match d {
                                AttributeData::Uint(v) => v[component] as i32,
                                AttributeData::Sint(v) => v[component],
                                AttributeData::Float32(v) => v[component] as i32,
                            })
                            .collect(),
                    );
                }
            }
        }
    }
}

fn import_vertex_groups(
    mesh: &mut MeshData,
    blend_indices: BTreeMap<u32, Vec<Vec<u32>>>,
    blend_weights: BTreeMap<u32, Vec<Vec<f32>>>,
    report: &mut Report,
) {
    if blend_indices.is_empty() {
        return;
    }
    let num_groups = blend_indices
        .values()
        .flatten()
        .flatten()
        .copied()
        .max()
        .map_or(0, |m| m as usize + 1);
    mesh.groups.names = (0..num_groups).map(|i| i.to_string()).collect();
    mesh.groups.weights = vec![Vec::new(); mesh.vertex_count()];

    for (semantic_index, indices) in &blend_indices {
        let Some(weights) = blend_weights.get(semantic_index) else {
            report.warning(format!(
                "BLENDINDICES{semantic_index} has no matching BLENDWEIGHT, skipping"
            ));
            continue;
        };
        for (vertex, (idx, w)) in indices.iter().zip(weights).enumerate() {
            for (&i, &w) in idx.iter().zip(w) {
                if w == 0.0 {
                    continue;
                }
                mesh.groups.weights[vertex].push((i as usize, w));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const VB0_TXT: &str = "\
byte offset: 0
first vertex: 0
vertex count: 3
stride: 32
element[0]:
  SemanticName: POSITION
  SemanticIndex: 0
  Format: R32G32B32_FLOAT
  InputSlot: 0
  AlignedByteOffset: 0
  InputSlotClass: per-vertex
  InstanceDataStepRate: 0
element[1]:
  SemanticName: NORMAL
  SemanticIndex: 0
  Format: R32G32B32_FLOAT
  InputSlot: 0
  AlignedByteOffset: 12
  InputSlotClass: per-vertex
  InstanceDataStepRate: 0
element[2]:
  SemanticName: TEXCOORD
  SemanticIndex: 0
  Format: R32G32_FLOAT
  InputSlot: 0
  AlignedByteOffset: 24
  InputSlotClass: per-vertex
  InstanceDataStepRate: 0
topology: trianglelist
vertex-data:

vb0[0]+000 POSITION: 0, 0, 0
vb0[0]+012 NORMAL: 0, 0, 1
vb0[0]+024 TEXCOORD: 0, 1

vb0[1]+032 POSITION: 1, 0, 0
vb0[1]+044 NORMAL: 0, 0, 1
vb0[1]+056 TEXCOORD: 1, 1

vb0[2]+064 POSITION: 0, 1, 0
vb0[2]+076 NORMAL: 0, 0, 1
vb0[2]+088 TEXCOORD: 0, 0
";

    const IB_TXT: &str = "\
byte offset: 0
first index: 0
index count: 3
topology: trianglelist
format: DXGI_FORMAT_R16_UINT

0 1 2
";

    fn sample_group(dir: &Path) -> DumpGroup {
        let vb_path = dir.join("000001-vb0=1234abcd.txt");
        let ib_path = dir.join("000001-ib=5678ef01.txt");
        fs::write(&vb_path, VB0_TXT).unwrap();
        fs::write(&ib_path, IB_TXT).unwrap();
        DumpGroup {
            vb_paths: vec![vb_path],
            ib_path: Some(ib_path),
        }
    }

    #[test]
    fn end_to_end_triangle() {
        let dir = tempfile::tempdir().unwrap();
        let group = sample_group(dir.path());

        let mut report = Report::new();
        let (vb, ib) = load_mesh(&[group], &mut report).unwrap();
        let (mesh, metadata) =
            import_mesh(vb, ib, &ImportOptions::default(), &mut report).unwrap();

        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        assert_eq!(mesh.normals.as_deref(), Some(&[[0.0, 0.0, 1.0]; 3][..]));
        let uv = &mesh.uv_layers["TEXCOORD.xy"];
        assert!(uv.flipped_v);
        // V flipped on import.
        assert_eq!(uv.data[0], vec![0.0, 0.0]);
        assert_eq!(uv.data[2], vec![0.0, 1.0]);
        assert!(!report.has_warnings());

        assert_eq!(metadata.topology, Topology::TriangleList);
        assert_eq!(metadata.index_format.as_deref(), Some("DXGI_FORMAT_R16_UINT"));
        assert_eq!(metadata.strides, [(0u32, 32u32)].into_iter().collect());
    }

    #[test]
    fn flip_mesh_mirrors_positions_and_winding() {
        let dir = tempfile::tempdir().unwrap();
        let group = sample_group(dir.path());

        let mut report = Report::new();
        let (vb, ib) = load_mesh(&[group], &mut report).unwrap();
        let options = ImportOptions {
            flip_mesh: true,
            ..ImportOptions::default()
        };
        let (mesh, metadata) = import_mesh(vb, ib, &options, &mut report).unwrap();
        assert_eq!(mesh.positions[1], [-1.0, 0.0, 0.0]);
        assert_eq!(mesh.faces, vec![[2, 1, 0]]);
        // The user-facing option is recorded unchanged.
        assert!(!metadata.flip_winding);
        assert!(metadata.flip_mesh);
    }

    #[test]
    fn unused_index_buffer_is_discarded_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let mut group = sample_group(dir.path());
        let ib_path = dir.path().join("000002-ib=5678ef01.txt");
        fs::write(
            &ib_path,
            "byte offset: 0\ntopology: trianglelist\nformat: DXGI_FORMAT_R16_UINT\n",
        )
        .unwrap();
        group.ib_path = Some(ib_path);

        let mut report = Report::new();
        let (_, ib) = load_mesh(&[group], &mut report).unwrap();
        assert!(ib.is_none());
        assert!(report.has_warnings());
    }

    #[test]
    fn pointlist_identity_ib_is_accepted() {
        let mut ib = IndexBuffer::new("DXGI_FORMAT_R16_UINT").unwrap();
        ib.topology = Topology::PointList;
        for i in 0..3 {
            ib.append(vec![i]);
        }
        let mut vb = VertexBufferGroup::new(Topology::PointList);
        for _ in 0..3 {
            vb.append(Default::default());
        }
        assert!(assert_pointlist_ib_is_pointless(&ib, &vb).is_ok());

        let mut shuffled = IndexBuffer::new("DXGI_FORMAT_R16_UINT").unwrap();
        shuffled.topology = Topology::PointList;
        for i in [0u32, 2, 1] {
            shuffled.append(vec![i]);
        }
        assert!(matches!(
            assert_pointlist_ib_is_pointless(&shuffled, &vb),
            Err(MeshError::Dump(DumpError::PointListIndexBuffer))
        ));
    }

    #[test]
    fn binary_load_matches_text_load() {
        let dir = tempfile::tempdir().unwrap();
        let group = sample_group(dir.path());
        let mut report = Report::new();
        let (text_vb, text_ib) = load_mesh(&[group.clone()], &mut report).unwrap();

        // Re-encode the parsed records as the .buf files a dump would hold.
        let mut buf = Vec::new();
        for vertex in &text_vb.vertices {
            buf.extend(text_vb.layout.encode(
                vertex,
                framedump_buffers::SlotSelector::Slot(0),
                32,
            ));
        }
        let vb_bin = dir.path().join("000001-vb0=1234abcd.buf");
        let ib_bin = dir.path().join("000001-ib=5678ef01.buf");
        fs::write(&vb_bin, &buf).unwrap();
        fs::write(&ib_bin, [0u8, 0, 1, 0, 2, 0]).unwrap();

        let (vb, ib) = load_mesh_binary(
            &[(vb_bin, group.vb_paths[0].clone())],
            Some((ib_bin, group.ib_path.clone().unwrap())),
            false,
            &mut report,
        )
        .unwrap();
        assert_eq!(vb.vertices, text_vb.vertices);
        assert_eq!(ib.unwrap().faces, text_ib.unwrap().faces);
    }

    #[test]
    fn unknown_semantics_become_scalar_layers() {
        let mut layers = BTreeMap::new();
        layers.insert(
            String::from("PSIZE"),
            vec![
                AttributeData::Uint(vec![1, 0x80000000]),
                AttributeData::Uint(vec![2, 3]),
            ],
        );
        let mut mesh = MeshData::default();
        import_vertex_layers(&mut mesh, layers);
        assert_eq!(mesh.int_layers["PSIZE.x"], vec![1, 2]);
        // 0x80000000 does not fit a signed layer; reinterpreted.
        assert_eq!(mesh.int_layers["PSIZE.y"], vec![i32::MIN, 3]);
    }

    #[test]
    fn blend_groups_skip_zero_weights() {
        let mut mesh = MeshData::default();
        mesh.positions = vec![[0.0; 3]; 2];
        let mut indices = BTreeMap::new();
        indices.insert(0u32, vec![vec![4u32, 7, 0, 0], vec![1, 0, 0, 0]]);
        let mut weights = BTreeMap::new();
        weights.insert(0u32, vec![vec![0.75f32, 0.25, 0.0, 0.0], vec![1.0, 0.0, 0.0, 0.0]]);
        let mut report = Report::new();
        import_vertex_groups(&mut mesh, indices, weights, &mut report);
        assert_eq!(mesh.groups.names.len(), 8);
        assert_eq!(mesh.groups.weights[0], vec![(4, 0.75), (7, 0.25)]);
        assert_eq!(mesh.groups.weights[1], vec![(1, 1.0)]);
    }
}
