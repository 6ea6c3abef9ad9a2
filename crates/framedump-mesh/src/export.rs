//! The inverse pipeline: re-encode a [`MeshData`] + [`DumpMetadata`] pair
//! into binary buffers and a `.fmt` sidecar, byte-compatible with the dump
//! it was imported from for unedited attributes.

use crate::error::Result;
use crate::mesh::{DumpMetadata, MeshData};
use framedump_buffers::{
    write_fmt_file, AttributeData, IndexBuffer, InputLayout, LayoutElement, Report, Semantic,
    SlotClass, SlotSelector, Topology, Vertex, VertexBufferGroup,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Rebuilds the draw-call buffers from a reconstructed mesh.
///
/// `outline` optionally overrides the tangent of specific vertices with a
/// blended outline normal (see [`crate::outline`]).
pub fn export_mesh(
    mesh: &MeshData,
    metadata: &DumpMetadata,
    outline: Option<&HashMap<u32, [f32; 3]>>,
    report: &mut Report,
) -> Result<(VertexBufferGroup, Option<IndexBuffer>)> {
    let mut layout = metadata.layout.clone();
    let translations = layout.semantic_remap();

    let mut vb = VertexBufferGroup::new(metadata.topology);
    vb.layout = layout;
    vb.first = metadata.first_vertex;

    let flip_winding = metadata.flip_winding ^ metadata.flip_mesh;
    let mirror = if metadata.flip_mesh { -1.0 } else { 1.0 };

    let mut unhandled: HashSet<Semantic> = HashSet::new();
    for i in 0..mesh.vertex_count() {
        let vertex = build_vertex(
            mesh,
            &vb.layout,
            &translations,
            metadata,
            mirror,
            outline,
            i,
            &mut unhandled,
        );
        vb.append(vertex);
    }
    for semantic in unhandled {
        report.info(format!("unhandled vertex element: {semantic}"));
    }

    let ib = match &metadata.index_format {
        Some(format) => {
            let mut ib = IndexBuffer::new(format)?;
            ib.topology = Topology::TriangleList;
            ib.first = metadata.first_index;
            for face in &mesh.faces {
                let face = if flip_winding {
                    vec![face[2], face[1], face[0]]
                } else {
                    face.to_vec()
                };
                ib.append(face);
            }
            Some(ib)
        }
        None => None,
    };
    Ok((vb, ib))
}

#[allow(clippy::too_many_arguments)]
fn build_vertex(
    mesh: &MeshData,
    layout: &InputLayout,
    translations: &HashMap<Semantic, Semantic>,
    metadata: &DumpMetadata,
    mirror: f32,
    outline: Option<&HashMap<u32, [f32; 3]>>,
    i: usize,
    unhandled: &mut HashSet<Semantic>,
) -> Vertex {
    let mut vertex = Vertex::new();
    let sorted_groups = mesh.groups.sorted_weights(i);

    for elem in layout.iter() {
        if elem.slot_class != SlotClass::PerVertex || elem.reused_offset {
            continue;
        }
        let translated = translations.get(&elem.semantic).unwrap_or(&elem.semantic);
        let name = translated.name.to_ascii_uppercase();
        let index = translated.index;

        let data = if name == "POSITION" {
            let p = mesh.positions[i];
            let mut lanes = vec![mirror * p[0], p[1], p[2]];
            if let Some(w) = mesh.float_layers.get("POSITION.w") {
                lanes.push(w[i]);
                Some(AttributeData::Float32(lanes))
            } else {
                Some(elem.pad_floats(lanes, 1.0))
            }
        } else if name.starts_with("COLOR") {
            color_lanes(mesh, elem, i)
        } else if name == "NORMAL" {
            mesh.normals.as_ref().map(|normals| {
                let n = normals[i];
                let translate = normal_export_translation(layout, translated, metadata.flip_normal);
                let mut lanes = vec![
                    translate(mirror * n[0]),
                    translate(n[1]),
                    translate(n[2]),
                ];
                if let Some(w) = mesh.float_layers.get("NORMAL.w") {
                    lanes.push(w[i]);
                    AttributeData::Float32(lanes)
                } else {
                    elem.pad_floats(lanes, 0.0)
                }
            })
        } else if name.starts_with("TANGENT") {
            tangent_lanes(mesh, elem, outline, i)
        } else if name.starts_with("BINORMAL") {
            // Untested in the wild; recomputing it from normal and tangent
            // has never been verified against a real dump.
            None
        } else if name.starts_with("BLENDINDICES") {
            let window = blend_window(&sorted_groups, index);
            Some(elem.pad_uints(
                window.iter().map(|&(g, _)| g as u32).collect(),
                0,
            ))
        } else if name.starts_with("BLENDWEIGHT") {
            let window = blend_window(&sorted_groups, index);
            Some(elem.pad_floats(window.iter().map(|&(_, w)| w).collect(), 0.0))
        } else if name.starts_with("TEXCOORD") && elem.is_float() {
            texcoord_lanes(mesh, index, i)
        } else {
            aux_lanes(mesh, elem, i)
        };

        match data {
            Some(data) => {
                vertex.insert(elem.semantic.clone(), data);
            }
            None => {
                unhandled.insert(elem.semantic.clone());
            }
        }
    }
    vertex
}

/// The four-wide slice of sorted group memberships covered by blend
/// semantic index `index`.
fn blend_window(sorted_groups: &[(usize, f32)], index: u32) -> &[(usize, f32)] {
    let start = (index as usize * 4).min(sorted_groups.len());
    let end = (start + 4).min(sorted_groups.len());
    &sorted_groups[start..end]
}

fn color_lanes(mesh: &MeshData, elem: &LayoutElement, i: usize) -> Option<AttributeData> {
    let key = elem.semantic.to_string();
    if let Some(layer) = mesh.color_layers.get(&key) {
        return Some(elem.pad_floats(layer[i].clone(), 0.0));
    }
    // Layers imported by a host that splits alpha off.
    let rgb = mesh.color_layers.get(&format!("{key}.RGB"))?;
    let a = mesh.color_layers.get(&format!("{key}.A"))?;
    let mut lanes: Vec<f32> = rgb[i].iter().copied().take(3).collect();
    lanes.push(a[i].first().copied().unwrap_or(0.0));
    Some(AttributeData::Float32(lanes))
}

fn tangent_lanes(
    mesh: &MeshData,
    elem: &LayoutElement,
    outline: Option<&HashMap<u32, [f32; 3]>>,
    i: usize,
) -> Option<AttributeData> {
    if let Some(over) = outline.and_then(|o| o.get(&(i as u32))) {
        // Outline override keeps the bitangent sign from the stored tangent
        // when present, else +1.
        let sign = mesh.tangents.as_ref().map_or(1.0, |t| t[i].1);
        return Some(elem.pad_floats(over.to_vec(), sign));
    }
    let (tangent, sign) = mesh.tangents.as_ref()?[i];
    Some(elem.pad_floats(tangent.to_vec(), sign))
}

fn texcoord_lanes(mesh: &MeshData, index: u32, i: usize) -> Option<AttributeData> {
    // The importer keys UV layers by the translated semantic.
    let base = Semantic::new("TEXCOORD", index).to_string();
    let mut uvs = Vec::new();
    for suffix in ["xy", "zw"] {
        if let Some(layer) = mesh.uv_layers.get(&format!("{base}.{suffix}")) {
            let uv = &layer.data[i];
            uvs.push(uv[0]);
            uvs.push(if layer.flipped_v { 1.0 - uv[1] } else { uv[1] });
        }
    }
    // 1D and 3D TEXCOORDs: .x only matches nothing above, .z extends an .xy
    // pair handled above.
    for suffix in ["x", "z"] {
        if let Some(layer) = mesh.uv_layers.get(&format!("{base}.{suffix}")) {
            uvs.push(layer.data[i][0]);
        }
    }
    if uvs.is_empty() {
        return None;
    }
    Some(AttributeData::Float32(uvs))
}

/// Unknown semantics come back out of the scalar layers they were stored in.
fn aux_lanes(mesh: &MeshData, elem: &LayoutElement, i: usize) -> Option<AttributeData> {
    let mut floats = Vec::new();
    let mut ints = Vec::new();
    for component in ['x', 'y', 'z', 'w'] {
        let layer_name = format!("{}.{}", elem.semantic, component);
        if let Some(layer) = mesh.int_layers.get(&layer_name) {
            ints.push(layer[i]);
        } else if let Some(layer) = mesh.float_layers.get(&layer_name) {
            floats.push(layer[i]);
        }
    }
    if !ints.is_empty() {
        if elem.format.ends_with("SINT") {
            return Some(AttributeData::Sint(ints));
        }
        return Some(AttributeData::Uint(ints.into_iter().map(|v| v as u32).collect()));
    }
    if !floats.is_empty() {
        return Some(AttributeData::Float32(floats));
    }
    None
}

fn normal_export_translation(
    layout: &InputLayout,
    translated: &Semantic,
    flip: bool,
) -> impl Fn(f32) -> f32 {
    // The source element may sit behind a semantic remap.
    let elem = layout
        .untranslate(translated)
        .or_else(|| layout.get(translated));
    let unorm = elem.is_some_and(|e| e.format.ends_with("_UNORM"));
    let sign = if flip { -1.0 } else { 1.0 };
    move |x: f32| {
        // Scale normal range -1..1 back to UNORM range 0..1.
        if unorm {
            sign * x / 2.0 + 0.5
        } else {
            sign * x
        }
    }
}

/// Writes the full export set: one `.vb<N>` per slot, the `.ib` when the
/// draw call was indexed, and the `.fmt` sidecar.
pub fn write_export(
    output_prefix: &Path,
    vb: &VertexBufferGroup,
    ib: Option<&IndexBuffer>,
    metadata: &DumpMetadata,
) -> Result<()> {
    let strides: BTreeMap<SlotSelector, u32> = metadata
        .strides
        .iter()
        .map(|(&slot, &stride)| (SlotSelector::Slot(slot), stride))
        .collect();

    let mut vb_name = output_prefix.as_os_str().to_owned();
    vb_name.push(".vb");
    vb.write(Path::new(&vb_name), &strides)?;

    if let Some(ib) = ib {
        let mut ib_name = output_prefix.as_os_str().to_owned();
        ib_name.push(".ib");
        let mut out = fs::File::create(Path::new(&ib_name))?;
        ib.write(&mut out)?;
    }

    let mut fmt_name = output_prefix.as_os_str().to_owned();
    fmt_name.push(".fmt");
    let mut out = fs::File::create(Path::new(&fmt_name))?;
    write_fmt_file(&mut out, vb, ib, &strides)?;
    Ok(())
}

/// Re-encodes the vertex records of `vb` into the per-slot binary images
/// without touching the filesystem.
pub fn encode_slots(vb: &VertexBufferGroup, metadata: &DumpMetadata) -> BTreeMap<u32, Vec<u8>> {
    let mut out = BTreeMap::new();
    for (&slot, &stride) in &metadata.strides {
        let mut bytes = Vec::with_capacity(vb.len() * stride as usize);
        for vertex in &vb.vertices {
            bytes.extend(vb.layout.encode(vertex, SlotSelector::Slot(slot), stride));
        }
        out.insert(slot, bytes);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{import_mesh, load_mesh, DumpGroup, ImportOptions};
    use pretty_assertions::assert_eq;

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

    fn import_sample() -> (MeshData, DumpMetadata, Vec<u8>) {
        let dir = tempfile::tempdir().unwrap();
        let vb_path = dir.path().join("000001-vb0=1234abcd.txt");
        let ib_path = dir.path().join("000001-ib=5678ef01.txt");
        std::fs::write(&vb_path, VB0_TXT).unwrap();
        std::fs::write(&ib_path, IB_TXT).unwrap();

        let mut report = Report::new();
        let (vb, ib) = load_mesh(
            &[DumpGroup {
                vb_paths: vec![vb_path],
                ib_path: Some(ib_path),
            }],
            &mut report,
        )
        .unwrap();

        // What the original draw call's slot 0 bytes look like.
        let original = encode_slots(
            &vb,
            &DumpMetadata {
                layout: vb.layout.clone(),
                topology: vb.topology,
                strides: vb.slot_strides(),
                first_vertex: vb.first,
                first_index: 0,
                index_format: None,
                flip_winding: false,
                flip_normal: false,
                flip_mesh: false,
                axis: Default::default(),
            },
        )[&0]
            .clone();

        let (mesh, metadata) =
            import_mesh(vb, ib, &ImportOptions::default(), &mut report).unwrap();
        (mesh, metadata, original)
    }

    #[test]
    fn export_round_trips_original_bytes() {
        let (mesh, metadata, original) = import_sample();
        let mut report = Report::new();
        let (vb, ib) = export_mesh(&mesh, &metadata, None, &mut report).unwrap();

        let slots = encode_slots(&vb, &metadata);
        assert_eq!(slots[&0], original);

        let ib = ib.unwrap();
        assert_eq!(ib.faces, vec![vec![0, 1, 2]]);
        let mut ib_bytes = Vec::new();
        ib.write(&mut ib_bytes).unwrap();
        assert_eq!(ib_bytes, vec![0u8, 0, 1, 0, 2, 0]);
    }

    #[test]
    fn export_round_trips_with_flip_mesh() {
        let dir = tempfile::tempdir().unwrap();
        let vb_path = dir.path().join("000001-vb0=1234abcd.txt");
        let ib_path = dir.path().join("000001-ib=5678ef01.txt");
        std::fs::write(&vb_path, VB0_TXT).unwrap();
        std::fs::write(&ib_path, IB_TXT).unwrap();

        let mut report = Report::new();
        let (vb, ib) = load_mesh(
            &[DumpGroup {
                vb_paths: vec![vb_path],
                ib_path: Some(ib_path),
            }],
            &mut report,
        )
        .unwrap();
        let pristine = vb.clone();
        let options = ImportOptions {
            flip_mesh: true,
            ..ImportOptions::default()
        };
        let (mesh, metadata) = import_mesh(vb, ib, &options, &mut report).unwrap();
        let (exported, ib) = export_mesh(&mesh, &metadata, None, &mut report).unwrap();

        // Mirror and winding flip both undo themselves on the way out.
        assert_eq!(exported.vertices, pristine.vertices);
        assert_eq!(ib.unwrap().faces, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn write_export_emits_buffer_set() {
        let (mesh, metadata, original) = import_sample();
        let mut report = Report::new();
        let (vb, ib) = export_mesh(&mesh, &metadata, None, &mut report).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("mesh");
        write_export(&prefix, &vb, ib.as_ref(), &metadata).unwrap();

        assert_eq!(std::fs::read(dir.path().join("mesh.vb0")).unwrap(), original);
        assert_eq!(std::fs::read(dir.path().join("mesh.ib")).unwrap().len(), 6);
        let fmt = std::fs::read_to_string(dir.path().join("mesh.fmt")).unwrap();
        assert!(fmt.starts_with("vb0 stride: 32\n"));
        assert!(fmt.contains("format: DXGI_FORMAT_R16_UINT"));
    }
}
