//! Parses a text dump, writes the `.fmt` sidecar plus raw buffers, and
//! reinterprets them from the sidecar alone.

use framedump_buffers::{
    write_fmt_file, IndexBuffer, SlotBuffer, SlotSelector, Topology, VertexBufferGroup,
};
use std::collections::BTreeMap;
use std::fs;

const VB0_TXT: &str = "\
byte offset: 0
first vertex: 0
vertex count: 2
stride: 20
element[0]:
  SemanticName: POSITION
  SemanticIndex: 0
  Format: R32G32B32_FLOAT
  InputSlot: 0
  AlignedByteOffset: 0
  InputSlotClass: per-vertex
  InstanceDataStepRate: 0
element[1]:
  SemanticName: TEXCOORD
  SemanticIndex: 0
  Format: R32G32_FLOAT
  InputSlot: 0
  AlignedByteOffset: 12
  InputSlotClass: per-vertex
  InstanceDataStepRate: 0
topology: trianglestrip
vertex-data:

vb0[0]+000 POSITION: 0.5, -1, 2
vb0[0]+012 TEXCOORD: 0, 1

vb0[1]+020 POSITION: 1, 0, 0
vb0[1]+032 TEXCOORD: 1, 1
";

#[test]
fn fmt_sidecar_describes_raw_buffers() {
    let dir = tempfile::tempdir().unwrap();
    let txt = dir.path().join("000001-vb0=cafe1234.txt");
    fs::write(&txt, VB0_TXT).unwrap();
    let group = VertexBufferGroup::from_text_files(&[&txt], true).unwrap();
    assert_eq!(group.topology, Topology::TriangleStrip);

    let strides: BTreeMap<SlotSelector, u32> =
        [(SlotSelector::Slot(0), 20u32)].into_iter().collect();
    let ib = IndexBuffer::new("DXGI_FORMAT_R16_UINT").unwrap();

    // Write the binary buffer and its format sidecar.
    let prefix = dir.path().join("out.vb");
    group.write(&prefix, &strides).unwrap();
    let mut fmt = Vec::new();
    write_fmt_file(&mut fmt, &group, Some(&ib), &strides).unwrap();
    let fmt_text = String::from_utf8(fmt).unwrap();
    assert!(fmt_text.starts_with("vb0 stride: 20\n"));

    // The sidecar alone is enough to reinterpret the raw bytes.
    let mut layout = framedump_buffers::InputLayout::new();
    let mut slot = SlotBuffer::from_text(0, &fmt_text, &mut layout, false).unwrap();
    assert_eq!(slot.stride, 20);
    let bytes = fs::read(dir.path().join("out.vb0")).unwrap();
    slot.parse_binary(&bytes, &layout, false).unwrap();
    assert_eq!(slot.vertices.len(), 2);
    assert_eq!(slot.vertices, group.vertices);
}
