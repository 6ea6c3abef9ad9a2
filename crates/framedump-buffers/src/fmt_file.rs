//! `.fmt` sidecar output: the stride/topology/format header plus the full
//! input layout, enough to reinterpret a raw `.vb`/`.ib` pair later.

use crate::error::Result;
use crate::index::IndexBuffer;
use crate::layout::SlotSelector;
use crate::vertex::VertexBufferGroup;
use std::collections::BTreeMap;
use std::io::Write;

/// Writes the format sidecar for an exported buffer set.
///
/// Numbered selectors produce `vbN stride:` lines; the `All` selector is the
/// single-buffer `stride:` form from older flat exports.
pub fn write_fmt_file(
    f: &mut impl Write,
    vb: &VertexBufferGroup,
    ib: Option<&IndexBuffer>,
    strides: &BTreeMap<SlotSelector, u32>,
) -> Result<()> {
    for (&selector, &stride) in strides {
        match selector {
            SlotSelector::Slot(n) => writeln!(f, "vb{n} stride: {stride}")?,
            SlotSelector::All => writeln!(f, "stride: {stride}")?,
        }
    }
    writeln!(f, "topology: {}", vb.topology)?;
    if let Some(ib) = ib {
        writeln!(f, "format: {}", ib.format)?;
    }
    write!(f, "{}", vb.layout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{InputLayout, LayoutElement, Semantic, SlotClass};
    use crate::topology::Topology;
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_per_slot_strides_and_layout() {
        let mut vb = VertexBufferGroup::new(Topology::TriangleList);
        let mut layout = InputLayout::new();
        layout.push(
            LayoutElement::new(
                Semantic::new("POSITION", 0),
                "R32G32B32_FLOAT",
                0,
                0,
                SlotClass::PerVertex,
                0,
            )
            .unwrap(),
        );
        vb.layout = layout;

        let ib = IndexBuffer::new("DXGI_FORMAT_R16_UINT").unwrap();
        let strides: BTreeMap<SlotSelector, u32> =
            [(SlotSelector::Slot(0), 12u32)].into_iter().collect();

        let mut out = Vec::new();
        write_fmt_file(&mut out, &vb, Some(&ib), &strides).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\
vb0 stride: 12
topology: trianglelist
format: DXGI_FORMAT_R16_UINT
element[0]:
  SemanticName: POSITION
  SemanticIndex: 0
  Format: R32G32B32_FLOAT
  InputSlot: 0
  AlignedByteOffset: 0
  InputSlotClass: per-vertex
  InstanceDataStepRate: 0
"
        );
    }
}
