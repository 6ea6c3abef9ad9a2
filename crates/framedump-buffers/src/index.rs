//! Index buffer model: text and binary parsing, strip expansion, merging.

use crate::codec::{AttributeData, FormatDesc};
use crate::error::{DumpError, Result};
use crate::text::LineReader;
use crate::topology::Topology;
use std::io::Write;
use tracing::info;

/// Whether the draw call that produced a dump actually used the bound
/// index buffer.
///
/// A dump header always carries a `byte offset:` line; `first index` and
/// `index count` only follow it for indexed draw calls. A file with no
/// `byte offset:` line at all is a format sidecar from a previous export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCallUse {
    /// Loaded from a `.fmt` file, not a frame-analysis dump.
    FmtFile,
    /// Frame-analysis dump of a non-indexed draw call.
    NotUsed,
    /// Frame-analysis dump of an indexed draw call.
    Used,
}

#[derive(Debug, Clone)]
pub struct IndexBuffer {
    pub faces: Vec<Vec<u32>>,
    pub first: u32,
    pub index_count: u32,
    /// The index format string exactly as it appeared in the source file.
    pub format: String,
    desc: FormatDesc,
    pub offset: u64,
    pub topology: Topology,
    pub used_in_drawcall: DrawCallUse,
}

impl IndexBuffer {
    /// An empty buffer of the given index format, for building an export.
    pub fn new(format: &str) -> Result<Self> {
        Ok(Self {
            faces: Vec::new(),
            first: 0,
            index_count: 0,
            format: format.to_string(),
            desc: FormatDesc::parse(format)?,
            offset: 0,
            topology: Topology::TriangleList,
            used_in_drawcall: DrawCallUse::FmtFile,
        })
    }

    /// Parses an `ib.txt` dump or a `.fmt` index header.
    pub fn from_text(text: &str, load_indices: bool) -> Result<Self> {
        // Placeholder format; dumps always carry a format: line.
        let mut ib = Self::new("R32_UINT")?;

        let mut lines = LineReader::new(text);
        while let Some(line) = lines.next() {
            if let Some(v) = line.strip_prefix("byte offset:") {
                ib.offset = parse_num("byte offset", v)?;
                ib.used_in_drawcall = DrawCallUse::NotUsed;
            } else if let Some(v) = line.strip_prefix("first index:") {
                ib.first = parse_num("first index", v)?;
                ib.used_in_drawcall = DrawCallUse::Used;
            } else if let Some(v) = line.strip_prefix("index count:") {
                ib.index_count = parse_num("index count", v)?;
                ib.used_in_drawcall = DrawCallUse::Used;
            } else if let Some(v) = line.strip_prefix("topology:") {
                ib.topology = v.trim().parse()?;
            } else if let Some(v) = line.strip_prefix("format:") {
                ib.format = v.trim().to_string();
                ib.desc = FormatDesc::parse(&ib.format)?;
            } else if line.is_empty() {
                if !load_indices {
                    return Ok(ib);
                }
                ib.parse_index_data(&mut lines)?;
            }
        }
        // Without index data there is nothing to validate the declared
        // count against; a header-only file may also end without the blank
        // line that precedes index data.
        if load_indices && ib.used_in_drawcall != DrawCallUse::NotUsed {
            ib.validate_count()?;
        }
        Ok(ib)
    }

    fn parse_index_data(&mut self, lines: &mut LineReader<'_>) -> Result<()> {
        let per_face = self.topology.indices_per_face();
        for line in std::iter::from_fn(|| lines.next()) {
            if line.is_empty() {
                continue;
            }
            let face: std::result::Result<Vec<u32>, _> =
                line.split_whitespace().map(str::parse).collect();
            let face = face.map_err(|_| DumpError::InvalidNumber {
                field: "index-data",
                value: line.to_string(),
            })?;
            if face.len() != per_face {
                return Err(DumpError::IndexCountMismatch {
                    declared: per_face,
                    parsed: face.len(),
                });
            }
            self.faces.push(face);
        }
        self.expand_strips()
    }

    /// Decodes raw indices from an `ib.buf` dump.
    ///
    /// Like vertex buffers, the declared index count is disregarded unless
    /// `use_drawcall_range` is set, since the binary file may hold the whole
    /// buffer while the text sidecar describes a partial dump.
    pub fn parse_binary(&mut self, bytes: &[u8], use_drawcall_range: bool) -> Result<()> {
        let stride = self.desc.byte_size();
        let mut pos = self.offset as usize;
        if use_drawcall_range {
            pos += self.first as usize * stride;
        } else {
            self.first = 0;
        }

        let per_face = self.topology.indices_per_face();
        let mut face = Vec::with_capacity(per_face);
        let mut i = 0u32;
        while pos + stride <= bytes.len() {
            if use_drawcall_range && i == self.index_count {
                break;
            }
            let index = self.desc.decode(&bytes[pos..pos + stride]);
            face.push(index.lane_i64(0) as u32);
            if face.len() == per_face {
                self.faces.push(std::mem::take(&mut face));
            }
            pos += stride;
            i += 1;
        }
        if !face.is_empty() {
            return Err(DumpError::TruncatedIndexData);
        }
        self.expand_strips()?;

        if use_drawcall_range {
            self.validate_count()?;
        } else {
            self.index_count = self.logical_index_count() as u32;
        }
        Ok(())
    }

    pub fn append(&mut self, face: Vec<u32>) {
        self.index_count += face.len() as u32;
        self.faces.push(face);
    }

    /// Converts strip-ordered single indices into explicit triangles.
    ///
    /// Every second face swaps its last two vertices so all faces keep the
    /// same orientation.
    fn expand_strips(&mut self) -> Result<()> {
        if self.topology != Topology::TriangleStrip {
            return Ok(());
        }
        let strip: Vec<u32> = self.faces.iter().map(|f| f[0]).collect();
        if !strip.is_empty() && strip.len() < 3 {
            return Err(DumpError::DegenerateStrip);
        }
        self.faces = (2..strip.len())
            .map(|i| {
                if i % 2 == 1 {
                    vec![strip[i - 2], strip[i], strip[i - 1]]
                } else {
                    vec![strip[i - 2], strip[i - 1], strip[i]]
                }
            })
            .collect();
        Ok(())
    }

    /// Merges another buffer covering a later draw call of the same buffer.
    pub fn merge(&mut self, other: Self) -> Result<()> {
        if self.format != other.format {
            return Err(DumpError::MergeConflict(
                "index buffers have different formats, only the same buffer split across draw calls can be merged",
            ));
        }
        self.first = self.first.min(other.first);
        self.index_count += other.index_count;
        self.faces.extend(other.faces);
        Ok(())
    }

    /// Encodes every face back to binary.
    pub fn write(&self, output: &mut impl Write) -> Result<()> {
        for face in &self.faces {
            let lanes = AttributeData::Uint(face.clone());
            output.write_all(&self.desc.encode(&lanes))?;
        }
        info!(indices = self.logical_index_count(), "wrote index buffer");
        Ok(())
    }

    /// Indices consumed per stored face. Strip faces hold one index each
    /// until expansion; expanded strip triangles still count as one, with
    /// [`extra_indices`] covering the first triangle.
    ///
    /// [`extra_indices`]: Self::extra_indices
    pub fn indices_per_face(&self) -> usize {
        self.topology.indices_per_face()
    }

    /// Leading indices not accounted for per-face (2 for a non-empty strip).
    pub fn extra_indices(&self) -> usize {
        if !self.faces.is_empty() && self.topology == Topology::TriangleStrip {
            2
        } else {
            0
        }
    }

    /// The index count the stored faces are equivalent to.
    pub fn logical_index_count(&self) -> usize {
        self.faces.len() * self.indices_per_face() + self.extra_indices()
    }

    fn validate_count(&self) -> Result<()> {
        let parsed = self.logical_index_count();
        if parsed != self.index_count as usize {
            return Err(DumpError::IndexCountMismatch {
                declared: self.index_count as usize,
                parsed,
            });
        }
        Ok(())
    }
}

fn parse_num<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| DumpError::InvalidNumber {
        field,
        value: value.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const IB_TXT: &str = "\
byte offset: 0
first index: 0
index count: 6
topology: trianglelist
format: DXGI_FORMAT_R16_UINT
offset: 0

0 1 2
2 1 3
";

    #[test]
    fn parses_indexed_drawcall_dump() {
        let ib = IndexBuffer::from_text(IB_TXT, true).unwrap();
        assert_eq!(ib.used_in_drawcall, DrawCallUse::Used);
        assert_eq!(ib.faces, vec![vec![0, 1, 2], vec![2, 1, 3]]);
        assert_eq!(ib.index_count, 6);
        assert_eq!(ib.format, "DXGI_FORMAT_R16_UINT");
    }

    #[test]
    fn non_indexed_drawcall_has_no_first_or_count() {
        let text = "\
byte offset: 0
topology: trianglelist
format: DXGI_FORMAT_R16_UINT
";
        let ib = IndexBuffer::from_text(text, true).unwrap();
        assert_eq!(ib.used_in_drawcall, DrawCallUse::NotUsed);
        assert!(ib.faces.is_empty());
    }

    #[test]
    fn fmt_file_has_no_byte_offset() {
        let text = "\
topology: trianglelist
format: DXGI_FORMAT_R32_UINT
";
        let ib = IndexBuffer::from_text(text, true).unwrap();
        assert_eq!(ib.used_in_drawcall, DrawCallUse::FmtFile);
    }

    #[test]
    fn declared_count_mismatch_is_fatal() {
        let text = IB_TXT.replace("index count: 6", "index count: 7");
        assert!(matches!(
            IndexBuffer::from_text(&text, true),
            Err(DumpError::IndexCountMismatch { declared: 7, parsed: 6 })
        ));
    }

    #[test]
    fn strip_expansion_alternates_winding() {
        let text = "\
byte offset: 0
first index: 0
index count: 5
topology: trianglestrip
format: DXGI_FORMAT_R16_UINT

0
1
2
3
4
";
        let ib = IndexBuffer::from_text(text, true).unwrap();
        assert_eq!(
            ib.faces,
            vec![vec![0, 1, 2], vec![1, 3, 2], vec![2, 3, 4]]
        );
        assert_eq!(ib.logical_index_count(), 5);
        assert_eq!(ib.extra_indices(), 2);
    }

    #[test]
    fn two_index_strip_is_degenerate() {
        let text = "\
byte offset: 0
first index: 0
index count: 2
topology: trianglestrip
format: DXGI_FORMAT_R16_UINT

0
1
";
        assert!(matches!(
            IndexBuffer::from_text(text, true),
            Err(DumpError::DegenerateStrip)
        ));
    }

    #[test]
    fn header_only_parse_skips_count_validation() {
        // A sidecar can end right after the header, without the blank line
        // that would precede index data.
        let header = "\
byte offset: 0
first index: 0
index count: 6
topology: trianglelist
format: DXGI_FORMAT_R16_UINT
";
        let ib = IndexBuffer::from_text(header, false).unwrap();
        assert_eq!(ib.used_in_drawcall, DrawCallUse::Used);
        assert_eq!(ib.index_count, 6);
        assert!(ib.faces.is_empty());
    }

    #[test]
    fn binary_roundtrip_r16() {
        let ib = IndexBuffer::from_text(IB_TXT, true).unwrap();
        let mut bytes = Vec::new();
        ib.write(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 6 * 2);

        let header = "\
byte offset: 0
first index: 0
index count: 6
topology: trianglelist
format: DXGI_FORMAT_R16_UINT
";
        let mut reparsed = IndexBuffer::from_text(header, false).unwrap();
        reparsed.parse_binary(&bytes, true).unwrap();
        assert_eq!(reparsed.faces, ib.faces);
    }

    #[test]
    fn binary_parse_ignores_declared_count_without_range() {
        let header = "\
byte offset: 0
topology: trianglelist
format: DXGI_FORMAT_R32_UINT
";
        let mut ib = IndexBuffer::from_text(header, false).unwrap();
        let bytes: Vec<u8> = (0u32..9).flat_map(u32::to_le_bytes).collect();
        ib.parse_binary(&bytes, false).unwrap();
        assert_eq!(ib.faces.len(), 3);
        assert_eq!(ib.index_count, 9);
    }

    #[test]
    fn merge_takes_min_first_and_sums_counts() {
        let mut a = IndexBuffer::from_text(IB_TXT, true).unwrap();
        let mut b = IndexBuffer::from_text(IB_TXT, true).unwrap();
        b.first = 6;
        a.first = 12;
        a.merge(b).unwrap();
        assert_eq!(a.first, 6);
        assert_eq!(a.index_count, 12);
        assert_eq!(a.faces.len(), 4);

        let c = IndexBuffer::new("DXGI_FORMAT_R32_UINT").unwrap();
        assert!(matches!(a.merge(c), Err(DumpError::MergeConflict(_))));
    }
}
