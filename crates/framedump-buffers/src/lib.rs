//! Frame-analysis dump buffer models.
//!
//! Parses the per-draw-call vertex buffer, index buffer and input layout
//! dumps written by a frame-analysis capture (both the human-readable `.txt`
//! form and raw `.buf` + `.fmt` sidecar pairs), and re-encodes them
//! byte-compatibly for injection back into the capture tool.

#![forbid(unsafe_code)]

mod codec;
mod error;
mod fmt_file;
mod index;
mod layout;
mod report;
mod text;
mod topology;
mod vertex;

pub use codec::{format_components, format_size, AttributeData, FormatClass, FormatDesc};
pub use error::{DumpError, Result};
pub use fmt_file::write_fmt_file;
pub use index::{DrawCallUse, IndexBuffer};
pub use layout::{InputLayout, LayoutElement, Semantic, SlotClass, SlotSelector, Vertex};
pub use report::{Report, ReportEntry, Severity};
pub use topology::Topology;
pub use vertex::{ms_float, slot_from_filename, SlotBuffer, VertexBufferGroup};
