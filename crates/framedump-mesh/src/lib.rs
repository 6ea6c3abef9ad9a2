//! Mesh reconstruction from frame-analysis dumps.
//!
//! Builds on [`framedump_buffers`] to turn the captured draw-call state of a
//! frame-analysis dump into a renderer-agnostic [`MeshData`], and re-encodes
//! an edited mesh back into the original byte layout. Also covers the
//! surrounding workflow: grouping dump files by draw call, joining stream
//! output pre-skinning passes via the frame-analysis log, vertex group
//! retargeting and outline tangent generation.

#![forbid(unsafe_code)]

mod error;
mod export;
mod import;
mod mesh;
mod outline;
mod paths;
mod vgmap;

pub use error::{MeshError, Result};
pub use export::{encode_slots, export_mesh, write_export};
pub use import::{import_mesh, load_mesh, load_mesh_binary, DumpGroup, ImportOptions};
pub use mesh::{AxisConvention, DumpMetadata, MeshData, UvLayer, VertexGroups};
pub use outline::compute_outline_tangents;
pub use paths::group_dump_files;
pub use vgmap::{apply_vgmap, load_vgmap, update_vgmap, VgMap};
