use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the buffer parsing/encoding code.
pub type Result<T> = std::result::Result<T, DumpError>;

/// Unified error type for frame-dump buffer parsing and encoding.
///
/// Every variant is fatal for the mesh (or merge) being processed; batch
/// callers catch per-group and continue with the next file group. Advisory
/// findings never travel through this type — they go through
/// [`crate::report::Report`] instead.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("file uses an unsupported DXGI format: {format}")]
    UnsupportedFormat { format: String },

    #[error("malformed layout element: expected `{expected}` field, found {found:?}")]
    MalformedLayout {
        expected: &'static str,
        found: String,
    },

    #[error("input layouts using `AlignedByteOffset: append` are not yet supported")]
    AppendOffsetUnsupported,

    #[error("topology {0:?} is not yet supported")]
    UnsupportedTopology(String),

    #[error("cannot merge buffers split across draw calls: {0}")]
    MergeConflict(&'static str),

    #[error("cannot determine vertex buffer slot from filename {}", path.display())]
    FilenamePattern { path: PathBuf },

    #[error("index count mismatch: header declared {declared}, parsed {parsed}")]
    IndexCountMismatch { declared: usize, parsed: usize },

    #[error("vertex count mismatch: header declared {declared}, parsed {parsed}")]
    VertexCountMismatch { declared: usize, parsed: usize },

    #[error("index buffers on point list topologies are only supported as the identity enumeration")]
    PointListIndexBuffer,

    #[error("truncated index data: partial face at end of buffer")]
    TruncatedIndexData,

    #[error("invalid {field} value {value:?}")]
    InvalidNumber {
        field: &'static str,
        value: String,
    },

    #[error("flipping winding order is not implemented for {0}")]
    WindingFlipUnsupported(&'static str),

    #[error("insufficient vertices in triangle strip")]
    DegenerateStrip,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
