use framedump_buffers::DumpError;
use framedump_falog::LogError;
use std::io;
use thiserror::Error;

/// Errors surfaced while reconstructing or re-encoding a mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error(transparent)]
    Dump(#[from] DumpError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error("cannot parse vertex group map: {0}")]
    VgMap(#[from] serde_json::Error),

    #[error("dump group contains more than one index buffer")]
    ExcessIndexBuffers,

    #[error("no buffer files selected")]
    NoFilesSelected,

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, MeshError>;
