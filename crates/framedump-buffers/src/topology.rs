//! Primitive topologies appearing in frame-analysis dumps.

use crate::error::DumpError;
use std::fmt;
use std::str::FromStr;

/// The topologies the reconstruction pipeline knows how to interpret.
///
/// This is a closed enum rather than the dump's raw string so topology
/// handling is exhaustive; line topologies and anything else fail parsing
/// with [`DumpError::UnsupportedTopology`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Topology {
    #[default]
    TriangleList,
    TriangleStrip,
    PointList,
}

impl Topology {
    /// Raw indices consumed per face record in a dump.
    ///
    /// A strip consumes one index per record; the first triangle needs two
    /// extra seed indices (see [`crate::index::IndexBuffer::extra_indices`]).
    pub fn indices_per_face(self) -> usize {
        match self {
            Topology::TriangleList => 3,
            Topology::TriangleStrip => 1,
            Topology::PointList => 1,
        }
    }
}

impl FromStr for Topology {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trianglelist" => Ok(Topology::TriangleList),
            "trianglestrip" => Ok(Topology::TriangleStrip),
            "pointlist" => Ok(Topology::PointList),
            other => Err(DumpError::UnsupportedTopology(other.to_string())),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Topology::TriangleList => "trianglelist",
            Topology::TriangleStrip => "trianglestrip",
            Topology::PointList => "pointlist",
        })
    }
}
