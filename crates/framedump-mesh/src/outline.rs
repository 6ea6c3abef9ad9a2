//! Outline tangent generation.
//!
//! Toon outlines extrude along the tangent channel, so hard edges split
//! across duplicated vertices leave gaps in the outline. For vertices whose
//! surrounding faces form a closed, well-connected fan it is safe to replace
//! the tangent with the blended normal of all co-located vertices; this
//! module decides which vertices qualify and computes the blend.

use crate::mesh::MeshData;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Vertices sharing an identical position, unified so faces that meet at a
/// split vertex still count as connected.
fn same_vertex_map(positions: &[[f32; 3]]) -> HashMap<u32, BTreeSet<u32>> {
    let mut by_pos: HashMap<[u32; 3], BTreeSet<u32>> = HashMap::new();
    for (i, p) in positions.iter().enumerate() {
        let key = [p[0].to_bits(), p[1].to_bits(), p[2].to_bits()];
        by_pos.entry(key).or_default().insert(i as u32);
    }
    let mut map = HashMap::new();
    for group in by_pos.into_values() {
        for &v in &group {
            map.insert(v, group.clone());
        }
    }
    map
}

/// Prunes connection-graph nodes with fewer than two surviving connections
/// until the graph is stable. Returns whether at least three well-connected
/// nodes remain.
fn prune_connections(mut graph: HashMap<u32, HashSet<u32>>) -> bool {
    loop {
        let keys: HashSet<u32> = graph.keys().copied().collect();
        let Some(&weak) = graph
            .iter()
            .find(|(_, conns)| conns.intersection(&keys).count() < 2)
            .map(|(k, _)| k)
        else {
            return true;
        };
        graph.remove(&weak);
        if graph.len() < 3 {
            return false;
        }
    }
}

/// Whether the faces around one vertex enclose it well enough to blend.
///
/// The graph nodes are the faces' other vertices outside the co-located
/// set `vg_set`; edges connect vertices appearing in the same face, plus
/// bridges through co-located duplicates.
fn faces_enclose_vertex(
    connected_faces: &[[u32; 3]],
    vg_set: &BTreeSet<u32>,
    same_vertex: &HashMap<u32, BTreeSet<u32>>,
) -> bool {
    let mut connections: HashMap<u32, Vec<u32>> = HashMap::new();
    for face in connected_faces {
        let outside: Vec<u32> = face.iter().copied().filter(|v| !vg_set.contains(v)).collect();
        if outside.len() > 1 {
            for &point in &outside {
                connections
                    .entry(point)
                    .or_default()
                    .extend(outside.iter().copied().filter(|&x| x != point));
            }
        }
    }

    // Bridge connections through co-located duplicates of connected points.
    let keys: HashSet<u32> = connections.keys().copied().collect();
    let mut bridges: HashMap<u32, Vec<u32>> = HashMap::new();
    for (&entry, value) in &connections {
        for &val in value {
            let Some(twins) = same_vertex.get(&val) else {
                continue;
            };
            for &twin in twins {
                if twin != val && keys.contains(&twin) {
                    bridges.entry(entry).or_default().push(twin);
                }
            }
        }
    }
    for (key, value) in bridges {
        for val in value {
            connections.entry(val).or_default().push(key);
            connections.entry(key).or_default().push(val);
        }
    }

    // Two-way paths only.
    let graph: HashMap<u32, HashSet<u32>> = connections
        .into_iter()
        .filter(|(_, v)| v.len() > 1)
        .map(|(k, v)| (k, v.into_iter().collect()))
        .collect();
    graph.len() >= 3 && prune_connections(graph)
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len == 0.0 {
        [0.0, 0.0, 0.0]
    } else {
        [v[0] / len, v[1] / len, v[2] / len]
    }
}

/// Computes per-vertex tangent overrides for outline extrusion.
///
/// For every vertex whose surrounding face fan passes
/// [`faces_enclose_vertex`], the override is the normalized sum of the
/// normals of all co-located vertices, giving every duplicate the same
/// extrusion direction.
pub fn compute_outline_tangents(mesh: &MeshData) -> HashMap<u32, [f32; 3]> {
    let mut overrides = HashMap::new();
    let Some(normals) = &mesh.normals else {
        return overrides;
    };
    let same_vertex = same_vertex_map(&mesh.positions);

    let mut faces_by_vertex: HashMap<u32, Vec<[u32; 3]>> = HashMap::new();
    for face in &mesh.faces {
        for &v in face {
            faces_by_vertex.entry(v).or_default().push(*face);
        }
    }

    for (&vertex, twins) in &same_vertex {
        // Every face touching any co-located duplicate is part of the fan.
        let mut connected_faces: Vec<[u32; 3]> = Vec::new();
        for &twin in twins {
            if let Some(faces) = faces_by_vertex.get(&twin) {
                connected_faces.extend_from_slice(faces);
            }
        }
        if connected_faces.is_empty() {
            continue;
        }
        if !faces_enclose_vertex(&connected_faces, twins, &same_vertex) {
            continue;
        }
        let mut sum = [0.0f32; 3];
        for &twin in twins {
            let n = normals[twin as usize];
            sum = [sum[0] + n[0], sum[1] + n[1], sum[2] + n[2]];
        }
        overrides.insert(vertex, normalize(sum));
    }
    overrides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prune_keeps_a_cycle() {
        let mut graph: HashMap<u32, HashSet<u32>> = HashMap::new();
        for (a, b, c) in [(0u32, 1u32, 2u32), (1, 2, 0), (2, 0, 1)] {
            graph.insert(a, [b, c].into_iter().collect());
        }
        assert!(prune_connections(graph));
    }

    #[test]
    fn prune_rejects_a_chain() {
        // 0 - 1 - 2: the endpoints only connect once each.
        let mut graph: HashMap<u32, HashSet<u32>> = HashMap::new();
        graph.insert(0, [1u32].into_iter().collect());
        graph.insert(1, [0u32, 2].into_iter().collect());
        graph.insert(2, [1u32].into_iter().collect());
        assert!(!prune_connections(graph));
    }

    #[test]
    fn enclosed_apex_gets_blended_tangent() {
        // A pyramid apex (vertex 0) surrounded by a closed fan over the base
        // square 1-2-3-4.
        let mut mesh = MeshData::default();
        mesh.positions = vec![
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, -1.0, 0.0],
        ];
        mesh.normals = Some(vec![[0.0, 0.0, 1.0]; 5]);
        mesh.faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];

        let overrides = compute_outline_tangents(&mesh);
        assert_eq!(overrides.get(&0), Some(&[0.0, 0.0, 1.0]));
    }

    #[test]
    fn boundary_vertex_is_left_alone() {
        // A single triangle: no vertex is enclosed.
        let mut mesh = MeshData::default();
        mesh.positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        mesh.normals = Some(vec![[0.0, 0.0, 1.0]; 3]);
        mesh.faces = vec![[0, 1, 2]];
        assert!(compute_outline_tangents(&mesh).is_empty());
    }
}
