//! Vertex group maps.
//!
//! A vertex group map is a JSON object mapping group names to the bone
//! indices a particular model expects, used to retarget a mesh rigged for
//! one skeleton onto the blend-index space of another.

use crate::error::Result;
use crate::mesh::VertexGroups;
use framedump_buffers::Report;
use serde::de::Error as _;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Group name to bone index.
pub type VgMap = BTreeMap<String, i64>;

/// Loads a vertex group map from a JSON file.
///
/// With `reverse` the stored object is interpreted as index -> name and
/// inverted, which lets one map serve both directions of a retarget.
pub fn load_vgmap(path: &Path, reverse: bool) -> Result<VgMap> {
    let file = File::open(path)?;
    let map: VgMap = serde_json::from_reader(BufReader::new(file))?;
    if !reverse {
        return Ok(map);
    }
    let mut inverted = VgMap::new();
    for (name, index) in map {
        let bone: i64 = name.parse().map_err(|_| {
            serde_json::Error::custom(format!(
                "reversed map requires numeric keys, found {name:?}"
            ))
        })?;
        inverted.insert(index.to_string(), bone);
    }
    Ok(inverted)
}

/// Applies a vertex group map to a mesh's bone groups.
///
/// `rename` renames each numeric group to the mapped name (creating empty
/// groups for unmatched names, so a retargeted mesh exposes the full
/// skeleton). `cleanup` drops groups the map does not mention, including
/// their weight memberships.
pub fn apply_vgmap(
    groups: &mut VertexGroups,
    vgmap: &VgMap,
    rename: bool,
    cleanup: bool,
    report: &mut Report,
) {
    if rename {
        for (name, index) in vgmap {
            if groups.names.iter().any(|n| n == name) {
                continue;
            }
            let numeric = index.to_string();
            if let Some(pos) = groups.names.iter().position(|n| *n == numeric) {
                groups.names[pos] = name.clone();
            } else {
                groups.names.push(name.clone());
            }
        }
    }
    if cleanup {
        let mut translation: BTreeMap<usize, usize> = BTreeMap::new();
        let mut kept = Vec::new();
        for (i, name) in groups.names.iter().enumerate() {
            if vgmap.contains_key(name) {
                translation.insert(i, kept.len());
                kept.push(name.clone());
            }
        }
        let dropped = groups.names.len() - kept.len();
        if dropped > 0 {
            report.info(format!("removed {dropped} unmapped vertex groups"));
        }
        groups.names = kept;
        for weights in &mut groups.weights {
            *weights = weights
                .iter()
                .filter_map(|&(group, weight)| {
                    translation.get(&group).map(|&g| (g, weight))
                })
                .collect();
        }
    }
    info!(groups = groups.names.len(), "applied vertex group map");
}

/// Extends a map with indices for named groups it does not cover yet.
///
/// Groups with purely numeric names are taken to already be in bone-index
/// space and are skipped. New names are assigned indices above the current
/// maximum, `step` apart, so a modder can interleave additions later.
pub fn update_vgmap(vgmap: &mut VgMap, groups: &VertexGroups, step: i64, report: &mut Report) {
    let mut highest = vgmap.values().copied().max().unwrap_or(-step);
    for name in &groups.names {
        if name.chars().all(|c| c.is_ascii_digit()) && !name.is_empty() {
            continue;
        }
        if vgmap.contains_key(name) {
            continue;
        }
        highest += step;
        vgmap.insert(name.clone(), highest);
        report.info(format!("assigned named vertex group {name} = {highest}"));
    }
}
