//! Frame-analysis dump file grouping.
//!
//! A frame-analysis directory holds files named like
//! `000012-vb0=3c95f422-vs=....txt`. Everything sharing the surrounding
//! name but differing in the `-vb<slot>=<hash>` / `-ib=<hash>` token belongs
//! to one draw call, and this module turns a user's file selection into
//! [`DumpGroup`]s of related buffers.

use crate::error::{MeshError, Result};
use crate::import::DumpGroup;
use framedump_buffers::Report;
use framedump_falog::{Slot, VbSoMapEntry};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// One occurrence of a `-ib[=<hash>]` or `-vb<slot>[=<hash>]` token inside a
/// filename, byte offsets into the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BufferToken {
    start: usize,
    end: usize,
    has_hash: bool,
}

/// Finds the leftmost buffer token. The token must be followed by a
/// character that cannot extend a lowercase hex hash, so a hash inside a
/// longer hex run never matches partially.
fn buffer_token(name: &str) -> Option<BufferToken> {
    let b = name.as_bytes();
    let is_hex = |c: u8| matches!(c, b'0'..=b'9' | b'a'..=b'f');
    for start in 0..b.len() {
        if b[start] != b'-' {
            continue;
        }
        let rest = &b[start + 1..];
        let after_kind = if rest.starts_with(b"ib") {
            start + 3
        } else if rest.starts_with(b"vb") {
            let mut j = start + 3;
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            if j == start + 3 {
                continue;
            }
            j
        } else {
            continue;
        };
        let mut end = after_kind;
        let mut has_hash = false;
        if b.get(after_kind) == Some(&b'=') {
            let mut j = after_kind + 1;
            while j < b.len() && is_hex(b[j]) {
                j += 1;
            }
            if j > after_kind + 1 {
                has_hash = true;
                end = j;
            }
        }
        match b.get(end) {
            Some(&c) if !is_hex(c) && c != b'=' => {
                return Some(BufferToken { start, end, has_hash });
            }
            _ => {}
        }
    }
    None
}

/// Parses `<drawcall>-vb<slot>=...` from the start of a filename.
fn vb_draw_call_slot(name: &str) -> Option<(u32, u32)> {
    let digits = name.find(|c: char| !c.is_ascii_digit())?;
    if digits == 0 {
        return None;
    }
    let draw_call: u32 = name[..digits].parse().ok()?;
    let rest = name[digits..].strip_prefix("-vb")?;
    let slot_digits = rest.find(|c: char| !c.is_ascii_digit())?;
    if slot_digits == 0 || !rest[slot_digits..].starts_with('=') {
        return None;
    }
    let slot: u32 = rest[..slot_digits].parse().ok()?;
    Some((draw_call, slot))
}

/// Whether `name` is `<prefix><kind><anything><suffix>`, the shape the
/// sibling-buffer expansion looks for.
fn matches_buffer_pattern(name: &str, prefix: &str, kind: &str, suffix: &str) -> bool {
    let Some(rest) = name.strip_prefix(prefix) else {
        return false;
    };
    let Some(rest) = rest.strip_prefix(kind) else {
        return false;
    };
    rest.len() >= suffix.len() && rest.ends_with(suffix)
}

fn list_directory(dirname: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dirname)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Groups a selection of dump files into per-draw-call [`DumpGroup`]s.
///
/// With `load_related`, the selection is first widened to every `.txt` file
/// in the directory carrying the same `-vb<slot>=<hash>` / `-ib=<hash>`
/// token as a selected file, so picking one buffer of a mesh pulls in its
/// other dumps from the frame. Each surviving filename then seeds a group of
/// all sibling vertex buffers plus the draw call's index buffer.
///
/// `so_map` (from
/// [`find_stream_output_vertex_buffers`](framedump_falog::find_stream_output_vertex_buffers))
/// additionally pulls in the pre-skinning vertex buffers of the stream
/// output pass that produced a group's input.
///
/// Log and shader-usage files in the selection are skipped silently; other
/// unrecognized names are reported and skipped so a sloppy select-all still
/// imports everything it can.
pub fn group_dump_files(
    selected: &[PathBuf],
    load_related: bool,
    so_map: Option<&BTreeMap<VbSoMapEntry, VbSoMapEntry>>,
    report: &mut Report,
) -> Result<Vec<DumpGroup>> {
    let dirname = selected
        .first()
        .ok_or(MeshError::NoFilesSelected)?
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let selected_names: Vec<String> = selected
        .iter()
        .filter_map(|p| p.file_name())
        .filter_map(|n| n.to_str())
        .map(str::to_owned)
        .collect();
    let dir_names = list_directory(&dirname)?;

    let mut files: BTreeSet<String> = BTreeSet::new();
    if load_related {
        for name in &selected_names {
            let Some(token) = buffer_token(name) else {
                continue;
            };
            if !token.has_hash {
                continue;
            }
            let token = &name[token.start..token.end];
            files.extend(
                dir_names
                    .iter()
                    .filter(|n| n.contains(token) && n.ends_with(".txt"))
                    .cloned(),
            );
        }
    }
    if files.is_empty() {
        files = selected_names.into_iter().collect();
    }
    if files.is_empty() {
        return Err(MeshError::NoFilesSelected);
    }

    let mut done: BTreeSet<String> = BTreeSet::new();
    let mut groups = Vec::new();
    for filename in &files {
        if done.contains(filename) {
            continue;
        }
        let Some(token) = buffer_token(filename) else {
            let lower = filename.to_lowercase();
            if lower.starts_with("log") || lower == "shaderusage.txt" {
                // User probably selected the whole directory.
                continue;
            }
            report.error(format!(
                "{filename}: filename does not match the vertex/index buffer pattern, \
                 cannot find corresponding buffers"
            ));
            continue;
        };
        if !token.has_hash {
            report.info(format!(
                "{filename}: filename carries no hash, a custom-resource text dump \
                 may be incomplete"
            ));
        }

        let prefix = &filename[..token.start];
        let suffix = &filename[token.end..];
        let ib_names: Vec<&String> = dir_names
            .iter()
            .filter(|n| matches_buffer_pattern(n, prefix, "-ib", suffix))
            .collect();
        let mut vb_names: Vec<String> = dir_names
            .iter()
            .filter(|n| matches_buffer_pattern(n, prefix, "-vb", suffix))
            .cloned()
            .collect();
        done.extend(vb_names.iter().cloned());
        done.extend(ib_names.iter().map(|n| (*n).clone()));

        if let Some(so_map) = so_map {
            let mut so_names: BTreeSet<String> = BTreeSet::new();
            for vb_name in &vb_names {
                let Some((draw_call, slot)) = vb_draw_call_slot(vb_name) else {
                    continue;
                };
                let key = VbSoMapEntry {
                    draw_call,
                    slot: Slot::Index(slot),
                };
                let Some(so) = so_map.get(&key) else {
                    continue;
                };
                let so_prefix = format!("{:06}-vb", so.draw_call);
                let found: Vec<&String> = dir_names
                    .iter()
                    .filter(|n| n.starts_with(&so_prefix) && n.ends_with(".txt"))
                    .collect();
                if found.is_empty() {
                    report.warning(format!(
                        "{so_prefix}*.txt not found, the unposed stream output \
                         pre-skinning buffers will be unavailable"
                    ));
                }
                so_names.extend(found.into_iter().cloned());
            }
            vb_names.extend(so_names);
        }

        if ib_names.len() > 1 {
            return Err(MeshError::ExcessIndexBuffers);
        }
        let ib_path = ib_names.first().map(|n| dirname.join(n));
        if ib_path.is_none() {
            report.warning(format!(
                "{}: no index buffer present, support for this case is experimental",
                vb_names.first().map(String::as_str).unwrap_or(filename)
            ));
        }
        groups.push(DumpGroup {
            vb_paths: vb_names.iter().map(|n| dirname.join(n)).collect(),
            ib_path,
        });
    }
    Ok(groups)
}
