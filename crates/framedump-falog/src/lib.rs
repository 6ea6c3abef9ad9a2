//! Frame-analysis log index.
//!
//! Parses a frame-analysis `log.txt`, tracks which resources were bound to
//! which pipeline slots at the time of each draw call, and answers reverse
//! queries ("which draw calls used this resource, and where").
//!
//! Only the bind calls the importer needs are tracked: `IASetVertexBuffers`
//! and `SOSetTargets`. Everything else in the log is skipped.

#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Lines;
use thiserror::Error;

/// Frame-analysis log errors.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot open frame analysis log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A pipeline slot. Almost always numbered; the depth target slot in render
/// target bind lines is the lone named one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Index(u32),
    Depth,
}

impl Slot {
    fn parse(s: &str) -> Option<Self> {
        if s == "D" {
            return Some(Slot::Depth);
        }
        s.parse().ok().map(Slot::Index)
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Index(n) => write!(f, "{n}"),
            Slot::Depth => f.write_str("D"),
        }
    }
}

/// The slot families the log index tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SlotType {
    VertexBuffer,
    StreamOutput,
}

/// One resource bound to one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceBinding {
    pub slot: Slot,
    pub view_address: Option<u64>,
    pub resource_address: u64,
    pub resource_hash: u64,
}

/// One (draw call, slot) where a resource was bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceUse {
    pub draw_call: u32,
    pub slot_type: SlotType,
    pub slot: Slot,
}

/// Bound slots stored sparsely by draw call.
///
/// Draw calls that change nothing in a slot family have no entry; a query
/// returns the slots as of the most recent draw call that did change them.
#[derive(Debug)]
pub struct SparseSlots {
    by_draw_call: BTreeMap<u32, BTreeMap<Slot, ResourceBinding>>,
    last_draw_call: u32,
}

impl SparseSlots {
    fn new() -> Self {
        let mut by_draw_call = BTreeMap::new();
        by_draw_call.insert(0, BTreeMap::new());
        Self {
            by_draw_call,
            last_draw_call: 0,
        }
    }

    /// The slots bound as of `draw_call`.
    pub fn at(&self, draw_call: u32) -> &BTreeMap<Slot, ResourceBinding> {
        self.by_draw_call
            .range(..=draw_call)
            .next_back()
            .map(|(_, slots)| slots)
            .unwrap_or_else(|| &self.by_draw_call[&0])
    }

    /// Draw calls at or after `draw_call` that changed this slot family.
    pub fn subsequent_draw_calls(&self, draw_call: u32) -> impl Iterator<Item = u32> + '_ {
        self.by_draw_call.range(draw_call..).map(|(&dc, _)| dc)
    }

    /// Draw calls with explicit entries, in order.
    pub fn draw_calls(&self) -> impl Iterator<Item = (u32, &BTreeMap<Slot, ResourceBinding>)> {
        self.by_draw_call.iter().map(|(&dc, slots)| (dc, slots))
    }

    /// Parse-time access: a new draw call starts from a copy of the most
    /// recent bindings.
    fn entry_for(&mut self, draw_call: u32) -> &mut BTreeMap<Slot, ResourceBinding> {
        if draw_call > self.last_draw_call {
            let copy = self.at(self.last_draw_call).clone();
            self.by_draw_call.insert(draw_call, copy);
            self.last_draw_call = draw_call;
        }
        let key = *self
            .by_draw_call
            .range(..=draw_call)
            .next_back()
            .map(|(k, _)| k)
            .unwrap_or(&0);
        self.by_draw_call.get_mut(&key).unwrap_or_else(|| unreachable!())
    }
}

/// Parsed frame-analysis log: bound resource state per draw call plus the
/// reverse resource index.
#[derive(Debug)]
pub struct FrameAnalysisLog {
    /// Highest draw call number seen.
    pub last_draw_call: u32,
    vb: SparseSlots,
    so: SparseSlots,
    resource_index: HashMap<u64, BTreeSet<ResourceUse>>,
}

impl FrameAnalysisLog {
    pub fn parse(text: &str) -> Self {
        let mut log = Self {
            last_draw_call: 0,
            vb: SparseSlots::new(),
            so: SparseSlots::new(),
            resource_index: HashMap::new(),
        };
        let mut lines = text.lines().peekable();
        while let Some(line) = lines.next() {
            let Some((draw_call, remain)) = split_draw_call(line) else {
                continue;
            };
            log.last_draw_call = draw_call;
            if let Some((start_slot, num_buffers)) = parse_ia_set_vertex_buffers(remain) {
                let bindings = log.vb.entry_for(draw_call);
                for i in 0..num_buffers {
                    bindings.remove(&Slot::Index(start_slot + i));
                }
                consume_bindings(
                    &mut lines,
                    bindings,
                    &mut log.resource_index,
                    SlotType::VertexBuffer,
                    draw_call,
                );
            } else if is_so_set_targets(remain) {
                let bindings = log.so.entry_for(draw_call);
                bindings.clear();
                consume_bindings(
                    &mut lines,
                    bindings,
                    &mut log.resource_index,
                    SlotType::StreamOutput,
                    draw_call,
                );
            }
        }
        log
    }

    pub fn slots(&self, slot_type: SlotType) -> &SparseSlots {
        match slot_type {
            SlotType::VertexBuffer => &self.vb,
            SlotType::StreamOutput => &self.so,
        }
    }

    /// Finds every (draw call, slot) where the resource at `address` was
    /// bound, including draw calls where it was merely left bound by an
    /// earlier bind call.
    pub fn find_resource_uses(
        &self,
        address: u64,
        slot_type: Option<SlotType>,
    ) -> BTreeSet<ResourceUse> {
        let mut ret = BTreeSet::new();
        let Some(uses) = self.resource_index.get(&address) else {
            return ret;
        };
        for bound in uses {
            if slot_type.is_some_and(|st| bound.slot_type != st) {
                continue;
            }
            let sparse = self.slots(bound.slot_type);
            let mut unbound_at = None;
            for dc in sparse.subsequent_draw_calls(bound.draw_call) {
                let still_bound = sparse
                    .at(dc)
                    .get(&bound.slot)
                    .is_some_and(|b| b.resource_address == address);
                if !still_bound {
                    unbound_at = Some(dc);
                    break;
                }
            }
            // When never unbound, the resource stayed in the slot until the
            // end of the frame.
            let end = unbound_at.unwrap_or(self.last_draw_call);
            for draw_call in bound.draw_call..end {
                ret.insert(ResourceUse {
                    draw_call,
                    ..*bound
                });
            }
        }
        ret
    }
}

fn split_draw_call(line: &str) -> Option<(u32, &str)> {
    let end = line.find(' ')?;
    let (digits, rest) = line.split_at(end);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((digits.parse().ok()?, &rest[1..]))
}

/// Matches `IASetVertexBuffers(StartSlot:N, NumBuffers:M, ...)`.
fn parse_ia_set_vertex_buffers(remain: &str) -> Option<(u32, u32)> {
    let rest = remain.strip_prefix("IASetVertexBuffers(StartSlot:")?;
    if !remain.trim_end().ends_with(')') {
        return None;
    }
    let (start, rest) = rest.split_once(", NumBuffers:")?;
    let num_end = rest.find(',').unwrap_or(rest.len());
    Some((start.parse().ok()?, rest[..num_end].parse().ok()?))
}

fn is_so_set_targets(remain: &str) -> bool {
    remain.starts_with("SOSetTargets(") && remain.trim_end().ends_with(')')
}

/// Consumes the indented `slot: [view=...] resource=... hash=...` lines that
/// follow a bind call, recording each binding in both directions.
fn consume_bindings(
    lines: &mut Peekable<Lines<'_>>,
    bindings: &mut BTreeMap<Slot, ResourceBinding>,
    resource_index: &mut HashMap<u64, BTreeSet<ResourceUse>>,
    slot_type: SlotType,
    draw_call: u32,
) {
    while let Some(next) = lines.peek() {
        let Some(binding) = parse_resource_line(next) else {
            break;
        };
        lines.next();
        bindings.insert(binding.slot, binding);
        resource_index
            .entry(binding.resource_address)
            .or_default()
            .insert(ResourceUse {
                draw_call,
                slot_type,
                slot: binding.slot,
            });
    }
}

fn parse_resource_line(line: &str) -> Option<ResourceBinding> {
    let trimmed = line.trim_start();
    if trimmed.len() == line.len() {
        // Resource lines are always indented under their bind call.
        return None;
    }
    let (slot_str, rest) = trimmed.split_once(": ")?;
    let slot = Slot::parse(slot_str)?;
    let (view_address, rest) = match rest.strip_prefix("view=0x") {
        Some(rest) => {
            let (hex, rest) = rest.split_once(' ')?;
            (Some(u64::from_str_radix(hex, 16).ok()?), rest)
        }
        None => (None, rest),
    };
    let rest = rest.strip_prefix("resource=0x")?;
    let (address_hex, rest) = rest.split_once(' ')?;
    let resource_address = u64::from_str_radix(address_hex, 16).ok()?;
    let hash_hex = rest.strip_prefix("hash=")?;
    let resource_hash = u64::from_str_radix(hash_hex.trim_end(), 16).ok()?;
    Some(ResourceBinding {
        slot,
        view_address,
        resource_address,
        resource_hash,
    })
}

/// Maps one (draw call, slot) to another, linking a vertex buffer input back
/// to the stream output pass that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VbSoMapEntry {
    pub draw_call: u32,
    pub slot: Slot,
}

/// For every stream output target in the log, finds the draw calls that
/// later consumed it as a vertex buffer input.
pub fn find_stream_output_vertex_buffers(
    log: &FrameAnalysisLog,
) -> BTreeMap<VbSoMapEntry, VbSoMapEntry> {
    let mut vb_so_map = BTreeMap::new();
    for (so_draw_call, bindings) in log.slots(SlotType::StreamOutput).draw_calls() {
        for (&so_slot, so) in bindings {
            for vb_use in log.find_resource_uses(so.resource_address, Some(SlotType::VertexBuffer))
            {
                vb_so_map.insert(
                    VbSoMapEntry {
                        draw_call: vb_use.draw_call,
                        slot: vb_use.slot,
                    },
                    VbSoMapEntry {
                        draw_call: so_draw_call,
                        slot: so_slot,
                    },
                );
            }
        }
    }
    vb_so_map
}

/// Opens the frame-analysis log covering a dump directory.
///
/// A deferred context directory (`ctx-0x...`) has its log next to the parent
/// directory rather than inside it.
pub fn open_frame_analysis_log(dirname: &Path) -> Result<FrameAnalysisLog, LogError> {
    let basename = dirname
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let path = if basename.to_lowercase().starts_with("ctx-0x") {
        dirname.join("..").join(format!("log-0x{}.txt", &basename[6..]))
    } else {
        dirname.join("log.txt")
    };
    let text = fs::read_to_string(&path).map_err(|source| LogError::Open {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "parsed frame analysis log");
    Ok(FrameAnalysisLog::parse(&text))
}
