//! Input layout model: the ordered set of vertex attribute descriptions
//! shared by every slot of a vertex buffer group.
//!
//! The text schema is positionally rigid — each `element[i]:` block carries
//! its fields in a fixed order, and the parser rejects anything out of
//! place rather than treating the block as a free-form key/value bag.

use crate::codec::{AttributeData, FormatDesc};
use crate::error::{DumpError, Result};
use crate::report::Report;
use crate::text::LineReader;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// A semantic role plus its index (`TEXCOORD` + 1 -> `TEXCOORD1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Semantic {
    pub name: String,
    pub index: u32,
}

impl Semantic {
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }

    /// Splits a combined `NAMEn` string back into name + index
    /// (`TEXCOORD1` -> `TEXCOORD`/1, `POSITION` -> `POSITION`/0).
    pub fn parse(combined: &str) -> Self {
        let digits = combined
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .count();
        if digits == 0 || digits == combined.len() {
            return Self::new(combined, 0);
        }
        let (name, index) = combined.split_at(combined.len() - digits);
        Self::new(name, index.parse().unwrap_or(0))
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 0 {
            f.write_str(&self.name)
        } else {
            write!(f, "{}{}", self.name, self.index)
        }
    }
}

/// How a slot's data advances: once per vertex or once per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotClass {
    PerVertex,
    PerInstance,
}

impl SlotClass {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "per-vertex" => Ok(SlotClass::PerVertex),
            "per-instance" => Ok(SlotClass::PerInstance),
            other => Err(DumpError::MalformedLayout {
                expected: "InputSlotClass",
                found: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SlotClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SlotClass::PerVertex => "per-vertex",
            SlotClass::PerInstance => "per-instance",
        })
    }
}

/// Selects which slots an encode/write operation covers.
///
/// Frame-analysis dumps use one file per numbered slot; previously exported
/// flat `.vb` files carry every slot interleaved, which is the `All` case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SlotSelector {
    All,
    Slot(u32),
}

impl fmt::Display for SlotSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotSelector::All => Ok(()),
            SlotSelector::Slot(n) => write!(f, "{n}"),
        }
    }
}

/// One decoded vertex: semantic -> numeric lanes.
pub type Vertex = BTreeMap<Semantic, AttributeData>;

/// One vertex attribute description from an input layout.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    pub semantic: Semantic,
    /// Remap target recorded by [`InputLayout::apply_remap`] or loaded from a
    /// previously exported layout.
    pub remapped: Option<Semantic>,
    /// The DXGI format string exactly as it appeared in the source file;
    /// preserved so serialization is byte-identical.
    pub format: String,
    pub desc: FormatDesc,
    pub input_slot: u32,
    pub aligned_byte_offset: u32,
    pub slot_class: SlotClass,
    pub instance_data_step_rate: u32,
    /// Set by [`InputLayout::flag_invalid`]: a later element aliased this
    /// element's (slot, offset).
    pub reused_offset: bool,
    /// Set by [`InputLayout::flag_invalid`]: excluded from vertex decode.
    pub invalid: bool,
}

impl PartialEq for LayoutElement {
    /// Descriptor equality only: remap assignments and invalid flags are
    /// bookkeeping, not part of the layout identity used by merge checks.
    fn eq(&self, other: &Self) -> bool {
        self.semantic == other.semantic
            && self.format == other.format
            && self.input_slot == other.input_slot
            && self.aligned_byte_offset == other.aligned_byte_offset
            && self.slot_class == other.slot_class
            && self.instance_data_step_rate == other.instance_data_step_rate
    }
}

impl LayoutElement {
    pub fn new(
        semantic: Semantic,
        format: impl Into<String>,
        input_slot: u32,
        aligned_byte_offset: u32,
        slot_class: SlotClass,
        instance_data_step_rate: u32,
    ) -> Result<Self> {
        let format = format.into();
        let desc = FormatDesc::parse(&format)?;
        Ok(Self {
            semantic,
            remapped: None,
            format,
            desc,
            input_slot,
            aligned_byte_offset,
            slot_class,
            instance_data_step_rate,
            reused_offset: false,
            invalid: false,
        })
    }

    /// Parses one element block body (the lines following `element[i]:`).
    pub(crate) fn from_lines(lines: &mut LineReader<'_>) -> Result<Self> {
        let semantic_name = next_field(lines, "SemanticName")?;
        let semantic_index = parse_u32("SemanticIndex", next_field(lines, "SemanticIndex")?)?;

        let (remap_name, leftover) = next_optional(lines, "RemappedSemanticName");
        let remapped = match remap_name {
            Some(name) => {
                let index =
                    parse_u32("RemappedSemanticIndex", next_field(lines, "RemappedSemanticIndex")?)?;
                Some(Semantic::new(name, index))
            }
            None => None,
        };

        let format = match leftover {
            Some(line) => field_value(line, "Format")?,
            None => next_field(lines, "Format")?,
        };
        let desc = FormatDesc::parse(format)?;

        let input_slot = parse_u32("InputSlot", next_field(lines, "InputSlot")?)?;

        let offset = next_field(lines, "AlignedByteOffset")?;
        if offset == "append" {
            return Err(DumpError::AppendOffsetUnsupported);
        }
        let aligned_byte_offset = parse_u32("AlignedByteOffset", offset)?;

        let slot_class = SlotClass::parse(next_field(lines, "InputSlotClass")?)?;
        let instance_data_step_rate =
            parse_u32("InstanceDataStepRate", next_field(lines, "InstanceDataStepRate")?)?;

        Ok(Self {
            semantic: Semantic::new(semantic_name, semantic_index),
            remapped,
            format: format.to_string(),
            desc,
            input_slot,
            aligned_byte_offset,
            slot_class,
            instance_data_step_rate,
            reused_offset: false,
            invalid: false,
        })
    }

    pub fn components(&self) -> usize {
        self.desc.components as usize
    }

    pub fn byte_size(&self) -> usize {
        self.desc.byte_size()
    }

    pub fn is_float(&self) -> bool {
        self.desc.class.is_float()
    }

    pub fn is_int(&self) -> bool {
        self.desc.class.is_int()
    }

    /// Pads (or clips) float lanes to this element's component count.
    pub fn pad_floats(&self, mut v: Vec<f32>, fill: f32) -> AttributeData {
        v.truncate(self.components());
        v.resize(self.components(), fill);
        AttributeData::Float32(v)
    }

    /// Pads (or clips) unsigned integer lanes to this element's component count.
    pub fn pad_uints(&self, mut v: Vec<u32>, fill: u32) -> AttributeData {
        v.truncate(self.components());
        v.resize(self.components(), fill);
        AttributeData::Uint(v)
    }

    pub fn encode(&self, data: &AttributeData) -> Vec<u8> {
        self.desc.encode(data)
    }

    pub fn decode(&self, data: &[u8]) -> AttributeData {
        self.desc.decode(data)
    }

    fn to_text(&self, out: &mut String) {
        use std::fmt::Write;
        writeln!(out, "  SemanticName: {}", self.semantic.name).unwrap();
        writeln!(out, "  SemanticIndex: {}", self.semantic.index).unwrap();
        if let Some(remap) = &self.remapped {
            writeln!(out, "  RemappedSemanticName: {}", remap.name).unwrap();
            writeln!(out, "  RemappedSemanticIndex: {}", remap.index).unwrap();
        }
        writeln!(out, "  Format: {}", self.format).unwrap();
        writeln!(out, "  InputSlot: {}", self.input_slot).unwrap();
        writeln!(out, "  AlignedByteOffset: {}", self.aligned_byte_offset).unwrap();
        writeln!(out, "  InputSlotClass: {}", self.slot_class).unwrap();
        writeln!(out, "  InstanceDataStepRate: {}", self.instance_data_step_rate).unwrap();
    }
}

fn field_value<'a>(line: &'a str, field: &'static str) -> Result<&'a str> {
    line.strip_prefix(field)
        .and_then(|rest| rest.strip_prefix(": "))
        .ok_or_else(|| DumpError::MalformedLayout {
            expected: field,
            found: line.to_string(),
        })
}

fn next_field<'a>(lines: &mut LineReader<'a>, field: &'static str) -> Result<&'a str> {
    let line = lines.next().ok_or(DumpError::MalformedLayout {
        expected: field,
        found: String::from("<end of file>"),
    })?;
    field_value(line, field)
}

/// Like [`next_field`] but tolerates the field being absent: returns the
/// value when present, otherwise hands back the non-matching line so the
/// caller can re-interpret it.
fn next_optional<'a>(
    lines: &mut LineReader<'a>,
    field: &'static str,
) -> (Option<&'a str>, Option<&'a str>) {
    match lines.next() {
        Some(line) => match line
            .strip_prefix(field)
            .and_then(|rest| rest.strip_prefix(": "))
        {
            Some(value) => (Some(value), None),
            None => (None, Some(line)),
        },
        None => (None, None),
    }
}

fn parse_u32(field: &'static str, value: &str) -> Result<u32> {
    value.parse().map_err(|_| DumpError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Ordered collection of layout elements, keyed by combined semantic name.
#[derive(Debug, Clone, Default)]
pub struct InputLayout {
    elems: Vec<LayoutElement>,
    remap_cache: Option<HashMap<Semantic, Semantic>>,
}

impl PartialEq for InputLayout {
    fn eq(&self, other: &Self) -> bool {
        self.elems == other.elems
    }
}

impl InputLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element, replacing any previous element with the same
    /// semantic (keeping the original position, for stable serialization).
    pub fn push(&mut self, elem: LayoutElement) {
        match self.elems.iter_mut().find(|e| e.semantic == elem.semantic) {
            Some(existing) => *existing = elem,
            None => self.elems.push(elem),
        }
    }

    /// Parses one `element[i]:` block body from `lines` and adds it.
    pub(crate) fn parse_element(&mut self, lines: &mut LineReader<'_>) -> Result<()> {
        let elem = LayoutElement::from_lines(lines)?;
        self.push(elem);
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LayoutElement> {
        self.elems.iter()
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn get(&self, semantic: &Semantic) -> Option<&LayoutElement> {
        self.elems.iter().find(|e| &e.semantic == semantic)
    }

    /// Reverse lookup: the source element whose remapped name is `target`.
    pub fn untranslate(&self, target: &Semantic) -> Option<&LayoutElement> {
        self.elems
            .iter()
            .find(|e| e.remapped.as_ref() == Some(target))
    }

    /// Assigns remap targets.
    ///
    /// Each requested remap resolves the next free semantic index for its
    /// target name (max seen index + 1, tracked across the whole layout).
    /// Duplicate `from` entries keep the first assignment; remaps whose
    /// `from` element is absent are skipped. Both cases are reported, not
    /// fatal.
    pub fn apply_remap(
        &mut self,
        remaps: &[(Semantic, String)],
        report: &mut Report,
    ) -> HashMap<Semantic, Semantic> {
        let mut highest: HashMap<String, i64> = HashMap::new();
        for elem in &self.elems {
            let name = elem.semantic.name.to_ascii_uppercase();
            let entry = highest.entry(name).or_insert(0);
            *entry = (*entry).max(elem.semantic.index as i64);
        }

        let mut translations: HashMap<Semantic, Semantic> = HashMap::new();
        for (from, to) in remaps {
            if translations.contains_key(from) {
                report.error(format!(
                    "semantic remap for {from} specified multiple times, only the first will be used"
                ));
                continue;
            }
            if self.get(from).is_none() {
                report.warning(format!(
                    "semantic \"{from}\" not found in imported file, double check your semantic remaps"
                ));
                continue;
            }

            let index = {
                let entry = highest.entry(to.clone()).or_insert(-1);
                *entry += 1;
                *entry as u32
            };
            let target = Semantic::new(to.clone(), index);
            report.info(format!("remapping semantic {from} -> {target}"));

            if let Some(elem) = self.elems.iter_mut().find(|e| &e.semantic == from) {
                elem.remapped = Some(target.clone());
            }
            translations.insert(from.clone(), target);
        }

        self.remap_cache = Some(translations.clone());
        translations
    }

    /// The source-name -> target-name translation table, rebuilt from the
    /// elements' stored remap fields when no cached table exists.
    pub fn semantic_remap(&mut self) -> HashMap<Semantic, Semantic> {
        if let Some(cache) = &self.remap_cache {
            if !cache.is_empty() {
                return cache.clone();
            }
        }
        let table: HashMap<Semantic, Semantic> = self
            .elems
            .iter()
            .filter_map(|e| e.remapped.clone().map(|r| (e.semantic.clone(), r)))
            .collect();
        self.remap_cache = Some(table.clone());
        table
    }

    /// Flags elements that cannot be decoded from the given slots.
    ///
    /// A later element aliasing an earlier element's (slot, offset) is
    /// marked reused + invalid; an element whose slot is missing from
    /// `slot_strides` or whose bytes overflow the slot's stride is marked
    /// invalid. Per-instance elements are left untouched here — they are
    /// excluded from vertex decode regardless.
    pub fn flag_invalid(&mut self, slot_strides: &BTreeMap<u32, u32>) {
        let mut seen_offsets: HashSet<(u32, u32)> = HashSet::new();
        for elem in &mut self.elems {
            if elem.slot_class != SlotClass::PerVertex {
                continue;
            }
            if !seen_offsets.insert((elem.input_slot, elem.aligned_byte_offset)) {
                elem.reused_offset = true;
                elem.invalid = true;
                continue;
            }
            elem.reused_offset = false;

            let Some(&stride) = slot_strides.get(&elem.input_slot) else {
                // Some engines declare slots they never bind.
                elem.invalid = true;
                continue;
            };
            if elem.aligned_byte_offset as usize + elem.byte_size() > stride as usize {
                elem.invalid = true;
                continue;
            }
            elem.invalid = false;
        }
    }

    /// Encodes one vertex into a `stride`-sized buffer for the selected slot.
    ///
    /// Element overflow past the stride is a programming error (the layout
    /// must have been flag-checked against this stride), hence the assert.
    pub fn encode(&self, vertex: &Vertex, selector: SlotSelector, stride: u32) -> Vec<u8> {
        let mut buf = vec![0u8; stride as usize];
        for (semantic, data) in vertex {
            let Some(elem) = self.get(semantic) else {
                continue;
            };
            if let SlotSelector::Slot(slot) = selector {
                if elem.input_slot != slot {
                    // Belongs to a different vertex buffer.
                    continue;
                }
            }
            let bytes = elem.encode(data);
            let start = elem.aligned_byte_offset as usize;
            assert!(
                start + bytes.len() <= buf.len(),
                "element {} overflows stride {}",
                semantic,
                stride
            );
            buf[start..start + bytes.len()].copy_from_slice(&bytes);
        }
        assert_eq!(buf.len(), stride as usize);
        buf
    }

    /// Decodes the elements belonging to `slot` from one vertex's bytes.
    ///
    /// Elements that do not fit inside `buf` are skipped; `flag_invalid`
    /// marks the same elements invalid.
    pub fn decode(&self, buf: &[u8], slot: u32) -> Vertex {
        let mut vertex = Vertex::new();
        for elem in &self.elems {
            if elem.input_slot != slot {
                // Belongs to a different vertex buffer.
                continue;
            }
            let start = elem.aligned_byte_offset as usize;
            let end = start + elem.byte_size();
            if end > buf.len() {
                continue;
            }
            vertex.insert(elem.semantic.clone(), elem.decode(&buf[start..end]));
        }
        vertex
    }
}

impl fmt::Display for InputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (i, elem) in self.elems.iter().enumerate() {
            use std::fmt::Write;
            writeln!(out, "element[{i}]:").unwrap();
            elem.to_text(&mut out);
        }
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TWO_ELEMENTS: &str = "\
element[0]:
  SemanticName: POSITION
  SemanticIndex: 0
  Format: R32G32B32_FLOAT
  InputSlot: 0
  AlignedByteOffset: 0
  InputSlotClass: per-vertex
  InstanceDataStepRate: 0
element[1]:
  SemanticName: TEXCOORD
  SemanticIndex: 0
  Format: R16G16_FLOAT
  InputSlot: 0
  AlignedByteOffset: 12
  InputSlotClass: per-vertex
  InstanceDataStepRate: 0
";

    fn parse_layout(text: &str) -> InputLayout {
        let mut layout = InputLayout::new();
        let mut lines = LineReader::new(text);
        while let Some(line) = lines.next() {
            if line.starts_with("element[") {
                layout.parse_element(&mut lines).unwrap();
            }
        }
        layout
    }

    #[test]
    fn parse_then_serialize_is_byte_identical() {
        let layout = parse_layout(TWO_ELEMENTS);
        assert_eq!(layout.to_string(), TWO_ELEMENTS);
    }

    #[test]
    fn serialize_preserves_remap_fields() {
        let text = "\
element[0]:
  SemanticName: TEXCOORD
  SemanticIndex: 5
  RemappedSemanticName: BLENDWEIGHT
  RemappedSemanticIndex: 0
  Format: R32G32B32A32_FLOAT
  InputSlot: 0
  AlignedByteOffset: 0
  InputSlotClass: per-vertex
  InstanceDataStepRate: 0
";
        let layout = parse_layout(text);
        assert_eq!(layout.to_string(), text);
        let elem = layout.get(&Semantic::new("TEXCOORD", 5)).unwrap();
        assert_eq!(elem.remapped, Some(Semantic::new("BLENDWEIGHT", 0)));
    }

    #[test]
    fn positional_schema_is_enforced() {
        let text = "\
element[0]:
  SemanticIndex: 0
  SemanticName: POSITION
";
        let mut lines = LineReader::new(text);
        lines.next();
        assert!(matches!(
            LayoutElement::from_lines(&mut lines),
            Err(DumpError::MalformedLayout { expected: "SemanticName", .. })
        ));
    }

    #[test]
    fn append_offset_fails_fast() {
        let text = "\
  SemanticName: POSITION
  SemanticIndex: 0
  Format: R32G32B32_FLOAT
  InputSlot: 0
  AlignedByteOffset: append
  InputSlotClass: per-vertex
  InstanceDataStepRate: 0
";
        let mut lines = LineReader::new(text);
        assert!(matches!(
            LayoutElement::from_lines(&mut lines),
            Err(DumpError::AppendOffsetUnsupported)
        ));
    }

    #[test]
    fn remap_assigns_next_free_index() {
        let mut layout = InputLayout::new();
        layout.push(
            LayoutElement::new(Semantic::new("TEXCOORD", 0), "R32G32_FLOAT", 0, 0, SlotClass::PerVertex, 0)
                .unwrap(),
        );
        layout.push(
            LayoutElement::new(Semantic::new("TEXCOORD", 1), "R32G32_FLOAT", 0, 8, SlotClass::PerVertex, 0)
                .unwrap(),
        );

        let mut report = Report::new();
        let table = layout.apply_remap(
            &[(Semantic::new("TEXCOORD", 1), String::from("TEXCOORD"))],
            &mut report,
        );
        // TEXCOORD0 and TEXCOORD1 exist, so the next free TEXCOORD index is 2.
        assert_eq!(
            table.get(&Semantic::new("TEXCOORD", 1)),
            Some(&Semantic::new("TEXCOORD", 2))
        );

        let mut layout = InputLayout::new();
        layout.push(
            LayoutElement::new(Semantic::new("TEXCOORD", 0), "R32G32_FLOAT", 0, 0, SlotClass::PerVertex, 0)
                .unwrap(),
        );
        layout.push(
            LayoutElement::new(Semantic::new("AUX", 0), "R32G32_FLOAT", 0, 8, SlotClass::PerVertex, 0)
                .unwrap(),
        );
        let table = layout.apply_remap(
            &[(Semantic::new("AUX", 0), String::from("TEXCOORD"))],
            &mut report,
        );
        assert_eq!(
            table.get(&Semantic::new("AUX", 0)),
            Some(&Semantic::new("TEXCOORD", 1))
        );
    }

    #[test]
    fn remap_skips_duplicates_and_missing_sources() {
        let mut layout = InputLayout::new();
        layout.push(
            LayoutElement::new(Semantic::new("AUX", 0), "R32_FLOAT", 0, 0, SlotClass::PerVertex, 0)
                .unwrap(),
        );
        let mut report = Report::new();
        let table = layout.apply_remap(
            &[
                (Semantic::new("AUX", 0), String::from("TEXCOORD")),
                (Semantic::new("AUX", 0), String::from("COLOR")),
                (Semantic::new("MISSING", 0), String::from("COLOR")),
            ],
            &mut report,
        );
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get(&Semantic::new("AUX", 0)),
            Some(&Semantic::new("TEXCOORD", 0))
        );
        assert!(report.has_warnings());
    }

    #[test]
    fn flag_invalid_marks_offset_collisions() {
        let mut layout = InputLayout::new();
        layout.push(
            LayoutElement::new(Semantic::new("NORMAL", 0), "R32G32B32_FLOAT", 0, 12, SlotClass::PerVertex, 0)
                .unwrap(),
        );
        layout.push(
            LayoutElement::new(Semantic::new("BINORMAL", 0), "R32G32B32_FLOAT", 0, 12, SlotClass::PerVertex, 0)
                .unwrap(),
        );
        let strides: BTreeMap<u32, u32> = [(0u32, 24u32)].into_iter().collect();
        layout.flag_invalid(&strides);

        let normal = layout.get(&Semantic::new("NORMAL", 0)).unwrap();
        assert!(!normal.invalid);
        let binormal = layout.get(&Semantic::new("BINORMAL", 0)).unwrap();
        assert!(binormal.invalid);
        assert!(binormal.reused_offset);
    }

    #[test]
    fn flag_invalid_marks_missing_slots_and_stride_overflow() {
        let mut layout = InputLayout::new();
        layout.push(
            LayoutElement::new(Semantic::new("POSITION", 0), "R32G32B32_FLOAT", 0, 0, SlotClass::PerVertex, 0)
                .unwrap(),
        );
        layout.push(
            LayoutElement::new(Semantic::new("TEXCOORD", 0), "R32G32_FLOAT", 1, 0, SlotClass::PerVertex, 0)
                .unwrap(),
        );
        layout.push(
            LayoutElement::new(Semantic::new("NORMAL", 0), "R32G32B32_FLOAT", 0, 8, SlotClass::PerVertex, 0)
                .unwrap(),
        );
        // Slot 1 absent; NORMAL overflows the 16-byte stride of slot 0.
        let strides: BTreeMap<u32, u32> = [(0u32, 16u32)].into_iter().collect();
        layout.flag_invalid(&strides);

        assert!(!layout.get(&Semantic::new("POSITION", 0)).unwrap().invalid);
        assert!(layout.get(&Semantic::new("TEXCOORD", 0)).unwrap().invalid);
        assert!(layout.get(&Semantic::new("NORMAL", 0)).unwrap().invalid);
    }

    #[test]
    fn encode_decode_one_slot() {
        let layout = parse_layout(TWO_ELEMENTS);
        let mut vertex = Vertex::new();
        vertex.insert(
            Semantic::new("POSITION", 0),
            AttributeData::Float32(vec![1.0, 2.0, 3.0]),
        );
        vertex.insert(
            Semantic::new("TEXCOORD", 0),
            AttributeData::Float32(vec![0.25, 0.75]),
        );
        let bytes = layout.encode(&vertex, SlotSelector::Slot(0), 16);
        assert_eq!(bytes.len(), 16);
        assert_eq!(layout.decode(&bytes, 0), vertex);
    }

    #[test]
    fn semantic_parse_splits_trailing_digits() {
        assert_eq!(Semantic::parse("TEXCOORD1"), Semantic::new("TEXCOORD", 1));
        assert_eq!(Semantic::parse("TEXCOORD"), Semantic::new("TEXCOORD", 0));
        assert_eq!(Semantic::parse("BLENDINDICES12"), Semantic::new("BLENDINDICES", 12));
    }
}
