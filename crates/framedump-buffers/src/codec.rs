//! DXGI vertex format classification and per-lane encode/decode.
//!
//! Dump files describe every element with a DXGI-style format string such as
//! `R32G32B32_FLOAT` or `DXGI_FORMAT_R8G8B8A8_UNORM`. The classifier parses
//! the string once into a closed [`FormatClass`] + lane count, so the hot
//! encode/decode paths are a plain `match` instead of repeated string
//! inspection.
//!
//! Normalized formats (UNORM/SNORM) quantize with round-half-to-even on
//! encode so that `decode(encode(x))` is stable in both directions.

use crate::error::{DumpError, Result};
use half::f16;

/// Numeric interpretation of one format lane.
///
/// The supported families are the ones produced by frame-analysis capture
/// tools; packed formats (10-10-10-2, block compression, depth/stencil) are
/// deliberately outside this set and fail classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatClass {
    Float32,
    Float16,
    Uint32,
    Uint16,
    Uint8,
    Sint32,
    Sint16,
    Sint8,
    Unorm16,
    Unorm8,
    Snorm16,
    Snorm8,
}

impl FormatClass {
    /// Byte width of a single lane.
    pub fn lane_size(self) -> usize {
        match self {
            FormatClass::Float32 | FormatClass::Uint32 | FormatClass::Sint32 => 4,
            FormatClass::Float16
            | FormatClass::Uint16
            | FormatClass::Sint16
            | FormatClass::Unorm16
            | FormatClass::Snorm16 => 2,
            FormatClass::Uint8
            | FormatClass::Sint8
            | FormatClass::Unorm8
            | FormatClass::Snorm8 => 1,
        }
    }

    /// True for lanes that decode to floating point values (FLOAT, UNORM and
    /// SNORM families).
    pub fn is_float(self) -> bool {
        matches!(
            self,
            FormatClass::Float32
                | FormatClass::Float16
                | FormatClass::Unorm16
                | FormatClass::Unorm8
                | FormatClass::Snorm16
                | FormatClass::Snorm8
        )
    }

    /// True for raw integer lanes (UINT and SINT families).
    pub fn is_int(self) -> bool {
        !self.is_float()
    }
}

/// A classified DXGI format: lane interpretation plus lane count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDesc {
    pub class: FormatClass,
    pub components: u32,
}

impl FormatDesc {
    /// Classifies a DXGI-style format string.
    ///
    /// Accepts an optional `DXGI_FORMAT_` prefix and is case-insensitive.
    /// Channel groups are `[RGBAD]<bits>` repeated (the `D` covers depth
    /// aliases some tools emit); all channels must share one bit width.
    pub fn parse(fmt: &str) -> Result<Self> {
        classify(fmt).ok_or_else(|| DumpError::UnsupportedFormat {
            format: fmt.to_string(),
        })
    }

    /// Total byte size of one element of this format.
    pub fn byte_size(&self) -> usize {
        self.class.lane_size() * self.components as usize
    }

    /// Decodes exactly one element. `data` must hold at least
    /// [`byte_size`](Self::byte_size) bytes; trailing bytes are ignored.
    pub fn decode(&self, data: &[u8]) -> AttributeData {
        let n = self.components as usize;
        let lane = self.class.lane_size();
        debug_assert!(data.len() >= n * lane);
        match self.class {
            FormatClass::Float32 => AttributeData::Float32(
                (0..n)
                    .map(|i| bytemuck::pod_read_unaligned::<f32>(&data[i * 4..i * 4 + 4]))
                    .collect(),
            ),
            FormatClass::Float16 => AttributeData::Float32(
                (0..n)
                    .map(|i| f16::from_le_bytes([data[i * 2], data[i * 2 + 1]]).to_f32())
                    .collect(),
            ),
            FormatClass::Uint32 => AttributeData::Uint(
                (0..n)
                    .map(|i| u32::from_le_bytes(data[i * 4..i * 4 + 4].try_into().unwrap()))
                    .collect(),
            ),
            FormatClass::Uint16 => AttributeData::Uint(
                (0..n)
                    .map(|i| u16::from_le_bytes([data[i * 2], data[i * 2 + 1]]) as u32)
                    .collect(),
            ),
            FormatClass::Uint8 => {
                AttributeData::Uint((0..n).map(|i| data[i] as u32).collect())
            }
            FormatClass::Sint32 => AttributeData::Sint(
                (0..n)
                    .map(|i| i32::from_le_bytes(data[i * 4..i * 4 + 4].try_into().unwrap()))
                    .collect(),
            ),
            FormatClass::Sint16 => AttributeData::Sint(
                (0..n)
                    .map(|i| i16::from_le_bytes([data[i * 2], data[i * 2 + 1]]) as i32)
                    .collect(),
            ),
            FormatClass::Sint8 => {
                AttributeData::Sint((0..n).map(|i| data[i] as i8 as i32).collect())
            }
            FormatClass::Unorm16 => AttributeData::Float32(
                (0..n)
                    .map(|i| {
                        u16::from_le_bytes([data[i * 2], data[i * 2 + 1]]) as f32 / 65535.0
                    })
                    .collect(),
            ),
            FormatClass::Unorm8 => AttributeData::Float32(
                (0..n).map(|i| data[i] as f32 / 255.0).collect(),
            ),
            FormatClass::Snorm16 => AttributeData::Float32(
                (0..n)
                    .map(|i| {
                        i16::from_le_bytes([data[i * 2], data[i * 2 + 1]]) as f32 / 32767.0
                    })
                    .collect(),
            ),
            FormatClass::Snorm8 => AttributeData::Float32(
                (0..n).map(|i| data[i] as i8 as f32 / 127.0).collect(),
            ),
        }
    }

    /// Encodes the lanes of `data`.
    ///
    /// Encodes exactly `data.len()` lanes: callers that need a full element
    /// pad first (see [`crate::layout::LayoutElement::pad_floats`]). Integer lanes
    /// are converted between signedness by value; float lanes fed to integer
    /// formats are truncated toward zero.
    pub fn encode(&self, data: &AttributeData) -> Vec<u8> {
        let n = data.len();
        let mut out = Vec::with_capacity(n * self.class.lane_size());
        for i in 0..n {
            match self.class {
                FormatClass::Float32 => {
                    out.extend_from_slice(&data.lane_f32(i).to_le_bytes());
                }
                FormatClass::Float16 => {
                    out.extend_from_slice(&f16::from_f32(data.lane_f32(i)).to_le_bytes());
                }
                FormatClass::Uint32 => {
                    out.extend_from_slice(&(data.lane_i64(i) as u32).to_le_bytes());
                }
                FormatClass::Uint16 => {
                    out.extend_from_slice(&(data.lane_i64(i) as u16).to_le_bytes());
                }
                FormatClass::Uint8 => out.push(data.lane_i64(i) as u8),
                FormatClass::Sint32 => {
                    out.extend_from_slice(&(data.lane_i64(i) as i32).to_le_bytes());
                }
                FormatClass::Sint16 => {
                    out.extend_from_slice(&(data.lane_i64(i) as i16).to_le_bytes());
                }
                FormatClass::Sint8 => out.push(data.lane_i64(i) as i8 as u8),
                FormatClass::Unorm16 => {
                    let q = (data.lane_f32(i) * 65535.0).round_ties_even() as u16;
                    out.extend_from_slice(&q.to_le_bytes());
                }
                FormatClass::Unorm8 => {
                    out.push((data.lane_f32(i) * 255.0).round_ties_even() as u8);
                }
                FormatClass::Snorm16 => {
                    let q = (data.lane_f32(i) * 32767.0).round_ties_even() as i16;
                    out.extend_from_slice(&q.to_le_bytes());
                }
                FormatClass::Snorm8 => {
                    out.push((data.lane_f32(i) * 127.0).round_ties_even() as i8 as u8);
                }
            }
        }
        out
    }
}

/// Number of numeric lanes in a DXGI format string (`R32G32B32_FLOAT` -> 3).
pub fn format_components(fmt: &str) -> Result<u32> {
    Ok(FormatDesc::parse(fmt)?.components)
}

/// Byte size of one element of a DXGI format (`R32G32B32_FLOAT` -> 12).
pub fn format_size(fmt: &str) -> Result<usize> {
    Ok(FormatDesc::parse(fmt)?.byte_size())
}

/// One decoded vertex attribute: the numeric lanes of a single element.
///
/// Lanes keep the storage family of their format (raw integers stay
/// integers) so re-encoding is lossless; normalized and float formats decode
/// to `f32`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    Float32(Vec<f32>),
    Uint(Vec<u32>),
    Sint(Vec<i32>),
}

impl AttributeData {
    pub fn len(&self) -> usize {
        match self {
            AttributeData::Float32(v) => v.len(),
            AttributeData::Uint(v) => v.len(),
            AttributeData::Sint(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lane as `f32` (integers converted by value).
    pub fn lane_f32(&self, i: usize) -> f32 {
        match self {
            AttributeData::Float32(v) => v[i],
            AttributeData::Uint(v) => v[i] as f32,
            AttributeData::Sint(v) => v[i] as f32,
        }
    }

    /// Lane as a wide integer (floats truncated toward zero).
    pub fn lane_i64(&self, i: usize) -> i64 {
        match self {
            AttributeData::Float32(v) => v[i] as i64,
            AttributeData::Uint(v) => v[i] as i64,
            AttributeData::Sint(v) => v[i] as i64,
        }
    }

    pub fn floats(&self) -> Option<&[f32]> {
        match self {
            AttributeData::Float32(v) => Some(v),
            _ => None,
        }
    }

    pub fn uints(&self) -> Option<&[u32]> {
        match self {
            AttributeData::Uint(v) => Some(v),
            _ => None,
        }
    }

    pub fn sints(&self) -> Option<&[i32]> {
        match self {
            AttributeData::Sint(v) => Some(v),
            _ => None,
        }
    }
}

fn classify(fmt: &str) -> Option<FormatDesc> {
    let upper = fmt.to_ascii_uppercase();
    let body = upper.strip_prefix("DXGI_FORMAT_").unwrap_or(&upper);

    let (channels, suffix) = body.rsplit_once('_')?;

    let mut components = 0u32;
    let mut width: Option<u32> = None;
    let mut rest = channels;
    while !rest.is_empty() {
        let mut chars = rest.chars();
        let letter = chars.next()?;
        if !matches!(letter, 'R' | 'G' | 'B' | 'A' | 'D') {
            return None;
        }
        rest = chars.as_str();
        let digits_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits_len == 0 {
            return None;
        }
        let bits: u32 = rest[..digits_len].parse().ok()?;
        match width {
            None => width = Some(bits),
            // Mixed lane widths (e.g. R10G10B10A2) are not representable.
            Some(w) if w != bits => return None,
            Some(_) => {}
        }
        components += 1;
        rest = &rest[digits_len..];
    }

    let class = match (suffix, width?) {
        ("FLOAT", 32) => FormatClass::Float32,
        ("FLOAT", 16) => FormatClass::Float16,
        ("UINT", 32) => FormatClass::Uint32,
        ("UINT", 16) => FormatClass::Uint16,
        ("UINT", 8) => FormatClass::Uint8,
        ("SINT", 32) => FormatClass::Sint32,
        ("SINT", 16) => FormatClass::Sint16,
        ("SINT", 8) => FormatClass::Sint8,
        ("UNORM", 16) => FormatClass::Unorm16,
        ("UNORM", 8) => FormatClass::Unorm8,
        ("SNORM", 16) => FormatClass::Snorm16,
        ("SNORM", 8) => FormatClass::Snorm8,
        _ => return None,
    };

    Some(FormatDesc { class, components })
}
