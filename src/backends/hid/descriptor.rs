//! HID report descriptor parsing.
//!
//! Turns a raw report descriptor into a flat list of [`ReportField`]s, one per
//! usage, each knowing where its value lives inside an input report. This is
//! what the backend hands to the classifier as raw elements.
//!
//! Supported:
//! - short items (main / global / local), long items are skipped
//! - extended (4-byte) usages carrying their own usage page
//! - `Push` / `Pop` of the global state
//! - report IDs (fields are addressed relative to the byte after the ID)
//! - usage lists and usage ranges
//! - Variable and Array inputs, constant padding
//!
//! ## Logical range signedness
//! Logical Maximum is read as unsigned when Logical Minimum is non-negative, so
//! `15 00 25 FF` means `0..255` rather than `0..-1`. Field values are
//! sign-extended only when Logical Minimum is negative.
//!
//! ## Hostile descriptors
//! Report Size and Report Count come straight from the device. Items whose
//! bits would end past [`MAX_REPORT_BITS`], or whose size overflows, are
//! skipped without emitting fields. Fields wider than 32 bits are never
//! emitted (they still occupy their bits), and one main item emits at most
//! [`MAX_REPORT_COUNT`] fields.

use crate::element::{ElementCookie, ElementType, RawElement};
use tracing::debug;

/// Array ranges larger than this are clipped (keyboards can declare thousands of usages).
const MAX_ARRAY_USAGES: u32 = 256;

/// Fields emitted per main item at most; also caps array slots.
pub const MAX_REPORT_COUNT: u32 = 256;

/// Longest addressable report (8 KiB, in bits). Anything past it is skipped.
pub const MAX_REPORT_BITS: u32 = 8 * 8192;

/// Widest field `extract` can read.
const MAX_FIELD_BITS: u32 = 32;

/// How a field's value is read from its report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldRead {
    /// One value at `bit_offset`.
    Variable,
    /// `slots` consecutive indices; the field is `1` when any slot equals `selector`.
    Array { slots: u32, selector: i64 },
}

/// One usage inside a report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportField {
    pub report_id: u8,
    /// Bit offset from the start of the report payload (after any ID byte).
    pub bit_offset: u32,
    pub bit_size: u32,
    pub usage_page: u16,
    pub usage: u16,
    pub logical_min: i64,
    pub logical_max: i64,
    pub kind: ElementType,
    pub read: FieldRead,
}

impl ReportField {
    #[inline]
    fn signed(&self) -> bool {
        self.logical_min < 0
    }

    /// Extract this field's raw value from a report payload. `None` if the payload is too short.
    pub fn read(&self, payload: &[u8]) -> Option<i64> {
        match self.read {
            FieldRead::Variable => extract(payload, self.bit_offset, self.bit_size, self.signed()),
            FieldRead::Array { slots, selector } => {
                for slot in 0..slots {
                    let offset = slot
                        .checked_mul(self.bit_size)
                        .and_then(|o| o.checked_add(self.bit_offset))?;
                    if extract(payload, offset, self.bit_size, self.signed())? == selector {
                        return Some(1);
                    }
                }
                Some(0)
            }
        }
    }

    pub fn to_raw_element(&self, cookie: ElementCookie) -> RawElement {
        RawElement {
            cookie,
            kind: self.kind,
            usage_page: self.usage_page,
            usage: self.usage,
            logical_min: self.logical_min,
            logical_max: self.logical_max,
        }
    }
}

/// Parsed descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportDescriptor {
    pub fields: Vec<ReportField>,
    /// True when any report ID is declared; input reports then start with the ID byte.
    pub numbered: bool,
}

impl ReportDescriptor {
    /// Input fields only.
    pub fn inputs(&self) -> impl Iterator<Item = &ReportField> {
        self.fields.iter().filter(|f| f.kind.is_classifiable())
    }
}

/// Little-endian bit extraction. `None` if the field runs past the payload.
pub fn extract(payload: &[u8], bit_offset: u32, bit_size: u32, signed: bool) -> Option<i64> {
    if bit_size == 0 || bit_size > MAX_FIELD_BITS {
        return None;
    }
    let end = bit_offset as usize + bit_size as usize;
    if end > payload.len() * 8 {
        return None;
    }
    let mut v: u64 = 0;
    for b in 0..bit_size {
        let bit = (bit_offset + b) as usize;
        if payload[bit / 8] >> (bit % 8) & 1 != 0 {
            v |= 1 << b;
        }
    }
    if signed && v & (1 << (bit_size - 1)) != 0 {
        v |= !0u64 << bit_size;
    }
    Some(v as i64)
}

#[derive(Clone, Debug, Default)]
struct Globals {
    usage_page: u16,
    logical_min: i64,
    logical_max_signed: i64,
    logical_max_unsigned: i64,
    report_size: u32,
    report_count: u32,
    report_id: u8,
}

impl Globals {
    fn logical_max(&self) -> i64 {
        if self.logical_min < 0 {
            self.logical_max_signed
        } else {
            self.logical_max_unsigned
        }
    }
}

#[derive(Debug, Default)]
struct Locals {
    usages: Vec<(u16, u16)>,
    usage_min: Option<(u16, u16)>,
    usage_max: Option<u16>,
}

impl Locals {
    /// Usage list in declaration order: explicit usages first, then the range.
    fn resolve(&self, limit: u32) -> Vec<(u16, u16)> {
        let mut out = self.usages.clone();
        if let (Some((page, lo)), Some(hi)) = (self.usage_min, self.usage_max) {
            if lo <= hi {
                let span = limit.saturating_sub(1).min(u16::MAX as u32) as u16;
                let hi = hi.min(lo.saturating_add(span));
                out.extend((lo..=hi).map(|u| (page, u)));
            }
        }
        out
    }
}

struct Item<'a> {
    tag: u8,
    kind: u8,
    data: &'a [u8],
}

impl Item<'_> {
    fn unsigned(&self) -> u32 {
        self.data
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | b as u32)
    }

    fn signed(&self) -> i64 {
        match self.data.len() {
            1 => self.data[0] as i8 as i64,
            2 => i16::from_le_bytes([self.data[0], self.data[1]]) as i64,
            4 => i32::from_le_bytes([self.data[0], self.data[1], self.data[2], self.data[3]]) as i64,
            _ => 0,
        }
    }
}

/// Split a descriptor into short items. Malformed trailing bytes end the walk.
fn items(desc: &[u8]) -> impl Iterator<Item = Item<'_>> {
    let mut pos = 0;
    std::iter::from_fn(move || loop {
        let prefix = *desc.get(pos)?;
        if prefix == 0xFE {
            // Long item: [0xFE][size][tag][data...]
            let size = *desc.get(pos + 1)? as usize;
            pos += 3 + size;
            continue;
        }
        let size = match prefix & 0x03 {
            3 => 4,
            n => n as usize,
        };
        let data = desc.get(pos + 1..pos + 1 + size)?;
        pos += 1 + size;
        return Some(Item {
            tag: prefix >> 4,
            kind: (prefix >> 2) & 0x03,
            data,
        });
    })
}

const MAIN: u8 = 0;
const GLOBAL: u8 = 1;
const LOCAL: u8 = 2;

const MAIN_INPUT: u8 = 0x8;
const MAIN_OUTPUT: u8 = 0x9;
const MAIN_FEATURE: u8 = 0xB;

const FLAG_CONSTANT: u32 = 0x01;
const FLAG_VARIABLE: u32 = 0x02;

/// Parse a report descriptor. Unknown items are skipped; nothing here fails.
pub fn parse(desc: &[u8]) -> ReportDescriptor {
    let mut globals = Globals::default();
    let mut stack: Vec<Globals> = Vec::new();
    let mut locals = Locals::default();
    let mut out = ReportDescriptor::default();

    // Running bit offsets per (main item kind, report id).
    let mut offsets: std::collections::HashMap<(u8, u8), u32> = Default::default();

    for item in items(desc) {
        match item.kind {
            GLOBAL => match item.tag {
                0x0 => globals.usage_page = item.unsigned() as u16,
                0x1 => globals.logical_min = item.signed(),
                0x2 => {
                    globals.logical_max_signed = item.signed();
                    globals.logical_max_unsigned = item.unsigned() as i64;
                }
                0x7 => globals.report_size = item.unsigned(),
                0x8 => {
                    globals.report_id = item.unsigned() as u8;
                    out.numbered = true;
                }
                0x9 => globals.report_count = item.unsigned(),
                0xA => stack.push(globals.clone()),
                0xB => {
                    if let Some(g) = stack.pop() {
                        globals = g;
                    }
                }
                _ => {}
            },
            LOCAL => {
                let extended = item.data.len() == 4;
                let raw = item.unsigned();
                let page = if extended {
                    (raw >> 16) as u16
                } else {
                    globals.usage_page
                };
                let usage = raw as u16;
                match item.tag {
                    0x0 => locals.usages.push((page, usage)),
                    0x1 => locals.usage_min = Some((page, usage)),
                    0x2 => locals.usage_max = Some(usage),
                    _ => {}
                }
            }
            MAIN => {
                let main_kind = match item.tag {
                    MAIN_INPUT | MAIN_OUTPUT | MAIN_FEATURE => Some(item.tag),
                    _ => None,
                };
                if let Some(tag) = main_kind {
                    let offset = offsets.entry((tag, globals.report_id)).or_insert(0);
                    let end = globals
                        .report_size
                        .checked_mul(globals.report_count)
                        .and_then(|bits| offset.checked_add(bits));
                    match end {
                        Some(end) if end <= MAX_REPORT_BITS => {
                            let flags = item.unsigned();
                            emit_fields(&mut out.fields, tag, flags, &globals, &locals, *offset);
                            *offset = end;
                        }
                        _ => {
                            debug!(
                                report_id = globals.report_id,
                                size = globals.report_size,
                                count = globals.report_count,
                                "main item exceeds the maximum report length; skipped"
                            );
                            // Nothing after this item in the same report is addressable.
                            *offset = u32::MAX;
                        }
                    }
                }
                // Every main item (collections included) clears local state.
                locals = Locals::default();
            }
            _ => {}
        }
    }
    out
}

fn emit_fields(
    out: &mut Vec<ReportField>,
    tag: u8,
    flags: u32,
    g: &Globals,
    locals: &Locals,
    base_offset: u32,
) {
    if flags & FLAG_CONSTANT != 0
        || g.report_size == 0
        || g.report_size > MAX_FIELD_BITS
        || g.report_count == 0
    {
        return;
    }
    let count = g.report_count.min(MAX_REPORT_COUNT);

    let usages = locals.resolve(if flags & FLAG_VARIABLE != 0 {
        count
    } else {
        MAX_ARRAY_USAGES
    });
    if usages.is_empty() {
        return;
    }

    let element_kind = |size: u32| match tag {
        MAIN_OUTPUT => ElementType::Output,
        MAIN_FEATURE => ElementType::Feature,
        _ if size == 1 => ElementType::InputButton,
        _ => ElementType::InputMisc,
    };

    if flags & FLAG_VARIABLE != 0 {
        for i in 0..count {
            let (usage_page, usage) = usages[(i as usize).min(usages.len() - 1)];
            out.push(ReportField {
                report_id: g.report_id,
                bit_offset: base_offset + i * g.report_size,
                bit_size: g.report_size,
                usage_page,
                usage,
                logical_min: g.logical_min,
                logical_max: g.logical_max(),
                kind: element_kind(g.report_size),
                read: FieldRead::Variable,
            });
        }
    } else {
        let kind = match tag {
            MAIN_INPUT => ElementType::InputButton,
            _ => element_kind(g.report_size),
        };
        for (k, (usage_page, usage)) in usages.into_iter().enumerate() {
            out.push(ReportField {
                report_id: g.report_id,
                bit_offset: base_offset,
                bit_size: g.report_size,
                usage_page,
                usage,
                logical_min: 0,
                logical_max: 1,
                kind,
                read: FieldRead::Array {
                    slots: count,
                    selector: g.logical_min + k as i64,
                },
            });
        }
    }
}
