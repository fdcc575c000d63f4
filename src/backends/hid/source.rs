//! Value reads for one open hidapi device.
//!
//! [`HidValueSource`] owns the non-blocking `hidapi::HidDevice`. At the start of
//! each sampling pass it drains a bounded number of pending input reports and
//! keeps the latest payload per report ID; element values are then extracted
//! from those cached payloads.
//!
//! A failed read drops every cached payload, so values fall back to defaults
//! instead of repeating the last good report.
//!
//! This module does **not** classify or normalize anything; it only answers
//! "what is the raw value of field N right now".

use super::descriptor::{FieldRead, ReportDescriptor, ReportField, MAX_REPORT_BITS};
use crate::device::ValueSource;
use crate::element::ElementCookie;
use hidapi::HidDevice;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Display;
use tracing::{trace, warn};

/// Latest payload per report ID. Unnumbered devices use ID 0.
#[derive(Debug, Default)]
pub struct ReportCache {
    latest: HashMap<u8, Vec<u8>>,
}

impl ReportCache {
    /// Store one report as returned by `hid_read` (ID byte first when `numbered`).
    pub fn store(&mut self, data: &[u8], numbered: bool) {
        let (report_id, payload) = match (numbered, data.split_first()) {
            (true, Some((&id, rest))) => (id, rest),
            (true, None) => return,
            (false, _) => (0, data),
        };
        let slot = self.latest.entry(report_id).or_default();
        slot.clear();
        slot.extend_from_slice(payload);
    }

    pub fn payload(&self, report_id: u8) -> Option<&[u8]> {
        self.latest.get(&report_id).map(Vec::as_slice)
    }

    /// Forget every payload; reads resolve to `None` until the next report.
    pub fn clear(&mut self) {
        self.latest.clear();
    }
}

pub struct HidValueSource {
    device: Mutex<HidDevice>,
    label: String,
    fields: Vec<ReportField>,
    numbered: bool,
    max_reports_per_tick: usize,
    state: Mutex<ReadState>,
}

struct ReadState {
    buf: Vec<u8>,
    cache: ReportCache,
    failed: bool,
}

impl ReadState {
    fn new(buf_len: usize) -> Self {
        Self {
            buf: vec![0u8; buf_len],
            cache: ReportCache::default(),
            failed: false,
        }
    }

    /// Read up to `max_reports` pending reports through `read` (`Ok(0)` = nothing pending).
    fn drain<E: Display>(
        &mut self,
        label: &str,
        numbered: bool,
        max_reports: usize,
        mut read: impl FnMut(&mut [u8]) -> Result<usize, E>,
    ) {
        for _ in 0..max_reports {
            match read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => {
                    trace!(dev = %label, n, "input report");
                    self.cache.store(&self.buf[..n], numbered);
                    self.failed = false;
                }
                Err(e) => {
                    // Log once per failure streak; the device is usually being unplugged.
                    if !self.failed {
                        warn!(dev = %label, error = %e, "HID read failed");
                        self.failed = true;
                    }
                    self.cache.clear();
                    break;
                }
            }
        }
    }
}

impl HidValueSource {
    /// `fields` are indexed by [`ElementCookie`].
    pub fn new(
        device: HidDevice,
        label: String,
        descriptor: ReportDescriptor,
        max_reports_per_tick: usize,
    ) -> Self {
        // Largest report end (bits → bytes) plus the ID byte; hidapi truncates longer reports.
        let payload_len = descriptor
            .fields
            .iter()
            .map(|f| match f.read {
                FieldRead::Variable => f.bit_offset.saturating_add(f.bit_size),
                FieldRead::Array { slots, .. } => slots
                    .saturating_mul(f.bit_size)
                    .saturating_add(f.bit_offset),
            })
            .max()
            .unwrap_or(0)
            .min(MAX_REPORT_BITS)
            .div_ceil(8) as usize;
        let buf_len = (payload_len + 1).max(64);

        Self {
            device: Mutex::new(device),
            label,
            fields: descriptor.fields,
            numbered: descriptor.numbered,
            max_reports_per_tick,
            state: Mutex::new(ReadState::new(buf_len)),
        }
    }

    /// Whether the latest read attempt failed (the device is most likely gone).
    pub fn failed(&self) -> bool {
        self.state.lock().failed
    }
}

impl ValueSource for HidValueSource {
    fn begin_frame(&self) {
        let device = self.device.lock();
        self.state.lock().drain(
            &self.label,
            self.numbered,
            self.max_reports_per_tick,
            |buf| device.read(buf),
        );
    }

    fn value(&self, element: ElementCookie) -> Option<i64> {
        let field = self.fields.get(element.0 as usize)?;
        let state = self.state.lock();
        field.read(state.cache.payload(field.report_id)?)
    }
}
