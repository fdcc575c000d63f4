//! hidapi backend.
//!
//! Discovery pipeline, run on every [`pump`](Backend::pump):
//!
//! - Refresh the hidapi device list
//! - Keep entries whose top-level `(usage_page, usage)` matches the configured criteria
//! - For paths not seen before: open non-blocking, fetch and parse the report
//!   descriptor, announce `Attached` with the parsed elements
//! - For known paths that disappeared: announce `Detached`
//! - For known paths whose reads are failing: announce `Detached` and reopen,
//!   which also covers a device replugged between two pumps
//!
//! hidapi has no attach/detach callbacks, so hot-plug is detected by diffing
//! consecutive device lists. A device that cannot be opened is skipped and
//! tried again on the next pump.

pub mod descriptor;
pub mod source;

use crate::config::{Config, DeviceMatch};
use crate::device::{Backend, NativeHandle};
use crate::element::ElementCookie;
use crate::error::{Error, Result};
use crate::hotplug::HotplugSender;
use crate::metadata::DeviceProperties;
use hidapi::{DeviceInfo, HidApi};
use source::HidValueSource;
use std::collections::{HashMap, HashSet};
use std::ffi::CString;
use std::sync::Arc;
use tracing::{debug, info, warn};

const BACKEND_NAME: &str = "hidapi";

/// Largest report descriptor the USB HID class allows.
const MAX_REPORT_DESCRIPTOR_SIZE: usize = 4096;

/// An announced device and the source its gamepad reads through.
struct Attached {
    handle: NativeHandle,
    source: Arc<HidValueSource>,
}

/// [`Backend`] over hidapi; see the module docs for the discovery pipeline.
pub struct HidBackend {
    api: Option<HidApi>,
    matching: Vec<DeviceMatch>,
    events: Option<HotplugSender>,
    attached: HashMap<CString, Attached>,
    next_handle: u64,
    max_reports_per_tick: usize,
}

impl HidBackend {
    /// Unopened backend. Each device drains at most
    /// `config.max_reports_per_tick` reports per sampling pass.
    pub fn new(config: &Config) -> Self {
        Self {
            api: None,
            matching: Vec::new(),
            events: None,
            attached: HashMap::new(),
            next_handle: 0,
            max_reports_per_tick: config.max_reports_per_tick,
        }
    }
}

/// Whether a hidapi entry is a device we want.
fn accept_device(info: &DeviceInfo, matching: &[DeviceMatch]) -> bool {
    matching
        .iter()
        .any(|m| m.matches(info.usage_page(), info.usage()))
}

/// Best-effort properties snapshot for a hidapi entry.
fn properties(info: &DeviceInfo) -> DeviceProperties {
    DeviceProperties {
        name: info
            .product_string()
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        vendor_id: info.vendor_id(),
        product_id: info.product_id(),
        version: info.release_number(),
        path: Some(info.path().to_string_lossy().into_owned()),
        usage_page: Some(info.usage_page()),
        usage: Some(info.usage()),
    }
}

impl HidBackend {
    /// Open one device and announce it. Returns `false` if it should be retried later.
    fn attach(&mut self, info: &DeviceInfo, api: &HidApi, events: &HotplugSender) -> bool {
        let props = properties(info);
        let label = format!(
            "{:04x}:{:04x} {}",
            props.vendor_id,
            props.product_id,
            props.display_name()
        );

        let device = match info.open_device(api) {
            Ok(d) => d,
            Err(e) => {
                debug!(dev = %label, error = %e, "open failed; will retry");
                return false;
            }
        };
        // Sampling must never block; if this fails reads may block briefly, so keep going.
        if let Err(e) = device.set_blocking_mode(false) {
            warn!(dev = %label, error = %e, "could not switch to non-blocking reads");
        }

        let mut raw = vec![0u8; MAX_REPORT_DESCRIPTOR_SIZE];
        let len = match device.get_report_descriptor(&mut raw) {
            Ok(n) if n > 0 => n,
            Ok(_) => {
                debug!(dev = %label, "empty report descriptor; will retry");
                return false;
            }
            Err(e) => {
                debug!(dev = %label, error = %e, "report descriptor unavailable; will retry");
                return false;
            }
        };
        let parsed = descriptor::parse(&raw[..len]);
        let elements = parsed
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| f.to_raw_element(ElementCookie(i as u32)))
            .collect::<Vec<_>>();

        let handle = NativeHandle(self.next_handle);
        self.next_handle += 1;

        debug!(
            dev = %label,
            %handle,
            fields = parsed.fields.len(),
            inputs = parsed.inputs().count(),
            numbered = parsed.numbered,
            "descriptor parsed"
        );

        let source = Arc::new(HidValueSource::new(
            device,
            label,
            parsed,
            self.max_reports_per_tick,
        ));
        events.attached(handle, props, elements, source.clone());
        self.attached
            .insert(info.path().to_owned(), Attached { handle, source });
        true
    }
}

impl Backend for HidBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn open(&mut self, matching: &[DeviceMatch], events: HotplugSender) -> Result<()> {
        if self.api.is_some() {
            return Err(Error::AlreadyOpen(BACKEND_NAME));
        }
        if matching.is_empty() {
            return Err(Error::NoMatchCriteria);
        }
        let api = HidApi::new()?;
        info!(criteria = matching.len(), "HID session opened");
        self.api = Some(api);
        self.matching = matching.to_vec();
        self.events = Some(events);
        Ok(())
    }

    fn pump(&mut self) -> Result<()> {
        let (Some(mut api), Some(events)) = (self.api.take(), self.events.clone()) else {
            return Err(Error::NotOpen(BACKEND_NAME));
        };
        let result = self.pump_with(&mut api, &events);
        self.api = Some(api);
        result
    }
}

impl HidBackend {
    fn pump_with(&mut self, api: &mut HidApi, events: &HotplugSender) -> Result<()> {
        api.refresh_devices()?;

        // A stale device node never recovers; drop it so the path is reopened below.
        let failing: Vec<CString> = self
            .attached
            .iter()
            .filter(|(_, a)| a.source.failed())
            .map(|(p, _)| p.clone())
            .collect();
        for path in failing {
            if let Some(gone) = self.attached.remove(&path) {
                info!(
                    handle = %gone.handle,
                    path = %path.to_string_lossy(),
                    "reads failing; reopening"
                );
                events.detached(gone.handle);
            }
        }

        let mut present: HashSet<CString> = HashSet::new();
        for info in api.device_list() {
            if !accept_device(info, &self.matching) {
                continue;
            }
            let path = info.path().to_owned();
            // hidapi can list one path several times (one per top-level usage).
            if !present.insert(path.clone()) || self.attached.contains_key(&path) {
                continue;
            }
            if !self.attach(info, api, events) {
                present.remove(&path);
            }
        }

        let gone: Vec<CString> = self
            .attached
            .keys()
            .filter(|p| !present.contains(*p))
            .cloned()
            .collect();
        for path in gone {
            if let Some(gone) = self.attached.remove(&path) {
                debug!(handle = %gone.handle, path = %path.to_string_lossy(), "device left");
                events.detached(gone.handle);
            }
        }
        Ok(())
    }
}
