//! Physical device session: discovery, geometry and the event source (evdev 0.13).

use std::collections::VecDeque;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use evdev::raw_stream::RawDevice;
use evdev::{AbsoluteAxisCode, EventType};
use log::{debug, warn};

use crate::event::RawEvent;
use crate::filter::{DeviceGeometry, GeometryError};
use crate::session::{EventSource, ReadStatus};

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
}

fn is_multitouch(dev: &RawDevice) -> bool {
    let has_abs = dev.supported_events().contains(EventType::ABSOLUTE);
    let axes = dev.supported_absolute_axes();
    let has_mt = axes.is_some_and(|a| {
        a.contains(AbsoluteAxisCode::ABS_MT_SLOT)
            && a.contains(AbsoluteAxisCode::ABS_MT_POSITION_X)
            && a.contains(AbsoluteAxisCode::ABS_MT_POSITION_Y)
    });
    has_abs && has_mt
}

pub fn discover_multitouch() -> Vec<DeviceInfo> {
    let mut out = vec![];
    let Ok(rd) = std::fs::read_dir("/dev/input") else {
        return out;
    };
    for e in rd.flatten() {
        let p = e.path();
        let is_event_node = p
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.starts_with("event"));
        if !is_event_node {
            continue;
        }
        match RawDevice::open(&p) {
            Ok(dev) if is_multitouch(&dev) => out.push(DeviceInfo {
                path: p.display().to_string(),
                name: dev.name().unwrap_or("unknown").to_string(),
            }),
            Ok(_) => {}
            Err(e) => debug!("skipping {}: {e}", p.display()),
        }
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    out
}

/// Opened touch device plus the events read but not yet handed out.
///
/// Reads the unsynced stream so `SYN_DROPPED` reaches us; the replay that
/// follows it is passed through as the device framed it.
pub struct TouchDevice {
    device: RawDevice,
    pending: EventQueue,
}

/// Read-ahead buffer that tags the events of a `SYN_DROPPED` replay.
#[derive(Debug, Default)]
struct EventQueue {
    events: VecDeque<RawEvent>,
    resyncing: bool,
}

impl EventQueue {
    fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn push(&mut self, ev: RawEvent) {
        self.events.push_back(ev);
    }

    fn pop(&mut self) -> Option<ReadStatus> {
        let ev = self.events.pop_front()?;
        // everything up to the next report belongs to the replay
        if ev.is_dropped() {
            warn!("device dropped events; passing resync through");
            self.resyncing = true;
        }
        if self.resyncing {
            if ev.is_report() {
                self.resyncing = false;
            }
            return Some(ReadStatus::Resync(ev));
        }
        Some(ReadStatus::Event(ev))
    }
}

impl TouchDevice {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let device = RawDevice::open(path)
            .with_context(|| format!("failed to open device ({})", path.display()))?;
        Ok(Self {
            device,
            pending: EventQueue::default(),
        })
    }

    pub fn device(&self) -> &RawDevice {
        &self.device
    }

    pub fn name(&self) -> &str {
        self.device.name().unwrap_or("unknown")
    }

    pub fn geometry(&self) -> Result<DeviceGeometry, GeometryError> {
        DeviceGeometry::from_absinfo(self.device.get_absinfo()?)
    }

    /// Blocks until the kernel has at least one event for us.
    fn fill(&mut self) -> io::Result<()> {
        for ev in self.device.fetch_events()? {
            self.pending.push(RawEvent::from(ev));
        }
        Ok(())
    }
}

impl EventSource for TouchDevice {
    fn next_event(&mut self) -> io::Result<ReadStatus> {
        if self.pending.is_empty() {
            match self.fill() {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(ReadStatus::Pending),
                Err(e) => return Err(e),
            }
        }
        Ok(self.pending.pop().unwrap_or(ReadStatus::Pending))
    }

    fn grab(&mut self) -> io::Result<()> {
        self.device.grab()
    }

    fn ungrab(&mut self) -> io::Result<()> {
        self.device.ungrab()
    }
}

/// Capability dump in the spirit of `evtest`: identity, event codes with
/// their axis info, and input properties.
pub fn describe(dev: &RawDevice) -> serde_json::Value {
    let id = dev.input_id();
    let types: Vec<String> = dev
        .supported_events()
        .iter()
        .map(|t| format!("{t:?}"))
        .collect();
    let keys: Vec<String> = dev
        .supported_keys()
        .map(|k| k.iter().map(|c| format!("{c:?}")).collect())
        .unwrap_or_default();
    let axes: Vec<serde_json::Value> = dev
        .get_absinfo()
        .map(|it| {
            it.map(|(code, info)| {
                serde_json::json!({
                    "code": format!("{code:?}"),
                    "value": info.value(),
                    "min": info.minimum(),
                    "max": info.maximum(),
                    "fuzz": info.fuzz(),
                    "flat": info.flat(),
                    "resolution": info.resolution(),
                })
            })
            .collect()
        })
        .unwrap_or_default();
    let props: Vec<String> = dev
        .properties()
        .iter()
        .map(|p| format!("{p:?}"))
        .collect();

    serde_json::json!({
        "name": dev.name().unwrap_or("unknown"),
        "phys": dev.physical_path(),
        "uniq": dev.unique_name(),
        "id": {
            "bus": format!("{:#x}", id.bus_type().0),
            "vendor": format!("{:#x}", id.vendor()),
            "product": format!("{:#x}", id.product()),
            "version": format!("{:#x}", id.version()),
        },
        "driver_version": format!("{:?}", dev.driver_version()),
        "event_types": types,
        "keys": keys,
        "absolute_axes": axes,
        "properties": props,
        "multitouch": is_multitouch(dev),
    })
}
