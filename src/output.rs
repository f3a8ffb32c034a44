//! Synthetic uinput device that mirrors the grabbed touchpad.

use std::io;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use evdev::raw_stream::RawDevice;
use evdev::uinput::VirtualDevice;
use evdev::{InputEvent, UinputAbsSetup};
use log::info;

use crate::event::RawEvent;
use crate::session::EventSink;

/// Time given to udev and compositors to pick the new node up.
const SETTLE: Duration = Duration::from_secs(1);

pub struct MirrorSink {
    dev: VirtualDevice,
    frame: Vec<InputEvent>,
}

impl MirrorSink {
    /// Creates a virtual device with the same identity, keys, axes (with
    /// their full absinfo), properties and misc codes as `source`.
    pub fn create_from(source: &RawDevice) -> Result<Self> {
        let name = source.name().unwrap_or("touchcrop virtual touchpad").to_string();
        let mut builder = VirtualDevice::builder()
            .context("failed to open /dev/uinput")?
            .name(&name)
            .input_id(source.input_id())
            .with_properties(source.properties())?;

        if let Some(keys) = source.supported_keys() {
            builder = builder.with_keys(keys)?;
        }
        if let Some(rel) = source.supported_relative_axes() {
            builder = builder.with_relative_axes(rel)?;
        }
        if let Some(msc) = source.misc_properties() {
            builder = builder.with_msc(msc)?;
        }
        for (code, info) in source.get_absinfo()? {
            builder = builder.with_absolute_axis(&UinputAbsSetup::new(code, info))?;
        }

        let mut dev = builder.build().context("failed to create uinput device")?;
        if let Ok(nodes) = dev.enumerate_dev_nodes_blocking() {
            for node in nodes.flatten() {
                info!("uinput: mirror available as {}", node.display());
            }
        }
        thread::sleep(SETTLE);

        Ok(Self {
            dev,
            frame: Vec::with_capacity(50),
        })
    }
}

impl EventSink for MirrorSink {
    /// Collects a frame and emits it on `SYN_REPORT`; evdev terminates
    /// every emitted batch with its own report.
    fn write_event(&mut self, event: &RawEvent) -> io::Result<()> {
        if !event.is_report() {
            self.frame.push(InputEvent::from(*event));
            return Ok(());
        }
        let res = self.dev.emit(&self.frame);
        self.frame.clear();
        res
    }
}
