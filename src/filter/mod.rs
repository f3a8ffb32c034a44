//! Batch filters that mute touches inside the cropped border.
//!
//! Both filters work on one complete frame at a time: slot positions are
//! first brought up to date with the whole batch, and only then are the
//! magnitude fields (touch/width major/minor, pressure) of contacts judged
//! to be in the border rewritten to zero. Events are never removed, so the
//! stream stays well-formed for whoever reads the synthetic device.

mod flex;
mod slots;
mod strict;
mod zone;

use evdev::{AbsInfo, AbsoluteAxisCode};
use serde::Deserialize;
use thiserror::Error;

use crate::event::RawEvent;

pub use flex::FlexCrop;
pub use strict::StrictCrop;
pub use zone::ValidZone;

pub trait EventFilter {
    /// Rewrites `batch` in place; returns how many fields were zeroed.
    fn process_events(&mut self, batch: &mut [RawEvent]) -> usize;
}

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("device does not appear to be a trackpad: {0:?} is missing")]
    MissingAxis(AbsoluteAxisCode),
    #[error("failed to read absolute axis info: {0}")]
    AbsInfoUnavailable(#[from] std::io::Error),
    #[error("device reports an invalid slot range (max {0})")]
    InvalidSlotRange(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl From<AbsInfo> for AxisRange {
    fn from(info: AbsInfo) -> Self {
        Self {
            min: info.minimum(),
            max: info.maximum(),
        }
    }
}

/// Percent of each axis cropped from the matching side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Borders {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Default for Borders {
    fn default() -> Self {
        Self::new(10, 10, 0, 15)
    }
}

impl Borders {
    pub const fn new(left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    pub fn in_range(perc: i32) -> bool {
        (0..=100).contains(&perc)
    }
}

/// What the filters need to know about the physical device, read once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceGeometry {
    pub x: AxisRange,
    pub y: AxisRange,
    pub max_slot: usize,
}

impl DeviceGeometry {
    /// Picks ABS_X, ABS_Y and ABS_MT_SLOT out of a device's axis table.
    pub fn from_absinfo(
        axes: impl IntoIterator<Item = (AbsoluteAxisCode, AbsInfo)>,
    ) -> Result<Self, GeometryError> {
        let (mut x, mut y, mut slot) = (None, None, None);
        for (code, info) in axes {
            match code {
                AbsoluteAxisCode::ABS_X => x = Some(AxisRange::from(info)),
                AbsoluteAxisCode::ABS_Y => y = Some(AxisRange::from(info)),
                AbsoluteAxisCode::ABS_MT_SLOT => slot = Some(info.maximum()),
                _ => {}
            }
        }

        let x = x.ok_or(GeometryError::MissingAxis(AbsoluteAxisCode::ABS_X))?;
        let y = y.ok_or(GeometryError::MissingAxis(AbsoluteAxisCode::ABS_Y))?;
        let max = slot.ok_or(GeometryError::MissingAxis(AbsoluteAxisCode::ABS_MT_SLOT))?;
        let max_slot = usize::try_from(max).map_err(|_| GeometryError::InvalidSlotRange(max))?;

        Ok(Self { x, y, max_slot })
    }

    /// Squared length of the device diagonal in raw units. A full `i32`
    /// span squares past `i64`, hence `i128`.
    pub fn diagonal_sq(&self) -> i128 {
        let dx = i128::from(self.x.max) - i128::from(self.x.min);
        let dy = i128::from(self.y.max) - i128::from(self.y.min);
        dx * dx + dy * dy
    }
}
