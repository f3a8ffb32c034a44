use log::trace;

use super::slots::{SlotTracker, zero_magnitudes};
use super::{Borders, DeviceGeometry, EventFilter, ValidZone};
use crate::event::RawEvent;

/// Mutes every contact whose current position is outside the valid zone.
#[derive(Debug, Clone)]
pub struct StrictCrop {
    zone: ValidZone,
    slots: SlotTracker,
}

impl StrictCrop {
    pub fn new(geometry: &DeviceGeometry, borders: Borders) -> Self {
        Self {
            zone: ValidZone::new(geometry.x, geometry.y, borders),
            slots: SlotTracker::new(geometry.max_slot),
        }
    }

    pub fn zone(&self) -> &ValidZone {
        &self.zone
    }
}

impl EventFilter for StrictCrop {
    fn process_events(&mut self, batch: &mut [RawEvent]) -> usize {
        let start = self.slots.ingest(batch, &mut ());
        let zone = &self.zone;
        let zeroed = zero_magnitudes(batch, start, &self.slots, |_, state| {
            !zone.inside(state.pos.x, state.pos.y)
        });
        if zeroed > 0 {
            trace!("strict: zeroed {zeroed} magnitude field(s)");
        }
        zeroed
    }
}
