//! Crop that lets multi-finger gestures reach into the border.
//!
//! A contact outside the valid zone is still passed through when another
//! live contact is within a quarter of the device diagonal of it, so a
//! two-finger scroll whose second finger strays into the border stays a
//! two-finger scroll. A lone touch in the border is treated as noise.
//!
//! Validity is sticky for the lifetime of a contact: it is cleared only
//! when the slot sees a tracking-id change, so a finger that started in
//! the zone keeps working after it slides into the border.
//!
//! The proximity check is one scan over all pairs per frame. Every close
//! pair with at least one not-yet-valid member is visited in that scan, so
//! "valid" ends up meaning "inside, or near some other live contact"; it is
//! not a transitive closure over chains of nearby contacts.

use std::collections::BTreeSet;

use log::trace;

use super::slots::{SlotObserver, SlotTracker, zero_magnitudes};
use super::{Borders, DeviceGeometry, EventFilter, ValidZone};
use crate::event::RawEvent;

/// Live slots and their per-contact verdicts.
#[derive(Debug, Clone)]
struct ActiveSlots {
    // ascending iteration keeps the pair scan deterministic
    live: BTreeSet<usize>,
    valid: Vec<bool>,
}

impl ActiveSlots {
    fn new(capacity: usize) -> Self {
        Self {
            live: BTreeSet::new(),
            valid: vec![false; capacity],
        }
    }

    fn is_valid(&self, slot: usize) -> bool {
        self.valid.get(slot).copied().unwrap_or(false)
    }

    fn mark_valid(&mut self, slot: usize) {
        if let Some(v) = self.valid.get_mut(slot) {
            *v = true;
        }
    }
}

impl SlotObserver for ActiveSlots {
    fn on_tracking_id(&mut self, slot: Option<usize>, value: i32) {
        let Some(slot) = slot else {
            return;
        };
        if let Some(v) = self.valid.get_mut(slot) {
            *v = false;
        }
        if value == -1 {
            self.live.remove(&slot);
        } else {
            self.live.insert(slot);
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlexCrop {
    zone: ValidZone,
    slots: SlotTracker,
    active: ActiveSlots,
    /// `diagonal² / 16`, i.e. (diagonal / 4)².
    near_sq: i128,
}

impl FlexCrop {
    pub fn new(geometry: &DeviceGeometry, borders: Borders) -> Self {
        let slots = SlotTracker::new(geometry.max_slot);
        Self {
            zone: ValidZone::new(geometry.x, geometry.y, borders),
            active: ActiveSlots::new(slots.capacity()),
            slots,
            near_sq: geometry.diagonal_sq() / 16,
        }
    }

    pub fn zone(&self) -> &ValidZone {
        &self.zone
    }

    pub fn active_count(&self) -> usize {
        self.active.live.len()
    }

    fn mark_inside(&mut self) {
        for &s in &self.active.live {
            let Some(state) = self.slots.at(s) else {
                continue;
            };
            if self.zone.inside(state.pos.x, state.pos.y) {
                self.active.valid[s] = true;
            }
        }
    }

    fn mark_near(&mut self) {
        let live: Vec<usize> = self.active.live.iter().copied().collect();
        for &s1 in &live {
            if self.active.is_valid(s1) {
                continue;
            }
            for &s2 in &live {
                if s1 == s2 {
                    continue;
                }
                let (Some(a), Some(b)) = (self.slots.at(s1), self.slots.at(s2)) else {
                    continue;
                };
                if a.pos.distance_sq(&b.pos) < self.near_sq {
                    self.active.mark_valid(s1);
                    self.active.mark_valid(s2);
                }
            }
        }
    }
}

impl EventFilter for FlexCrop {
    fn process_events(&mut self, batch: &mut [RawEvent]) -> usize {
        let start = self.slots.ingest(batch, &mut self.active);
        self.mark_inside();
        self.mark_near();

        let active = &self.active;
        let zeroed = zero_magnitudes(batch, start, &self.slots, |slot, _| {
            !active.is_valid(slot)
        });
        if zeroed > 0 {
            trace!(
                "flex: zeroed {zeroed} magnitude field(s), {} live contact(s)",
                self.active_count()
            );
        }
        zeroed
    }
}
