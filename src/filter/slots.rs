//! Per-slot contact positions, updated once per batch.

use log::debug;

use crate::event::{EventKind, RawEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Exact for any pair of `i32` coordinates.
    pub fn distance_sq(&self, other: &Point) -> i128 {
        let dx = i128::from(self.x) - i128::from(other.x);
        let dy = i128::from(self.y) - i128::from(other.y);
        dx * dx + dy * dy
    }
}

#[derive(Debug, Clone, Default)]
pub struct SlotState {
    pub pos: Point,
}

/// Called for every event of the ingest pass with the slot it targets
/// (`None` when the device selected a slot outside `0..=max_slot`).
pub trait SlotObserver {
    fn on_tracking_id(&mut self, _slot: Option<usize>, _value: i32) {}
}

impl SlotObserver for () {}

/// Fixed-capacity slot storage sized `max_slot + 1`; device-reported
/// indices go through [`SlotTracker::index`] before touching it.
#[derive(Debug, Clone)]
pub struct SlotTracker {
    slots: Vec<SlotState>,
    // raw device value; persists across batches
    current: i32,
}

impl SlotTracker {
    pub fn new(max_slot: usize) -> Self {
        Self {
            slots: vec![SlotState::default(); max_slot + 1],
            current: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn index(&self, raw: i32) -> Option<usize> {
        usize::try_from(raw).ok().filter(|&s| s < self.slots.len())
    }

    pub fn get_mut(&mut self, raw: i32) -> Option<&mut SlotState> {
        self.index(raw).map(move |s| &mut self.slots[s])
    }

    pub fn at(&self, slot: usize) -> Option<&SlotState> {
        self.slots.get(slot)
    }

    /// Ingests a whole batch in arrival order and returns the slot cursor
    /// that was in effect before it, which the mutation pass starts from.
    pub fn ingest(&mut self, batch: &[RawEvent], observer: &mut impl SlotObserver) -> i32 {
        let before = self.current;
        for ev in batch {
            match ev.kind() {
                EventKind::Slot => {
                    self.current = ev.value;
                    if self.index(ev.value).is_none() {
                        debug!(
                            "slot {} outside 0..{}; its events pass unclassified",
                            ev.value,
                            self.slots.len()
                        );
                    }
                }
                EventKind::PositionX => {
                    if let Some(s) = self.get_mut(self.current) {
                        s.pos.x = ev.value;
                    }
                }
                EventKind::PositionY => {
                    if let Some(s) = self.get_mut(self.current) {
                        s.pos.y = ev.value;
                    }
                }
                EventKind::TrackingId => {
                    let slot = self.index(self.current);
                    observer.on_tracking_id(slot, ev.value);
                }
                _ => {}
            }
        }
        before
    }
}

/// Second pass shared by both filters: walks the batch from `start_slot`
/// and zeroes every magnitude field for which `suppress(slot)` holds.
/// Returns how many fields were zeroed.
pub fn zero_magnitudes(
    batch: &mut [RawEvent],
    start_slot: i32,
    tracker: &SlotTracker,
    mut suppress: impl FnMut(usize, &SlotState) -> bool,
) -> usize {
    let mut slot = start_slot;
    let mut zeroed = 0;
    for ev in batch.iter_mut() {
        match ev.kind() {
            EventKind::Slot => slot = ev.value,
            EventKind::Magnitude => {
                let Some(idx) = tracker.index(slot) else {
                    continue;
                };
                if ev.value != 0 && suppress(idx, &tracker.slots[idx]) {
                    ev.value = 0;
                    zeroed += 1;
                }
            }
            _ => {}
        }
    }
    zeroed
}
