//! Raw evdev records and the classification the crop filters care about.

use evdev::{AbsoluteAxisCode, EventType, InputEvent, SynchronizationCode};

/// One `(type, code, value)` record as read from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub type_: u16,
    pub code: u16,
    pub value: i32,
}

/// One atomic frame: every event up to and including a `SYN_REPORT`.
pub type EventBatch = Vec<RawEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PositionX,
    PositionY,
    Slot,
    TrackingId,
    /// Touch size or pressure; zeroed to suppress a contact.
    Magnitude,
    Report,
    Other,
}

impl RawEvent {
    pub const fn new(type_: u16, code: u16, value: i32) -> Self {
        Self { type_, code, value }
    }

    pub const fn abs(code: AbsoluteAxisCode, value: i32) -> Self {
        Self::new(EventType::ABSOLUTE.0, code.0, value)
    }

    pub const fn report() -> Self {
        Self::new(
            EventType::SYNCHRONIZATION.0,
            SynchronizationCode::SYN_REPORT.0,
            0,
        )
    }

    pub fn kind(&self) -> EventKind {
        if self.type_ == EventType::SYNCHRONIZATION.0 {
            return if self.code == SynchronizationCode::SYN_REPORT.0 {
                EventKind::Report
            } else {
                EventKind::Other
            };
        }
        if self.type_ != EventType::ABSOLUTE.0 {
            return EventKind::Other;
        }
        match AbsoluteAxisCode(self.code) {
            AbsoluteAxisCode::ABS_MT_POSITION_X => EventKind::PositionX,
            AbsoluteAxisCode::ABS_MT_POSITION_Y => EventKind::PositionY,
            AbsoluteAxisCode::ABS_MT_SLOT => EventKind::Slot,
            AbsoluteAxisCode::ABS_MT_TRACKING_ID => EventKind::TrackingId,
            AbsoluteAxisCode::ABS_MT_TOUCH_MAJOR
            | AbsoluteAxisCode::ABS_MT_TOUCH_MINOR
            | AbsoluteAxisCode::ABS_MT_WIDTH_MAJOR
            | AbsoluteAxisCode::ABS_MT_WIDTH_MINOR
            | AbsoluteAxisCode::ABS_MT_PRESSURE => EventKind::Magnitude,
            _ => EventKind::Other,
        }
    }

    pub fn is_report(&self) -> bool {
        self.kind() == EventKind::Report
    }

    pub fn is_dropped(&self) -> bool {
        self.type_ == EventType::SYNCHRONIZATION.0
            && self.code == SynchronizationCode::SYN_DROPPED.0
    }
}

impl From<InputEvent> for RawEvent {
    fn from(ev: InputEvent) -> Self {
        Self::new(ev.event_type().0, ev.code(), ev.value())
    }
}

impl From<RawEvent> for InputEvent {
    fn from(ev: RawEvent) -> Self {
        InputEvent::new(ev.type_, ev.code, ev.value)
    }
}
