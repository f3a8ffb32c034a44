//! Read loop: batches raw events into frames and hands them to a handler.

use std::io;
use std::ops::{Deref, DerefMut};

use log::{debug, warn};
use thiserror::Error;

use crate::event::{EventBatch, RawEvent};
use crate::filter::EventFilter;

/// Outcome of one blocking read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    Event(RawEvent),
    /// Part of the state replay after the kernel dropped events.
    Resync(RawEvent),
    /// Nothing to read yet.
    Pending,
}

pub trait EventSource {
    fn next_event(&mut self) -> io::Result<ReadStatus>;
    fn grab(&mut self) -> io::Result<()>;
    fn ungrab(&mut self) -> io::Result<()>;
}

/// Destination of forwarded events; `write_event` failures are reported
/// but never stop a batch.
///
/// A sink may buffer until `SYN_REPORT` and write the frame in one go (the
/// uinput mirror does). Its failures then surface on the report event and
/// cost the whole frame, not a single event.
pub trait EventSink {
    fn write_event(&mut self, event: &RawEvent) -> io::Result<()>;
}

pub trait EventHandler {
    fn wants_grab(&self) -> bool;
    fn on_data(&mut self, event: RawEvent);
    fn on_report(&mut self, event: RawEvent);
    fn on_resync(&mut self, event: RawEvent);
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to grab device: {0}")]
    Grab(#[source] io::Error),
    #[error("failed to handle events: {0}")]
    Read(#[source] io::Error),
}

/// Exclusive grab held for as long as the guard lives.
pub struct GrabGuard<'a, S: EventSource> {
    source: &'a mut S,
}

impl<'a, S: EventSource> GrabGuard<'a, S> {
    pub fn acquire(source: &'a mut S) -> io::Result<Self> {
        source.grab()?;
        debug!("device grabbed");
        Ok(Self { source })
    }
}

impl<S: EventSource> Deref for GrabGuard<'_, S> {
    type Target = S;
    fn deref(&self) -> &S {
        self.source
    }
}

impl<S: EventSource> DerefMut for GrabGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.source
    }
}

impl<S: EventSource> Drop for GrabGuard<'_, S> {
    fn drop(&mut self) {
        match self.source.ungrab() {
            Ok(()) => debug!("device released"),
            Err(e) => warn!("failed to ungrab device: {e}"),
        }
    }
}

/// Drives `source` until a read fails. Only returns with an error: a
/// blocking source has no other way to end.
pub fn run_event_loop<S, H>(source: &mut S, handler: &mut H) -> Result<(), SessionError>
where
    S: EventSource,
    H: EventHandler,
{
    if handler.wants_grab() {
        let mut grabbed = GrabGuard::acquire(source).map_err(SessionError::Grab)?;
        pump(&mut *grabbed, handler)
    } else {
        pump(source, handler)
    }
}

fn pump<S: EventSource, H: EventHandler>(
    source: &mut S,
    handler: &mut H,
) -> Result<(), SessionError> {
    loop {
        match source.next_event() {
            Ok(ReadStatus::Event(ev)) if ev.is_report() => handler.on_report(ev),
            Ok(ReadStatus::Event(ev)) => handler.on_data(ev),
            Ok(ReadStatus::Resync(ev)) => handler.on_resync(ev),
            Ok(ReadStatus::Pending) => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) => return Err(SessionError::Read(e)),
        }
    }
}

/// Filters each frame and writes it to a sink.
pub struct ForwardTo<D: EventSink, F: EventFilter> {
    batch: EventBatch,
    dest: D,
    filter: F,
}

impl<D: EventSink, F: EventFilter> ForwardTo<D, F> {
    pub fn new(dest: D, filter: F) -> Self {
        Self {
            batch: Vec::with_capacity(50),
            dest,
            filter,
        }
    }

    fn flush(&mut self) {
        self.filter.process_events(&mut self.batch);
        for ev in &self.batch {
            if let Err(e) = self.dest.write_event(ev) {
                warn!(
                    "failed to write event (type {}, code {}): {e}",
                    ev.type_, ev.code
                );
            }
        }
        self.batch.clear();
    }
}

impl<D: EventSink, F: EventFilter> EventHandler for ForwardTo<D, F> {
    fn wants_grab(&self) -> bool {
        true
    }

    fn on_data(&mut self, event: RawEvent) {
        self.batch.push(event);
    }

    fn on_report(&mut self, event: RawEvent) {
        self.batch.push(event);
        self.flush();
    }

    fn on_resync(&mut self, event: RawEvent) {
        // replay framing is the device's; each event is its own frame
        if !self.batch.is_empty() {
            self.flush();
        }
        self.batch.push(event);
        self.flush();
    }
}

/// Prints every event; never grabs.
pub struct PrintEvents<W: io::Write> {
    out: W,
}

impl<W: io::Write> PrintEvents<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn print(&mut self, tag: &str, ev: RawEvent) {
        let line = if ev.is_report() {
            "++++++++++++++++++++ SYN_REPORT +++++++++++++++".to_string()
        } else {
            format!(
                "type {} ({}), code {}, value {}",
                ev.type_,
                type_name(ev.type_),
                ev.code,
                ev.value
            )
        };
        if let Err(e) = writeln!(self.out, "{tag}{line}") {
            warn!("failed to print event: {e}");
        }
    }
}

impl<W: io::Write> EventHandler for PrintEvents<W> {
    fn wants_grab(&self) -> bool {
        false
    }
    fn on_data(&mut self, event: RawEvent) {
        self.print("Event: ", event);
    }
    fn on_report(&mut self, event: RawEvent) {
        self.print("Event: ", event);
    }
    fn on_resync(&mut self, event: RawEvent) {
        self.print("Resync: ", event);
    }
}

fn type_name(type_: u16) -> String {
    format!("{:?}", evdev::EventType(type_))
}
