//! The seam between a canvas and the widget that hosts it.

use crate::EventMask;
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use strum_macros::Display;

/// Outcome of a host pointer grab.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum GrabStatus {
    Success,
    AlreadyGrabbed,
    InvalidTime,
    NotViewable,
    Frozen,
}

/// Services a canvas needs from its hosting widget.
///
/// Calls are requests; the host performs them on its own schedule. A
/// scheduled update must eventually be answered with [`Canvas::run_idle`]
/// and a queued repaint with [`Canvas::draw`].
///
/// [`Canvas::run_idle`]: crate::Canvas::run_idle
/// [`Canvas::draw`]: crate::Canvas::draw
pub trait Host {
    /// Arrange for one deferred update pass.
    fn schedule_update(&mut self);

    /// Drop a previously scheduled update pass.
    fn cancel_update(&mut self);

    /// Arrange for one repaint of the pending damage.
    fn queue_repaint(&mut self);

    /// The canvas content changed size or visibility.
    fn queue_resize(&mut self) {}

    fn grab_pointer(&mut self, mask: EventMask, cursor: Option<&str>, time: u32) -> GrabStatus;

    fn ungrab_pointer(&mut self, time: u32);

    /// Give the hosting widget keyboard focus.
    fn grab_focus(&mut self) {}
}

/// Everything a [`RecordingHost`] was asked to do.
#[derive(Clone, Debug, Default)]
pub struct HostLog {
    pub updates_scheduled: usize,
    pub updates_cancelled: usize,
    pub repaints_queued: usize,
    pub resizes_queued: usize,
    pub pointer_grabs: Vec<(EventMask, Option<String>)>,
    pub pointer_ungrabs: usize,
    pub focus_grabs: usize,
    /// When set, pointer grabs fail with this status.
    pub refuse_grabs: Option<GrabStatus>,
}

/// A headless host that records requests instead of acting on them.
///
/// Clones share the same log, so a test can keep one handle while the
/// canvas owns another.
#[derive(Clone, Debug, Default)]
pub struct RecordingHost {
    log: Rc<RefCell<HostLog>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Ref<'_, HostLog> {
        self.log.borrow()
    }

    pub fn refuse_grabs(&self, status: Option<GrabStatus>) {
        self.log.borrow_mut().refuse_grabs = status;
    }

    pub fn reset(&self) {
        let refuse = self.log.borrow().refuse_grabs;
        *self.log.borrow_mut() = HostLog {
            refuse_grabs: refuse,
            ..HostLog::default()
        };
    }
}

impl Host for RecordingHost {
    fn schedule_update(&mut self) {
        self.log.borrow_mut().updates_scheduled += 1;
    }

    fn cancel_update(&mut self) {
        self.log.borrow_mut().updates_cancelled += 1;
    }

    fn queue_repaint(&mut self) {
        self.log.borrow_mut().repaints_queued += 1;
    }

    fn queue_resize(&mut self) {
        self.log.borrow_mut().resizes_queued += 1;
    }

    fn grab_pointer(&mut self, mask: EventMask, cursor: Option<&str>, _time: u32) -> GrabStatus {
        let mut log = self.log.borrow_mut();
        if let Some(status) = log.refuse_grabs {
            return status;
        }
        log.pointer_grabs.push((mask, cursor.map(str::to_owned)));
        GrabStatus::Success
    }

    fn ungrab_pointer(&mut self, _time: u32) {
        self.log.borrow_mut().pointer_ungrabs += 1;
    }

    fn grab_focus(&mut self) {
        self.log.borrow_mut().focus_grabs += 1;
    }
}
