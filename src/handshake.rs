//! Trigger/result handshake between a measurement requester and the cycle.
//!
//! ```text
//! ┌─────────────┐  trigger   ┌─────────────┐  trigger   ┌──────────────────┐
//! │  Requester  │──(set)────▶│  Handshake  │──(clear)──▶│    Responder     │
//! │  (caller)   │◀─(take)────│  2 × atomic │◀──(set)────│ (MeasurementCycle)│
//! └─────────────┘  new_data  └─────────────┘  new_data  └──────────────────┘
//! ```
//!
//! | Flag       | set by    | cleared by           |
//! |------------|-----------|----------------------|
//! | `trigger`  | Requester | Responder on publish |
//! | `new_data` | Responder | Requester            |
//!
//! [`Handshake::split`] borrows the handshake mutably, so exactly one
//! requester and one responder exist for as long as the halves are alive.
//! Both flags are atomics: the requester may live in another cooperative
//! task, a timer callback or an ISR.

use core::sync::atomic::{AtomicBool, Ordering};

/// Result of [`Requester::trigger_measurement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAck {
    /// The trigger was idle and is now set.
    Accepted,
    /// A request was already outstanding; it still stands, nothing queued.
    AlreadyPending,
}

pub struct Handshake {
    trigger: AtomicBool,
    new_data: AtomicBool,
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

impl Handshake {
    pub const fn new() -> Self {
        Self {
            trigger: AtomicBool::new(false),
            new_data: AtomicBool::new(false),
        }
    }

    /// Split into the caller half and the cycle half.
    pub fn split(&mut self) -> (Requester<'_>, Responder<'_>) {
        let shared: &Self = self;
        (Requester { shared }, Responder { shared })
    }
}

/// Caller side: requests measurements and collects completion.
pub struct Requester<'a> {
    shared: &'a Handshake,
}

impl Requester<'_> {
    /// Request a measurement.  An accepted request also discards any
    /// unread completion so the next `take_new_data()` refers to it.  A
    /// repeat while one is outstanding leaves both flags alone.
    pub fn trigger_measurement(&self) -> TriggerAck {
        if self.shared.trigger.swap(true, Ordering::AcqRel) {
            return TriggerAck::AlreadyPending;
        }
        self.shared.new_data.store(false, Ordering::Release);
        TriggerAck::Accepted
    }

    /// `true` while a request has not been serviced yet.
    pub fn is_pending(&self) -> bool {
        self.shared.trigger.load(Ordering::Acquire)
    }

    /// Peek at the completion flag without clearing it.
    pub fn has_new_data(&self) -> bool {
        self.shared.new_data.load(Ordering::Acquire)
    }

    /// Read and clear the completion flag.
    pub fn take_new_data(&self) -> bool {
        self.shared.new_data.swap(false, Ordering::AcqRel)
    }
}

/// Cycle side: observes requests and signals completion.
pub struct Responder<'a> {
    shared: &'a Handshake,
}

impl Responder<'_> {
    pub fn is_triggered(&self) -> bool {
        self.shared.trigger.load(Ordering::Acquire)
    }

    /// Retire the outstanding request, then signal completion.
    ///
    /// A trigger landing between the two stores is accepted as a fresh
    /// request; its completion flag is then set by this publish, and the
    /// cycle services the new request on its next pass.
    pub fn publish(&self) {
        self.shared.trigger.store(false, Ordering::Release);
        self.shared.new_data.store(true, Ordering::Release);
    }
}
