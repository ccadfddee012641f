//! Deterministic event scheduler driving the emulated timeline.
//!
//! Time is measured in CPU cycles. Events are registered once by name and can then be scheduled
//! any number of times with a userdata payload. Events with the same timestamp fire in the order
//! they were scheduled.
//!
//! Code running on other threads (e.g. a threaded DSP engine) cannot touch the scheduler. It
//! pushes onto a [ThreadEventQueue] instead, which is moved into the main queue whenever the
//! timeline looks for due events.
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::Mutex;

use super::bus::EventTypeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct ScheduledEvent {
    time: u64,
    sequence: u64,
    event: EventTypeId,
    userdata: u64,
}

/// An event that became due while advancing the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FiredEvent {
    pub time: u64,
    pub event: EventTypeId,
    pub userdata: u64,
}

#[derive(Clone, Copy, Debug)]
struct ThreadEvent {
    cycles_into_future: u64,
    event: EventTypeId,
    userdata: u64,
}

/// Events scheduled from threads other than the emulation thread.
#[derive(Clone, Debug, Default)]
pub struct ThreadEventQueue(Arc<Mutex<Vec<ThreadEvent>>>);

impl ThreadEventQueue {
    pub fn push(&self, cycles_into_future: u64, event: EventTypeId, userdata: u64) {
        let entry = ThreadEvent {
            cycles_into_future,
            event,
            userdata,
        };
        match self.0.lock() {
            Ok(mut queue) => queue.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }

    fn take(&self) -> Vec<ThreadEvent> {
        match self.0.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

#[derive(Default)]
pub struct Scheduler {
    now: u64,
    next_sequence: u64,
    event_names: Vec<&'static str>,
    queue: BinaryHeap<Reverse<ScheduledEvent>>,
    thread_queue: ThreadEventQueue,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Registers an event type. Registering a name twice returns the existing id.
    pub fn register_event(&mut self, name: &'static str) -> EventTypeId {
        if let Some(idx) = self.event_names.iter().position(|n| *n == name) {
            log::warn!("Event type {name} registered twice");
            return EventTypeId(idx);
        }
        self.event_names.push(name);
        EventTypeId(self.event_names.len() - 1)
    }

    pub fn event_name(&self, event: EventTypeId) -> Option<&'static str> {
        self.event_names.get(event.0).copied()
    }

    pub fn schedule(&mut self, cycles_into_future: u64, event: EventTypeId, userdata: u64) {
        let time = self.now + cycles_into_future;
        log::trace!(
            "Schedule {} at {time} ({userdata:#x})",
            self.event_name(event).unwrap_or("<unregistered>")
        );
        self.queue.push(Reverse(ScheduledEvent {
            time,
            sequence: self.next_sequence,
            event,
            userdata,
        }));
        self.next_sequence += 1;
    }

    pub fn thread_queue(&self) -> ThreadEventQueue {
        self.thread_queue.clone()
    }

    /// Moves events scheduled from other threads into the main queue, relative to the current
    /// time.
    pub fn move_thread_events(&mut self) {
        for entry in self.thread_queue.take() {
            self.schedule(entry.cycles_into_future, entry.event, entry.userdata);
        }
    }

    /// Returns the next event due at or before `until` and moves the current time to it.
    pub fn pop_due(&mut self, until: u64) -> Option<FiredEvent> {
        self.move_thread_events();
        let Reverse(next) = self.queue.peek()?;
        if next.time > until {
            return None;
        }
        let Reverse(next) = self.queue.pop()?;
        self.now = self.now.max(next.time);
        Some(FiredEvent {
            time: next.time,
            event: next.event,
            userdata: next.userdata,
        })
    }

    /// Moves the current time forward to `until`. Due events should be consumed with
    /// [Scheduler::pop_due] first.
    pub fn advance_to(&mut self, until: u64) {
        self.now = self.now.max(until);
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(e)| e.time)
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn events_fire_in_time_then_schedule_order() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.register_event("A");
        let b = scheduler.register_event("B");
        scheduler.schedule(100, b, 1);
        scheduler.schedule(50, a, 2);
        scheduler.schedule(100, a, 3);

        assert_eq!(scheduler.pop_due(40), None);
        let fired: Vec<_> = std::iter::from_fn(|| scheduler.pop_due(1000))
            .map(|e| (e.time, e.event, e.userdata))
            .collect();
        assert_eq!(fired, vec![(50, a, 2), (100, b, 1), (100, a, 3)]);
        assert_eq!(scheduler.now(), 100);
    }

    #[test]
    fn schedule_is_relative_to_now() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.register_event("A");
        scheduler.advance_to(1000);
        scheduler.schedule(10, a, 0);
        assert_eq!(scheduler.next_event_time(), Some(1010));
    }

    #[test]
    fn duplicate_registration_returns_existing_id() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.register_event("A");
        scheduler.register_event("B");
        assert_eq!(scheduler.register_event("A"), a);
        assert_eq!(scheduler.event_name(a), Some("A"));
    }

    #[test]
    fn thread_events_are_moved_on_pop() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.register_event("A");
        scheduler.advance_to(500);
        let queue = scheduler.thread_queue();
        thread::spawn(move || queue.push(20, a, 7)).join().unwrap();
        assert_eq!(scheduler.pending_events(), 0);
        assert_eq!(
            scheduler.pop_due(520),
            Some(FiredEvent {
                time: 520,
                event: a,
                userdata: 7
            })
        );
    }
}
