//! Debug event collection
//!
//! Components emit events (register access, interrupts, DMA transfers) into a collector shared
//! with whoever wants to inspect them. Collection is globally disabled by default so the fast
//! path only costs an atomic load.
use core::marker::PhantomData;
use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use super::util::RingBuffer;

pub static DEBUG_EVENTS_ENABLED: AtomicBool = AtomicBool::new(false);

pub fn set_debug_events_enabled(enabled: bool) {
    DEBUG_EVENTS_ENABLED.store(enabled, Ordering::Relaxed);
}

pub trait DebugErrorCollector {
    #[cold]
    fn on_error(&mut self, message: String);
}

pub trait DebugEventCollector<EventT>: DebugErrorCollector {
    #[cold]
    fn on_event(&mut self, event: EventT);
}

/// Wrapper to a dyn trait reference of a DebugEventCollector
///
/// This is used by emulator components to generate events, which can then be
/// inspected by tests or tooling.
#[derive(Clone)]
pub struct DebugEventCollectorRef<EventT>(pub Rc<RefCell<dyn DebugEventCollector<EventT>>>);

impl<EventT: 'static> DebugEventCollectorRef<EventT> {
    /// A collector that drops everything.
    pub fn null() -> Self {
        DebugEventCollectorRef(Rc::new(RefCell::new(NullCollector)))
    }
}

impl<EventT> DebugEventCollectorRef<EventT> {
    pub fn on_event(&self, event: EventT) {
        if DEBUG_EVENTS_ENABLED.load(Ordering::Relaxed) {
            self.0.deref().borrow_mut().on_event(event);
        }
    }

    pub fn on_error(&self, message: String) {
        if DEBUG_EVENTS_ENABLED.load(Ordering::Relaxed) {
            self.0.deref().borrow_mut().on_error(message);
        }
    }
}

struct NullCollector;

impl DebugErrorCollector for NullCollector {
    fn on_error(&mut self, _message: String) {}
}

impl<EventT> DebugEventCollector<EventT> for NullCollector {
    fn on_event(&mut self, _event: EventT) {}
}

pub trait EventFilter<EventT> {
    fn matches(&self, event: &EventT) -> bool;
}

pub struct DebugEventLoggerConfig<EventT, EventFilterT: EventFilter<EventT>> {
    pub enabled: bool,
    pub event_filter: Vec<EventFilterT>,
    pub phantom: PhantomData<EventT>,
}

impl<EventT, EventFilterT: EventFilter<EventT>> DebugEventLoggerConfig<EventT, EventFilterT> {
    pub fn new(enabled: bool, event_filter: Vec<EventFilterT>) -> Self {
        Self {
            enabled,
            event_filter,
            phantom: PhantomData,
        }
    }
}

impl<EventT, EventFilterT: EventFilter<EventT>> Default
    for DebugEventLoggerConfig<EventT, EventFilterT>
{
    fn default() -> Self {
        Self {
            enabled: false,
            event_filter: Vec::new(),
            phantom: PhantomData,
        }
    }
}

/// Keeps the most recent events matching any of the configured filters.
pub struct DebugEventLogger<EventT, EventFilterT: EventFilter<EventT>> {
    pub config: DebugEventLoggerConfig<EventT, EventFilterT>,
    pub log: RingBuffer<EventT, 1024>,
    pub errors: RingBuffer<String, 64>,
}

impl<EventT, EventFilterT: EventFilter<EventT>> DebugEventLogger<EventT, EventFilterT> {
    pub fn new(config: DebugEventLoggerConfig<EventT, EventFilterT>) -> Self {
        Self {
            config,
            log: RingBuffer::default(),
            errors: RingBuffer::default(),
        }
    }

    pub fn collect_event(&mut self, event: EventT) {
        if !self.config.enabled {
            return;
        }
        if self
            .config
            .event_filter
            .iter()
            .any(|filter| filter.matches(&event))
        {
            self.log.push(event);
        }
    }
}

impl<EventT, EventFilterT: EventFilter<EventT>> Default for DebugEventLogger<EventT, EventFilterT> {
    fn default() -> Self {
        Self::new(DebugEventLoggerConfig::default())
    }
}

impl<EventT, EventFilterT: EventFilter<EventT>> DebugErrorCollector
    for DebugEventLogger<EventT, EventFilterT>
{
    fn on_error(&mut self, message: String) {
        if self.config.enabled {
            self.errors.push(message);
        }
    }
}

impl<EventT, EventFilterT: EventFilter<EventT>> DebugEventCollector<EventT>
    for DebugEventLogger<EventT, EventFilterT>
{
    fn on_event(&mut self, event: EventT) {
        self.collect_event(event);
    }
}
