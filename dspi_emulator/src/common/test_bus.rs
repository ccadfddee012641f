//! Collaborator implementation for unit tests.
//!
//! Memory is sparse so tests only pay for what they touch. Everything the device does to the
//! outside world is recorded for inspection.
use std::collections::HashMap;

use super::bus::AudioSink;
use super::bus::EventScheduler;
use super::bus::EventTypeId;
use super::bus::FromThread;
use super::bus::HighSpeedPort;
use super::bus::MainMemory;
use super::bus::ProcessorInterface;

pub const TEST_RAM_MASK: u32 = 0x01FF_FFFF;
pub const TEST_EXRAM_SIZE: usize = 0x0400_0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledCall {
    pub cycles_into_future: u64,
    pub event: EventTypeId,
    pub userdata: u64,
    pub from: FromThread,
}

#[derive(Default)]
pub struct TestBus {
    pub ram: HashMap<u32, u8>,
    pub exram: Vec<u8>,
    pub registered_events: Vec<&'static str>,
    pub scheduled: Vec<ScheduledCall>,
    pub samples: Vec<i16>,
    pub hsp: HashMap<u32, u64>,
    /// Every value the interrupt line was set to, in order.
    pub interrupt_line: Vec<bool>,
}

impl TestBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test bus of a console with extended RAM.
    pub fn with_exram() -> Self {
        Self {
            exram: vec![0; TEST_EXRAM_SIZE],
            ..Default::default()
        }
    }

    pub fn load_ram(&mut self, addr: u32, data: &[u8]) {
        for (idx, byte) in data.iter().enumerate() {
            self.write_u8(addr + idx as u32, *byte);
        }
    }

    pub fn ram_bytes(&self, addr: u32, len: usize) -> Vec<u8> {
        (0..len as u32).map(|idx| self.read_u8(addr + idx)).collect()
    }

    pub fn interrupt_asserted(&self) -> bool {
        self.interrupt_line.last().copied().unwrap_or(false)
    }

    pub fn event_id(&self, name: &str) -> Option<EventTypeId> {
        self.registered_events
            .iter()
            .position(|n| *n == name)
            .map(EventTypeId)
    }

    pub fn take_scheduled(&mut self) -> Vec<ScheduledCall> {
        std::mem::take(&mut self.scheduled)
    }
}

impl MainMemory for TestBus {
    fn read_u8(&self, addr: u32) -> u8 {
        self.ram.get(&(addr & TEST_RAM_MASK)).copied().unwrap_or(0)
    }

    fn write_u8(&mut self, addr: u32, value: u8) {
        self.ram.insert(addr & TEST_RAM_MASK, value);
    }

    fn read_u64(&self, addr: u32) -> u64 {
        let mut bytes = [0; 8];
        self.read_bytes(addr, &mut bytes);
        u64::from_be_bytes(bytes)
    }

    fn write_u64(&mut self, addr: u32, value: u64) {
        for (idx, byte) in value.to_be_bytes().iter().enumerate() {
            self.write_u8(addr + idx as u32, *byte);
        }
    }

    fn ram_mask(&self) -> u32 {
        TEST_RAM_MASK
    }

    fn exram(&self) -> &[u8] {
        &self.exram
    }

    fn exram_mut(&mut self) -> &mut [u8] {
        &mut self.exram
    }

    fn exram_mask(&self) -> u32 {
        (self.exram.len() as u32).saturating_sub(1)
    }
}

impl EventScheduler for TestBus {
    fn register_event(&mut self, name: &'static str) -> EventTypeId {
        self.registered_events.push(name);
        EventTypeId(self.registered_events.len() - 1)
    }

    fn schedule_event(
        &mut self,
        cycles_into_future: u64,
        event: EventTypeId,
        userdata: u64,
        from: FromThread,
    ) {
        self.scheduled.push(ScheduledCall {
            cycles_into_future,
            event,
            userdata,
            from,
        });
    }
}

impl AudioSink for TestBus {
    fn push_audio_samples(&mut self, samples: &[i16]) {
        self.samples.extend_from_slice(samples);
    }
}

impl HighSpeedPort for TestBus {
    fn hsp_read(&mut self, addr: u32) -> u64 {
        self.hsp.get(&addr).copied().unwrap_or(0)
    }

    fn hsp_write(&mut self, addr: u32, value: u64) {
        self.hsp.insert(addr, value);
    }
}

impl ProcessorInterface for TestBus {
    fn set_dsp_interrupt(&mut self, asserted: bool) {
        self.interrupt_line.push(asserted);
    }
}
