//! Reference implementation of the hardware surrounding the DSP interface.
//!
//! Provides main memory, extended RAM on the Wii, the event scheduler, a capture of the audio
//! output, a sparse high speed port and the DSP interrupt line of the processor interface.
use std::collections::HashMap;

use crate::common::bus::AudioSink;
use crate::common::bus::EventScheduler;
use crate::common::bus::EventTypeId;
use crate::common::bus::FromThread;
use crate::common::bus::HighSpeedPort;
use crate::common::bus::MainMemory;
use crate::common::bus::ProcessorInterface;
use crate::common::scheduler::Scheduler;
use crate::components::dspi::ConsoleRevision;

/// 24 MiB of main RAM, mirrored every 32 MiB.
pub const RAM_SIZE: usize = 0x0180_0000;
pub const RAM_MASK: u32 = 0x01FF_FFFF;
/// 64 MiB of extended RAM on the Wii.
pub const EXRAM_SIZE: usize = 0x0400_0000;
pub const EXRAM_MASK: u32 = 0x03FF_FFFF;
/// Physical addresses from 0x1000_0000 decode to extended RAM on the Wii.
pub const EXRAM_SELECT: u32 = 0x1000_0000;

pub struct MainBusImpl {
    pub ram: Vec<u8>,
    pub exram: Vec<u8>,
    pub scheduler: Scheduler,
    /// Interleaved stereo samples produced by the audio DMA.
    pub audio_output: Vec<i16>,
    pub hsp: HashMap<u32, u64>,
    pub dsp_interrupt: bool,
}

impl MainBusImpl {
    pub fn new(console: ConsoleRevision) -> Self {
        Self {
            ram: vec![0; RAM_SIZE],
            exram: if console.is_wii() {
                vec![0; EXRAM_SIZE]
            } else {
                Vec::new()
            },
            scheduler: Scheduler::new(),
            audio_output: Vec::new(),
            hsp: HashMap::new(),
            dsp_interrupt: false,
        }
    }

    pub fn load_ram(&mut self, addr: u32, data: &[u8]) {
        for (idx, byte) in data.iter().enumerate() {
            self.write_u8(addr.wrapping_add(idx as u32), *byte);
        }
    }

    pub fn ram_slice(&self, addr: u32, len: usize) -> Vec<u8> {
        let mut data = vec![0; len];
        self.read_bytes(addr, &mut data);
        data
    }
}

impl MainMemory for MainBusImpl {
    fn read_u8(&self, addr: u32) -> u8 {
        let (memory, offset) = if addr & EXRAM_SELECT != 0 && !self.exram.is_empty() {
            (&self.exram, addr & EXRAM_MASK)
        } else {
            (&self.ram, addr & RAM_MASK)
        };
        memory.get(offset as usize).copied().unwrap_or(0)
    }

    fn write_u8(&mut self, addr: u32, value: u8) {
        let (memory, offset) = if addr & EXRAM_SELECT != 0 && !self.exram.is_empty() {
            (&mut self.exram, addr & EXRAM_MASK)
        } else {
            (&mut self.ram, addr & RAM_MASK)
        };
        if let Some(byte) = memory.get_mut(offset as usize) {
            *byte = value;
        }
    }

    fn read_u64(&self, addr: u32) -> u64 {
        let mut bytes = [0; 8];
        self.read_bytes(addr, &mut bytes);
        u64::from_be_bytes(bytes)
    }

    fn write_u64(&mut self, addr: u32, value: u64) {
        for (idx, byte) in value.to_be_bytes().into_iter().enumerate() {
            self.write_u8(addr.wrapping_add(idx as u32), byte);
        }
    }

    fn ram_mask(&self) -> u32 {
        RAM_MASK
    }

    fn exram(&self) -> &[u8] {
        &self.exram
    }

    fn exram_mut(&mut self) -> &mut [u8] {
        &mut self.exram
    }

    fn exram_mask(&self) -> u32 {
        EXRAM_MASK
    }
}

impl EventScheduler for MainBusImpl {
    fn register_event(&mut self, name: &'static str) -> EventTypeId {
        self.scheduler.register_event(name)
    }

    fn schedule_event(
        &mut self,
        cycles_into_future: u64,
        event: EventTypeId,
        userdata: u64,
        from: FromThread,
    ) {
        match from {
            FromThread::Cpu => self.scheduler.schedule(cycles_into_future, event, userdata),
            FromThread::Any => self
                .scheduler
                .thread_queue()
                .push(cycles_into_future, event, userdata),
        }
    }
}

impl AudioSink for MainBusImpl {
    fn push_audio_samples(&mut self, samples: &[i16]) {
        self.audio_output.extend_from_slice(samples);
    }
}

impl HighSpeedPort for MainBusImpl {
    fn hsp_read(&mut self, addr: u32) -> u64 {
        self.hsp.get(&addr).copied().unwrap_or(0)
    }

    fn hsp_write(&mut self, addr: u32, value: u64) {
        self.hsp.insert(addr, value);
    }
}

impl ProcessorInterface for MainBusImpl {
    fn set_dsp_interrupt(&mut self, asserted: bool) {
        if asserted != self.dsp_interrupt {
            log::debug!("DSP interrupt {}", if asserted { "asserted" } else { "cleared" });
        }
        self.dsp_interrupt = asserted;
    }
}
