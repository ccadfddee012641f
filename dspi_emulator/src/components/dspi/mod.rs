//! Implementation of the DSP interface (DSPI)
//!
//! The DSP interface connects the CPU to the audio DSP. It contains the CPU side of the DSP
//! mailboxes and control register, the audio DMA feeding the audio output, the ARAM DMA moving
//! data between main memory and ARAM, and the interrupt logic tying all of them to the DSP
//! interrupt of the processor interface.
mod aram;
mod aram_dma;
mod audio_dma;
mod config;
mod control;
mod debug;
mod mmio;
mod registers;
mod state;

use intbits::Bits;

use self::aram::Aram;
pub use self::aram::ARAM_MASK;
pub use self::aram::ARAM_SIZE;
use self::aram_dma::AramDma;
pub use self::aram_dma::AramDmaDirection;
pub use self::aram_dma::AramDmaTransfer;
use self::audio_dma::AudioDma;
use self::audio_dma::AudioDmaTick;
use self::audio_dma::FRAMES_PER_BLOCK;
pub use self::config::ConsoleRevision;
pub use self::config::DspiConfig;
use self::control::DspControl;
use self::control::ENGINE_OWNED_MASK;
pub use self::debug::DspiEvent;
pub use self::debug::DspiEventFilter;
pub use self::debug::DspiEventLogger;
use self::mmio::Mapping;
use self::mmio::MmioDevice;
pub use self::registers::*;
use self::state::AramDmaSnapshot;
use self::state::AudioDmaSnapshot;
use self::state::DspiSnapshot;
use crate::common::bus::DspiBus;
use crate::common::bus::EventTypeId;
use crate::common::bus::FromThread;
use crate::common::bus::MainMemory;
use crate::common::debug_events::DebugEventCollectorRef;
use crate::common::dsp_engine::interrupt_channel;
use crate::common::dsp_engine::DspEngine;
use crate::common::dsp_engine::DspEngineFactory;
use crate::common::dsp_engine::DspInterruptReceiver;
use crate::common::dsp_engine::DspInterruptSender;
use crate::common::dsp_engine::DspInterruptType;
use crate::common::dsp_engine::Mailbox;
use crate::common::util::decode_be_samples;

/// Name of the scheduler event raising DSP interface interrupts. The low 16 bits of the userdata
/// hold the pending bits to raise, the upper half the reset generation.
pub const EVENT_GENERATE_DSP_INTERRUPT: &str = "DSPint";
/// Name of the scheduler event completing an ARAM DMA.
pub const EVENT_COMPLETE_ARAM: &str = "ARAMint";

/// Time slice given to an LLE engine before reading a mailbox.
const DSP_MAIL_SLICE: i32 = 72;
/// Delay of the AID interrupt after arming the audio DMA. Some games crash if it arrives any
/// sooner than ~87 cycles.
const AID_ARM_DELAY: u64 = 200;
/// Userdata bits holding the reset generation an event was scheduled in.
const GENERATION_SHIFT: u32 = 32;
const ARAM_MODE_INITIALIZED: u16 = 1;
/// 156 MHz
const ARAM_REFRESH_DEFAULT: u16 = 156;

pub struct Dspi {
    config: DspiConfig,
    aram: Aram,
    audio_dma: AudioDma,
    aram_dma: AramDma,
    control: DspControl,
    /// Register 5012: AR_INFO
    aram_info: u16,
    /// Register 5016: AR_MODE
    aram_mode: u16,
    /// Register 501A: AR_REFRESH
    aram_refresh: u16,
    /// Cycles the LLE engine is still owed.
    dsp_slice: i32,
    /// Bumped on every reset so events scheduled before it can be told apart.
    generation: u32,
    dsp_engine: Box<dyn DspEngine>,
    is_lle: bool,
    interrupt_sender: DspInterruptSender,
    interrupt_requests: DspInterruptReceiver,
    event_generate_dsp_interrupt: EventTypeId,
    event_complete_aram: EventTypeId,
    mmio: Mapping<Dspi>,
    debug_event_collector: DebugEventCollectorRef<DspiEvent>,
}

impl Dspi {
    pub fn new(
        config: DspiConfig,
        engine_factory: &dyn DspEngineFactory,
        bus: &mut dyn DspiBus,
    ) -> Self {
        let (interrupt_sender, interrupt_requests) = interrupt_channel();
        let dsp_engine = engine_factory.create(config.engine, interrupt_sender.clone());
        let mut dspi = Self {
            config,
            aram: Self::create_aram(config, &*bus),
            audio_dma: AudioDma::default(),
            aram_dma: AramDma::default(),
            control: DspControl::halted(),
            aram_info: 0,
            aram_mode: ARAM_MODE_INITIALIZED,
            aram_refresh: ARAM_REFRESH_DEFAULT,
            dsp_slice: 0,
            generation: 0,
            is_lle: dsp_engine.is_lle(),
            dsp_engine,
            interrupt_sender,
            interrupt_requests,
            event_generate_dsp_interrupt: EventTypeId::default(),
            event_complete_aram: EventTypeId::default(),
            mmio: registers::build_mapping(),
            debug_event_collector: DebugEventCollectorRef::null(),
        };
        dspi.event_generate_dsp_interrupt = bus.register_event(EVENT_GENERATE_DSP_INTERRUPT);
        dspi.event_complete_aram = bus.register_event(EVENT_COMPLETE_ARAM);
        log::info!(
            "DSPI: init {} with {} engine",
            config.console,
            config.engine
        );
        dspi
    }

    pub fn with_debug_event_collector(
        mut self,
        collector: DebugEventCollectorRef<DspiEvent>,
    ) -> Self {
        self.debug_event_collector = collector;
        self
    }

    /// Resets the device after an emulated hard reset. Scheduler events stay registered, the
    /// ARAM buffer is only replaced if the console revision changes where ARAM lives.
    pub fn reinit(
        &mut self,
        config: DspiConfig,
        engine_factory: &dyn DspEngineFactory,
        bus: &mut dyn DspiBus,
    ) {
        self.dsp_engine.shutdown();
        let (interrupt_sender, interrupt_requests) = interrupt_channel();
        self.dsp_engine = engine_factory.create(config.engine, interrupt_sender.clone());
        self.is_lle = self.dsp_engine.is_lle();
        self.interrupt_sender = interrupt_sender;
        self.interrupt_requests = interrupt_requests;

        if config.console.is_wii() != self.config.console.is_wii() {
            self.aram = Self::create_aram(config, &*bus);
        }
        self.config = config;
        self.audio_dma = AudioDma::default();
        self.aram_dma = AramDma::default();
        self.control = DspControl::halted();
        self.aram_info = 0;
        self.aram_mode = ARAM_MODE_INITIALIZED;
        self.aram_refresh = ARAM_REFRESH_DEFAULT;
        self.dsp_slice = 0;
        self.generation = self.generation.wrapping_add(1);
        log::info!("DSPI: reinit {} with {} engine", config.console, config.engine);
    }

    /// Tears down the DSP engine and releases owned ARAM.
    pub fn shutdown(mut self) {
        self.dsp_engine.shutdown();
        log::info!("DSPI: shutdown");
    }

    fn create_aram<M: MainMemory + ?Sized>(config: DspiConfig, memory: &M) -> Aram {
        if config.console.is_wii() {
            Aram::aliased(memory)
        } else {
            Aram::owned()
        }
    }

    pub fn config(&self) -> DspiConfig {
        self.config
    }

    pub fn read_u16(&mut self, addr: u32) -> u16 {
        self.mmio_read_u16(addr)
    }

    pub fn write_u16(&mut self, bus: &mut dyn DspiBus, addr: u32, value: u16) {
        self.mmio_write_u16(bus, addr, value)
    }

    pub fn read_u32(&mut self, addr: u32) -> u32 {
        self.mmio_read_u32(addr)
    }

    pub fn write_u32(&mut self, bus: &mut dyn DspiBus, addr: u32, value: u32) {
        self.mmio_write_u32(bus, addr, value)
    }

    /// Handles scheduler events registered by this device.
    ///
    /// Events scheduled before the last reset are ignored.
    pub fn on_event(&mut self, event: EventTypeId, userdata: u64, bus: &mut dyn DspiBus) {
        if event != self.event_generate_dsp_interrupt && event != self.event_complete_aram {
            log::warn!("DSPI: Unexpected event {:?}", event);
            return;
        }
        if (userdata >> GENERATION_SHIFT) as u32 != self.generation {
            log::debug!("DSPI: Ignoring event {:?} scheduled before reset", event);
            return;
        }
        if event == self.event_generate_dsp_interrupt {
            self.generate_interrupt(userdata as u16, bus);
        } else if self.control.dma_state() {
            self.control.set_dma_state(false);
            self.generate_interrupt(DspInterruptType::Aram.bits(), bus);
        }
    }

    fn event_userdata(&self, interrupt_bits: u16) -> u64 {
        ((self.generation as u64) << GENERATION_SHIFT) | interrupt_bits as u64
    }

    pub fn interrupt_sender(&self) -> DspInterruptSender {
        self.interrupt_sender.clone()
    }

    /// Schedules interrupts requested by the DSP engine since the last call.
    pub fn process_dsp_interrupt_requests(&mut self, bus: &mut dyn DspiBus) {
        while let Some(request) = self.interrupt_requests.try_next() {
            bus.schedule_event(
                request.cycles_into_future,
                self.event_generate_dsp_interrupt,
                self.event_userdata(request.interrupt.bits()),
                FromThread::Any,
            );
        }
    }

    /// True if the device currently asserts its interrupt.
    pub fn interrupt_asserted(&self) -> bool {
        self.control.interrupt_asserted()
    }

    /// Gives the DSP engine time to run.
    pub fn update_dsp_slice(&mut self, cycles: i32) {
        if self.is_lle {
            // Use up the rest of the previous slice first.
            self.dsp_engine.update(self.dsp_slice);
            self.dsp_slice = (self.dsp_slice % 6).saturating_add(cycles);
        } else {
            self.dsp_engine.update(cycles);
        }
    }

    /// Advances the audio DMA by one block. Has to be called at 4 kHz.
    pub fn update_audio_dma(&mut self, bus: &mut dyn DspiBus) {
        match self.audio_dma.tick() {
            AudioDmaTick::Silence => bus.push_audio_samples(&[0; FRAMES_PER_BLOCK * 2]),
            AudioDmaTick::Streaming => (),
            AudioDmaTick::Reloaded { blocks } => {
                if blocks != 0 {
                    self.send_audio_blocks(blocks, bus);
                }
                self.generate_interrupt(DspInterruptType::Aid.bits(), bus);
            }
        }
    }

    /// Byte read of ARAM as seen by the DSP.
    pub fn read_aram<M: MainMemory + ?Sized>(&self, addr: u32, memory: &M) -> u8 {
        self.aram.read_u8(addr, memory)
    }

    /// Byte write of ARAM as seen by the DSP.
    pub fn write_aram<M: MainMemory + ?Sized>(&mut self, addr: u32, value: u8, memory: &mut M) {
        self.aram.write_u8(addr, value, memory)
    }

    /// Contents of the owned ARAM buffer, None if ARAM is aliased to extended RAM.
    pub fn aram(&self) -> Option<&[u8]> {
        self.aram.contents()
    }

    pub fn aram_mut(&mut self) -> Option<&mut [u8]> {
        self.aram.contents_mut()
    }

    pub fn save_state(&self) -> Vec<u8> {
        DspiSnapshot {
            aram: self.aram.contents().map(|aram| aram.to_vec()),
            control: u16::from(self.control),
            audio_dma: AudioDmaSnapshot {
                current_source_address: self.audio_dma.current_source_address,
                remaining_blocks_count: self.audio_dma.remaining_blocks_count,
                source_address: self.audio_dma.source_address,
                control: u16::from(self.audio_dma.control),
            },
            aram_dma: AramDmaSnapshot {
                mm_addr: self.aram_dma.mm_addr,
                ar_addr: self.aram_dma.ar_addr,
                count: self.aram_dma.count_raw(),
            },
            aram_info: self.aram_info,
            aram_mode: self.aram_mode,
            aram_refresh: self.aram_refresh,
            dsp_slice: self.dsp_slice,
            dsp_engine: self.dsp_engine.save_state(),
        }
        .encode()
    }

    /// Restores a state produced by [Dspi::save_state]. The device is left untouched if the state
    /// cannot be decoded or does not match the ARAM configuration.
    pub fn load_state(&mut self, encoded: &[u8]) -> anyhow::Result<()> {
        let snapshot = DspiSnapshot::decode(encoded)?;
        snapshot.validate(self.aram.contents().map(|aram| aram.len()))?;
        self.dsp_engine.load_state(&snapshot.dsp_engine)?;

        if let (Some(target), Some(source)) = (self.aram.contents_mut(), &snapshot.aram) {
            target.copy_from_slice(source);
        }
        self.control = DspControl::from(snapshot.control);
        self.audio_dma = AudioDma {
            source_address: snapshot.audio_dma.source_address,
            control: snapshot.audio_dma.control.into(),
            current_source_address: snapshot.audio_dma.current_source_address,
            remaining_blocks_count: snapshot.audio_dma.remaining_blocks_count,
        };
        self.aram_dma = AramDma {
            mm_addr: snapshot.aram_dma.mm_addr,
            ar_addr: snapshot.aram_dma.ar_addr,
            count: snapshot.aram_dma.count.into(),
        };
        self.aram_info = snapshot.aram_info;
        self.aram_mode = snapshot.aram_mode;
        self.aram_refresh = snapshot.aram_refresh;
        self.dsp_slice = snapshot.dsp_slice;
        Ok(())
    }

    fn read_mailbox_high(&mut self, mailbox: Mailbox) -> u16 {
        if self.dsp_slice > DSP_MAIL_SLICE && self.is_lle {
            self.dsp_engine.update(DSP_MAIL_SLICE);
            self.dsp_slice -= DSP_MAIL_SLICE;
        }
        self.dsp_engine.read_mailbox_high(mailbox)
    }

    /// Register 500A: DSP_CONTROL (read)
    fn read_control(&mut self) -> u16 {
        (u16::from(self.control) & !ENGINE_OWNED_MASK)
            | (self.dsp_engine.read_control_register() & ENGINE_OWNED_MASK)
    }

    /// Register 500A: DSP_CONTROL (write)
    fn write_control(&mut self, bus: &mut dyn DspiBus, value: u16) {
        let engine_bits = self.dsp_engine.write_control_register(value);
        let written =
            DspControl::from((value & !ENGINE_OWNED_MASK) | (engine_bits & ENGINE_OWNED_MASK));

        // Resetting the DSP also stops the audio DMA.
        if value.bit(0) {
            self.audio_dma.control = Default::default();
        }

        self.control.apply_write(written);
        if value.bits(12..16) != 0 {
            let message = format!("DSPI: Control register written with junk in the padding: {value:04X}");
            log::error!("{}", message);
            self.debug_event_collector.on_error(message);
        }
        self.update_interrupts(bus);
    }

    /// Register 5036: AUDIO_DMA_CONTROL_LEN (write)
    fn write_audio_dma_control(&mut self, bus: &mut dyn DspiBus, value: u16) {
        if !self.audio_dma.write_control(value) {
            return;
        }
        let num_blocks = self.audio_dma.num_blocks();
        log::info!(
            "DSPI: Audio DMA configured: {} blocks from {:08X}",
            num_blocks,
            self.audio_dma.source_address
        );
        self.debug_event_collector.on_event(DspiEvent::AudioDmaArmed {
            source_address: self.audio_dma.source_address,
            num_blocks,
        });
        // Make the samples available as soon as possible.
        self.send_audio_blocks(num_blocks, bus);
        bus.schedule_event(
            AID_ARM_DELAY,
            self.event_generate_dsp_interrupt,
            self.event_userdata(DspInterruptType::Aid.bits()),
            FromThread::Cpu,
        );
    }

    fn send_audio_blocks(&mut self, blocks: u16, bus: &mut dyn DspiBus) {
        let mut data = vec![0; blocks as usize * audio_dma::BLOCK_SIZE as usize];
        bus.read_bytes(self.audio_dma.source_address, &mut data);
        bus.push_audio_samples(&decode_be_samples(&data));
    }

    /// Register 502A: AR_DMA_CNT_L (write) starts the transfer.
    fn start_aram_dma(&mut self, bus: &mut dyn DspiBus) {
        self.control.set_dma_state(true);
        bus.schedule_event(
            self.aram_dma.transfer_cycles(),
            self.event_complete_aram,
            self.event_userdata(0),
            FromThread::Cpu,
        );
        let transfer = self.aram_dma.run(&mut self.aram, bus);
        log::debug!(
            "DSPI: DMA {:08X} bytes {:?} MM {:08X} AR {:08X}",
            transfer.bytes,
            transfer.direction,
            transfer.mm_addr,
            transfer.ar_addr
        );
        self.debug_event_collector
            .on_event(DspiEvent::AramDma(transfer));
    }

    /// Raises interrupt pending bits. Bits other than the three interrupt bits are ignored.
    fn generate_interrupt(&mut self, bits: u16, bus: &mut dyn DspiBus) {
        self.control.raise(bits);
        self.debug_event_collector.on_event(DspiEvent::Interrupt {
            bits: bits & DspInterruptType::ALL_BITS,
        });
        self.update_interrupts(bus);
    }

    fn update_interrupts(&mut self, bus: &mut dyn DspiBus) {
        let asserted = self.control.interrupt_asserted();
        bus.set_dsp_interrupt(asserted);
        self.debug_event_collector
            .on_event(DspiEvent::InterruptLine { asserted });
    }
}

impl MmioDevice for Dspi {
    fn mapping(&self) -> &Mapping<Self> {
        &self.mmio
    }

    fn on_read(&mut self, addr: u32, value: u16) {
        log::trace!("DSPI: Read {:04X} = {:04X}", addr, value);
        self.debug_event_collector
            .on_event(DspiEvent::Read { addr, value });
    }

    fn on_write(&mut self, addr: u32, value: u16, handled: bool) {
        if handled {
            log::trace!("DSPI: Write {:04X} = {:04X}", addr, value);
            self.debug_event_collector
                .on_event(DspiEvent::Write { addr, value });
        } else {
            log::warn!("DSPI: Dropped write to {:04X} = {:04X}", addr, value);
            self.debug_event_collector.on_error(format!(
                "DSPI: Dropped write to {:04X} = {:04X}",
                addr, value
            ));
        }
    }
}
