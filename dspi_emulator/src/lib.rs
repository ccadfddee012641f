pub mod common;
pub mod components;
pub mod main_bus;

use std::cell::RefCell;
use std::cell::RefMut;
use std::ops::Deref;
use std::path::Path;
use std::rc::Rc;

use anyhow::Context;

use crate::common::bus::EventTypeId;
use crate::common::bus::ProcessorInterface;
use crate::common::debug_events::DebugEventCollectorRef;
use crate::common::dsp_engine::DspEngineFactory;
use crate::components::dspi::Dspi;
use crate::components::dspi::DspiConfig;
use crate::components::dspi::DspiEventLogger;
use crate::components::mailbox_engine::MailboxEngine;
use crate::main_bus::MainBusImpl;

/// CPU clock of the emulated console.
pub const CPU_CLOCK: u64 = 486_000_000;
/// The audio DMA moves one block at 4 kHz.
pub const AUDIO_DMA_PERIOD: u64 = CPU_CLOCK / 4000;
/// Interval at which the DSP engine is given time.
pub const DSP_PERIOD: u64 = 12000;
pub const AUDIO_SAMPLE_RATE: u32 = 32_000;

/// The DSP interface together with the hardware it is wired to.
pub struct System {
    pub dspi: Dspi,
    pub bus: MainBusImpl,
    engine_factory: Box<dyn DspEngineFactory>,
    debug_log: Rc<RefCell<DspiEventLogger>>,
    event_audio_dma: EventTypeId,
    event_dsp: EventTypeId,
}

impl System {
    /// Creates a system using the built-in mailbox engine.
    pub fn new(config: DspiConfig) -> Self {
        Self::with_engine_factory(config, Box::new(MailboxEngine::create))
    }

    pub fn with_engine_factory(
        config: DspiConfig,
        engine_factory: Box<dyn DspEngineFactory>,
    ) -> Self {
        let debug_log = Rc::new(RefCell::new(DspiEventLogger::default()));
        let mut bus = MainBusImpl::new(config.console);
        let dspi = Dspi::new(config, engine_factory.as_ref(), &mut bus)
            .with_debug_event_collector(DebugEventCollectorRef(debug_log.clone()));

        let event_audio_dma = bus.scheduler.register_event("AudioDMA");
        let event_dsp = bus.scheduler.register_event("DSP");
        bus.scheduler.schedule(AUDIO_DMA_PERIOD, event_audio_dma, 0);
        bus.scheduler.schedule(DSP_PERIOD, event_dsp, 0);

        Self {
            dspi,
            bus,
            engine_factory,
            debug_log,
            event_audio_dma,
            event_dsp,
        }
    }

    pub fn read_u16(&mut self, addr: u32) -> u16 {
        self.dspi.read_u16(addr)
    }

    pub fn write_u16(&mut self, addr: u32, value: u16) {
        self.dspi.write_u16(&mut self.bus, addr, value)
    }

    pub fn read_u32(&mut self, addr: u32) -> u32 {
        self.dspi.read_u32(addr)
    }

    pub fn write_u32(&mut self, addr: u32, value: u32) {
        self.dspi.write_u32(&mut self.bus, addr, value)
    }

    /// Current time in CPU cycles.
    pub fn cycles(&self) -> u64 {
        self.bus.scheduler.now()
    }

    /// Runs all events due in the next `cycles` CPU cycles.
    pub fn advance(&mut self, cycles: u64) {
        let target = self.bus.scheduler.now() + cycles;
        loop {
            self.dspi.process_dsp_interrupt_requests(&mut self.bus);
            let Some(fired) = self.bus.scheduler.pop_due(target) else {
                break;
            };
            if fired.event == self.event_audio_dma {
                self.dspi.update_audio_dma(&mut self.bus);
                self.bus
                    .scheduler
                    .schedule(AUDIO_DMA_PERIOD, self.event_audio_dma, 0);
            } else if fired.event == self.event_dsp {
                self.dspi.update_dsp_slice(DSP_PERIOD as i32);
                self.bus.scheduler.schedule(DSP_PERIOD, self.event_dsp, 0);
            } else {
                self.dspi
                    .on_event(fired.event, fired.userdata, &mut self.bus);
            }
        }
        self.bus.scheduler.advance_to(target);
    }

    /// Emulated hard reset of the DSP interface.
    pub fn reset(&mut self) {
        let config = self.dspi.config();
        self.dspi
            .reinit(config, self.engine_factory.as_ref(), &mut self.bus);
        self.bus.set_dsp_interrupt(self.dspi.interrupt_asserted());
    }

    pub fn save_state(&self) -> Vec<u8> {
        self.dspi.save_state()
    }

    pub fn load_state(&mut self, encoded: &[u8]) -> anyhow::Result<()> {
        self.dspi.load_state(encoded)?;
        self.bus.set_dsp_interrupt(self.dspi.interrupt_asserted());
        Ok(())
    }

    /// Writes the audio produced so far as a 32 kHz stereo WAV file.
    pub fn dump_audio(&self, path: &Path) -> anyhow::Result<()> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: AUDIO_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("Cannot create {}", path.display()))?;
        let mut i16_writer = writer.get_i16_writer(self.bus.audio_output.len() as u32);
        for sample in &self.bus.audio_output {
            i16_writer.write_sample(*sample);
        }
        i16_writer.flush()?;
        writer.finalize()?;
        Ok(())
    }

    pub fn shutdown(self) {
        self.dspi.shutdown();
    }

    /// Events collected while debug events are enabled.
    pub fn debug_log(&self) -> RefMut<'_, DspiEventLogger> {
        self.debug_log.deref().borrow_mut()
    }
}
