//! Interfaces of the console hardware the DSP interface is wired to.
//!
//! The DSP interface does not own main memory, the event scheduler, the audio output or the
//! processor interface. Each operation that needs them receives a [DspiBus], which is implemented
//! by the main bus of the system (and by the test bus in unit tests).
use bitcode::Decode;
use bitcode::Encode;

/// Handle of an event type registered with the scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct EventTypeId(pub usize);

/// Which thread an event is scheduled from.
///
/// Events from [FromThread::Any] must not touch scheduler state directly and are handed over to
/// the emulation timeline, which applies them the next time it advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum FromThread {
    Cpu,
    Any,
}

/// Main memory as seen by the DMA engines. Multi-byte values are big-endian.
pub trait MainMemory {
    fn read_u8(&self, addr: u32) -> u8;
    fn write_u8(&mut self, addr: u32, value: u8);
    fn read_u64(&self, addr: u32) -> u64;
    fn write_u64(&mut self, addr: u32, value: u64);

    /// Address mask of main RAM for the current console.
    fn ram_mask(&self) -> u32;

    /// Extended RAM that doubles as ARAM on consoles without a dedicated ARAM chip. Empty if the
    /// console has no extended RAM.
    fn exram(&self) -> &[u8];
    fn exram_mut(&mut self) -> &mut [u8];
    fn exram_mask(&self) -> u32;

    fn read_bytes(&self, addr: u32, target: &mut [u8]) {
        for (idx, byte) in target.iter_mut().enumerate() {
            *byte = self.read_u8(addr.wrapping_add(idx as u32));
        }
    }
}

pub trait EventScheduler {
    fn register_event(&mut self, name: &'static str) -> EventTypeId;
    fn schedule_event(
        &mut self,
        cycles_into_future: u64,
        event: EventTypeId,
        userdata: u64,
        from: FromThread,
    );
}

/// Receives interleaved 16-bit stereo samples (left, right, left, ...) at 32 kHz.
pub trait AudioSink {
    fn push_audio_samples(&mut self, samples: &[i16]);
}

/// Peripheral that answers ARAM DMA requests beyond the end of ARAM.
pub trait HighSpeedPort {
    fn hsp_read(&mut self, addr: u32) -> u64;
    fn hsp_write(&mut self, addr: u32, value: u64);
}

/// The single DSP interrupt source of the processor interface.
pub trait ProcessorInterface {
    fn set_dsp_interrupt(&mut self, asserted: bool);
}

/// Everything the DSP interface needs from the rest of the system.
pub trait DspiBus:
    MainMemory + EventScheduler + AudioSink + HighSpeedPort + ProcessorInterface
{
}

impl<T> DspiBus for T where
    T: MainMemory + EventScheduler + AudioSink + HighSpeedPort + ProcessorInterface
{
}
