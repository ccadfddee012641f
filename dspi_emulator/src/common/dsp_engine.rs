//! Interface to the engine that executes DSP code.
//!
//! The DSP interface only forwards mailbox and control register traffic to the engine and hands
//! it time to run. How the engine executes microcode (interpreter, JIT or high level emulation) is
//! up to the implementation.
use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::Sender;
use std::sync::mpsc::TryRecvError;

/// Selects between an accurate engine that needs regular time slices (LLE) and a fast
/// approximation (HLE).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DspEngineKind {
    #[default]
    Hle,
    Lle,
}

/// The two mailboxes between CPU and DSP.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum Mailbox {
    /// Written by the CPU, read by the DSP.
    CpuToDsp,
    /// Written by the DSP, read by the CPU.
    DspToCpu,
}

/// Interrupt sources of the DSP interface. The value of each is the position of its pending bit
/// in the control register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum DspInterruptType {
    /// Audio DMA (AID) started a new buffer.
    Aid,
    /// ARAM DMA finished.
    Aram,
    /// DSP to CPU interrupt.
    Dsp,
}

impl DspInterruptType {
    pub const ALL_BITS: u16 = 0x0008 | 0x0020 | 0x0080;

    pub fn bits(self) -> u16 {
        match self {
            DspInterruptType::Aid => 0x0008,
            DspInterruptType::Aram => 0x0020,
            DspInterruptType::Dsp => 0x0080,
        }
    }
}

pub trait DspEngine {
    /// True for engines that execute real DSP code and have to be given time slices.
    fn is_lle(&self) -> bool;

    fn read_mailbox_high(&mut self, mailbox: Mailbox) -> u16;
    fn read_mailbox_low(&mut self, mailbox: Mailbox) -> u16;
    fn write_mailbox_high(&mut self, mailbox: Mailbox, value: u16);
    fn write_mailbox_low(&mut self, mailbox: Mailbox, value: u16);

    /// Current value of the engine owned control bits (reset, assert interrupt, halt, init).
    fn read_control_register(&mut self) -> u16;
    /// Applies a CPU write to the control register and returns the resulting engine owned bits.
    fn write_control_register(&mut self, value: u16) -> u16;

    /// Runs the engine for `cycles` DSP cycles.
    fn update(&mut self, cycles: i32);

    fn save_state(&self) -> Vec<u8>;
    fn load_state(&mut self, encoded: &[u8]) -> anyhow::Result<()>;

    fn shutdown(&mut self) {}
}

/// Request of the DSP engine to raise an interrupt some cycles in the future.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterruptRequest {
    pub interrupt: DspInterruptType,
    pub cycles_into_future: u64,
}

/// Sending half of the interrupt hand-off. Engines running on their own thread keep a clone of
/// this and never touch the control register themselves.
#[derive(Clone, Debug)]
pub struct DspInterruptSender(Sender<InterruptRequest>);

impl DspInterruptSender {
    pub fn request(&self, interrupt: DspInterruptType, cycles_into_future: u64) {
        // The device may already be shut down, in which case nobody is interested.
        let _ = self.0.send(InterruptRequest {
            interrupt,
            cycles_into_future,
        });
    }
}

/// Receiving half of the interrupt hand-off, drained on the emulation timeline.
#[derive(Debug)]
pub struct DspInterruptReceiver(Receiver<InterruptRequest>);

impl DspInterruptReceiver {
    pub fn try_next(&self) -> Option<InterruptRequest> {
        match self.0.try_recv() {
            Ok(request) => Some(request),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

pub fn interrupt_channel() -> (DspInterruptSender, DspInterruptReceiver) {
    let (sender, receiver) = mpsc::channel();
    (DspInterruptSender(sender), DspInterruptReceiver(receiver))
}

/// Creates DSP engines on (re)initialization of the DSP interface.
pub trait DspEngineFactory {
    fn create(&self, kind: DspEngineKind, interrupts: DspInterruptSender) -> Box<dyn DspEngine>;
}

impl<F> DspEngineFactory for F
where
    F: Fn(DspEngineKind, DspInterruptSender) -> Box<dyn DspEngine>,
{
    fn create(&self, kind: DspEngineKind, interrupts: DspInterruptSender) -> Box<dyn DspEngine> {
        self(kind, interrupts)
    }
}
