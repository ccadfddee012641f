use std::fmt::Display;

use super::aram_dma::AramDmaTransfer;
use crate::common::debug_events::DebugEventLogger;
use crate::common::debug_events::EventFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DspiEvent {
    Read { addr: u32, value: u16 },
    Write { addr: u32, value: u16 },
    /// Interrupt pending bits were raised.
    Interrupt { bits: u16 },
    /// The DSP interrupt line of the processor interface changed.
    InterruptLine { asserted: bool },
    AramDma(AramDmaTransfer),
    AudioDmaArmed { source_address: u32, num_blocks: u16 },
}

impl Display for DspiEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DspiEvent::Read { addr, value } => write!(f, "R {addr:04X} = {value:04X}"),
            DspiEvent::Write { addr, value } => write!(f, "W {addr:04X} = {value:04X}"),
            DspiEvent::Interrupt { bits } => write!(f, "IRQ {bits:02X}"),
            DspiEvent::InterruptLine { asserted } => write!(f, "IRQ line {asserted}"),
            DspiEvent::AramDma(t) => write!(
                f,
                "ARAM DMA {:?} {:08X} bytes MM {:08X} AR {:08X}",
                t.direction, t.bytes, t.mm_addr, t.ar_addr
            ),
            DspiEvent::AudioDmaArmed {
                source_address,
                num_blocks,
            } => write!(f, "AID {num_blocks} blocks from {source_address:08X}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DspiEventFilter {
    Registers,
    Interrupts,
    Dma,
}

impl EventFilter<DspiEvent> for DspiEventFilter {
    fn matches(&self, event: &DspiEvent) -> bool {
        match self {
            DspiEventFilter::Registers => {
                matches!(event, DspiEvent::Read { .. } | DspiEvent::Write { .. })
            }
            DspiEventFilter::Interrupts => matches!(
                event,
                DspiEvent::Interrupt { .. } | DspiEvent::InterruptLine { .. }
            ),
            DspiEventFilter::Dma => matches!(
                event,
                DspiEvent::AramDma(_) | DspiEvent::AudioDmaArmed { .. }
            ),
        }
    }
}

pub type DspiEventLogger = DebugEventLogger<DspiEvent, DspiEventFilter>;
