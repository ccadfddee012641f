//! ARAM DMA moving data between main memory and ARAM.
//!
//! Real hardware moves 32-byte chunks over time. The copy here is done at once when the DMA is
//! started, in 8-byte chunks, and only the completion interrupt is delayed.
use bilge::prelude::*;

use super::aram::Aram;
use crate::common::bus::DspiBus;
use crate::common::uint::U32Ext;

/// Both addresses are mirrored every 64 MiB.
pub const ADDRESS_MASK: u32 = 0x03FF_FFFF;
const CHUNK_SIZE: u32 = 8;
/// Measured transfer rate: 246 cycles per 32 bytes.
const CYCLES_PER_32_BYTES: u64 = 246;

#[bitsize(1)]
#[derive(Clone, Copy, Debug, Default, FromBits, PartialEq, Eq)]
pub enum AramDmaDirection {
    #[default]
    MainToAram = 0,
    AramToMain = 1,
}

/// Register 5028/502A: AR_DMA_CNT_H/L - byte count and direction
#[bitsize(32)]
#[derive(Clone, Copy, DebugBits, Default, FromBits, PartialEq)]
pub(crate) struct AramDmaCount {
    pub count: u31,
    pub direction: AramDmaDirection,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct AramDma {
    /// Register 5020/5022: AR_DMA_MMADDR_H/L
    pub mm_addr: u32,
    /// Register 5024/5026: AR_DMA_ARADDR_H/L
    pub ar_addr: u32,
    pub count: AramDmaCount,
}

/// Summary of a finished transfer, for logging and debug events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AramDmaTransfer {
    pub direction: AramDmaDirection,
    pub mm_addr: u32,
    pub ar_addr: u32,
    pub bytes: u32,
}

impl AramDma {
    pub fn byte_count(&self) -> u32 {
        self.count.count().value()
    }

    pub fn count_raw(&self) -> u32 {
        u32::from(self.count)
    }

    pub fn set_count_high(&mut self, value: u16) {
        self.count = AramDmaCount::from(self.count_raw().with_high_word(value));
    }

    pub fn set_count_low(&mut self, value: u16) {
        self.count = AramDmaCount::from(self.count_raw().with_low_word(value));
    }

    /// Cycles until the completion interrupt of a transfer of the current size.
    pub fn transfer_cycles(&self) -> u64 {
        (self.byte_count() / 32) as u64 * CYCLES_PER_32_BYTES
    }

    /// Runs the whole transfer. Addresses and count are updated the way they would be after
    /// the hardware finished.
    pub fn run(&mut self, aram: &mut Aram, bus: &mut dyn DspiBus) -> AramDmaTransfer {
        self.ar_addr &= ADDRESS_MASK;
        self.mm_addr &= ADDRESS_MASK;
        let transfer = AramDmaTransfer {
            direction: self.count.direction(),
            mm_addr: self.mm_addr,
            ar_addr: self.ar_addr,
            bytes: self.byte_count(),
        };

        let in_aram = (self.ar_addr as usize) < aram.size();
        if !in_aram && aram.is_aliased() {
            // Nothing lives behind aliased ARAM.
            return transfer;
        }

        let mut remaining = self.byte_count();
        while remaining > 0 {
            match (self.count.direction(), in_aram) {
                (AramDmaDirection::AramToMain, true) => {
                    let chunk = aram.load_chunk(self.ar_addr, &*bus);
                    bus.write_u64(self.mm_addr, u64::from_be_bytes(chunk));
                }
                (AramDmaDirection::MainToAram, true) => {
                    let chunk = bus.read_u64(self.mm_addr).to_be_bytes();
                    aram.store_chunk(self.ar_addr, chunk, bus);
                }
                (AramDmaDirection::AramToMain, false) => {
                    let value = bus.hsp_read(self.ar_addr);
                    bus.write_u64(self.mm_addr, value);
                }
                (AramDmaDirection::MainToAram, false) => {
                    let value = bus.read_u64(self.mm_addr);
                    bus.hsp_write(self.ar_addr, value);
                }
            }
            self.mm_addr = self.mm_addr.wrapping_add(CHUNK_SIZE);
            self.ar_addr = self.ar_addr.wrapping_add(CHUNK_SIZE);
            remaining = remaining.saturating_sub(CHUNK_SIZE);
        }
        self.count.set_count(u31::new(0));
        transfer
    }
}
