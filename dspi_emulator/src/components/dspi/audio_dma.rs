//! Audio DMA (AID) streaming 32-byte stereo blocks from main memory to the audio output.
use bilge::prelude::*;

use crate::common::uint::U32Ext;

/// Size of one block in bytes: 8 stereo frames of 16-bit samples.
pub const BLOCK_SIZE: u32 = 32;
pub const FRAMES_PER_BLOCK: usize = 8;

/// Register 5036: AUDIO_DMA_CONTROL_LEN - DMA length in blocks and enable
#[bitsize(16)]
#[derive(Clone, Copy, DebugBits, Default, FromBits, PartialEq)]
pub(crate) struct AudioDmaControl {
    pub num_blocks: u15,
    pub enable: bool,
}

/// What a tick of the audio DMA produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AudioDmaTick {
    /// Disabled, a block of silence has to be emitted.
    Silence,
    /// Still working through the current buffer.
    Streaming,
    /// Buffer exhausted and restarted at the base registers. `blocks` blocks need to be sent
    /// and the AID interrupt raised.
    Reloaded { blocks: u16 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct AudioDma {
    /// Register 5030/5032: AUDIO_DMA_START_HI/LO
    pub source_address: u32,
    pub control: AudioDmaControl,
    pub current_source_address: u32,
    /// Blocks left in the current buffer. Zero-based when read through 503A.
    pub remaining_blocks_count: u16,
}

impl AudioDma {
    pub fn num_blocks(&self) -> u16 {
        self.control.num_blocks().value()
    }

    pub fn set_source_high(&mut self, value: u16) {
        self.source_address = self.source_address.with_high_word(value);
    }

    pub fn set_source_low(&mut self, value: u16) {
        self.source_address = self.source_address.with_low_word(value);
    }

    /// Stores a new control value. Returns true if this armed the DMA, i.e. enable went from 0
    /// to 1, in which case the counters are loaded from the base registers. While already
    /// running, the new values are picked up on the next reload.
    pub fn write_control(&mut self, value: u16) -> bool {
        let already_enabled = self.control.enable();
        self.control = AudioDmaControl::from(value);
        if already_enabled || !self.control.enable() {
            return false;
        }
        self.current_source_address = self.source_address;
        self.remaining_blocks_count = self.num_blocks();
        true
    }

    /// Register 503A: AUDIO_DMA_BLOCKS_LEFT
    pub fn blocks_left(&self) -> u16 {
        self.remaining_blocks_count.saturating_sub(1)
    }

    /// Advances by one block. Called at 4 kHz.
    pub fn tick(&mut self) -> AudioDmaTick {
        if !self.control.enable() {
            return AudioDmaTick::Silence;
        }
        if self.remaining_blocks_count != 0 {
            self.remaining_blocks_count -= 1;
            self.current_source_address = self.current_source_address.wrapping_add(BLOCK_SIZE);
        }
        if self.remaining_blocks_count != 0 {
            return AudioDmaTick::Streaming;
        }
        self.current_source_address = self.source_address;
        self.remaining_blocks_count = self.num_blocks();
        AudioDmaTick::Reloaded {
            blocks: self.remaining_blocks_count,
        }
    }
}
