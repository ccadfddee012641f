//! Helpers to access the 16-bit halves of 32-bit registers.
//!
//! The CPU only ever talks to the DSP interface through 16-bit registers. Registers that hold
//! 32-bit values (addresses, counters) are exposed as a high and a low half.

pub trait U32Ext {
    fn low_word(self) -> u16;
    fn high_word(self) -> u16;
    fn with_low_word(self, value: u16) -> u32;
    fn with_high_word(self, value: u16) -> u32;
}

impl U32Ext for u32 {
    #[inline]
    fn low_word(self) -> u16 {
        self as u16
    }

    #[inline]
    fn high_word(self) -> u16 {
        (self >> 16) as u16
    }

    #[inline]
    fn with_low_word(self, value: u16) -> u32 {
        (self & 0xFFFF_0000) | value as u32
    }

    #[inline]
    fn with_high_word(self, value: u16) -> u32 {
        (self & 0x0000_FFFF) | ((value as u32) << 16)
    }
}
