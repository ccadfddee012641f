use bilge::prelude::*;

use crate::common::dsp_engine::DspInterruptType;

/// Bits of the control register owned by the DSP engine: reset, assert interrupt, halt, init code
/// and init.
pub const ENGINE_OWNED_MASK: u16 = 0x0C07;

/// Register 500A: DSPCR - DSP control and interrupt status
///
/// Each interrupt source has a pending bit directly followed by its enable bit. Pending bits are
/// acknowledged by writing 1 to them.
#[bitsize(16)]
#[derive(Clone, Copy, DebugBits, Default, FromBits, PartialEq)]
pub(crate) struct DspControl {
    pub reset: bool,
    pub assert_int: bool,
    pub halt: bool,
    pub aid: bool,
    pub aid_mask: bool,
    pub aram: bool,
    pub aram_mask: bool,
    pub dsp: bool,
    pub dsp_mask: bool,
    pub dma_state: bool,
    pub init_code: bool,
    pub init: bool,
    pub pad: u4,
}

impl DspControl {
    /// State after power on: everything cleared except for the halt bit.
    pub fn halted() -> Self {
        let mut control = DspControl::default();
        control.set_halt(true);
        control
    }

    /// True if any interrupt source is both pending and enabled.
    pub fn interrupt_asserted(&self) -> bool {
        let hex = u16::from(*self);
        ((hex >> 1) & hex & DspInterruptType::ALL_BITS) != 0
    }

    /// Sets the pending bits in `bits`. Bits outside of the interrupt pending bits are ignored.
    pub fn raise(&mut self, bits: u16) {
        *self = DspControl::from(u16::from(*self) | (bits & DspInterruptType::ALL_BITS));
    }

    /// Merges a CPU write into the register. `written` already contains the engine owned bits as
    /// returned by the engine.
    pub fn apply_write(&mut self, written: DspControl) {
        self.set_reset(written.reset());
        self.set_assert_int(written.assert_int());
        self.set_halt(written.halt());
        self.set_init_code(written.init_code());
        self.set_init(written.init());

        self.set_aid_mask(written.aid_mask());
        self.set_aram_mask(written.aram_mask());
        self.set_dsp_mask(written.dsp_mask());

        if written.aid() {
            self.set_aid(false);
        }
        if written.aram() {
            self.set_aram(false);
        }
        if written.dsp() {
            self.set_dsp(false);
        }

        self.set_pad(written.pad());
    }
}
