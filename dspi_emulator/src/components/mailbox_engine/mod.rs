//! Minimal high level DSP engine.
//!
//! Does not run any microcode. It latches the mailboxes between CPU and DSP and keeps the engine
//! owned control bits, which is enough for software that only probes the DSP. The DSP side of the
//! mailboxes is available through [MailboxEngine::post_mail] and [MailboxEngine::take_mail].
#[cfg(test)]
mod test;

use std::cell::RefCell;
use std::rc::Rc;

use bitcode::Decode;
use bitcode::Encode;

use crate::common::dsp_engine::DspEngine;
use crate::common::dsp_engine::DspEngineKind;
use crate::common::dsp_engine::DspInterruptSender;
use crate::common::dsp_engine::DspInterruptType;
use crate::common::dsp_engine::Mailbox;
use crate::common::uint::U32Ext;

/// Set while a mail has been written but not yet read by the receiver.
const MAIL_STATUS: u32 = 0x8000_0000;
const MAIL_PAYLOAD: u32 = 0x7FFF_FFFF;

/// Reset, assert interrupt, halt, init code and init.
const CONTROL_MASK: u16 = 0x0C07;
const CONTROL_RESET: u16 = 0x0001;
const CONTROL_ASSERT_INT: u16 = 0x0002;

#[derive(Clone, Debug, Default, PartialEq, Encode, Decode)]
struct MailboxState {
    to_dsp: u32,
    from_dsp: u32,
    control: u16,
    cycles: u64,
}

/// Handle to the DSP side of a [MailboxEngine] that stays valid after the engine was handed to
/// the DSP interface.
#[derive(Clone)]
pub struct MailboxEngine {
    state: Rc<RefCell<MailboxState>>,
    interrupts: DspInterruptSender,
}

impl MailboxEngine {
    pub fn new(interrupts: DspInterruptSender) -> Self {
        Self {
            state: Rc::new(RefCell::new(MailboxState {
                control: 0x0004,
                ..Default::default()
            })),
            interrupts,
        }
    }

    /// Engine factory for the DSP interface. Only the HLE kind is provided, LLE requests fall
    /// back to it.
    pub fn create(kind: DspEngineKind, interrupts: DspInterruptSender) -> Box<dyn DspEngine> {
        if kind == DspEngineKind::Lle {
            log::warn!("No LLE engine available, using mailbox engine");
        }
        Box::new(MailboxEngine::new(interrupts))
    }

    /// DSP side: sends a mail to the CPU, optionally raising the DSP interrupt.
    pub fn post_mail(&self, mail: u32, raise_interrupt: bool) {
        self.state.borrow_mut().from_dsp = (mail & MAIL_PAYLOAD) | MAIL_STATUS;
        if raise_interrupt {
            self.interrupts.request(DspInterruptType::Dsp, 0);
        }
    }

    /// DSP side: receives the pending mail from the CPU.
    pub fn take_mail(&self) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        if state.to_dsp & MAIL_STATUS == 0 {
            return None;
        }
        state.to_dsp &= MAIL_PAYLOAD;
        Some(state.to_dsp)
    }

    /// Cycles the engine was given so far.
    pub fn cycles(&self) -> u64 {
        self.state.borrow().cycles
    }

    fn mailbox(&self, mailbox: Mailbox) -> u32 {
        let state = self.state.borrow();
        match mailbox {
            Mailbox::CpuToDsp => state.to_dsp,
            Mailbox::DspToCpu => state.from_dsp,
        }
    }
}

impl DspEngine for MailboxEngine {
    fn is_lle(&self) -> bool {
        false
    }

    fn read_mailbox_high(&mut self, mailbox: Mailbox) -> u16 {
        self.mailbox(mailbox).high_word()
    }

    fn read_mailbox_low(&mut self, mailbox: Mailbox) -> u16 {
        let value = self.mailbox(mailbox).low_word();
        if mailbox == Mailbox::DspToCpu {
            self.state.borrow_mut().from_dsp &= MAIL_PAYLOAD;
        }
        value
    }

    fn write_mailbox_high(&mut self, mailbox: Mailbox, value: u16) {
        match mailbox {
            Mailbox::CpuToDsp => {
                let mut state = self.state.borrow_mut();
                state.to_dsp = state.to_dsp.with_high_word(value & 0x7FFF);
            }
            Mailbox::DspToCpu => log::warn!("CPU write to DSP mailbox high: {value:04X}"),
        }
    }

    fn write_mailbox_low(&mut self, mailbox: Mailbox, value: u16) {
        match mailbox {
            Mailbox::CpuToDsp => {
                let mut state = self.state.borrow_mut();
                state.to_dsp = state.to_dsp.with_low_word(value) | MAIL_STATUS;
            }
            Mailbox::DspToCpu => log::warn!("CPU write to DSP mailbox low: {value:04X}"),
        }
    }

    fn read_control_register(&mut self) -> u16 {
        self.state.borrow().control
    }

    fn write_control_register(&mut self, value: u16) -> u16 {
        let mut state = self.state.borrow_mut();
        let mut control = value & CONTROL_MASK;
        if control & CONTROL_RESET != 0 {
            log::debug!("Mailbox engine reset");
            state.to_dsp = 0;
            state.from_dsp = 0;
        }
        // Reset completes immediately and nobody on the DSP side handles interrupts.
        control &= !(CONTROL_RESET | CONTROL_ASSERT_INT);
        state.control = control;
        control
    }

    fn update(&mut self, cycles: i32) {
        self.state.borrow_mut().cycles += cycles.max(0) as u64;
    }

    fn save_state(&self) -> Vec<u8> {
        bitcode::encode(&*self.state.borrow())
    }

    fn load_state(&mut self, encoded: &[u8]) -> anyhow::Result<()> {
        *self.state.borrow_mut() = bitcode::decode(encoded)?;
        Ok(())
    }
}
