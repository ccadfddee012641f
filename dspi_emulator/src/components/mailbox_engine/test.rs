#![cfg(test)]

use super::*;
use crate::common::dsp_engine::interrupt_channel;

#[test]
fn test_cpu_to_dsp_mail() {
    let (sender, _receiver) = interrupt_channel();
    let mut engine = MailboxEngine::new(sender);
    assert_eq!(engine.take_mail(), None);

    engine.write_mailbox_high(Mailbox::CpuToDsp, 0xFFFF);
    assert_eq!(engine.read_mailbox_high(Mailbox::CpuToDsp), 0x7FFF);
    engine.write_mailbox_low(Mailbox::CpuToDsp, 0x1234);
    assert_eq!(engine.read_mailbox_high(Mailbox::CpuToDsp), 0xFFFF);
    assert_eq!(engine.read_mailbox_low(Mailbox::CpuToDsp), 0x1234);

    assert_eq!(engine.take_mail(), Some(0x7FFF_1234));
    assert_eq!(engine.read_mailbox_high(Mailbox::CpuToDsp), 0x7FFF);
    assert_eq!(engine.take_mail(), None);
}

#[test]
fn test_dsp_to_cpu_mail() {
    let (sender, receiver) = interrupt_channel();
    let mut engine = MailboxEngine::new(sender);
    let dsp_side = engine.clone();

    dsp_side.post_mail(0xDCD1_0000, true);
    assert_eq!(engine.read_mailbox_high(Mailbox::DspToCpu), 0xDCD1);
    assert_eq!(engine.read_mailbox_low(Mailbox::DspToCpu), 0x0000);
    assert_eq!(engine.read_mailbox_high(Mailbox::DspToCpu), 0x5CD1);
    assert_eq!(
        receiver.try_next().map(|r| r.interrupt),
        Some(DspInterruptType::Dsp)
    );

    dsp_side.post_mail(0x1, false);
    assert_eq!(receiver.try_next(), None);
}

#[test]
fn test_control_bits() {
    let (sender, _receiver) = interrupt_channel();
    let mut engine = MailboxEngine::new(sender);
    assert_eq!(engine.read_control_register(), 0x0004);

    engine.write_mailbox_low(Mailbox::CpuToDsp, 1);
    assert_eq!(engine.write_control_register(0xFFFF), 0x0C04);
    assert_eq!(engine.read_control_register(), 0x0C04);
    assert_eq!(engine.take_mail(), None);
}

#[test]
fn test_save_state() {
    let (sender, _receiver) = interrupt_channel();
    let mut engine = MailboxEngine::new(sender.clone());
    engine.write_mailbox_low(Mailbox::CpuToDsp, 0x42);
    engine.update(100);
    let saved = engine.save_state();

    let mut restored = MailboxEngine::new(sender);
    restored.load_state(&saved).unwrap();
    assert_eq!(restored.take_mail(), Some(0x42));
    assert_eq!(restored.cycles(), 100);
    assert!(restored.load_state(&[]).is_err());
}
