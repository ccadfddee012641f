//! Register level tests of the DSP interface through the whole system.

use dspi_emulator::common::dsp_engine::DspEngineKind;
use dspi_emulator::common::logging;
use dspi_emulator::components::dspi::*;
use dspi_emulator::System;
use pretty_assertions::assert_eq;

fn gamecube() -> System {
    logging::test_init(false);
    System::new(DspiConfig::new(ConsoleRevision::GameCube, DspEngineKind::Hle))
}

#[test]
pub fn test_power_on_registers() {
    let mut system = gamecube();
    assert_eq!(system.read_u16(DSP_CONTROL), 0x0004);
    assert_eq!(system.read_u16(AR_MODE), 0x0001);
    assert_eq!(system.read_u16(AR_REFRESH), 156);
    assert_eq!(system.read_u32(AR_DMA_MMADDR_H), 0);
    assert_eq!(system.read_u16(AUDIO_DMA_BLOCKS_LEFT), 0);
    assert!(!system.bus.dsp_interrupt);
}

#[test]
pub fn test_full_address_decodes_register() {
    let mut system = gamecube();
    system.write_u16(0x0C00_0000 | AR_INFO, 0x0055);
    assert_eq!(system.read_u16(AR_INFO), 0x0055);
    assert_eq!(system.read_u16(0x0C00_0000 | AR_INFO), 0x0055);
}

#[test]
pub fn test_u32_writes_split_into_halves() {
    let mut system = gamecube();
    system.write_u32(AR_DMA_ARADDR_H, 0xFFFF_FFFF);
    assert_eq!(system.read_u16(AR_DMA_ARADDR_H), 0x03FF);
    assert_eq!(system.read_u16(AR_DMA_ARADDR_L), 0xFFE0);
    assert_eq!(system.read_u32(AR_DMA_ARADDR_H), 0x03FF_FFE0);

    system.write_u32(AUDIO_DMA_START_HI, 0x0000_1000);
    assert_eq!(system.read_u32(AUDIO_DMA_START_HI), 0x0000_1000);
}

#[test]
pub fn test_cpu_mail_is_latched() {
    let mut system = gamecube();
    system.write_u32(DSP_MAIL_TO_DSP_HI, 0x1234_5678);
    assert_eq!(system.read_u16(DSP_MAIL_TO_DSP_HI), 0x9234);
    assert_eq!(system.read_u16(DSP_MAIL_TO_DSP_LO), 0x5678);
    assert_eq!(system.read_u16(DSP_MAIL_FROM_DSP_HI), 0x0000);

    // Resetting the DSP drops the mail.
    system.write_u16(DSP_CONTROL, 0x0001);
    assert_eq!(system.read_u32(DSP_MAIL_TO_DSP_HI), 0);
    assert_eq!(system.read_u16(DSP_CONTROL) & 0x0001, 0);
}

#[test]
pub fn test_interrupt_line_follows_control_register() {
    let mut system = gamecube();
    system.write_u16(DSP_CONTROL, 0x0040);
    system.write_u16(AR_DMA_CNT_L, 0x0020);
    assert!(!system.bus.dsp_interrupt);

    system.advance(246);
    assert!(system.bus.dsp_interrupt);
    assert_eq!(system.read_u16(DSP_CONTROL) & 0x0220, 0x0020);

    system.write_u16(DSP_CONTROL, 0x0060);
    assert!(!system.bus.dsp_interrupt);
}

#[test]
pub fn test_reset_restores_power_on_state() {
    let mut system = gamecube();
    system.write_u16(AR_INFO, 0x0013);
    system.write_u16(DSP_CONTROL, 0x0150);
    system.reset();
    assert_eq!(system.read_u16(AR_INFO), 0);
    assert_eq!(system.read_u16(DSP_CONTROL), 0x0004);
    assert_eq!(system.bus.scheduler.event_name(Default::default()), Some("DSPint"));
    system.shutdown();
}
