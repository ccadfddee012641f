//! Replays random register accesses on the DSP interface.
#![no_main]

use dspi_emulator::common::dsp_engine::DspEngineKind;
use dspi_emulator::components::dspi::ConsoleRevision;
use dspi_emulator::components::dspi::DspiConfig;
use dspi_emulator::System;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((first, ops)) = data.split_first() else {
        return;
    };
    let console = if first & 1 == 0 {
        ConsoleRevision::GameCube
    } else {
        ConsoleRevision::Wii
    };
    let mut system = System::new(DspiConfig::new(console, DspEngineKind::Hle));
    // Each operation is 5 bytes: kind, register offset, 16 bit value and a time delta.
    // Whatever the sequence, the device must never panic.
    for op in ops.chunks_exact(5) {
        let addr = 0x5000 | ((op[1] as u32) << 1 & 0x7E);
        let value = u16::from_be_bytes([op[2], op[3]]);
        match op[0] % 4 {
            0 => system.write_u16(addr, value),
            1 => {
                system.read_u16(addr);
            }
            2 => system.write_u32(addr & !3, (value as u32) << 16 | value as u32),
            _ => {
                system.read_u32(addr & !3);
            }
        }
        system.advance(op[4] as u64 * 64);
    }
    let state = system.save_state();
    let _ = system.load_state(&state);
});
