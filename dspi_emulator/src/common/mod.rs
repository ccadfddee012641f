//! Traits and types shared by all components of the emulator.

pub mod bus;
pub mod debug_events;
pub mod dsp_engine;
pub mod logging;
pub mod scheduler;
#[cfg(test)]
pub mod test_bus;
pub mod uint;
pub mod util;
