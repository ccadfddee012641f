use anyhow::Context;

use crate::common::dsp_engine::DspEngineKind;

pub const CONSOLE_ENV: &str = "DSPI_CONSOLE";
pub const ENGINE_ENV: &str = "DSPI_ENGINE";

/// Console the DSP interface is part of. Decides where ARAM lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ConsoleRevision {
    /// Dedicated 16 MiB ARAM owned by the DSP interface.
    #[default]
    GameCube,
    /// ARAM is aliased to the extended RAM of the console.
    Wii,
}

impl ConsoleRevision {
    pub fn is_wii(self) -> bool {
        self == ConsoleRevision::Wii
    }

    /// Writable bits of AUDIO_DMA_START_HI. The Wii can stream from the larger address space.
    pub fn audio_source_high_mask(self) -> u16 {
        match self {
            ConsoleRevision::GameCube => 0x03FF,
            ConsoleRevision::Wii => 0x1FFF,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DspiConfig {
    pub console: ConsoleRevision,
    pub engine: DspEngineKind,
}

impl DspiConfig {
    pub fn new(console: ConsoleRevision, engine: DspEngineKind) -> Self {
        Self { console, engine }
    }

    /// Reads `DSPI_CONSOLE` (`gamecube` or `wii`) and `DSPI_ENGINE` (`hle` or `lle`). Unset
    /// variables fall back to the defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = DspiConfig::default();
        if let Some(console) = lookup(CONSOLE_ENV) {
            config.console = console
                .to_lowercase()
                .parse()
                .with_context(|| format!("Invalid {CONSOLE_ENV}: {console}"))?;
        }
        if let Some(engine) = lookup(ENGINE_ENV) {
            config.engine = engine
                .to_lowercase()
                .parse()
                .with_context(|| format!("Invalid {ENGINE_ENV}: {engine}"))?;
        }
        Ok(config)
    }
}
