//! Save state of the DSP interface.
use anyhow::bail;
use bitcode::Decode;
use bitcode::Encode;

/// Persisted fields, in the order they are written.
#[derive(Clone, Debug, Default, PartialEq, Encode, Decode)]
pub(crate) struct DspiSnapshot {
    /// Owned ARAM contents. None if ARAM is aliased to extended RAM.
    pub aram: Option<Vec<u8>>,
    pub control: u16,
    pub audio_dma: AudioDmaSnapshot,
    pub aram_dma: AramDmaSnapshot,
    pub aram_info: u16,
    pub aram_mode: u16,
    pub aram_refresh: u16,
    pub dsp_slice: i32,
    pub dsp_engine: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Encode, Decode)]
pub(crate) struct AudioDmaSnapshot {
    pub current_source_address: u32,
    pub remaining_blocks_count: u16,
    pub source_address: u32,
    pub control: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Encode, Decode)]
pub(crate) struct AramDmaSnapshot {
    pub mm_addr: u32,
    pub ar_addr: u32,
    pub count: u32,
}

impl DspiSnapshot {
    pub fn decode(encoded: &[u8]) -> anyhow::Result<Self> {
        Ok(bitcode::decode(encoded)?)
    }

    pub fn encode(&self) -> Vec<u8> {
        bitcode::encode(self)
    }

    /// Checks that the snapshot was taken with the same ARAM configuration and holds a usable
    /// DSP slice budget.
    pub fn validate(&self, owned_size: Option<usize>) -> anyhow::Result<()> {
        if self.dsp_slice < 0 {
            bail!("Negative DSP slice budget: {}", self.dsp_slice);
        }
        match (&self.aram, owned_size) {
            (Some(aram), Some(size)) if aram.len() != size => bail!(
                "ARAM size mismatch: state has {:#X} bytes, device has {:#X}",
                aram.len(),
                size
            ),
            (Some(_), None) => bail!("State contains ARAM contents but ARAM is aliased"),
            (None, Some(_)) => bail!("State has no ARAM contents but ARAM is owned"),
            _ => Ok(()),
        }
    }
}
