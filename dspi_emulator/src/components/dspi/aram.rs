//! Backing store of the auxiliary RAM.
//!
//! On the GameCube ARAM is a dedicated 16 MiB chip that is only reachable through the DSP
//! interface, so the device owns the buffer. On the Wii there is no ARAM chip and the extended
//! RAM of the console (owned by main memory) takes its place.
use crate::common::bus::MainMemory;

pub const ARAM_SIZE: usize = 0x0100_0000;
pub const ARAM_MASK: u32 = 0x00FF_FFFF;

/// Set in DSP accesses to aliased ARAM to select extended RAM instead of main RAM.
const EXRAM_SELECT: u32 = 0x1000_0000;

pub(crate) enum Aram {
    Owned { buffer: Box<[u8]>, mask: u32 },
    Aliased { size: usize, mask: u32 },
}

impl Aram {
    pub fn owned() -> Self {
        Aram::Owned {
            buffer: vec![0; ARAM_SIZE].into_boxed_slice(),
            mask: ARAM_MASK,
        }
    }

    pub fn aliased<M: MainMemory + ?Sized>(memory: &M) -> Self {
        Aram::Aliased {
            size: memory.exram().len(),
            mask: memory.exram_mask(),
        }
    }

    pub fn is_aliased(&self) -> bool {
        matches!(self, Aram::Aliased { .. })
    }

    pub fn size(&self) -> usize {
        match self {
            Aram::Owned { buffer, .. } => buffer.len(),
            Aram::Aliased { size, .. } => *size,
        }
    }

    /// Contents of the owned buffer. Aliased ARAM belongs to main memory.
    pub fn contents(&self) -> Option<&[u8]> {
        match self {
            Aram::Owned { buffer, .. } => Some(buffer),
            Aram::Aliased { .. } => None,
        }
    }

    pub fn contents_mut(&mut self) -> Option<&mut [u8]> {
        match self {
            Aram::Owned { buffer, .. } => Some(buffer),
            Aram::Aliased { .. } => None,
        }
    }

    /// Byte read as seen by the DSP. In aliased mode only addresses with bit 28 set reach
    /// extended RAM, everything else reads main RAM.
    pub fn read_u8<M: MainMemory + ?Sized>(&self, addr: u32, memory: &M) -> u8 {
        match self {
            Aram::Owned { buffer, mask } => buffer[(addr & mask) as usize],
            Aram::Aliased { mask, .. } => {
                if addr & EXRAM_SELECT != 0 {
                    byte_at(memory.exram(), addr & mask)
                } else {
                    memory.read_u8(addr & memory.ram_mask())
                }
            }
        }
    }

    /// Byte write as seen by the DSP. Always targets the backing store.
    pub fn write_u8<M: MainMemory + ?Sized>(&mut self, addr: u32, value: u8, memory: &mut M) {
        let store = self.store_mut(memory);
        if let Some((store, mask)) = store {
            if let Some(byte) = store.get_mut((addr & mask) as usize) {
                *byte = value;
            }
        }
    }

    /// Copies 8 bytes out of the backing store, in memory order.
    pub fn load_chunk<M: MainMemory + ?Sized>(&self, addr: u32, memory: &M) -> [u8; 8] {
        let (store, mask) = match self {
            Aram::Owned { buffer, mask } => (&buffer[..], *mask),
            Aram::Aliased { mask, .. } => (memory.exram(), *mask),
        };
        let mut chunk = [0; 8];
        for (idx, byte) in chunk.iter_mut().enumerate() {
            *byte = byte_at(store, addr.wrapping_add(idx as u32) & mask);
        }
        chunk
    }

    /// Copies 8 bytes into the backing store, in memory order.
    pub fn store_chunk<M: MainMemory + ?Sized>(&mut self, addr: u32, chunk: [u8; 8], memory: &mut M) {
        if let Some((store, mask)) = self.store_mut(memory) {
            for (idx, value) in chunk.iter().enumerate() {
                if let Some(byte) = store.get_mut((addr.wrapping_add(idx as u32) & mask) as usize) {
                    *byte = *value;
                }
            }
        }
    }

    fn store_mut<'a, M: MainMemory + ?Sized>(
        &'a mut self,
        memory: &'a mut M,
    ) -> Option<(&'a mut [u8], u32)> {
        match self {
            Aram::Owned { buffer, mask } => Some((&mut buffer[..], *mask)),
            Aram::Aliased { mask, .. } => {
                let mask = *mask;
                let exram = memory.exram_mut();
                if exram.is_empty() {
                    None
                } else {
                    Some((exram, mask))
                }
            }
        }
    }
}

fn byte_at(store: &[u8], addr: u32) -> u8 {
    store.get(addr as usize).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_bus::TestBus;

    #[test]
    fn owned_store_mirrors_every_16_mib() {
        let mut bus = TestBus::new();
        let mut aram = Aram::owned();
        aram.write_u8(0x0100_0010, 0xAB, &mut bus);
        assert_eq!(aram.read_u8(0x10, &bus), 0xAB);
        assert_eq!(aram.read_u8(0x0300_0010, &bus), 0xAB);
        assert_eq!(aram.size(), ARAM_SIZE);
        assert!(!aram.is_aliased());
    }

    #[test]
    fn aliased_reads_select_exram_with_bit_28() {
        let mut bus = TestBus::with_exram();
        bus.write_u8(0x40, 0x11);
        let mut aram = Aram::aliased(&bus);
        aram.write_u8(0x40, 0x22, &mut bus);

        assert_eq!(bus.exram[0x40], 0x22);
        assert_eq!(aram.read_u8(0x1000_0040, &bus), 0x22);
        assert_eq!(aram.read_u8(0x40, &bus), 0x11);
        assert_eq!(aram.size(), 0x0400_0000);
        assert!(aram.contents().is_none());
    }

    #[test]
    fn chunks_keep_memory_order() {
        let mut bus = TestBus::new();
        let mut aram = Aram::owned();
        aram.store_chunk(0x20, [1, 2, 3, 4, 5, 6, 7, 8], &mut bus);
        assert_eq!(&aram.contents().unwrap()[0x20..0x28], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(aram.load_chunk(0x20, &bus), [1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
