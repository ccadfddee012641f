//! Handler table for a memory mapped 16-bit register window.
//!
//! Handlers are installed per 16-bit register once at construction. 32-bit accesses are always
//! split into the register at `addr` (high half) followed by the one at `addr + 2` (low half).
use crate::common::bus::DspiBus;

/// Size of the decoded register window in bytes.
pub const WINDOW_SIZE: u32 = 0x1000;

pub(crate) enum ReadHandler<D> {
    /// Reads as zero.
    Invalid,
    Direct(fn(&D) -> u16),
    Complex(fn(&mut D) -> u16),
}

pub(crate) enum WriteHandler<D> {
    /// Write is dropped.
    Invalid,
    /// Stores `value & mask`.
    Direct { set: fn(&mut D, u16), mask: u16 },
    Complex(fn(&mut D, &mut dyn DspiBus, u16)),
}

// Manual impls, derive would require D: Copy.
impl<D> Clone for ReadHandler<D> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<D> Copy for ReadHandler<D> {}

impl<D> Clone for WriteHandler<D> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<D> Copy for WriteHandler<D> {}

pub(crate) struct Mapping<D> {
    reads: Vec<ReadHandler<D>>,
    writes: Vec<WriteHandler<D>>,
}

impl<D> Mapping<D> {
    pub fn new() -> Self {
        let slots = (WINDOW_SIZE / 2) as usize;
        Self {
            reads: vec![ReadHandler::Invalid; slots],
            writes: vec![WriteHandler::Invalid; slots],
        }
    }

    pub fn register(&mut self, addr: u32, read: ReadHandler<D>, write: WriteHandler<D>) {
        let slot = Self::slot(addr);
        self.reads[slot] = read;
        self.writes[slot] = write;
    }

    pub fn read_handler(&self, addr: u32) -> ReadHandler<D> {
        self.reads[Self::slot(addr)]
    }

    pub fn write_handler(&self, addr: u32) -> WriteHandler<D> {
        self.writes[Self::slot(addr)]
    }

    fn slot(addr: u32) -> usize {
        ((addr % WINDOW_SIZE) >> 1) as usize
    }
}

/// Register access for devices backed by a [Mapping].
pub(crate) trait MmioDevice: Sized {
    fn mapping(&self) -> &Mapping<Self>;

    fn on_read(&mut self, _addr: u32, _value: u16) {}

    /// Called after every 16-bit write. `handled` is false if the write was dropped.
    fn on_write(&mut self, _addr: u32, _value: u16, _handled: bool) {}

    fn mmio_read_u16(&mut self, addr: u32) -> u16 {
        let value = match self.mapping().read_handler(addr) {
            ReadHandler::Invalid => 0,
            ReadHandler::Direct(get) => get(self),
            ReadHandler::Complex(read) => read(self),
        };
        self.on_read(addr, value);
        value
    }

    fn mmio_write_u16(&mut self, bus: &mut dyn DspiBus, addr: u32, value: u16) {
        let handled = match self.mapping().write_handler(addr) {
            WriteHandler::Invalid => false,
            WriteHandler::Direct { set, mask } => {
                set(self, value & mask);
                true
            }
            WriteHandler::Complex(write) => {
                write(self, bus, value);
                true
            }
        };
        self.on_write(addr, value, handled);
    }

    fn mmio_read_u32(&mut self, addr: u32) -> u32 {
        let high = self.mmio_read_u16(addr);
        let low = self.mmio_read_u16(addr.wrapping_add(2));
        (high as u32) << 16 | low as u32
    }

    fn mmio_write_u32(&mut self, bus: &mut dyn DspiBus, addr: u32, value: u32) {
        self.mmio_write_u16(bus, addr, (value >> 16) as u16);
        self.mmio_write_u16(bus, addr.wrapping_add(2), value as u16);
    }
}
