//! General utility functions and types.
use std::collections::vec_deque::Iter;
use std::collections::VecDeque;
use std::fmt::Write;

/// Fixed capacity buffer that keeps the `N` most recently pushed items, newest first.
#[derive(Clone)]
pub struct RingBuffer<T, const N: usize> {
    pub stack: VecDeque<T>,
}

impl<T, const N: usize> RingBuffer<T, N> {
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn push(&mut self, data: T) {
        self.stack.push_front(data);
        self.stack.truncate(N);
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.stack.iter()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

impl<T, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self {
            stack: VecDeque::with_capacity(N),
        }
    }
}

/// Formats memory as a hex dump with 16 bytes per line. Used to produce readable diffs in tests.
pub fn format_memory(memory: &[u8]) -> String {
    let mut output = String::with_capacity(memory.len() * 3);
    for line in memory.chunks(16) {
        for byte in line {
            let _ = write!(output, "{:02X} ", byte);
        }
        output.push('\n');
    }
    output
}

/// Decodes big-endian 16-bit PCM as stored in emulated memory.
pub fn decode_be_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}
