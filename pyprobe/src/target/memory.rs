//! Word-oriented access to another process's memory

use crate::domain::{AttachmentError, RemoteAddr};

const WORD: u64 = 8;

/// Read-only view of the target's address space
///
/// Only [`read_word`](RemoteMemory::read_word) is required; everything else
/// is assembled from little-endian 64-bit words.
pub trait RemoteMemory {
    /// Read the 8 bytes at `addr`
    ///
    /// # Errors
    /// [`AttachmentError::ProcessExited`] when the address cannot be read.
    fn read_word(&self, addr: RemoteAddr) -> Result<u64, AttachmentError>;

    /// Read a pointer-sized value
    ///
    /// # Errors
    /// See [`read_word`](RemoteMemory::read_word).
    fn read_ptr(&self, addr: RemoteAddr) -> Result<RemoteAddr, AttachmentError> {
        self.read_word(addr).map(RemoteAddr)
    }

    /// Read a C `int`
    ///
    /// # Errors
    /// See [`read_word`](RemoteMemory::read_word).
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn read_i32(&self, addr: RemoteAddr) -> Result<i32, AttachmentError> {
        self.read_word(addr).map(|word| word as u32 as i32)
    }

    /// Read `len` bytes starting at `addr`
    ///
    /// # Errors
    /// See [`read_word`](RemoteMemory::read_word).
    #[allow(clippy::cast_possible_truncation)]
    fn read_bytes(&self, addr: RemoteAddr, len: usize) -> Result<Vec<u8>, AttachmentError> {
        let mut out = Vec::with_capacity(len);
        let mut cursor = addr;
        while out.len() < len {
            let word = self.read_word(cursor)?.to_le_bytes();
            let take = (len - out.len()).min(WORD as usize);
            out.extend_from_slice(&word[..take]);
            cursor = cursor.offset(WORD);
        }
        Ok(out)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;

    use super::RemoteMemory;
    use crate::domain::{AttachmentError, Pid, RemoteAddr};

    /// Sparse byte-addressed memory image; unmapped bytes fail like a dead target
    #[derive(Debug, Default)]
    pub struct FakeMemory {
        bytes: HashMap<u64, u8>,
    }

    impl FakeMemory {
        pub fn write(&mut self, addr: u64, data: &[u8]) {
            for (i, byte) in data.iter().enumerate() {
                self.bytes.insert(addr + i as u64, *byte);
            }
        }

        pub fn write_u64(&mut self, addr: u64, value: u64) {
            self.write(addr, &value.to_le_bytes());
        }

        pub fn write_i32(&mut self, addr: u64, value: i32) {
            self.write(addr, &value.to_le_bytes());
        }
    }

    impl RemoteMemory for FakeMemory {
        fn read_word(&self, addr: RemoteAddr) -> Result<u64, AttachmentError> {
            let mut word = [0u8; 8];
            for (i, slot) in word.iter_mut().enumerate() {
                *slot = *self
                    .bytes
                    .get(&(addr.0 + i as u64))
                    .ok_or(AttachmentError::ProcessExited { pid: Pid(1), addr })?;
            }
            Ok(u64::from_le_bytes(word))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeMemory;
    use super::*;

    #[test]
    fn test_read_bytes_spans_words() {
        let mut mem = FakeMemory::default();
        mem.write(0x100, b"hello, remote world!....");
        let bytes = mem.read_bytes(RemoteAddr(0x100), 20).unwrap();
        assert_eq!(bytes, b"hello, remote world!");
    }

    #[test]
    fn test_read_i32_uses_low_half() {
        let mut mem = FakeMemory::default();
        mem.write_i32(0x10, -7);
        mem.write_i32(0x14, 99);
        assert_eq!(mem.read_i32(RemoteAddr(0x10)).unwrap(), -7);
    }

    #[test]
    fn test_unmapped_read_fails() {
        let mem = FakeMemory::default();
        assert!(matches!(
            mem.read_ptr(RemoteAddr(0x40)),
            Err(AttachmentError::ProcessExited { addr: RemoteAddr(0x40), .. })
        ));
    }
}
