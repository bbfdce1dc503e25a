//! In-memory stand-in for the EEPROM driver, for host-side tests and the
//! bench binary. There's no process boundary here to simulate across —
//! the whole station is one firmware image — so this is a plain byte
//! array rather than a socket-backed emulator.

use iron_core::ByteStorage;

pub struct FakeEeprom {
    bytes: [u8; 4096],
}

impl FakeEeprom {
    pub fn new() -> Self {
        Self { bytes: [0u8; 4096] }
    }
}

impl Default for FakeEeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStorage for FakeEeprom {
    fn read_bytes(&mut self, addr: u16, buf: &mut [u8]) -> bool {
        let start = addr as usize;
        let end = start + buf.len();
        if end > self.bytes.len() {
            return false;
        }
        buf.copy_from_slice(&self.bytes[start..end]);
        true
    }

    fn write_bytes(&mut self, addr: u16, buf: &[u8]) -> bool {
        let start = addr as usize;
        let end = start + buf.len();
        if end > self.bytes.len() {
            return false;
        }
        self.bytes[start..end].copy_from_slice(buf);
        true
    }
}
