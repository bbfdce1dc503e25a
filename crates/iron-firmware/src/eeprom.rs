//! `ByteStorage` over an I2C EEPROM, with bounded ACK-polling for the
//! write cycle.
//!
//! After a page write, an EEPROM NAKs every transaction until it has
//! finished committing the page internally (typically a few
//! milliseconds). This driver polls for an ACK with a fixed timeout
//! rather than blocking forever on a part that never comes back.

use embedded_hal::i2c::I2c;
use iron_core::ByteStorage;

const EEPROM_I2C_ADDRESS: u8 = 0x50;
const EEPROM_ACK_POLL_TIMEOUT_MS: u32 = 7;
const EEPROM_ACK_POLL_INTERVAL_US: u32 = 200;

pub struct I2cEeprom<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C, D> I2cEeprom<I2C, D>
where
    I2C: I2c,
    D: FnMut(u32),
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self { i2c, delay }
    }

    fn wait_for_ack(&mut self) -> bool {
        let attempts = (EEPROM_ACK_POLL_TIMEOUT_MS * 1000) / EEPROM_ACK_POLL_INTERVAL_US;
        for _ in 0..attempts {
            if self.i2c.write(EEPROM_I2C_ADDRESS, &[]).is_ok() {
                return true;
            }
            (self.delay)(EEPROM_ACK_POLL_INTERVAL_US);
        }
        false
    }
}

impl<I2C, D> ByteStorage for I2cEeprom<I2C, D>
where
    I2C: I2c,
    D: FnMut(u32),
{
    fn read_bytes(&mut self, addr: u16, buf: &mut [u8]) -> bool {
        if !self.wait_for_ack() {
            return false;
        }
        let addr_bytes = addr.to_be_bytes();
        self.i2c
            .write_read(EEPROM_I2C_ADDRESS, &addr_bytes, buf)
            .is_ok()
    }

    fn write_bytes(&mut self, addr: u16, buf: &[u8]) -> bool {
        if !self.wait_for_ack() {
            return false;
        }
        let mut frame: heapless::Vec<u8, 34> = heapless::Vec::new();
        if frame.extend_from_slice(&addr.to_be_bytes()).is_err() {
            return false;
        }
        if frame.extend_from_slice(buf).is_err() {
            return false;
        }
        self.i2c.write(EEPROM_I2C_ADDRESS, &frame).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};

    #[test]
    fn write_then_read_round_trips() {
        let expectations = [
            Transaction::write(EEPROM_I2C_ADDRESS, vec![]),
            Transaction::write(EEPROM_I2C_ADDRESS, vec![0x00, 0x04, 0xAA, 0xBB]),
            Transaction::write(EEPROM_I2C_ADDRESS, vec![]),
            Transaction::write_read(EEPROM_I2C_ADDRESS, vec![0x00, 0x04], vec![0xAA, 0xBB]),
        ];
        let i2c = Mock::new(&expectations);
        let mut eeprom = I2cEeprom::new(i2c, |_us: u32| {});

        assert!(eeprom.write_bytes(4, &[0xAA, 0xBB]));
        let mut buf = [0u8; 2];
        assert!(eeprom.read_bytes(4, &mut buf));
        assert_eq!(buf, [0xAA, 0xBB]);

        eeprom.i2c.done();
    }
}
