//! EEPROM-backed persistence for a channel's configuration.
//!
//! `ByteStorage` is the collaborator contract: this module never touches
//! an I2C bus directly, it only calls through to whatever driver the
//! firmware (or a fake, on the host) provides. The `read_float`/
//! `write_float` default implementations do a raw little-endian 4-byte
//! copy; a driver only has to implement `read_bytes`/`write_bytes`.

use crate::calibration::CalibrationTable;
use crate::channel::Channel;

pub trait ByteStorage {
    fn read_bytes(&mut self, addr: u16, buf: &mut [u8]) -> bool;
    fn write_bytes(&mut self, addr: u16, buf: &[u8]) -> bool;

    fn read_byte(&mut self, addr: u16) -> Option<u8> {
        let mut buf = [0u8; 1];
        if self.read_bytes(addr, &mut buf) {
            Some(buf[0])
        } else {
            None
        }
    }

    fn write_byte(&mut self, addr: u16, value: u8) -> bool {
        self.write_bytes(addr, &[value])
    }

    /// Reads a little-endian `f32`. A read that fails, or that decodes to
    /// `NaN`, is reported as `None` — a NaN on the wire is as useless to
    /// the caller as a bus failure.
    fn read_float(&mut self, addr: u16) -> Option<f32> {
        let mut buf = [0u8; 4];
        if !self.read_bytes(addr, &mut buf) {
            return None;
        }
        let value = f32::from_le_bytes(buf);
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }

    fn write_float(&mut self, addr: u16, value: f32) -> bool {
        self.write_bytes(addr, &value.to_le_bytes())
    }
}

/// Ten scalar fields, then ten `(voltage, temperature)` calibration pairs:
/// `10 * 4 + 10 * 2 * 4 = 120` bytes per channel.
pub const RECORD_SIZE_BYTES: u16 = 120;
const SCALAR_COUNT: u16 = 10;
const CAL_TABLE_OFFSET: u16 = SCALAR_COUNT * 4;

/// Writes every field of a channel's persisted record. Sub-writes are
/// never short-circuited — a failure partway through does not stop the
/// remaining writes — and the overall result reports failure if any one
/// of them failed.
pub fn save<S: ByteStorage>(channel: &Channel<impl embedded_hal::digital::OutputPin>, storage: &mut S) -> bool {
    let base = channel.identity.eeprom_base;
    let mut ok = true;

    let scalars = [
        channel.tc_voltage_sp,
        channel.temp_sp_min,
        channel.temp_sp_max,
        channel.pid.kp,
        channel.pid.ki,
        channel.pid.kd,
        channel.pid.derivative_tau,
        channel.sleep_delay_ms,
        channel.sleep_voltage_sp,
        channel.temp_runaway_threshold,
    ];
    for (i, value) in scalars.iter().enumerate() {
        ok &= storage.write_float(base + (i as u16) * 4, *value);
    }

    for (i, (v, t)) in channel.calibration.entries().iter().enumerate() {
        let offset = base + CAL_TABLE_OFFSET + (i as u16) * 8;
        ok &= storage.write_float(offset, *v);
        ok &= storage.write_float(offset + 4, *t);
    }

    ok
}

/// Loads every field of a channel's persisted record. This is
/// all-or-nothing: on the first failed sub-read the in-memory channel is
/// left untouched at whatever values it already had (its factory
/// defaults, if this is the first load), and `false` is returned.
pub fn load<S: ByteStorage>(channel: &mut Channel<impl embedded_hal::digital::OutputPin>, storage: &mut S) -> bool {
    let base = channel.identity.eeprom_base;

    let mut scalars = [0f32; SCALAR_COUNT as usize];
    for (i, slot) in scalars.iter_mut().enumerate() {
        match storage.read_float(base + (i as u16) * 4) {
            Some(v) => *slot = v,
            None => return false,
        }
    }

    let mut entries = [(0f32, 0f32); 10];
    for (i, slot) in entries.iter_mut().enumerate() {
        let offset = base + CAL_TABLE_OFFSET + (i as u16) * 8;
        let v = match storage.read_float(offset) {
            Some(v) => v,
            None => return false,
        };
        let t = match storage.read_float(offset + 4) {
            Some(t) => t,
            None => return false,
        };
        *slot = (v, t);
    }

    channel.tc_voltage_sp = scalars[0];
    channel.temp_sp_min = scalars[1];
    channel.temp_sp_max = scalars[2];
    channel.pid.kp = scalars[3];
    channel.pid.ki = scalars[4];
    channel.pid.kd = scalars[5];
    channel.pid.derivative_tau = scalars[6];
    channel.sleep_delay_ms = scalars[7];
    channel.sleep_voltage_sp = scalars[8];
    channel.temp_runaway_threshold = scalars[9];
    channel.calibration = CalibrationTable::new(entries);
    channel.temp_sp = channel.calibration.tcv_to_temp(channel.tc_voltage_sp);

    true
}
