//! USB and HMI serial byte pumps.
//!
//! Both links feed the same framing/dispatch path; only the terminator
//! and the read timeout differ. The HMI link additionally has to notice
//! `xxxP`/`xxxR` preamble lines before anything reaches the command
//! dispatcher.

use heapless::Vec;
use iron_proto::{LineFramer, Terminator};

pub const HMI_READ_TIMEOUT_MS: u32 = 20;
const LINE_BUF_CAPACITY: usize = 96;

/// Accumulates bytes from a serial link and yields complete lines.
///
/// `timeout_ms` is `None` for USB (reads can block as long as the host
/// wants) and `Some(HMI_READ_TIMEOUT_MS)` for the HMI link, per the
/// source's per-link read timeout. `first_byte_ms` tracks when the
/// currently-buffered partial line started accumulating.
pub struct SerialPump {
    framer: LineFramer,
    buf: Vec<u8, LINE_BUF_CAPACITY>,
    timeout_ms: Option<u32>,
    first_byte_ms: Option<u32>,
}

impl SerialPump {
    pub fn usb() -> Self {
        Self {
            framer: LineFramer::new(Terminator::Newline),
            buf: Vec::new(),
            timeout_ms: None,
            first_byte_ms: None,
        }
    }

    pub fn hmi() -> Self {
        Self {
            framer: LineFramer::new(Terminator::TripleFf),
            buf: Vec::new(),
            timeout_ms: Some(HMI_READ_TIMEOUT_MS),
            first_byte_ms: None,
        }
    }

    /// Appends one received byte. Silently drops the byte if the line
    /// buffer is full and no frame boundary has appeared yet — a
    /// malformed, unterminated line cannot be allowed to block forever.
    pub fn push_byte(&mut self, now_ms: u32, byte: u8) {
        if self.buf.is_empty() {
            self.first_byte_ms = Some(now_ms);
        }
        if self.buf.push(byte).is_err() {
            self.buf.clear();
            self.first_byte_ms = None;
        }
    }

    /// Extracts the next complete line, if one is buffered, leaving any
    /// trailing bytes in place for the next call. If this link has a
    /// read timeout and the oldest buffered byte is older than it with
    /// no terminator found yet, the partial line is discarded and `None`
    /// is returned, per the source's "stale partial line, no surfaced
    /// error" behavior.
    pub fn next_line(&mut self, now_ms: u32) -> Option<heapless::String<LINE_BUF_CAPACITY>> {
        if let (Some(timeout), Some(start)) = (self.timeout_ms, self.first_byte_ms) {
            if !self.buf.is_empty() && now_ms.wrapping_sub(start) > timeout {
                self.buf.clear();
                self.first_byte_ms = None;
                return None;
            }
        }
        let (line, consumed) = self.framer.parse(&self.buf)?;
        let mut out = heapless::String::new();
        let _ = out.push_str(core::str::from_utf8(line).unwrap_or(""));
        let remaining = self.buf.len() - consumed;
        for i in 0..remaining {
            self.buf[i] = self.buf[consumed + i];
        }
        self.buf.truncate(remaining);
        if self.buf.is_empty() {
            self.first_byte_ms = None;
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_a_complete_usb_line() {
        let mut pump = SerialPump::usb();
        for &b in b"0:en:1\n" {
            pump.push_byte(0, b);
        }
        let line = pump.next_line(0).unwrap();
        assert_eq!(line.as_str(), "0:en:1");
        assert!(pump.next_line(0).is_none());
    }

    #[test]
    fn retains_partial_line_across_calls() {
        let mut pump = SerialPump::usb();
        for &b in b"0:en" {
            pump.push_byte(0, b);
        }
        assert!(pump.next_line(0).is_none());
        for &b in b":1\n" {
            pump.push_byte(0, b);
        }
        assert_eq!(pump.next_line(0).unwrap().as_str(), "0:en:1");
    }

    #[test]
    fn usb_link_has_no_read_timeout() {
        let mut pump = SerialPump::usb();
        for &b in b"0:en" {
            pump.push_byte(0, b);
        }
        // Far past the HMI timeout, but USB doesn't enforce one.
        assert!(pump.next_line(HMI_READ_TIMEOUT_MS * 1000).is_none());
        for &b in b":1\n" {
            pump.push_byte(HMI_READ_TIMEOUT_MS * 1000, b);
        }
        assert_eq!(
            pump.next_line(HMI_READ_TIMEOUT_MS * 1000).unwrap().as_str(),
            "0:en:1"
        );
    }

    #[test]
    fn yields_a_complete_hmi_line() {
        let mut pump = SerialPump::hmi();
        for &b in b"0:en:1" {
            pump.push_byte(0, b);
        }
        pump.push_byte(0, 0xFF);
        pump.push_byte(0, 0xFF);
        pump.push_byte(0, 0xFF);
        assert_eq!(pump.next_line(0).unwrap().as_str(), "0:en:1");
    }

    #[test]
    fn hmi_discards_stale_partial_line_after_timeout() {
        let mut pump = SerialPump::hmi();
        pump.push_byte(0, b'0');
        pump.push_byte(5, b':');
        assert!(pump.next_line(HMI_READ_TIMEOUT_MS + 1).is_none());

        // The stale bytes were dropped, not left to corrupt the next line.
        for &b in b"1:en:1" {
            pump.push_byte(HMI_READ_TIMEOUT_MS + 1, b);
        }
        pump.push_byte(HMI_READ_TIMEOUT_MS + 1, 0xFF);
        pump.push_byte(HMI_READ_TIMEOUT_MS + 1, 0xFF);
        pump.push_byte(HMI_READ_TIMEOUT_MS + 1, 0xFF);
        assert_eq!(
            pump.next_line(HMI_READ_TIMEOUT_MS + 1).unwrap().as_str(),
            "1:en:1"
        );
    }

    #[test]
    fn hmi_line_within_timeout_is_not_discarded() {
        let mut pump = SerialPump::hmi();
        pump.push_byte(0, b'0');
        assert!(pump.next_line(HMI_READ_TIMEOUT_MS).is_none());
        pump.push_byte(HMI_READ_TIMEOUT_MS, b':');
        pump.push_byte(HMI_READ_TIMEOUT_MS, b'1');
        pump.push_byte(HMI_READ_TIMEOUT_MS, 0xFF);
        pump.push_byte(HMI_READ_TIMEOUT_MS, 0xFF);
        pump.push_byte(HMI_READ_TIMEOUT_MS, 0xFF);
        assert_eq!(pump.next_line(HMI_READ_TIMEOUT_MS).unwrap().as_str(), "0:1");
    }
}
