//! Outbound HMI field-update encoding: `<field>.txt=`, `.val=`,
//! `.pco=` lines, and the `xxxP`/`xxxR` pause/resume preamble.
//!
//! The pause flag lives here rather than in `iron-core` because it's a
//! property of the link to the physical display, not of any channel's
//! control state — a paused link still runs its control loop, it just
//! stops pushing updates.

use core::fmt::Write;
use heapless::String;

pub const PAUSE_LINE: &str = "xxxP";
pub const RESUME_LINE: &str = "xxxR";

pub type EncodedLine = String<48>;

#[derive(Default)]
pub struct HmiLink {
    paused: bool,
}

impl HmiLink {
    pub fn new() -> Self {
        Self { paused: false }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Consumes one inbound preamble line, if it is one. Returns `true`
    /// if the line was a pause/resume control line (and so shouldn't be
    /// parsed as a command).
    pub fn handle_preamble(&mut self, line: &str) -> bool {
        match line {
            PAUSE_LINE => {
                self.paused = true;
                true
            }
            RESUME_LINE => {
                self.paused = false;
                true
            }
            _ => false,
        }
    }

    pub fn encode_text(&self, field: &str, text: &str) -> Option<EncodedLine> {
        if self.paused {
            return None;
        }
        let mut out = EncodedLine::new();
        write!(out, "{}.txt=\"{}\"", field, text).ok()?;
        Some(out)
    }

    pub fn encode_value(&self, field: &str, value: i32) -> Option<EncodedLine> {
        if self.paused {
            return None;
        }
        let mut out = EncodedLine::new();
        write!(out, "{}.val={}", field, value).ok()?;
        Some(out)
    }

    pub fn encode_color(&self, field: &str, color: u32) -> Option<EncodedLine> {
        if self.paused {
            return None;
        }
        let mut out = EncodedLine::new();
        write!(out, "{}.pco={}", field, color).ok()?;
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_text_field() {
        let link = HmiLink::new();
        let line = link.encode_text("h0.t0", "250").unwrap();
        assert_eq!(line.as_str(), "h0.t0.txt=\"250\"");
    }

    #[test]
    fn pause_suppresses_output() {
        let mut link = HmiLink::new();
        assert!(link.handle_preamble(PAUSE_LINE));
        assert!(link.encode_value("h0.n0", 50).is_none());
        assert!(link.handle_preamble(RESUME_LINE));
        assert!(link.encode_value("h0.n0", 50).is_some());
    }

    #[test]
    fn ordinary_lines_are_not_preambles() {
        let mut link = HmiLink::new();
        assert!(!link.handle_preamble("0:en:1"));
    }
}
