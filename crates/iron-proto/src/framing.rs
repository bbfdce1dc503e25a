//! Byte-stream line framer.
//!
//! The station speaks two physical links out of the same command
//! grammar: USB, where lines are `\n`-terminated, and the HMI, where
//! lines are terminated by three consecutive `0xFF` bytes (the Nextion
//! convention). `LineFramer` only finds the next frame boundary and
//! reports how many bytes to consume — it never allocates and never
//! blocks, so it can sit directly in a serial ISR's receive buffer or a
//! host-side test harness.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    Newline,
    TripleFf,
}

#[derive(Debug, Clone, Copy)]
pub struct LineFramer {
    terminator: Terminator,
}

impl LineFramer {
    pub fn new(terminator: Terminator) -> Self {
        Self { terminator }
    }

    /// Looks for the next complete frame at the start of `input`.
    ///
    /// Returns `Some((line, consumed))` where `line` excludes the
    /// terminator and `consumed` is the total number of bytes (line plus
    /// terminator) the caller should drop from its buffer. Returns
    /// `None` when the buffer doesn't yet contain a full frame.
    pub fn parse<'a>(&self, input: &'a [u8]) -> Option<(&'a [u8], usize)> {
        match self.terminator {
            Terminator::Newline => input
                .iter()
                .position(|&b| b == b'\n')
                .map(|pos| (trim_cr(&input[..pos]), pos + 1)),
            Terminator::TripleFf => {
                if input.len() < 3 {
                    return None;
                }
                (0..=input.len() - 3)
                    .find(|&i| input[i] == 0xFF && input[i + 1] == 0xFF && input[i + 2] == 0xFF)
                    .map(|i| (&input[..i], i + 3))
            }
        }
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    match line.split_last() {
        Some((&b'\r', rest)) => rest,
        _ => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_newline_frame() {
        let framer = LineFramer::new(Terminator::Newline);
        let (line, consumed) = framer.parse(b"0:en:1\nrest").unwrap();
        assert_eq!(line, b"0:en:1");
        assert_eq!(consumed, 7);
    }

    #[test]
    fn strips_trailing_cr() {
        let framer = LineFramer::new(Terminator::Newline);
        let (line, _) = framer.parse(b"0:en:1\r\n").unwrap();
        assert_eq!(line, b"0:en:1");
    }

    #[test]
    fn incomplete_newline_frame_returns_none() {
        let framer = LineFramer::new(Terminator::Newline);
        assert_eq!(framer.parse(b"0:en:1"), None);
    }

    #[test]
    fn finds_triple_ff_frame() {
        let framer = LineFramer::new(Terminator::TripleFf);
        let input = [b'h', b'0', 0xFF, 0xFF, 0xFF, b'x'];
        let (line, consumed) = framer.parse(&input).unwrap();
        assert_eq!(line, b"h0");
        assert_eq!(consumed, 5);
    }

    #[test]
    fn incomplete_triple_ff_frame_returns_none() {
        let framer = LineFramer::new(Terminator::TripleFf);
        let input = [b'h', b'0', 0xFF, 0xFF];
        assert_eq!(framer.parse(&input), None);
    }
}
