#![cfg_attr(not(feature = "std"), no_std)]

//! # iron-proto
//!
//! The line-oriented command surface shared by the iron-station's two
//! physical links: USB (`\n`-terminated ASCII) and the HMI display
//! (triple-`0xFF`-terminated). Both links speak the same `id:command:arg`
//! grammar; only the framing differs, which is why framing and grammar
//! are split into separate modules.
//!
//! - [`framing`]: finds the next complete line in a byte stream.
//! - [`command`]: parses a line into a `Request` and dispatches it
//!   against an `iron_core::Channel`.
//! - [`hmi`]: encodes outbound `<field>.txt=`/`.val=`/`.pco=` updates and
//!   tracks the HMI link's pause/resume state.

pub mod command;
pub mod framing;
pub mod hmi;

pub use command::{dispatch, parse_request, render_response, ProtoError, ReplyBuf, Request, ResponseBuf};
pub use framing::{LineFramer, Terminator};
pub use hmi::{EncodedLine, HmiLink, PAUSE_LINE, RESUME_LINE};
