#![cfg_attr(not(feature = "std"), no_std)]

//! # iron-core
//!
//! The closed-loop control engine for a multi-channel thermocouple
//! soldering station. This crate owns no hardware registers — every
//! collaborator it needs (a heater GPIO, an EEPROM byte store, a display
//! sink) is expressed as a trait, so the same `Channel`/`Station`/
//! `ZeroCrossScheduler` types run unmodified on the firmware target and
//! in host-side simulation and tests.
//!
//! ## Concurrency model
//!
//! `ZeroCrossScheduler::tick` is meant to be called directly from an
//! interrupt context on every AC half-cycle; it only ever writes a
//! handful of scalars and drives heater GPIOs. Everything else —
//! [`Channel::accept_sample`], [`Channel::run_pid_if_pending`],
//! [`Channel::update_sleep`], [`Channel::push_hmi_if_due`] — runs from a
//! single cooperative loop. There is no async executor and no RTOS
//! scheduler underneath any of this.

pub mod calibration;
pub mod channel;
pub mod constants;
pub mod error;
pub mod heartbeat;
pub mod hmi;
pub mod persistence;
pub mod pid;
pub mod runaway;
pub mod scheduler;

pub use calibration::CalibrationTable;
pub use channel::{Channel, ChannelIdentity};
pub use error::CoreError;
pub use heartbeat::HeartbeatMonitor;
pub use hmi::{HmiField, HmiSink, NullHmiSink};
pub use persistence::{save, load, ByteStorage, RECORD_SIZE_BYTES};
pub use pid::PidEngine;
pub use runaway::RunawayReason;
pub use scheduler::{Station, ZeroCrossScheduler};
