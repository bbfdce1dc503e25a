//! Timing and electrical constants shared across the control core.
//!
//! These are the §8 defaults from the station specification. Firmware
//! integrations may override the ones that are passed as arguments
//! (`n`, `amp_recovery_us`, ...); the ones baked in here (ADC reference,
//! back-calculation gain) are treated as fixed properties of the analog
//! front end and the PID contract, not per-deployment configuration.

/// ADC reference voltage, in volts.
pub const ADC_VREF_VOLTS: f32 = 3.3;

/// Default number of half-cycles between sample windows.
pub const DEFAULT_ZERO_CROSS_N: u16 = 10;

/// Amplifier recovery time after the heater is de-energized, in microseconds.
pub const DEFAULT_AMP_RECOVERY_US: u32 = 1700;

/// Heartbeat pulse width, in microseconds.
pub const DEFAULT_HEARTBEAT_PULSE_US: u32 = 5_000;

/// Minimum spacing between HMI pushes for a single channel, in milliseconds.
pub const DEFAULT_HMI_UPDATE_INTERVAL_MS: u32 = 200;

/// PID back-calculation anti-windup gain (`Kb` in spec terms).
pub const PID_BACK_CALC_GAIN: f32 = 1.0;

/// Oversampling guard: PID steps with a smaller `dt` are skipped.
pub const PID_MIN_DT_S: f32 = 0.001;

/// Channel output is always normalized to this range.
pub const OUTPUT_MIN: f32 = 0.0;
pub const OUTPUT_MAX: f32 = 1.0;
