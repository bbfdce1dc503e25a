//! A single control channel: one thermocouple input, one heater drive,
//! one stand-sense input, one PID loop.
//!
//! The two methods an interrupt context is allowed to call —
//! `schedule_sample` and `update_output` — only ever touch a handful of
//! scalars and the heater pin itself. Everything else (sample
//! acquisition, the PID step, the sleep state machine, HMI cadence) runs
//! from the cooperative loop.

use embedded_hal::digital::OutputPin;
use heapless::String;

use crate::calibration::CalibrationTable;
use crate::constants::ADC_VREF_VOLTS;
use crate::hmi::{HmiField, HmiSink};
use crate::pid::PidEngine;
use crate::runaway;

const HMI_UPDATE_INTERVAL_MS: u32 = crate::constants::DEFAULT_HMI_UPDATE_INTERVAL_MS;
const HMI_COLOR_ENABLED: u32 = 0x07E0;
const HMI_COLOR_DISABLED: u32 = 0xF800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SleepPhase {
    Awake,
    StandPending,
    Sleep,
}

/// The wiring identity of a channel: which ADC input and stand-sense
/// input it reads, its amplifier gain, and where its persisted record
/// lives in EEPROM.
#[derive(Debug, Clone, Copy)]
pub struct ChannelIdentity {
    pub analog_input_id: u8,
    pub stand_sense_id: u8,
    /// Amplifier gain in V/V, used to convert ADC volts to thermocouple
    /// microvolts.
    pub gain: f32,
    pub eeprom_base: u16,
}

pub struct Channel<P: OutputPin> {
    pub identity: ChannelIdentity,
    heater_pin: P,

    pub temp_sp: f32,
    pub temp_sp_min: f32,
    pub temp_sp_max: f32,
    pub temp_runaway_threshold: f32,
    pub tc_voltage_sp: f32,
    pub sleep_voltage_sp: f32,

    pub tc_voltage_pv: f32,
    pub temp_pv: f32,
    pv_timestamp_us: u32,
    pv_prev_timestamp_us: u32,

    pub pid: PidEngine,

    sample_scheduled: bool,
    sample_schedule_timestamp_us: u32,
    pid_update_pending: bool,
    /// Set whenever the PID state is reset; cleared by the next
    /// `run_pid_if_pending` call, which skips `pid.update` that one time
    /// so the very first post-reset step never computes `dt` from a
    /// bogus zero-origin timestamp.
    pid_skip_next: bool,

    pub enable: bool,
    sleep_fsm: SleepPhase,
    sleep_delay_start_ms: u32,
    pub sleep_delay_ms: f32,

    hmi_last_update_ms: u32,

    pub calibration: CalibrationTable,

    /// The thermocouple voltage that corresponds to a full-scale ADC
    /// reading, derived once from `identity.gain`.
    pub tc_max_voltage_setpoint: f32,
}

impl<P: OutputPin> Channel<P> {
    pub fn new(identity: ChannelIdentity, heater_pin: P) -> Self {
        let tc_max_voltage_setpoint = ADC_VREF_VOLTS * 1.0e6 / identity.gain;
        Self {
            identity,
            heater_pin,
            temp_sp: 0.0,
            temp_sp_min: 0.0,
            temp_sp_max: 450.0,
            temp_runaway_threshold: 450.0,
            tc_voltage_sp: 0.0,
            sleep_voltage_sp: 0.0,
            tc_voltage_pv: 0.0,
            temp_pv: 0.0,
            pv_timestamp_us: 0,
            pv_prev_timestamp_us: 0,
            pid: PidEngine::default(),
            sample_scheduled: true,
            sample_schedule_timestamp_us: 0,
            pid_update_pending: false,
            pid_skip_next: true,
            enable: false,
            sleep_fsm: SleepPhase::Awake,
            sleep_delay_start_ms: 0,
            sleep_delay_ms: 30_000.0,
            hmi_last_update_ms: 0,
            calibration: CalibrationTable::default(),
            tc_max_voltage_setpoint,
        }
    }

    /// Resets lifecycle state. Does not touch persisted configuration —
    /// callers load that separately via `persistence::load`.
    pub fn init(&mut self) {
        self.enable = false;
        let _ = self.heater_pin.set_low();
        self.sleep_fsm = SleepPhase::Awake;
        self.sample_scheduled = true;
        self.reset_pid();
    }

    fn reset_pid(&mut self) {
        self.pid.reset(self.tc_voltage_pv);
        self.pv_timestamp_us = 0;
        self.pv_prev_timestamp_us = 0;
        self.pid_update_pending = false;
        self.pid_skip_next = true;
    }

    /// Any write to the enable flag — true or false — resets the PID
    /// state, per the station's command contract.
    pub fn set_enable(&mut self, enable: bool) {
        self.enable = enable;
        if !enable {
            let _ = self.heater_pin.set_low();
            self.sleep_fsm = SleepPhase::Awake;
        }
        self.reset_pid();
    }

    pub fn is_sleeping(&self) -> bool {
        matches!(self.sleep_fsm, SleepPhase::Sleep)
    }

    // --- ISR-context entry points -----------------------------------

    /// Called from the zero-cross ISR when the sample window opens:
    /// drives the heater low and marks a sample as due once the
    /// amplifier has recovered.
    pub fn schedule_sample(&mut self, now_us: u32) {
        let _ = self.heater_pin.set_low();
        self.sample_scheduled = true;
        self.sample_schedule_timestamp_us = now_us;
    }

    /// Called from the zero-cross ISR on every half-cycle that isn't a
    /// sample window: drives the heater high iff the channel is enabled,
    /// not mid-sample-window, and this half-cycle's duty slot is below
    /// the PID's commanded output.
    pub fn update_output(&mut self, op_level: f32) {
        let drive_high = self.enable && !self.sample_scheduled && op_level < self.pid.output;
        if drive_high {
            let _ = self.heater_pin.set_high();
        } else {
            let _ = self.heater_pin.set_low();
        }
    }

    // --- Cooperative-loop entry points -------------------------------

    /// True once the amplifier has had time to recover from the heater
    /// being switched and a fresh ADC reading can be trusted.
    pub fn sample_due(&self, now_us: u32, amp_recovery_us: u32) -> bool {
        self.sample_scheduled
            && now_us.wrapping_sub(self.sample_schedule_timestamp_us) > amp_recovery_us
    }

    /// Converts a raw ADC reading into a process value, runs the runaway
    /// interlock, and (unless it just tripped) clears `sample_scheduled`
    /// — except on the very first acquisition after a reset, which is
    /// deliberately retaken so the next PID step sees a non-zero `dt`.
    pub fn accept_sample(&mut self, now_us: u32, adc_raw: u16, adc_full_scale: u16) {
        let is_first_after_reset = self.pid_skip_next;

        let adc_volts = (adc_raw as f32 / adc_full_scale as f32) * ADC_VREF_VOLTS;
        self.tc_voltage_pv = adc_volts / self.identity.gain * 1.0e6;
        self.temp_pv = self.calibration.tcv_to_temp(self.tc_voltage_pv);
        self.pv_prev_timestamp_us = self.pv_timestamp_us;
        self.pv_timestamp_us = now_us;
        self.pid_update_pending = true;

        if runaway::check(
            self.temp_pv,
            self.temp_runaway_threshold,
            adc_raw,
            adc_full_scale,
        )
        .is_some()
        {
            self.set_enable(false);
            self.sample_scheduled = true;
            return;
        }

        self.sample_scheduled = is_first_after_reset;
    }

    /// Runs one PID step if a fresh sample is waiting and the channel is
    /// enabled. Always clears the pending flag, including on the
    /// oversampling-guard path where the PID itself declines to step.
    /// The first call after a reset clears `pid_skip_next` instead of
    /// stepping the PID, since `dt` for that sample has no valid prior
    /// timestamp to measure from.
    pub fn run_pid_if_pending(&mut self) {
        if !self.pid_update_pending {
            return;
        }
        self.pid_update_pending = false;
        if self.pid_skip_next {
            self.pid_skip_next = false;
            return;
        }
        if !self.enable {
            return;
        }
        let dt_us = self.pv_timestamp_us.wrapping_sub(self.pv_prev_timestamp_us);
        let dt_s = dt_us as f32 * 1.0e-6;
        let setpoint = if self.is_sleeping() {
            self.sleep_voltage_sp
        } else {
            self.tc_voltage_sp
        };
        self.pid.update(
            setpoint,
            self.tc_voltage_pv,
            self.tc_max_voltage_setpoint,
            dt_s,
        );
    }

    /// Advances the sleep state machine. `stand_sense_high` is the raw
    /// stand-sense input: true means the iron is in its stand (resting).
    pub fn update_sleep(&mut self, stand_sense_high: bool, now_ms: u32) {
        if !self.enable {
            self.sleep_fsm = SleepPhase::Awake;
            return;
        }
        match self.sleep_fsm {
            SleepPhase::Awake => {
                if stand_sense_high {
                    self.sleep_fsm = SleepPhase::StandPending;
                    self.sleep_delay_start_ms = now_ms;
                }
            }
            SleepPhase::StandPending => {
                if !stand_sense_high {
                    self.sleep_fsm = SleepPhase::Awake;
                } else if now_ms.wrapping_sub(self.sleep_delay_start_ms) as f32
                    >= self.sleep_delay_ms
                {
                    self.sleep_fsm = SleepPhase::Sleep;
                }
            }
            SleepPhase::Sleep => {
                if !stand_sense_high {
                    self.sleep_fsm = SleepPhase::Awake;
                }
            }
        }
    }

    /// Pushes the channel's display fields if at least
    /// `HMI_UPDATE_INTERVAL_MS` has elapsed since the last push.
    pub fn push_hmi_if_due<H: HmiSink>(&mut self, now_ms: u32, hmi: &mut H) {
        if now_ms.wrapping_sub(self.hmi_last_update_ms) < HMI_UPDATE_INTERVAL_MS {
            return;
        }
        self.hmi_last_update_ms = now_ms;

        let mut buf: String<16> = String::new();
        if write_rounded(&mut buf, self.temp_pv).is_ok() {
            hmi.push_text(HmiField::ProcessValue, &buf);
        }

        buf.clear();
        if write_rounded(&mut buf, self.temp_sp).is_ok() {
            hmi.push_text(HmiField::SetPoint, &buf);
        }

        hmi.push_value(HmiField::OutputPercent, (self.pid.output * 100.0).round() as i32);

        if self.enable {
            hmi.push_text(HmiField::EnableState, "ON");
            hmi.push_color(HmiField::EnableState, HMI_COLOR_ENABLED);
        } else {
            hmi.push_text(HmiField::EnableState, "OFF");
            hmi.push_color(HmiField::EnableState, HMI_COLOR_DISABLED);
        }

        hmi.push_text(
            HmiField::SleepState,
            if self.is_sleeping() { "SLEEP" } else { "AWAKE" },
        );
    }
}

fn write_rounded(buf: &mut String<16>, value: f32) -> core::fmt::Result {
    use core::fmt::Write;
    write!(buf, "{:.0}", value)
}
