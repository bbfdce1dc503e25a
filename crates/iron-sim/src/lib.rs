//! Host-side simulation harness for the iron-station control core.
//!
//! Drives a real `iron_core::Channel` and `ZeroCrossScheduler` against a
//! [`plant::ThermalPlant`] instead of hardware, using
//! `embedded_hal_mock`'s digital pin as the channel's heater output so
//! the exact same `Channel` type the firmware uses runs here unmodified.

pub mod fake_storage;
pub mod plant;

pub use fake_storage::FakeEeprom;
pub use plant::ThermalPlant;

use embedded_hal_mock::eh1::pin::Mock as MockPin;
use iron_core::{Channel, ChannelIdentity};

pub type SimChannel = Channel<MockPin>;

pub fn new_sim_channel(gain: f32) -> SimChannel {
    let identity = ChannelIdentity {
        analog_input_id: 0,
        stand_sense_id: 0,
        gain,
        eeprom_base: 0,
    };
    let mut channel = Channel::new(identity, MockPin::new(&[]));
    channel.init();
    channel
}

/// Runs `channel` against `plant` for `steps` iterations of `dt_s`
/// seconds each, with the channel enabled and driving toward
/// `setpoint_c`. Returns the temperature trace.
pub fn run_closed_loop(
    channel: &mut SimChannel,
    plant: &mut ThermalPlant,
    setpoint_c: f32,
    steps: usize,
    dt_s: f32,
) -> Vec<f32> {
    let mut trace = Vec::with_capacity(steps);
    channel.temp_sp = setpoint_c;
    channel.tc_voltage_sp = channel.calibration.temp_to_tcv(setpoint_c);
    channel.enable = true;

    let mut now_us: u32 = 0;
    let dt_us = (dt_s * 1.0e6) as u32;
    for _ in 0..steps {
        now_us += dt_us;
        channel.schedule_sample(now_us);
        let adc_code = plant.adc_code(&channel.calibration, channel.identity.gain, 3.3, 4095);
        channel.accept_sample(now_us, adc_code, 4095);
        channel.run_pid_if_pending();
        plant.step(channel.pid.output, dt_s);
        trace.push(plant.temperature_c);
    }
    trace
}
