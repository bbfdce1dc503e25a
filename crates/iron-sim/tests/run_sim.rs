//! Integration tests driving the real `Channel`/`ZeroCrossScheduler`
//! stack through `iron-sim`'s plant model and fake EEPROM, without any
//! hardware collaborator.

use embedded_hal_mock::eh1::digital::{Mock as MockPin, State, Transaction};
use iron_core::{persistence, Channel, ChannelIdentity, Station, ZeroCrossScheduler};
use iron_proto::{dispatch, parse_request, ReplyBuf};
use iron_sim::{FakeEeprom, ThermalPlant};

fn identity(eeprom_base: u16) -> ChannelIdentity {
    ChannelIdentity {
        analog_input_id: 0,
        stand_sense_id: 0,
        gain: 200.0,
        eeprom_base,
    }
}

#[test]
fn burst_firing_respects_commanded_duty() {
    // At 50% output over N=4 half-cycles, exactly 2 of the 4 slots
    // should drive the heater high.
    let expectations = [
        Transaction::set(State::High),
        Transaction::set(State::High),
        Transaction::set(State::Low),
        Transaction::set(State::Low),
    ];
    let pin = MockPin::new(&expectations);
    let mut channel = Channel::new(identity(0), pin);
    channel.enable = true;
    channel.pid.output = 0.5;

    for k in 0..4u16 {
        channel.update_output(k as f32 / 4.0);
    }
}

#[test]
fn sample_window_opens_after_n_ticks_regardless_of_duty() {
    let mut station: Station<1, MockPin> = Station::new([Channel::new(identity(0), MockPin::new(&[]))]);
    let mut sched = ZeroCrossScheduler::new(2);

    sched.tick(0, &mut station);
    sched.tick(0, &mut station);
    sched.tick(1000, &mut station); // counter has wrapped, opens the sample window
    assert!(station.channel(0).unwrap().sample_due(2000, 0));
}

#[test]
fn pid_with_only_proportional_gain_tracks_setpoint_sign() {
    let mut channel = iron_sim::new_sim_channel(200.0);
    channel.enable = true;
    channel.pid.kp = 0.002;
    channel.pid.ki = 0.0;
    channel.pid.kd = 0.0;
    channel.tc_voltage_sp = 1000.0;

    channel.schedule_sample(1000);
    channel.accept_sample(1000, 0, 4095);
    channel.run_pid_if_pending(); // first sample after reset: skipped, not stepped

    channel.schedule_sample(2000);
    channel.accept_sample(2000, 0, 4095);
    channel.run_pid_if_pending();

    assert!(channel.pid.output > 0.0);
}

#[test]
fn integral_anti_windup_keeps_output_within_bounds() {
    let mut channel = iron_sim::new_sim_channel(200.0);
    channel.enable = true;
    channel.pid.kp = 0.0;
    channel.pid.ki = 5.0;
    channel.tc_voltage_sp = channel.tc_max_voltage_setpoint; // an unreachable setpoint

    let mut now_us = 0u32;
    for _ in 0..50 {
        now_us += 500_000;
        channel.schedule_sample(now_us);
        channel.accept_sample(now_us, 0, 4095);
        channel.run_pid_if_pending();
    }

    assert!(channel.pid.output <= 1.0);
    assert!(channel.pid.output >= 0.0);
}

#[test]
fn sleeping_channel_drives_toward_a_lower_setpoint() {
    let mut channel = iron_sim::new_sim_channel(200.0);
    channel.enable = true;
    channel.pid.kp = 0.01;
    channel.sleep_delay_ms = 10.0;
    channel.tc_voltage_sp = 3000.0;
    channel.sleep_voltage_sp = 300.0;

    channel.update_sleep(true, 0);
    channel.update_sleep(true, 100);
    assert!(channel.is_sleeping());

    channel.schedule_sample(1000);
    channel.accept_sample(1000, 0, 4095);
    channel.run_pid_if_pending(); // first sample after reset: skipped, not stepped

    channel.schedule_sample(2000);
    channel.accept_sample(2000, 0, 4095);
    channel.run_pid_if_pending();

    // Sleeping targets the much lower sleep setpoint, not the awake one.
    let sleeping_output = channel.pid.output;

    channel.enable = true;
    channel.update_sleep(false, 3000); // wake back up
    channel.pid.reset(0.0);
    channel.schedule_sample(4000);
    channel.accept_sample(4000, 0, 4095);
    channel.schedule_sample(5000);
    channel.accept_sample(5000, 0, 4095);
    channel.run_pid_if_pending();

    assert!(channel.pid.output >= sleeping_output);
}

#[test]
fn runaway_latches_and_requires_explicit_re_enable() {
    let expectations = [Transaction::set(State::Low)];
    let pin = MockPin::new(&expectations);
    let mut channel = Channel::new(identity(0), pin);
    channel.enable = true;
    channel.temp_runaway_threshold = 50.0;

    // A full-scale reading both saturates the ADC and reads as a high
    // temperature through the default calibration table.
    channel.accept_sample(1000, 4095, 4095);
    assert!(!channel.enable);

    channel.set_enable(true);
    assert!(channel.enable);
}

#[test]
fn calibration_extrapolates_past_either_end_without_panicking() {
    let mut plant = ThermalPlant::new(25.0, 2.5, 0.1);
    plant.temperature_c = 900.0; // past the factory table's last point
    let channel = iron_sim::new_sim_channel(200.0);
    let code = plant.adc_code(&channel.calibration, channel.identity.gain, 3.3, 4095);
    assert_eq!(code, 4095); // clamped at the ADC rail, not NaN or a panic
}

#[test]
fn malformed_command_line_is_rejected_without_mutating_channel() {
    let mut channel = iron_sim::new_sim_channel(200.0);
    let before = channel.enable;
    let req = parse_request("not-a-valid-line");
    assert!(req.is_err());
    assert_eq!(channel.enable, before);
}

#[test]
fn persisted_configuration_round_trips_through_fake_eeprom() {
    let mut storage = FakeEeprom::new();
    let mut src = iron_sim::new_sim_channel(200.0);
    src.pid.kp = 1.25;
    src.temp_sp_max = 430.0;
    assert!(persistence::save(&src, &mut storage));

    let mut dst = iron_sim::new_sim_channel(200.0);
    assert!(persistence::load(&mut dst, &mut storage));
    assert_eq!(dst.pid.kp, 1.25);
    assert_eq!(dst.temp_sp_max, 430.0);
}

#[test]
fn dispatch_rejects_setpoint_above_channel_ceiling() {
    let mut channel = iron_sim::new_sim_channel(200.0);
    channel.temp_sp_max = 450.0;
    let req = parse_request("0:set_t:500").unwrap();
    let mut buf = ReplyBuf::new();
    assert!(dispatch(&req, &mut channel, &mut buf).is_err());
}
