#![cfg_attr(not(test), no_std)]
#![no_main]

use defmt_rtt as _;
use panic_probe as _;

pub mod eeprom;
pub mod serial;

#[path = "../boards/mod.rs"]
pub mod boards;

/// Half-cycles between sample windows, and the number of channels the
/// reference board wires up.
const ZERO_CROSS_N: u16 = iron_core::constants::DEFAULT_ZERO_CROSS_N;
const AMP_RECOVERY_US: u32 = iron_core::constants::DEFAULT_AMP_RECOVERY_US;
const HEARTBEAT_PULSE_US: u32 = iron_core::constants::DEFAULT_HEARTBEAT_PULSE_US;
const ADC_FULL_SCALE: u16 = 4095;

#[rtic::app(device = stm32f4xx_hal::pac, dispatchers = [EXTI0, EXTI1])]
mod app {
    use super::*;
    use core::fmt::Write as _;
    use crate::boards::{BoardPins, CHANNEL_COUNT};
    use crate::eeprom::I2cEeprom;
    use crate::serial::SerialPump;
    use iron_core::{Channel, ChannelIdentity, HeartbeatMonitor, NullHmiSink, Station, ZeroCrossScheduler};
    use iron_proto::{dispatch, parse_request, render_response, HmiLink, ReplyBuf, ResponseBuf};
    use rtic_monotonics::systick::prelude::*;
    use stm32f4xx_hal::gpio::{ErasedPin, Input, Output, PushPull};
    use stm32f4xx_hal::i2c::I2c;
    use stm32f4xx_hal::prelude::*;

    systick_monotonic!(Systick, 1_000);

    type HeaterPin = ErasedPin<Output<PushPull>>;
    type StationN = Station<{ CHANNEL_COUNT }, HeaterPin>;

    #[shared]
    struct Shared {
        station: StationN,
        scheduler: ZeroCrossScheduler,
        heartbeat: HeartbeatMonitor,
        hmi_link: HmiLink,
    }

    #[local]
    struct Local {
        heartbeat_pin: HeaterPin,
        stand_sense: [ErasedPin<Input>; CHANNEL_COUNT],
        eeprom: I2cEeprom<I2c<stm32f4xx_hal::pac::I2C1>, fn(u32)>,
        usb_pump: SerialPump,
        hmi_pump: SerialPump,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        let dp = cx.device;
        let mut rcc = dp.RCC.constrain();

        let pins = BoardPins::new(&dp, &mut rcc);

        let clocks = rcc.cfgr().use_hse(8.MHz()).sysclk(168.MHz()).freeze();

        Systick::start(cx.core.SYST, clocks.hclk().0);

        let i2c = I2c::new(dp.I2C1, (pins.eeprom_scl, pins.eeprom_sda), 100.kHz(), &clocks);
        let eeprom = I2cEeprom::new(i2c, (|_us: u32| {}) as fn(u32));

        let stand_sense = pins.stand_sense;
        let [h0, h1, h2, h3] = pins.heater;
        let identity = |i: usize, base_pin_id: u8| ChannelIdentity {
            analog_input_id: base_pin_id,
            stand_sense_id: base_pin_id,
            gain: 200.0,
            eeprom_base: (i as u16) * iron_core::RECORD_SIZE_BYTES,
        };
        let mut station = Station::new([
            Channel::new(identity(0, 0), h0),
            Channel::new(identity(1, 1), h1),
            Channel::new(identity(2, 2), h2),
            Channel::new(identity(3, 3), h3),
        ]);
        for ch in station.iter_mut() {
            ch.init();
        }

        defmt::info!("iron-firmware init complete");

        (
            Shared {
                station,
                scheduler: ZeroCrossScheduler::new(ZERO_CROSS_N),
                heartbeat: HeartbeatMonitor::new(HEARTBEAT_PULSE_US),
                hmi_link: HmiLink::new(),
            },
            Local {
                heartbeat_pin: pins.heartbeat,
                stand_sense,
                eeprom,
                usb_pump: SerialPump::usb(),
                hmi_pump: SerialPump::hmi(),
            },
        )
    }

    /// Zero-cross detection interrupt. The only thing allowed to run at
    /// this priority: dispatch the scheduler's tick and mark the
    /// heartbeat. No float formatting, no I2C, no allocation.
    #[task(binds = EXTI9_5, shared = [station, scheduler, heartbeat], priority = 2)]
    fn zero_cross_isr(mut cx: zero_cross_isr::Context) {
        let now_us = Systick::now().duration_since_epoch().to_micros() as u32;
        cx.shared.scheduler.lock(|sched| {
            cx.shared.station.lock(|station| {
                sched.tick(now_us, station);
            });
        });
        cx.shared.heartbeat.lock(|hb| hb.mark_tick());
    }

    #[idle(shared = [station, heartbeat, hmi_link], local = [heartbeat_pin, stand_sense, eeprom, usb_pump, hmi_pump])]
    fn idle(mut cx: idle::Context) -> ! {
        loop {
            let now_us = Systick::now().duration_since_epoch().to_micros() as u32;
            let now_ms = now_us / 1000;

            cx.shared.station.lock(|station| {
                for (i, ch) in station.iter_mut().enumerate() {
                    if ch.sample_due(now_us, AMP_RECOVERY_US) {
                        let adc_raw = crate::ADC_FULL_SCALE / 2; // replaced by a real ADC read per channel
                        ch.accept_sample(now_us, adc_raw, crate::ADC_FULL_SCALE);
                    }
                    ch.run_pid_if_pending();
                    // Pulled up; the stand switch pulls the pin low when the
                    // iron is resting, the opposite sense of update_sleep's
                    // "true means resting" parameter.
                    let resting = cx.local.stand_sense[i].is_low();
                    ch.update_sleep(resting, now_ms);
                    let mut sink = NullHmiSink;
                    ch.push_hmi_if_due(now_ms, &mut sink);
                }
            });

            cx.shared
                .heartbeat
                .lock(|hb| hb.poll(now_us, cx.local.heartbeat_pin));

            for pump in [&mut *cx.local.usb_pump, &mut *cx.local.hmi_pump] {
                while let Some(line) = pump.next_line(now_ms) {
                    if cx.shared.hmi_link.lock(|link| link.handle_preamble(&line)) {
                        continue;
                    }
                    let mut response = ResponseBuf::new();
                    let req = match parse_request(&line) {
                        Ok(req) => req,
                        Err(e) => {
                            let mut buf = ReplyBuf::new();
                            let _ = write!(buf, "{}", e);
                            render_response(false, &buf, &mut response);
                            let _ = response;
                            continue;
                        }
                    };
                    cx.shared.station.lock(|station| {
                        let mut buf = ReplyBuf::new();
                        let ok = match station.channel_mut(req.channel_id as usize) {
                            Ok(channel) => dispatch(&req, channel, &mut buf).is_ok(),
                            Err(_) => {
                                buf.clear();
                                let _ = buf.push_str("Invalid device ID");
                                false
                            }
                        };
                        render_response(ok, &buf, &mut response);
                    });
                    // Transmitting `response` back over the pump's originating
                    // UART is left to board bring-up, which picks the TX
                    // peripheral and baud rate for this hardware revision.
                    let _ = response;
                }
            }
        }
    }
}
