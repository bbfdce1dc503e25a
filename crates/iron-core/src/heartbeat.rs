//! Liveness pulse driven from the zero-cross ISR and serviced from the
//! cooperative loop.
//!
//! The ISR only ever sets a flag (`mark_tick`); all GPIO timing math and
//! the actual pin writes happen in `poll`, called from the idle loop.
//! This keeps the ISR side to the single scalar write the concurrency
//! model allows it.

use embedded_hal::digital::OutputPin;

pub struct HeartbeatMonitor {
    pulse_width_us: u32,
    flag: bool,
    pulse_start_us: Option<u32>,
}

impl HeartbeatMonitor {
    pub fn new(pulse_width_us: u32) -> Self {
        Self {
            pulse_width_us,
            flag: false,
            pulse_start_us: None,
        }
    }

    /// Called from the zero-cross ISR on every tick.
    pub fn mark_tick(&mut self) {
        self.flag = true;
    }

    /// Called from the cooperative loop. Drives `pin` high the moment a
    /// tick has been observed, then low again once the pulse width has
    /// elapsed.
    pub fn poll<P: OutputPin>(&mut self, now_us: u32, pin: &mut P) {
        if self.flag {
            self.flag = false;
            let _ = pin.set_high();
            self.pulse_start_us = Some(now_us);
            return;
        }
        if let Some(start) = self.pulse_start_us {
            if now_us.wrapping_sub(start) >= self.pulse_width_us {
                let _ = pin.set_low();
                self.pulse_start_us = None;
            }
        }
    }
}
