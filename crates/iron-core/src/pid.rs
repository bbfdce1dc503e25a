//! Filtered-derivative PID with back-calculation anti-windup.
//!
//! `update` implements the per-channel control law in full: normalized
//! error, a single-pole low-pass on the derivative term, and integral
//! clamping driven by how far the unconstrained output sits from the
//! last saturated output (back-calculation, gain `Kb`).

use crate::constants::{OUTPUT_MAX, OUTPUT_MIN, PID_BACK_CALC_GAIN, PID_MIN_DT_S};

#[derive(Debug, Clone, Copy, Default)]
pub struct PidEngine {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub derivative_tau: f32,
    integral: f32,
    derivative_prev: f32,
    pub output: f32,
}

impl PidEngine {
    pub fn new(kp: f32, ki: f32, kd: f32, derivative_tau: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            derivative_tau,
            ..Default::default()
        }
    }

    /// Resets integral and output to zero and seeds the derivative filter
    /// with the current (unfiltered) process value, so the first
    /// derivative term after a reset reads as zero rather than a spike.
    pub fn reset(&mut self, seed_pv: f32) {
        self.integral = 0.0;
        self.derivative_prev = seed_pv;
        self.output = 0.0;
    }

    /// Runs one control step. `span` normalizes `setpoint`/`pv` into a
    /// dimensionless error so the gains are independent of the channel's
    /// amplifier scale; `dt_s` is the wall-clock time since the previous
    /// process-value sample.
    ///
    /// Returns `None` (an oversampling guard) without touching any
    /// internal state when `dt_s` is too small to safely drive a
    /// derivative or integral term.
    pub fn update(&mut self, setpoint: f32, pv: f32, span: f32, dt_s: f32) -> Option<f32> {
        if dt_s < PID_MIN_DT_S {
            return None;
        }
        let span = if span.abs() < f32::EPSILON { 1.0 } else { span };
        let error = setpoint / span - pv / span;

        let p_term = self.kp * error;

        let d_term = if self.kd > 0.0 {
            let slope = if self.derivative_tau > 0.0 {
                let alpha = dt_s / (self.derivative_tau + dt_s);
                let filtered = alpha * error + (1.0 - alpha) * self.derivative_prev;
                let slope = (filtered - self.derivative_prev) / dt_s;
                self.derivative_prev = filtered;
                slope
            } else {
                let slope = (error - self.derivative_prev) / dt_s;
                self.derivative_prev = error;
                slope
            };
            self.kd * slope
        } else {
            0.0
        };

        let i_term = if self.ki > 0.0 {
            let unconstrained = p_term + self.ki * self.integral + d_term;
            let anti_windup = self.output - unconstrained;
            self.integral += (error + PID_BACK_CALC_GAIN * anti_windup) * dt_s;
            self.integral = self
                .integral
                .clamp(OUTPUT_MIN / self.ki, OUTPUT_MAX / self.ki);
            self.ki * self.integral
        } else {
            0.0
        };

        self.output = (p_term + i_term + d_term).clamp(OUTPUT_MIN, OUTPUT_MAX);
        Some(self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn proportional_only_tracks_error() {
        let mut pid = PidEngine::new(0.5, 0.0, 0.0, 0.0);
        let out = pid.update(1.0, 0.0, 1.0, 0.1).unwrap();
        assert!(approx_eq!(f32, out, 0.5, epsilon = 1e-6));
    }

    #[test]
    fn output_clamps_to_unit_interval() {
        let mut pid = PidEngine::new(10.0, 0.0, 0.0, 0.0);
        let out = pid.update(1.0, 0.0, 1.0, 0.1).unwrap();
        assert!(approx_eq!(f32, out, 1.0, epsilon = 1e-6));
    }

    #[test]
    fn sub_millisecond_dt_is_a_no_op() {
        let mut pid = PidEngine::new(1.0, 1.0, 1.0, 0.5);
        pid.update(1.0, 0.0, 1.0, 0.1).unwrap();
        let output_before = pid.output;
        let result = pid.update(1.0, 0.0, 1.0, 0.0005);
        assert!(result.is_none());
        assert!(approx_eq!(f32, pid.output, output_before, epsilon = 1e-6));
    }

    #[test]
    fn integral_accumulates_over_time() {
        let mut pid = PidEngine::new(0.0, 1.0, 0.0, 0.0);
        let first = pid.update(1.0, 0.5, 1.0, 0.1).unwrap();
        let second = pid.update(1.0, 0.5, 1.0, 0.1).unwrap();
        assert!(second > first);
    }

    #[test]
    fn reset_seeds_derivative_with_unfiltered_pv() {
        let mut pid = PidEngine::new(0.0, 0.0, 2.0, 0.0);
        pid.reset(0.3);
        let out = pid.update(0.3, 0.3, 1.0, 0.1).unwrap();
        assert!(approx_eq!(f32, out, 0.0, epsilon = 1e-6));
        assert!(approx_eq!(f32, pid.output, 0.0, epsilon = 1e-6));
    }

    #[test]
    fn zero_ki_does_not_accumulate_integral() {
        let mut pid = PidEngine::new(0.2, 0.0, 0.0, 0.0);
        pid.update(1.0, 0.0, 1.0, 0.1).unwrap();
        let out = pid.update(1.0, 0.0, 1.0, 0.1).unwrap();
        assert!(approx_eq!(f32, out, 0.2, epsilon = 1e-6));
    }
}
