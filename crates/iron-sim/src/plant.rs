//! Lumped thermal model of a heated tip: heating proportional to PID
//! output, Newton's-law cooling toward ambient, and a round trip back
//! through the channel's own calibration table so the plant can hand
//! the channel a raw ADC code the way a real thermocouple amplifier
//! would.

use iron_core::CalibrationTable;

pub struct ThermalPlant {
    pub temperature_c: f32,
    ambient_c: f32,
    heat_coefficient: f32,
    cooling_coefficient: f32,
}

impl ThermalPlant {
    pub fn new(ambient_c: f32, heat_coefficient: f32, cooling_coefficient: f32) -> Self {
        Self {
            temperature_c: ambient_c,
            ambient_c,
            heat_coefficient,
            cooling_coefficient,
        }
    }

    pub fn step(&mut self, heater_output: f32, dt_s: f32) {
        let heating = heater_output * self.heat_coefficient * dt_s;
        let cooling = (self.temperature_c - self.ambient_c) * self.cooling_coefficient * dt_s;
        self.temperature_c += heating - cooling;
    }

    /// Converts the plant's current temperature into a raw ADC code, as
    /// if a thermocouple amplifier with the given gain were reading it.
    pub fn adc_code(
        &self,
        calibration: &CalibrationTable,
        gain: f32,
        adc_vref: f32,
        adc_full_scale: u16,
    ) -> u16 {
        let tcv_uv = calibration.temp_to_tcv(self.temperature_c);
        let adc_volts = tcv_uv * gain / 1.0e6;
        let code = (adc_volts / adc_vref) * adc_full_scale as f32;
        code.clamp(0.0, adc_full_scale as f32) as u16
    }
}
