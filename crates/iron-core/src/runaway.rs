//! Runaway interlock: a same-sample check, not a rate-of-change monitor.
//!
//! Unlike a thermal-runaway watchdog that tracks heat gain over a window,
//! this check only ever looks at the sample just taken: either the
//! computed temperature is past the channel's threshold, or the ADC
//! reading pinned at full scale (a disconnected or shorted sensor reads
//! as a rail value, not as a plausible temperature).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunawayReason {
    OverTemperature,
    SensorSaturated,
}

/// Returns the reason a channel should latch disabled, or `None` if the
/// sample is within bounds.
pub fn check(
    temp_pv: f32,
    runaway_threshold: f32,
    adc_raw: u16,
    adc_full_scale: u16,
) -> Option<RunawayReason> {
    if temp_pv > runaway_threshold {
        Some(RunawayReason::OverTemperature)
    } else if adc_raw >= adc_full_scale {
        Some(RunawayReason::SensorSaturated)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_when_within_bounds() {
        assert_eq!(check(200.0, 450.0, 2048, 4095), None);
    }

    #[test]
    fn trips_on_over_temperature() {
        assert_eq!(
            check(500.0, 450.0, 2048, 4095),
            Some(RunawayReason::OverTemperature)
        );
    }

    #[test]
    fn trips_on_sensor_saturation() {
        assert_eq!(
            check(10.0, 450.0, 4095, 4095),
            Some(RunawayReason::SensorSaturated)
        );
    }

    #[test]
    fn over_temperature_takes_priority_when_both_trip() {
        assert_eq!(
            check(500.0, 450.0, 4095, 4095),
            Some(RunawayReason::OverTemperature)
        );
    }
}
