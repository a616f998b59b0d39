// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

//! Tare and scale factor derivation
//!
//! Calibration is a human in the loop procedure: the operator empties the scale, then places a
//! known reference mass when prompted. Prompts go out on the log.

use crate::config::SamplingConfig;
use crate::hmi::status::format_decimal;
use crate::weight::interface::StrainGaugeInterface;
use crate::weight::weight::{resolve, WeightError};
use embedded_hal::delay::DelayNs;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Every reading failed, nothing to average.
    NoValidSamples,
    InvalidReferenceMass,
    /// Loaded and unloaded readings were identical.
    ZeroScale,
}

/// Offset and counts-per-gram pair. Only constructible with a usable scale.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationRecord {
    offset: i32,
    scale: f32,
}

impl CalibrationRecord {
    pub fn new(offset: i32, scale: f32) -> Result<Self, WeightError> {
        if scale == 0.0 || !scale.is_finite() {
            return Err(WeightError::Uncalibrated);
        }
        Ok(Self { offset, scale })
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Grams for a raw reading.
    pub fn resolve(&self, raw: i32) -> f32 {
        resolve(raw, self.offset, self.scale).unwrap_or(0.0)
    }
}

/// Truncated mean of the readings that succeeded, with `interval_ms` between reads.
fn average_valid_readings<SG, D>(
    gauge: &mut SG,
    delay: &mut D,
    samples: usize,
    interval_ms: u32,
) -> Result<i32, CalibrationError>
where
    SG: StrainGaugeInterface,
    D: DelayNs,
{
    let mut sum: i64 = 0;
    let mut valid: i64 = 0;

    for sample in 0..samples {
        match gauge.get_next_reading() {
            Ok(reading) => {
                sum += reading as i64;
                valid += 1;
            }
            Err(_) => trace!("Discarding failed reading {}", sample),
        }
        if sample + 1 < samples {
            delay.delay_ms(interval_ms);
        }
    }

    if valid == 0 {
        return Err(CalibrationError::NoValidSamples);
    }
    Ok((sum / valid) as i32)
}

/// Raw count of the empty scale.
pub fn tare<SG, D>(gauge: &mut SG, delay: &mut D, samples: usize, interval_ms: u32) -> Result<i32, CalibrationError>
where
    SG: StrainGaugeInterface,
    D: DelayNs,
{
    average_valid_readings(gauge, delay, samples, interval_ms)
}

/// Counts per gram, measured with `reference_mass` on the scale.
///
/// The caller has to make sure the mass is in place and settled, nothing here can tell.
pub fn calibrate_scale<SG, D>(
    gauge: &mut SG,
    delay: &mut D,
    offset: i32,
    reference_mass: f32,
    samples: usize,
    interval_ms: u32,
) -> Result<f32, CalibrationError>
where
    SG: StrainGaugeInterface,
    D: DelayNs,
{
    if !(reference_mass.is_finite() && reference_mass > 0.0) {
        return Err(CalibrationError::InvalidReferenceMass);
    }

    let mean = average_valid_readings(gauge, delay, samples, interval_ms)?;
    let scale = (mean as i64 - offset as i64) as f32 / reference_mass;

    if scale == 0.0 || !scale.is_finite() {
        return Err(CalibrationError::ZeroScale);
    }
    Ok(scale)
}

/// Full operator guided calibration: settle, tare, count down, measure the reference mass.
pub fn calibrate<SG, D>(gauge: &mut SG, delay: &mut D, config: &SamplingConfig) -> Result<CalibrationRecord, CalibrationError>
where
    SG: StrainGaugeInterface,
    D: DelayNs,
{
    info!("Stabilising sensor... keep the scale empty.");
    delay.delay_ms(config.settle_time_ms);

    let offset = match tare(gauge, delay, config.tare_samples, config.tare_interval_ms) {
        Ok(offset) => offset,
        Err(e) => {
            error!("Tare failed: {}", e);
            return Err(e);
        }
    };
    info!("Tare complete! Offset: {}", offset);
    info!("--------------------------------------------------");

    info!("Prepare the {}g reference mass...", config.reference_mass_grams);
    for remaining in (1..=config.countdown_secs).rev() {
        info!("Place the weight! Starting in {}...", remaining);
        delay.delay_ms(1_000);
    }

    info!("Calculating scale factor... keep the weight still.");
    let scale = match calibrate_scale(
        gauge,
        delay,
        offset,
        config.reference_mass_grams,
        config.scale_samples,
        config.scale_interval_ms,
    ) {
        Ok(scale) => scale,
        Err(e) => {
            error!("Scale calibration failed: {}", e);
            return Err(e);
        }
    };

    info!("Calibration finished! Scale: {}", format_decimal::<24>(scale, 4).as_str());
    info!("--------------------------------------------------");

    CalibrationRecord::new(offset, scale).map_err(|_| CalibrationError::ZeroScale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct ReadFailed;

    /// Plays back a script of readings
    struct ScriptedGauge {
        readings: VecDeque<Result<i32, ReadFailed>>,
        taken: usize,
    }

    impl ScriptedGauge {
        fn new(readings: impl IntoIterator<Item = Result<i32, ReadFailed>>) -> Self {
            Self {
                readings: readings.into_iter().collect(),
                taken: 0,
            }
        }
    }

    impl StrainGaugeInterface for ScriptedGauge {
        type Error = ReadFailed;

        fn initialize(&mut self) -> Result<(), ReadFailed> {
            Ok(())
        }

        fn is_ready(&mut self) -> Result<bool, ReadFailed> {
            Ok(!self.readings.is_empty())
        }

        fn get_next_reading(&mut self) -> Result<i32, ReadFailed> {
            self.taken += 1;
            self.readings.pop_front().unwrap_or(Err(ReadFailed))
        }

        fn power_down(&mut self) -> Result<(), ReadFailed> {
            Ok(())
        }

        fn power_up(&mut self) -> Result<(), ReadFailed> {
            Ok(())
        }

        fn get_adc_bit_count(&self) -> usize {
            24
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        total_ms: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ms += ns as u64 / 1_000_000;
        }

        fn delay_ms(&mut self, ms: u32) {
            self.total_ms += ms as u64;
        }
    }

    #[test]
    fn test_tare_all_failed() {
        let mut gauge = ScriptedGauge::new((0..10).map(|_| Err(ReadFailed)));
        let mut delay = CountingDelay::default();
        assert_eq!(tare(&mut gauge, &mut delay, 10, 10), Err(CalibrationError::NoValidSamples));
        assert_eq!(gauge.taken, 10);
    }

    #[test]
    fn test_tare_excludes_failures_from_sum_and_count() {
        let mut gauge = ScriptedGauge::new([Ok(100), Err(ReadFailed), Ok(101), Err(ReadFailed), Ok(104)]);
        let mut delay = CountingDelay::default();
        // (100 + 101 + 104) / 3 = 101.67 -> 101
        assert_eq!(tare(&mut gauge, &mut delay, 5, 10), Ok(101));
    }

    #[test]
    fn test_tare_truncates_towards_zero() {
        let mut gauge = ScriptedGauge::new([Ok(-100), Ok(-103)]);
        let mut delay = CountingDelay::default();
        assert_eq!(tare(&mut gauge, &mut delay, 2, 10), Ok(-101));
    }

    #[test]
    fn test_tare_keeps_genuine_zero_readings() {
        let mut gauge = ScriptedGauge::new([Ok(0), Ok(0), Ok(30)]);
        let mut delay = CountingDelay::default();
        assert_eq!(tare(&mut gauge, &mut delay, 3, 10), Ok(10));
    }

    #[test]
    fn test_tare_spaces_samples() {
        let mut gauge = ScriptedGauge::new((0..10).map(Ok));
        let mut delay = CountingDelay::default();
        tare(&mut gauge, &mut delay, 10, 10).unwrap();
        assert_eq!(delay.total_ms, 90);
    }

    #[test]
    fn test_tare_does_not_overflow() {
        let mut gauge = ScriptedGauge::new([Ok(8_388_607); 4]);
        let mut delay = CountingDelay::default();
        assert_eq!(tare(&mut gauge, &mut delay, 4, 0), Ok(8_388_607));
    }

    #[test]
    fn test_calibrate_scale() {
        let mut gauge = ScriptedGauge::new([Ok(1_800), Ok(1_900), Ok(2_000)]);
        let mut delay = CountingDelay::default();
        // mean 1900, offset 200 -> 1700 counts / 85 g
        assert_eq!(calibrate_scale(&mut gauge, &mut delay, 200, 85.0, 3, 100), Ok(20.0));
        assert_eq!(delay.total_ms, 200);
    }

    #[test]
    fn test_calibrate_scale_rejects_bad_mass() {
        let mut gauge = ScriptedGauge::new([Ok(1)]);
        let mut delay = CountingDelay::default();
        assert_eq!(
            calibrate_scale(&mut gauge, &mut delay, 0, 0.0, 1, 0),
            Err(CalibrationError::InvalidReferenceMass)
        );
        assert_eq!(
            calibrate_scale(&mut gauge, &mut delay, 0, f32::NAN, 1, 0),
            Err(CalibrationError::InvalidReferenceMass)
        );
        assert_eq!(gauge.taken, 0);
    }

    #[test]
    fn test_calibrate_scale_rejects_unchanged_load() {
        let mut gauge = ScriptedGauge::new([Ok(500), Ok(500)]);
        let mut delay = CountingDelay::default();
        assert_eq!(
            calibrate_scale(&mut gauge, &mut delay, 500, 85.0, 2, 0),
            Err(CalibrationError::ZeroScale)
        );
    }

    #[test]
    fn test_full_calibration() {
        let config = SamplingConfig::DEFAULT;
        let tare_readings = (0..config.tare_samples).map(|_| Ok(1_000));
        let loaded_readings = (0..config.scale_samples).map(|_| Ok(1_000 + 85 * 40));
        let mut gauge = ScriptedGauge::new(tare_readings.chain(loaded_readings));
        let mut delay = CountingDelay::default();

        let record = calibrate(&mut gauge, &mut delay, &config).unwrap();
        assert_eq!(record.offset(), 1_000);
        assert_eq!(record.scale(), 40.0);
        assert_eq!(record.resolve(1_000 + 400), 10.0);

        let expected_ms = config.settle_time_ms as u64
            + (config.tare_samples as u64 - 1) * config.tare_interval_ms as u64
            + config.countdown_secs as u64 * 1_000
            + (config.scale_samples as u64 - 1) * config.scale_interval_ms as u64;
        assert_eq!(delay.total_ms, expected_ms);
    }

    #[test]
    fn test_full_calibration_stops_on_degenerate_tare() {
        let config = SamplingConfig::DEFAULT;
        let mut gauge = ScriptedGauge::new(std::iter::empty());
        let mut delay = CountingDelay::default();

        assert_eq!(
            calibrate(&mut gauge, &mut delay, &config),
            Err(CalibrationError::NoValidSamples)
        );
        // no countdown once the tare failed
        assert_eq!(gauge.taken, config.tare_samples);
    }

    #[test]
    fn test_record_rejects_unusable_scale() {
        assert_eq!(CalibrationRecord::new(0, 0.0), Err(WeightError::Uncalibrated));
        assert_eq!(CalibrationRecord::new(0, f32::INFINITY), Err(WeightError::Uncalibrated));
        assert!(CalibrationRecord::new(0, -3.5).is_ok());
    }
}
