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

use crate::weight::calibration::CalibrationRecord;
use crate::weight::interface::StrainGaugeInterface;
use crate::weight::WeighingSystem;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WeightError {
    /// No usable scale factor, dividing by it would be meaningless.
    Uncalibrated,
    /// The strain gauge reading failed.
    Acquisition,
}

/// Convert a raw count to grams.
///
/// A raw count of exactly zero reads as 0 g whatever the calibration.
pub fn resolve(raw: i32, offset: i32, scale: f32) -> Result<f32, WeightError> {
    if raw == 0 {
        return Ok(0.0);
    }
    if scale == 0.0 || !scale.is_finite() {
        return Err(WeightError::Uncalibrated);
    }
    Ok((raw as i64 - offset as i64) as f32 / scale)
}

/// A strain gauge paired with the calibration taken at power up.
pub struct WeightScale<StrainGauge> {
    strain_gauge: StrainGauge,
    calibration: CalibrationRecord,
}

impl<StrainGauge> WeightScale<StrainGauge>
where
    StrainGauge: StrainGaugeInterface,
{
    pub fn new(strain_gauge: StrainGauge, calibration: CalibrationRecord) -> Self {
        Self {
            strain_gauge,
            calibration,
        }
    }

    pub fn calibration(&self) -> &CalibrationRecord {
        &self.calibration
    }

    pub fn into_inner(self) -> StrainGauge {
        self.strain_gauge
    }
}

impl<StrainGauge> WeighingSystem for WeightScale<StrainGauge>
where
    StrainGauge: StrainGaugeInterface,
{
    type Error = WeightError;

    fn get_instantaneous_weight_grams(&mut self) -> Result<f32, WeightError> {
        let reading = self.get_raw_reading()?;
        trace!("Reading = {}", reading);
        Ok(self.calibration.resolve(reading))
    }

    fn get_raw_reading(&mut self) -> Result<i32, WeightError> {
        self.strain_gauge
            .get_next_reading()
            .map_err(|_| WeightError::Acquisition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_zero_raw_reads_zero() {
        assert_eq!(resolve(0, 100, 2.0), Ok(0.0));
        assert_eq!(resolve(0, -5_000, 0.5), Ok(0.0));
    }

    #[test]
    fn test_resolve_arithmetic() {
        assert_eq!(resolve(1_100, 100, 2.0), Ok(500.0));
        assert_eq!(resolve(-900, 100, 2.0), Ok(-500.0));
        assert_eq!(resolve(100, 100, -4.0), Ok(0.0));
    }

    #[test]
    fn test_resolve_uncalibrated() {
        assert_eq!(resolve(1_100, 100, 0.0), Err(WeightError::Uncalibrated));
        assert_eq!(resolve(1_100, 100, f32::NAN), Err(WeightError::Uncalibrated));
    }

    #[test]
    fn test_resolve_extremes_do_not_overflow() {
        let grams = resolve(8_388_607, -8_388_608, 1.0).unwrap();
        assert_eq!(grams, 16_777_215.0);
    }

    struct FixedGauge(Option<i32>);

    impl StrainGaugeInterface for FixedGauge {
        type Error = ();

        fn initialize(&mut self) -> Result<(), ()> {
            Ok(())
        }

        fn is_ready(&mut self) -> Result<bool, ()> {
            Ok(self.0.is_some())
        }

        fn get_next_reading(&mut self) -> Result<i32, ()> {
            self.0.ok_or(())
        }

        fn power_down(&mut self) -> Result<(), ()> {
            Ok(())
        }

        fn power_up(&mut self) -> Result<(), ()> {
            Ok(())
        }

        fn get_adc_bit_count(&self) -> usize {
            24
        }
    }

    #[test]
    fn test_scale_weighs() {
        let record = CalibrationRecord::new(100, 2.0).unwrap();
        let mut scale = WeightScale::new(FixedGauge(Some(1_100)), record);
        assert_eq!(scale.get_instantaneous_weight_grams(), Ok(500.0));
        assert_eq!(scale.calibration().offset(), 100);
    }

    #[test]
    fn test_scale_reports_failed_acquisition() {
        let record = CalibrationRecord::new(100, 2.0).unwrap();
        let mut scale = WeightScale::new(FixedGauge(None), record);
        assert_eq!(scale.get_instantaneous_weight_grams(), Err(WeightError::Acquisition));
        assert_eq!(scale.get_raw_reading(), Err(WeightError::Acquisition));
    }
}
