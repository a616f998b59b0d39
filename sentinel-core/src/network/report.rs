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

use core::fmt::Write;
use heapless::String;

pub const PATH_CAPACITY: usize = 128;

const ADC_REFERENCE_VOLTS: f32 = 3.3;
const ADC_FULL_SCALE: f32 = 4096.0;
const SENSOR_VOLTS_AT_27C: f32 = 0.706;
const SENSOR_SLOPE_VOLTS_PER_C: f32 = 0.001721;

/// On-die temperature sensor conversion for a 12 bit ADC sample.
pub fn die_temperature_celsius(raw: u16) -> f32 {
    let volts = raw as f32 * ADC_REFERENCE_VOLTS / ADC_FULL_SCALE;
    27.0 - (volts - SENSOR_VOLTS_AT_27C) / SENSOR_SLOPE_VOLTS_PER_C
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Report<'a> {
    pub temperature_celsius: f32,
    /// Raw pin level, 1 is no flame.
    pub flame_level: u8,
    pub device_id: &'a str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PathTooLong;

impl Report<'_> {
    /// Query path sent to the server, e.g. `/update?temp=23.45&flame=1&device=pico_w`.
    pub fn path_and_query(&self) -> Result<String<PATH_CAPACITY>, PathTooLong> {
        let mut path = String::new();
        write!(
            path,
            "/update?temp={:.2}&flame={}&device={}",
            self.temperature_celsius, self.flame_level, self.device_id
        )
        .map_err(|_| PathTooLong)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_at_reference_voltage() {
        // 0.706 V is ~876 counts
        let celsius = die_temperature_celsius(876);
        assert!((celsius - 27.0).abs() < 0.5, "{celsius}");
    }

    #[test]
    fn test_temperature_falls_as_voltage_rises() {
        assert!(die_temperature_celsius(900) < die_temperature_celsius(850));
    }

    #[test]
    fn test_temperature_full_scale() {
        let celsius = die_temperature_celsius(4095);
        let expected = 27.0 - (4095.0 * 3.3 / 4096.0 - 0.706) / 0.001721;
        assert!((celsius - expected).abs() < 1e-3);
    }

    #[test]
    fn test_path_and_query() {
        let report = Report {
            temperature_celsius: 23.456,
            flame_level: 1,
            device_id: "pico_w",
        };
        assert_eq!(
            report.path_and_query().unwrap().as_str(),
            "/update?temp=23.46&flame=1&device=pico_w"
        );
    }

    #[test]
    fn test_negative_temperature_and_flame() {
        let report = Report {
            temperature_celsius: -4.5,
            flame_level: 0,
            device_id: "shed",
        };
        assert_eq!(
            report.path_and_query().unwrap().as_str(),
            "/update?temp=-4.50&flame=0&device=shed"
        );
    }

    #[test]
    fn test_oversized_device_id_is_rejected() {
        let long_id = "x".repeat(200);
        let report = Report {
            temperature_celsius: 20.0,
            flame_level: 1,
            device_id: &long_id,
        };
        assert_eq!(report.path_and_query(), Err(PathTooLong));
    }
}
