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

use defmt::{error, info, warn};
use embassy_time::{Duration, Ticker};
use embedded_hal::delay::DelayNs;
use sentinel_core::config::SamplingConfig;
use sentinel_core::hmi::status::format_decimal;
use sentinel_core::weight::calibration::calibrate;
use sentinel_core::weight::interface::StrainGaugeInterface;
use sentinel_core::weight::weight::WeightScale;
use sentinel_core::weight::WeighingSystem;

use crate::application::shared_state::SharedState;

/// Owns the strain gauge. Calibrates once, then publishes a weight every period.
///
/// The HX711 driver busy-waits, so this runs on its own core.
pub struct WeighingManager<SG, D> {
    strain_gauge: SG,
    delay: D,
    config: SamplingConfig,
    shared: &'static SharedState,
}

impl<SG, D> WeighingManager<SG, D>
where
    SG: StrainGaugeInterface,
    D: DelayNs,
{
    pub fn new(strain_gauge: SG, delay: D, shared: &'static SharedState) -> Self {
        Self {
            strain_gauge,
            delay,
            config: shared.config.sampling,
            shared,
        }
    }

    pub async fn run(mut self) -> ! {
        if self.strain_gauge.initialize().is_err() {
            warn!("Strain gauge did not initialise, readings will probably fail");
        }

        let calibration = match calibrate(&mut self.strain_gauge, &mut self.delay, &self.config) {
            Ok(record) => record,
            Err(e) => {
                error!("Calibration failed ({}), running without weights", e);
                park().await
            }
        };

        let mut weight_scale = WeightScale::new(self.strain_gauge, calibration);
        let mut periodic_timer = Ticker::every(Duration::from_millis(self.config.period_ms));
        loop {
            periodic_timer.next().await;
            match weight_scale.get_instantaneous_weight_grams() {
                Ok(grams) => {
                    info!("Weight: {} g", format_decimal::<16>(grams, 2).as_str());
                    self.shared.weight.write(grams);
                }
                Err(e) => warn!("Weighing failed: {}", e),
            }
        }
    }
}

/// Nothing left to do on this core.
async fn park() -> ! {
    loop {
        embassy_time::Timer::after_secs(3600).await;
    }
}
