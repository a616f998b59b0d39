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

use defmt::{info, warn};
use embassy_time::{Duration, Ticker, Timer};
use embedded_hal::digital::{InputPin, OutputPin};
use sentinel_core::alarm::AlarmState;

use crate::application::shared_state::SharedState;

/// Polls the flame sensor and drives the buzzer. Sole owner of the alarm state.
pub struct AlarmManager<FLAME, BUZZER> {
    flame_input: FLAME,
    buzzer: BUZZER,
    state: AlarmState,
    shared: &'static SharedState,
}

impl<FLAME, BUZZER> AlarmManager<FLAME, BUZZER>
where
    FLAME: InputPin,
    BUZZER: OutputPin,
{
    pub fn new(flame_input: FLAME, buzzer: BUZZER, shared: &'static SharedState) -> Self {
        Self {
            flame_input,
            buzzer,
            state: AlarmState::new(shared.config.alarm),
            shared,
        }
    }

    pub async fn run(&mut self) -> ! {
        info!("Flame sensor monitoring started");
        let config = self.shared.config.alarm;
        let _ = self.buzzer.set_low();

        let mut periodic_timer = Ticker::every(Duration::from_millis(config.poll_period_ms));
        loop {
            periodic_timer.next().await;

            let level = match self.flame_input.is_high() {
                Ok(high) => high as u8,
                Err(_) => {
                    warn!("Flame input read failed");
                    continue;
                }
            };
            self.shared.set_flame_level(level);

            let action = self.state.update(level == 0);
            if action.silence {
                let _ = self.buzzer.set_low();
            }
            if action.stuck_sensor {
                warn!("Flame sensor reads fire for {} polls in a row, it may be stuck. Check the sensor's threshold adjustment.",
                    self.state.run_length());
            }
            if action.sound_buzzer {
                info!("*** ALERT: FIRE DETECTED ***");
                let _ = self.buzzer.set_high();
                Timer::after_millis(config.pulse_ms).await;
                let _ = self.buzzer.set_low();
            }
        }
    }
}
