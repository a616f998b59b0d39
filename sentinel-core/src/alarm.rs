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

//! Flame alarm debouncing
//!
//! The flame sensor is polled at a fixed period. A fire is only declared after a run of
//! positive readings, then the buzzer is pulsed every period until the run ends.

use crate::config::AlarmConfig;

/// What the alarm task should do after a poll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmAction {
    pub sound_buzzer: bool,
    pub silence: bool,
    /// The positive run is long enough that the sensor is probably stuck.
    pub stuck_sensor: bool,
}

/// Owned by the alarm task alone.
#[derive(Debug)]
pub struct AlarmState {
    config: AlarmConfig,
    consecutive_positive_readings: u32,
    run_length: u32,
    stuck_reported: bool,
}

impl AlarmState {
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            config,
            consecutive_positive_readings: 0,
            run_length: 0,
            stuck_reported: false,
        }
    }

    pub fn consecutive_positive_readings(&self) -> u32 {
        self.consecutive_positive_readings
    }

    pub fn run_length(&self) -> u32 {
        self.run_length
    }

    pub fn update(&mut self, flame_detected: bool) -> AlarmAction {
        if !flame_detected {
            self.consecutive_positive_readings = 0;
            self.run_length = 0;
            self.stuck_reported = false;
            return AlarmAction {
                silence: true,
                ..Default::default()
            };
        }

        self.consecutive_positive_readings = self.consecutive_positive_readings.saturating_add(1);
        self.run_length = self.run_length.saturating_add(1);

        let mut action = AlarmAction::default();

        if self.run_length > self.config.stuck_threshold && !self.stuck_reported {
            self.stuck_reported = true;
            self.consecutive_positive_readings = self.config.trigger_count;
            action.stuck_sensor = true;
        }

        if self.consecutive_positive_readings >= self.config.trigger_count {
            action.sound_buzzer = true;
            if self.consecutive_positive_readings > self.config.rearm_ceiling {
                self.consecutive_positive_readings = self.config.trigger_count;
            }
        }

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alarm() -> AlarmState {
        AlarmState::new(AlarmConfig::DEFAULT)
    }

    #[test]
    fn test_fifth_positive_sounds_once() {
        let mut alarm = alarm();
        let pulses: Vec<bool> = (0..5).map(|_| alarm.update(true).sound_buzzer).collect();
        assert_eq!(pulses, [false, false, false, false, true]);
    }

    #[test]
    fn test_negative_resets_mid_run() {
        let mut alarm = alarm();
        for _ in 0..4 {
            alarm.update(true);
        }
        let action = alarm.update(false);
        assert!(action.silence);
        assert!(!action.sound_buzzer);
        assert_eq!(alarm.consecutive_positive_readings(), 0);

        // a fresh run needs five again
        for _ in 0..4 {
            assert!(!alarm.update(true).sound_buzzer);
        }
        assert!(alarm.update(true).sound_buzzer);
    }

    #[test]
    fn test_repeats_within_band() {
        let mut alarm = alarm();
        for _ in 0..4 {
            alarm.update(true);
        }
        for _ in 0..40 {
            assert!(alarm.update(true).sound_buzzer);
            let count = alarm.consecutive_positive_readings();
            assert!((5..=20).contains(&count), "count {count} left the band");
        }
    }

    #[test]
    fn test_clamps_above_ceiling() {
        let mut alarm = alarm();
        for _ in 0..20 {
            alarm.update(true);
        }
        assert_eq!(alarm.consecutive_positive_readings(), 20);
        alarm.update(true);
        assert_eq!(alarm.consecutive_positive_readings(), 5);
    }

    #[test]
    fn test_stuck_sensor_reported_once_per_run() {
        let mut alarm = alarm();
        let warnings: Vec<usize> = (1..=200)
            .filter(|_| alarm.update(true).stuck_sensor)
            .collect();
        assert_eq!(warnings, [51]);
        assert_eq!(alarm.run_length(), 200);

        alarm.update(false);
        let warnings = (1..=60).filter(|_| alarm.update(true).stuck_sensor).count();
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_stuck_warning_pulls_count_back() {
        let mut alarm = alarm();
        for _ in 0..50 {
            alarm.update(true);
        }
        let action = alarm.update(true);
        assert!(action.stuck_sensor);
        assert!(action.sound_buzzer);
        assert_eq!(alarm.consecutive_positive_readings(), 5);
    }
}
