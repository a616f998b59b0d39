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

//! Node configuration
//!
//! All tunables of the node in one place. Defaults reproduce the behaviour of the deployed
//! hardware; the firmware overrides the network section from build-time environment.

/// Load cell sampling and calibration parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplingConfig {
    /// Time the scale is left empty before the tare starts.
    pub settle_time_ms: u32,
    pub tare_samples: usize,
    pub tare_interval_ms: u32,
    pub reference_mass_grams: f32,
    /// Seconds counted down to the operator before the reference mass is measured.
    pub countdown_secs: u32,
    pub scale_samples: usize,
    pub scale_interval_ms: u32,
    /// Period of the continuous weighing loop once calibrated.
    pub period_ms: u64,
}

impl SamplingConfig {
    pub const DEFAULT: Self = Self {
        settle_time_ms: 5_000,
        tare_samples: 10,
        tare_interval_ms: 10,
        reference_mass_grams: 85.0,
        countdown_secs: 3,
        scale_samples: 15,
        scale_interval_ms: 100,
        period_ms: 1_000,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmConfig {
    pub poll_period_ms: u64,
    /// Consecutive positive readings before the buzzer sounds.
    pub trigger_count: u32,
    /// Upper edge of the repeating band; the count is pulled back to `trigger_count` above it.
    pub rearm_ceiling: u32,
    /// Run length after which the sensor is reported as possibly stuck.
    pub stuck_threshold: u32,
    pub pulse_ms: u64,
}

impl AlarmConfig {
    pub const DEFAULT: Self = Self {
        poll_period_ms: 200,
        trigger_count: 5,
        rearm_ceiling: 20,
        stuck_threshold: 50,
        pulse_ms: 150,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportingConfig {
    pub period_ms: u64,
    /// Ticks a request may stay outstanding before the guard gives up on it.
    pub watchdog_ticks: u8,
    pub server_address: [u8; 4],
    pub server_port: u16,
    pub device_id: &'static str,
    pub request_timeout_ms: u64,
}

impl ReportingConfig {
    pub const DEFAULT: Self = Self {
        period_ms: 5_000,
        watchdog_ticks: 2,
        server_address: [192, 168, 143, 29],
        server_port: 5000,
        device_id: "pico_w",
        request_timeout_ms: 8_000,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayConfig {
    pub refresh_period_ms: u64,
    /// The refresh counter goes back to zero after passing this value.
    pub counter_wrap: u8,
}

impl DisplayConfig {
    pub const DEFAULT: Self = Self {
        refresh_period_ms: 1_000,
        counter_wrap: 10,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonConfig {
    pub debounce_ms: u32,
    /// Pause after handling a press.
    pub hold_off_ms: u64,
}

impl ButtonConfig {
    pub const DEFAULT: Self = Self {
        debounce_ms: 250,
        hold_off_ms: 200,
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeConfig {
    pub sampling: SamplingConfig,
    pub alarm: AlarmConfig,
    pub reporting: ReportingConfig,
    pub display: DisplayConfig,
    pub button: ButtonConfig,
}

impl NodeConfig {
    pub const DEFAULT: Self = Self {
        sampling: SamplingConfig::DEFAULT,
        alarm: AlarmConfig::DEFAULT,
        reporting: ReportingConfig::DEFAULT,
        display: DisplayConfig::DEFAULT,
        button: ButtonConfig::DEFAULT,
    };
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Parse a dotted quad such as `192.168.1.10`.
pub fn parse_ipv4(text: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = text.trim().split('.');
    for octet in octets.iter_mut() {
        *octet = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}

/// Parse a TCP port, rejecting zero.
pub fn parse_port(text: &str) -> Option<u16> {
    match text.trim().parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

/// Device id as it will appear in the report query. Only URI unreserved characters are accepted
/// so the id never needs escaping.
pub fn parse_device_id(text: &str) -> Option<&str> {
    let id = text.trim();
    let unreserved = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~');
    if id.is_empty() || !id.chars().all(unreserved) {
        return None;
    }
    Some(id)
}
