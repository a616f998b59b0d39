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

//! Node configuration, with the network section taken from the build environment.

use defmt::warn;
use sentinel_core::config::{parse_device_id, parse_ipv4, parse_port, NodeConfig, ReportingConfig};

pub const WIFI_SSID: &str = env!("SENTINEL_WIFI_SSID");
pub const WIFI_PASSWORD: &str = env!("SENTINEL_WIFI_PASSWORD");

const SERVER_IP: &str = env!("SENTINEL_SERVER_IP");
const SERVER_PORT: &str = env!("SENTINEL_SERVER_PORT");
const DEVICE_ID: &str = env!("SENTINEL_DEVICE_ID");

pub fn node_config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.reporting = reporting_config();
    config
}

fn reporting_config() -> ReportingConfig {
    let mut reporting = ReportingConfig::DEFAULT;

    match parse_ipv4(SERVER_IP) {
        Some(address) => reporting.server_address = address,
        None => warn!("Invalid server address '{}', using default", SERVER_IP),
    }
    match parse_port(SERVER_PORT) {
        Some(port) => reporting.server_port = port,
        None => warn!("Invalid server port '{}', using default", SERVER_PORT),
    }
    match parse_device_id(DEVICE_ID) {
        Some(id) => reporting.device_id = id,
        None => warn!("Invalid device id '{}', using default", DEVICE_ID),
    }

    reporting
}

#[allow(dead_code)]
pub mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
