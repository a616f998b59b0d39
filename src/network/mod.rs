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

//! Wi-Fi bring-up and the HTTP client that carries the periodic reports.

pub mod http_client;

use cyw43::JoinOptions;
use defmt::{info, warn};
use embassy_net::Stack;
use embassy_time::{Duration, Ticker, Timer};

const JOIN_RETRY_DELAY: Duration = Duration::from_secs(5);
const ONBOARD_LED_GPIO: u8 = 0;

/// Joins the configured network, then blinks the on-board LED while connected.
pub async fn wifi_manager(mut control: cyw43::Control<'static>, stack: Stack<'static>, ssid: &str, password: &str) -> ! {
    if ssid.is_empty() {
        warn!("No Wi-Fi network configured, reports are disabled");
        loop {
            Timer::after_secs(3600).await;
        }
    }

    loop {
        info!("Joining Wi-Fi network {}", ssid);
        match control.join(ssid, JoinOptions::new(password.as_bytes())).await {
            Ok(()) => break,
            Err(e) => {
                warn!("Wi-Fi join failed: status={}", e.status);
                Timer::after(JOIN_RETRY_DELAY).await;
            }
        }
    }

    stack.wait_config_up().await;
    if let Some(config) = stack.config_v4() {
        info!("Wi-Fi connected! IP: {}", config.address);
    }

    let mut ticker = Ticker::every(Duration::from_millis(500));
    let mut led_on = false;
    loop {
        led_on = !led_on;
        control.gpio_set(ONBOARD_LED_GPIO, led_on).await;
        ticker.next().await;
    }
}
