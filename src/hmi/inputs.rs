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
use embassy_time::Timer;
use embedded_hal_async::digital::Wait;
use sentinel_core::hmi::wake::DebouncedWake;

use crate::platform::now_ms;

/// Feeds falling edges of the button into the debounced wake signal.
pub async fn button_edge_watcher(mut button: impl Wait, wake: &DebouncedWake) -> ! {
    loop {
        if button.wait_for_falling_edge().await.is_err() {
            warn!("Button edge wait failed");
            continue;
        }
        wake.on_edge(now_ms());
    }
}

/// Handles one press per wake, then holds off before waiting again.
pub async fn button_press_handler(wake: &DebouncedWake, hold_off_ms: u64) -> ! {
    loop {
        wake.wait().await;
        info!("Button A pressed!");
        Timer::after_millis(hold_off_ms).await;
    }
}
