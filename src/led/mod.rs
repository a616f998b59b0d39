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

use embassy_time::{Duration, Ticker};
use embedded_hal::digital::StatefulOutputPin;

/// Heartbeat LED, toggles every `half_period`.
pub async fn blink_forever(mut led: impl StatefulOutputPin, half_period: Duration) -> ! {
    let mut ticker = Ticker::every(half_period);
    loop {
        let _ = led.toggle();
        ticker.next().await;
    }
}
