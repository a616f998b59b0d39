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

//! RP2040 implementations of the board hooks the HX711 driver needs.

use embassy_time::Instant;
use sentinel_core::weight::interface::{InterruptMask, MonotonicClock};

/// Microseconds since boot from the embassy time driver.
#[derive(Clone, Copy, Default)]
pub struct EmbassyClock;

impl MonotonicClock for EmbassyClock {
    fn now_micros(&self) -> u64 {
        Instant::now().as_micros()
    }
}

/// Masks interrupts on the calling core only. The other core keeps running.
#[derive(Clone, Copy, Default)]
pub struct CoreInterruptMask;

impl InterruptMask for CoreInterruptMask {
    fn without_interrupts<R>(&mut self, f: impl FnOnce() -> R) -> R {
        cortex_m::interrupt::free(|_| f())
    }
}

/// Milliseconds since boot, wrapping after ~49 days.
pub fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}
