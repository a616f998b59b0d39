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

//! Status screen layout, independent of the panel driver.

use core::fmt::Write;
use heapless::String;

pub const TITLE_Y: i32 = 0;
pub const COUNT_Y: i32 = 12;
pub const WEIGHT_Y: i32 = 24;
pub const FLAME_Y: i32 = 40;

/// Minimal text surface the status screen is drawn on.
pub trait StatusDisplay {
    type Error;

    fn clear(&mut self) -> Result<(), Self::Error>;

    /// `scale` 1 is the normal font, 2 the large one.
    fn draw_text(&mut self, x: i32, y: i32, scale: u8, text: &str) -> Result<(), Self::Error>;

    /// Push the frame to the panel.
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// Snapshot of what gets shown on one refresh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStatus {
    pub counter: u8,
    pub flame_detected: bool,
    /// `None` until the first weight has been published.
    pub weight_grams: Option<f32>,
}

/// Counts refreshes, going back to 0 after `wrap`.
#[derive(Clone, Copy, Debug)]
pub struct RefreshCounter {
    value: u8,
    wrap: u8,
}

impl RefreshCounter {
    pub const fn new(wrap: u8) -> Self {
        Self { value: 0, wrap }
    }

    /// Current value, then advance.
    pub fn advance(&mut self) -> u8 {
        let current = self.value;
        self.value = if self.value >= self.wrap {
            0
        } else {
            self.value + 1
        };
        current
    }
}

/// Format `value` with a fixed number of decimals.
///
/// Output that does not fit in `N` bytes is truncated.
pub fn format_decimal<const N: usize>(value: f32, decimals: usize) -> String<N> {
    let mut out = String::new();
    let _ = write!(out, "{:.*}", decimals, value);
    out
}

pub fn render_status<D: StatusDisplay>(display: &mut D, status: &NodeStatus) -> Result<(), D::Error> {
    display.clear()?;
    display.draw_text(0, TITLE_Y, 1, "Monitoring")?;

    let mut line: String<24> = String::new();
    let _ = write!(line, "Count: {}", status.counter);
    display.draw_text(0, COUNT_Y, 1, &line)?;

    line.clear();
    match status.weight_grams {
        Some(grams) => {
            let _ = write!(line, "Weight: {} g", format_decimal::<14>(grams, 1));
        }
        None => {
            let _ = line.push_str("Weight: --");
        }
    }
    display.draw_text(0, WEIGHT_Y, 1, &line)?;

    if status.flame_detected {
        display.draw_text(0, FLAME_Y, 2, "FIRE!!!")?;
    } else {
        display.draw_text(0, FLAME_Y, 1, "System: OK")?;
    }

    display.present()
}
