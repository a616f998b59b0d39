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

pub mod hx711;

pub trait StrainGaugeInterface {
    type Error;

    /// Initialise the gauge and make it ready for taking readings. Will put it into an initalized,
    /// powered up state.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// True when a conversion is waiting to be clocked out.
    fn is_ready(&mut self) -> Result<bool, Self::Error>;

    /// Gets next reading from the strain gauge, waiting for the conversion to complete.
    fn get_next_reading(&mut self) -> Result<i32, Self::Error>;

    /// Power down the strain gauge
    fn power_down(&mut self) -> Result<(), Self::Error>;

    /// Power up the strain gauge
    fn power_up(&mut self) -> Result<(), Self::Error>;

    /// Return the number of bits supported by the ADC
    fn get_adc_bit_count(&self) -> usize;
}

/// Free running microsecond clock used for timeouts.
pub trait MonotonicClock {
    fn now_micros(&self) -> u64;
}

/// Runs a closure with interrupts masked on the calling core.
///
/// Implementations must restore the previous interrupt state when `f` returns.
pub trait InterruptMask {
    fn without_interrupts<R>(&mut self, f: impl FnOnce() -> R) -> R;
}
