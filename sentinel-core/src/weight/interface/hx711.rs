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

//! HX711 load cell ADC
//!
//! Two wire protocol: DOUT goes low when a conversion is ready, then 24 clock pulses shift the
//! sample out MSB first. 1 to 3 further pulses select gain and channel for the next conversion.
//! Holding the clock high for more than 60us powers the device down, so the pulse train runs
//! with interrupts masked.

use crate::weight::interface::{InterruptMask, MonotonicClock, StrainGaugeInterface};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Hx711Gain {
    Gain128,
    Gain64,
    Gain32ChannelB,
}

impl Hx711Gain {
    fn tick_count(&self) -> usize {
        match self {
            Hx711Gain::Gain128 => 25,
            Hx711Gain::Gain64 => 27,
            Hx711Gain::Gain32ChannelB => 26,
        }
    }
}

const POWER_MODE_CHANGE_DELAY_US: u32 = 60;
const CLK_HALF_PERIOD_US: u32 = 1;
const VALID_DATA_BITS: usize = 24;
pub const READY_TIMEOUT_US: u64 = 500_000;

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<OutPinE, InPinE> {
    OutPin(OutPinE),
    InPin(InPinE),
    /// DOUT never went low within the ready timeout.
    Timeout,
}

pub struct Hx711<CLK, DATA, D, C, IM> {
    clock_pin: CLK,
    data_pin: DATA,
    delay: D,
    clock: C,
    interrupts: IM,
    gain_clocks: usize,
    ready_timeout_us: u64,
    powered_up: bool,
}

impl<CLK, DATA, D, C, IM, ClkE, DataE> Hx711<CLK, DATA, D, C, IM>
where
    CLK: OutputPin<Error = ClkE>,
    DATA: InputPin<Error = DataE>,
    D: DelayNs,
    C: MonotonicClock,
    IM: InterruptMask,
{
    pub fn new(clock_pin: CLK, data_pin: DATA, delay: D, clock: C, interrupts: IM, gain: Hx711Gain) -> Self {
        Self {
            clock_pin,
            data_pin,
            delay,
            clock,
            interrupts,
            gain_clocks: gain.tick_count(),
            ready_timeout_us: READY_TIMEOUT_US,
            powered_up: false,
        }
    }

    /// Takes effect from the conversion after the next read.
    pub fn set_gain(&mut self, gain: Hx711Gain) {
        self.gain_clocks = gain.tick_count();
    }

    pub fn set_ready_timeout_us(&mut self, timeout_us: u64) {
        self.ready_timeout_us = timeout_us;
    }

    /// Reads one sample. `Err(Error::Timeout)` if the device did not become ready in time.
    pub fn read(&mut self) -> Result<i32, Error<ClkE, DataE>> {
        if !self.powered_up {
            self.power_up()?;
        }

        self.wait_until_ready()?;

        let Self {
            clock_pin,
            data_pin,
            delay,
            interrupts,
            gain_clocks,
            ..
        } = self;
        let gain_clocks = *gain_clocks;

        let raw = interrupts.without_interrupts(|| {
            let result = shift_in(clock_pin, data_pin, delay, gain_clocks);
            if result.is_err() {
                // leaving the clock high would power the device down
                let _ = clock_pin.set_low();
            }
            result
        })?;

        Ok(sign_extend_24(raw))
    }

    fn wait_until_ready(&mut self) -> Result<(), Error<ClkE, DataE>> {
        let start = self.clock.now_micros();
        loop {
            if self.data_pin.is_low().map_err(Error::InPin)? {
                return Ok(());
            }
            if self.clock.now_micros().wrapping_sub(start) >= self.ready_timeout_us {
                trace!("HX711 not ready after {} us", self.ready_timeout_us);
                return Err(Error::Timeout);
            }
            core::hint::spin_loop();
        }
    }
}

fn shift_in<CLK, DATA, D, ClkE, DataE>(
    clock_pin: &mut CLK,
    data_pin: &mut DATA,
    delay: &mut D,
    gain_clocks: usize,
) -> Result<u32, Error<ClkE, DataE>>
where
    CLK: OutputPin<Error = ClkE>,
    DATA: InputPin<Error = DataE>,
    D: DelayNs,
{
    let mut data: u32 = 0;

    for _ in 0..VALID_DATA_BITS {
        clock_pin.set_high().map_err(Error::OutPin)?;
        delay.delay_us(CLK_HALF_PERIOD_US);
        data <<= 1;
        if data_pin.is_high().map_err(Error::InPin)? {
            data |= 0x1;
        }
        clock_pin.set_low().map_err(Error::OutPin)?;
        delay.delay_us(CLK_HALF_PERIOD_US);
    }

    // gain / channel selection for the next conversion, nothing to capture
    for _ in VALID_DATA_BITS..gain_clocks {
        clock_pin.set_high().map_err(Error::OutPin)?;
        delay.delay_us(CLK_HALF_PERIOD_US);
        clock_pin.set_low().map_err(Error::OutPin)?;
        delay.delay_us(CLK_HALF_PERIOD_US);
    }

    Ok(data)
}

/// Sign extend a 24 bit two's complement value.
pub fn sign_extend_24(raw: u32) -> i32 {
    let mut value = (raw & 0x00FF_FFFF) as i32;
    if value & 0x0080_0000 != 0 {
        value |= 0xFF00_0000u32 as i32;
    }
    value
}

impl<CLK, DATA, D, C, IM, ClkE, DataE> StrainGaugeInterface for Hx711<CLK, DATA, D, C, IM>
where
    CLK: OutputPin<Error = ClkE>,
    DATA: InputPin<Error = DataE>,
    D: DelayNs,
    C: MonotonicClock,
    IM: InterruptMask,
{
    type Error = Error<ClkE, DataE>;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.power_up()
    }

    fn is_ready(&mut self) -> Result<bool, Self::Error> {
        self.data_pin.is_low().map_err(Error::InPin)
    }

    fn get_next_reading(&mut self) -> Result<i32, Self::Error> {
        self.read()
    }

    fn power_down(&mut self) -> Result<(), Self::Error> {
        self.clock_pin.set_high().map_err(Error::OutPin)?;
        self.delay.delay_us(POWER_MODE_CHANGE_DELAY_US);
        self.powered_up = false;
        Ok(())
    }

    fn power_up(&mut self) -> Result<(), Self::Error> {
        self.clock_pin.set_low().map_err(Error::OutPin)?;
        self.delay.delay_us(POWER_MODE_CHANGE_DELAY_US);
        self.powered_up = true;
        Ok(())
    }

    fn get_adc_bit_count(&self) -> usize {
        VALID_DATA_BITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Simulated HX711 seen through its two pins
    #[derive(Default)]
    struct Bus {
        pattern: u32,
        ready: bool,
        clock_high: bool,
        pulses: usize,
        pulses_unmasked: usize,
        mask_depth: usize,
        mask_entries: usize,
        now_us: u64,
    }

    type SharedBus = Rc<RefCell<Bus>>;

    struct SimClockPin(SharedBus);
    struct SimDataPin(SharedBus);
    struct SimDelay(SharedBus);
    struct SimTime(SharedBus);
    struct SimMask(SharedBus);

    impl ErrorType for SimClockPin {
        type Error = Infallible;
    }

    impl OutputPin for SimClockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().clock_high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            let mut bus = self.0.borrow_mut();
            if !bus.clock_high {
                bus.pulses += 1;
                if bus.mask_depth == 0 {
                    bus.pulses_unmasked += 1;
                }
            }
            bus.clock_high = true;
            Ok(())
        }
    }

    impl ErrorType for SimDataPin {
        type Error = Infallible;
    }

    impl InputPin for SimDataPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            let bus = self.0.borrow();
            Ok(match bus.pulses {
                0 => !bus.ready,
                n @ 1..=24 => (bus.pattern >> (24 - n)) & 0x1 == 0x1,
                _ => true,
            })
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|high| !high)
        }
    }

    impl DelayNs for SimDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.0.borrow_mut().now_us += (ns as u64).div_ceil(1_000);
        }
    }

    impl MonotonicClock for SimTime {
        fn now_micros(&self) -> u64 {
            // every poll costs a millisecond so a dead device times out quickly
            let mut bus = self.0.borrow_mut();
            bus.now_us += 1_000;
            bus.now_us
        }
    }

    impl InterruptMask for SimMask {
        fn without_interrupts<R>(&mut self, f: impl FnOnce() -> R) -> R {
            {
                let mut bus = self.0.borrow_mut();
                bus.mask_depth += 1;
                bus.mask_entries += 1;
            }
            let result = f();
            self.0.borrow_mut().mask_depth -= 1;
            result
        }
    }

    type SimHx711 = Hx711<SimClockPin, SimDataPin, SimDelay, SimTime, SimMask>;

    fn sim_hx711(pattern: u32, ready: bool, gain: Hx711Gain) -> (SimHx711, SharedBus) {
        let bus = Rc::new(RefCell::new(Bus {
            pattern,
            ready,
            ..Default::default()
        }));
        let hx711 = Hx711::new(
            SimClockPin(bus.clone()),
            SimDataPin(bus.clone()),
            SimDelay(bus.clone()),
            SimTime(bus.clone()),
            SimMask(bus.clone()),
            gain,
        );
        (hx711, bus)
    }

    #[test]
    fn test_boundary_patterns() {
        let cases = [
            (0x000000, 0),
            (0x000001, 1),
            (0x7FFFFF, 8_388_607),
            (0x800000, -8_388_608),
            (0xFFFFFF, -1),
        ];
        for (pattern, expected) in cases {
            let (mut hx711, _bus) = sim_hx711(pattern, true, Hx711Gain::Gain128);
            assert_eq!(hx711.read(), Ok(expected), "pattern {:#08x}", pattern);
        }
    }

    #[test]
    fn test_pulse_train_runs_masked() {
        let (mut hx711, bus) = sim_hx711(0x123456, true, Hx711Gain::Gain128);
        assert_eq!(hx711.read(), Ok(0x123456));

        let bus = bus.borrow();
        assert_eq!(bus.pulses, 25);
        assert_eq!(bus.pulses_unmasked, 0);
        assert_eq!(bus.mask_entries, 1);
        assert_eq!(bus.mask_depth, 0);
        assert!(!bus.clock_high);
    }

    #[test]
    fn test_gain_selects_trailing_pulses() {
        let (mut hx711, bus) = sim_hx711(0x000010, true, Hx711Gain::Gain64);
        assert_eq!(hx711.read(), Ok(0x10));
        assert_eq!(bus.borrow().pulses, 27);

        let (mut hx711, bus) = sim_hx711(0x000010, true, Hx711Gain::Gain128);
        hx711.set_gain(Hx711Gain::Gain32ChannelB);
        assert_eq!(hx711.read(), Ok(0x10));
        assert_eq!(bus.borrow().pulses, 26);
    }

    #[test]
    fn test_timeout_when_never_ready() {
        let (mut hx711, bus) = sim_hx711(0x7FFFFF, false, Hx711Gain::Gain128);
        assert_eq!(hx711.read(), Err(Error::Timeout));

        let bus = bus.borrow();
        assert!(bus.now_us >= READY_TIMEOUT_US);
        assert_eq!(bus.pulses, 0);
        assert_eq!(bus.mask_entries, 0);
        assert_eq!(bus.mask_depth, 0);
    }

    #[test]
    fn test_custom_ready_timeout() {
        let (mut hx711, bus) = sim_hx711(0, false, Hx711Gain::Gain128);
        hx711.set_ready_timeout_us(10_000);
        assert_eq!(hx711.read(), Err(Error::Timeout));
        assert!(bus.borrow().now_us < READY_TIMEOUT_US);
    }

    #[test]
    fn test_is_ready_is_a_plain_read() {
        let (mut hx711, bus) = sim_hx711(0, true, Hx711Gain::Gain128);
        assert_eq!(hx711.is_ready(), Ok(true));
        assert_eq!(hx711.is_ready(), Ok(true));
        bus.borrow_mut().ready = false;
        assert_eq!(hx711.is_ready(), Ok(false));
        assert_eq!(bus.borrow().pulses, 0);
    }

    #[test]
    fn test_power_cycle() {
        let (mut hx711, bus) = sim_hx711(0x42, true, Hx711Gain::Gain128);
        hx711.initialize().unwrap();
        hx711.power_down().unwrap();
        assert!(bus.borrow().clock_high);

        // a read after power down brings the device back first
        bus.borrow_mut().pulses = 0;
        assert_eq!(hx711.read(), Ok(0x42));
        assert!(!bus.borrow().clock_high);
        assert_eq!(hx711.get_adc_bit_count(), 24);
    }

    #[derive(Debug, PartialEq)]
    struct BrokenPin;

    impl embedded_hal::digital::Error for BrokenPin {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    /// Ready, then fails on the first data bit
    struct FlakyDataPin {
        bus: SharedBus,
    }

    impl ErrorType for FlakyDataPin {
        type Error = BrokenPin;
    }

    impl InputPin for FlakyDataPin {
        fn is_high(&mut self) -> Result<bool, BrokenPin> {
            if self.bus.borrow().pulses == 0 {
                Ok(false)
            } else {
                Err(BrokenPin)
            }
        }

        fn is_low(&mut self) -> Result<bool, BrokenPin> {
            self.is_high().map(|high| !high)
        }
    }

    #[test]
    fn test_pin_error_restores_interrupts_and_clock() {
        let bus: SharedBus = Rc::new(RefCell::new(Bus::default()));
        let mut hx711 = Hx711::new(
            SimClockPin(bus.clone()),
            FlakyDataPin { bus: bus.clone() },
            SimDelay(bus.clone()),
            SimTime(bus.clone()),
            SimMask(bus.clone()),
            Hx711Gain::Gain128,
        );

        assert_eq!(hx711.read(), Err(Error::InPin(BrokenPin)));
        let bus = bus.borrow();
        assert_eq!(bus.mask_depth, 0);
        assert!(!bus.clock_high);
    }

    #[test]
    fn test_sign_extend_ignores_upper_byte() {
        assert_eq!(sign_extend_24(0xAB00_0001), 1);
        assert_eq!(sign_extend_24(0x00FF_FFFE), -2);
    }

    proptest! {
        #[test]
        fn prop_read_matches_shifted_pattern(pattern in 0u32..0x0100_0000) {
            let (mut hx711, bus) = sim_hx711(pattern, true, Hx711Gain::Gain128);
            let expected = ((pattern << 8) as i32) >> 8;
            prop_assert_eq!(hx711.read(), Ok(expected));
            prop_assert_eq!(bus.borrow().mask_depth, 0);
        }
    }
}
