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

//! Board-agnostic logic for the sentinel monitoring node
//!
//! Everything in here is independent of the RP2040 so it can be exercised on the host:
//!
//! - HX711 load cell driver over `embedded-hal` pins
//! - Tare / scale calibration and weight resolution
//! - Flame alarm state
//! - Debounced button wake signal and the single slot mailbox
//! - Network report guard, report and HTTP request formatting
//! - Node configuration defaults

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod alarm;
pub mod config;
pub mod hmi;
pub mod network;
pub mod sync;
pub mod weight;
