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

//! Guard around the one outstanding report request.
//!
//! The reporting task ticks the guard every period. While a request is in flight further ticks
//! count as missed, and once more than `watchdog_ticks` have been missed the guard gives up on the
//! request and goes back to idle. The request itself is never cancelled, so its completion may
//! still turn up later; every dispatch carries a generation number so such late completions are
//! recognised and dropped.

use portable_atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Issued for each dispatched request. Hand it back on completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequestTicket {
    generation: u32,
}

impl RequestTicket {
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// No link, nothing done.
    LinkDown,
    /// The flag is now set, send the request.
    Dispatch(RequestTicket),
    /// Still waiting on the previous request.
    Waiting { missed: u8 },
    /// The previous request was abandoned and the flag cleared. Nothing is sent this tick.
    Recovered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GuardState {
    Idle,
    InFlight,
    TimedOutRecovering,
}

/// How a request ended, as seen by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestResult {
    Ok,
    ConnectFailed,
    Timeout,
    Io,
    /// The response did not start with a valid status line.
    MalformedResponse,
}

impl RequestResult {
    /// Whether the server finished its side, so the connection can be closed rather than reset.
    pub fn ends_gracefully(&self) -> bool {
        matches!(self, RequestResult::Ok | RequestResult::MalformedResponse)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Completion {
    pub result: RequestResult,
    pub bytes_received: usize,
    pub server_status: Option<u16>,
}

pub struct RequestGuard {
    in_flight: AtomicBool,
    missed_ticks: AtomicU8,
    generation: AtomicU32,
    watchdog_ticks: u8,
}

impl RequestGuard {
    pub const fn new(watchdog_ticks: u8) -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            missed_ticks: AtomicU8::new(0),
            generation: AtomicU32::new(0),
            watchdog_ticks,
        }
    }

    /// Called by the reporting task on each period.
    pub fn on_tick(&self, link_up: bool) -> TickOutcome {
        if !link_up {
            return TickOutcome::LinkDown;
        }

        if self.in_flight.load(Ordering::Acquire) {
            let missed = self.missed_ticks.load(Ordering::Acquire).saturating_add(1);
            if missed > self.watchdog_ticks {
                self.missed_ticks.store(0, Ordering::Release);
                self.in_flight.store(false, Ordering::Release);
                return TickOutcome::Recovered;
            }
            self.missed_ticks.store(missed, Ordering::Release);
            return TickOutcome::Waiting { missed };
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
        self.missed_ticks.store(0, Ordering::Release);
        self.in_flight.store(true, Ordering::Release);
        TickOutcome::Dispatch(RequestTicket { generation })
    }

    /// The request could not even be started.
    pub fn dispatch_failed(&self, ticket: RequestTicket) {
        self.clear_if_current(ticket);
    }

    /// Report the end of a request. Returns false if the ticket had already been abandoned.
    pub fn complete(&self, ticket: RequestTicket, completion: &Completion) -> bool {
        let current = self.clear_if_current(ticket);
        if current {
            match completion.result {
                RequestResult::Ok => info!(
                    "HTTP request {} done, status {}, {} bytes",
                    ticket.generation,
                    completion.server_status,
                    completion.bytes_received
                ),
                _ => warn!("HTTP request {} failed: {}", ticket.generation, completion.result),
            }
        } else {
            debug!("Ignoring late completion for request {}", ticket.generation);
        }
        current
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn missed_ticks(&self) -> u8 {
        self.missed_ticks.load(Ordering::Acquire)
    }

    pub fn state(&self) -> GuardState {
        match (self.is_in_flight(), self.missed_ticks()) {
            (false, _) => GuardState::Idle,
            (true, 0) => GuardState::InFlight,
            (true, _) => GuardState::TimedOutRecovering,
        }
    }

    /// A ticket is only current while its request is in flight, so one abandoned by the watchdog
    /// stays abandoned even before the next dispatch.
    fn clear_if_current(&self, ticket: RequestTicket) -> bool {
        if !self.in_flight.load(Ordering::Acquire) || self.generation.load(Ordering::Acquire) != ticket.generation {
            return false;
        }
        self.missed_ticks.store(0, Ordering::Release);
        self.in_flight.store(false, Ordering::Release);
        true
    }
}
