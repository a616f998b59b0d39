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

use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

/// Accepts an edge only if the previous accepted edge is at least `window_ms` old.
#[derive(Clone, Copy, Debug)]
pub struct EdgeDebouncer {
    window_ms: u32,
    last_accepted_ms: Option<u32>,
}

impl EdgeDebouncer {
    pub const fn new(window_ms: u32) -> Self {
        Self {
            window_ms,
            last_accepted_ms: None,
        }
    }

    /// `now_ms` is a free running millisecond counter, wrap around is fine.
    pub fn accept(&mut self, now_ms: u32) -> bool {
        match self.last_accepted_ms {
            Some(last) if now_ms.wrapping_sub(last) < self.window_ms => false,
            _ => {
                self.last_accepted_ms = Some(now_ms);
                true
            }
        }
    }
}

/// Binary wake signal fed by a debounced edge source.
///
/// The edge side never blocks or allocates. Exactly one task should wait on it; presses that
/// arrive while nobody is waiting collapse into one.
pub struct DebouncedWake {
    debouncer: Mutex<CriticalSectionRawMutex, RefCell<EdgeDebouncer>>,
    signal: Signal<CriticalSectionRawMutex, ()>,
}

impl DebouncedWake {
    pub const fn new(window_ms: u32) -> Self {
        Self {
            debouncer: Mutex::new(RefCell::new(EdgeDebouncer::new(window_ms))),
            signal: Signal::new(),
        }
    }

    /// Report an edge. Returns true if it raised the wake signal.
    pub fn on_edge(&self, now_ms: u32) -> bool {
        let accepted = self.debouncer.lock(|debouncer| debouncer.borrow_mut().accept(now_ms));
        if accepted {
            self.signal.signal(());
        }
        accepted
    }

    pub async fn wait(&self) {
        self.signal.wait().await
    }

    /// Consume a pending wake without waiting.
    pub fn try_take(&self) -> bool {
        self.signal.try_take().is_some()
    }
}
