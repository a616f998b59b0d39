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

use core::cell::Cell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Single slot, last write wins. Reads never block and never wait for a writer.
pub struct Mailbox<T: Copy> {
    slot: Mutex<CriticalSectionRawMutex, Cell<Option<T>>>,
}

impl<T: Copy> Mailbox<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Replace whatever is in the slot, read or not.
    pub fn write(&self, value: T) {
        self.slot.lock(|slot| slot.set(Some(value)));
    }

    /// Latest value, left in place.
    pub fn peek(&self) -> Option<T> {
        self.slot.lock(|slot| slot.get())
    }

    /// Latest value, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        self.slot.lock(|slot| slot.take())
    }
}

impl<T: Copy> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
