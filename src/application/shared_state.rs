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

//! Everything tasks share, created once at boot and handed to each task as `&'static`.

use portable_atomic::{AtomicU8, Ordering};
use sentinel_core::config::NodeConfig;
use sentinel_core::hmi::wake::DebouncedWake;
use sentinel_core::network::guard::RequestGuard;
use sentinel_core::sync::mailbox::Mailbox;

use crate::application::messaging::ReportRequestChannel;

/// Level of the flame input when nothing is detected.
pub const FLAME_LEVEL_CLEAR: u8 = 1;

pub struct SharedState {
    pub config: NodeConfig,
    /// Display refresh counter, written every refresh and not read on any critical path.
    pub counter: Mailbox<u8>,
    /// Latest weight in grams from the weighing core.
    pub weight: Mailbox<f32>,
    pub button_wake: DebouncedWake,
    pub request_guard: RequestGuard,
    pub report_requests: ReportRequestChannel,
    flame_level: AtomicU8,
}

impl SharedState {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            counter: Mailbox::new(),
            weight: Mailbox::new(),
            button_wake: DebouncedWake::new(config.button.debounce_ms),
            request_guard: RequestGuard::new(config.reporting.watchdog_ticks),
            report_requests: ReportRequestChannel::new(),
            flame_level: AtomicU8::new(FLAME_LEVEL_CLEAR),
            config,
        }
    }

    /// Raw flame input level as last sampled by the alarm task, 0 is flame.
    pub fn flame_level(&self) -> u8 {
        self.flame_level.load(Ordering::Acquire)
    }

    pub fn flame_detected(&self) -> bool {
        self.flame_level() == 0
    }

    pub fn set_flame_level(&self, level: u8) {
        self.flame_level.store(level, Ordering::Release);
    }
}
