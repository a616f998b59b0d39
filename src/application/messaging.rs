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

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use heapless::String;
use sentinel_core::network::guard::RequestTicket;
use sentinel_core::network::report::PATH_CAPACITY;

/// One report handed from the reporting task to the HTTP client.
pub struct ReportRequest {
    pub ticket: RequestTicket,
    pub address: [u8; 4],
    pub port: u16,
    pub path_and_query: String<PATH_CAPACITY>,
}

// a single request may be outstanding, anything more is a dispatch failure
const CHANNEL_DEPTH: usize = 1;

pub type ReportRequestChannel = Channel<CriticalSectionRawMutex, ReportRequest, CHANNEL_DEPTH>;
pub type ReportRequestSender<'a> = Sender<'a, CriticalSectionRawMutex, ReportRequest, CHANNEL_DEPTH>;
pub type ReportRequestReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, ReportRequest, CHANNEL_DEPTH>;
