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

//! Just enough HTTP/1.1 for a fire-and-forget GET.

use core::fmt::Write;
use heapless::String;

use crate::network::guard::{Completion, RequestResult};

pub const REQUEST_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequestTooLong;

pub fn format_get_request(
    address: [u8; 4],
    port: u16,
    path_and_query: &str,
) -> Result<String<REQUEST_CAPACITY>, RequestTooLong> {
    let mut request = String::new();
    let [a, b, c, d] = address;
    write!(
        request,
        "GET {path_and_query} HTTP/1.1\r\nHost: {a}.{b}.{c}.{d}:{port}\r\nConnection: close\r\n\r\n"
    )
    .map_err(|_| RequestTooLong)?;
    Ok(request)
}

/// Status code from the first line of a response, `None` if it isn't an HTTP status line.
///
/// Only the head of the response is needed, the rest of `response` is ignored.
pub fn parse_status_code(response: &[u8]) -> Option<u16> {
    let line_end = response
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(response.len());
    let line = core::str::from_utf8(&response[..line_end]).ok()?;

    let mut parts = line.split(' ');
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    let code = parts.next()?;
    if code.len() != 3 {
        return None;
    }
    code.parse().ok().filter(|code| (100..600).contains(code))
}

/// Completion for a request whose response was read to the end.
pub fn completion_from_response(head: &[u8], bytes_received: usize) -> Completion {
    match parse_status_code(head) {
        Some(status) => Completion {
            result: RequestResult::Ok,
            bytes_received,
            server_status: Some(status),
        },
        None => Completion {
            result: RequestResult::MalformedResponse,
            bytes_received,
            server_status: None,
        },
    }
}

/// Completion for a request that never got a response.
pub fn failed_completion(result: RequestResult, bytes_received: usize) -> Completion {
    Completion {
        result,
        bytes_received,
        server_status: None,
    }
}
