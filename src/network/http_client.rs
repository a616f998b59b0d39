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

use defmt::{debug, warn};
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Stack};
use embassy_time::{with_timeout, Duration};
use embedded_io_async::Write;
use sentinel_core::network::guard::{Completion, RequestResult};
use sentinel_core::network::http::{completion_from_response, failed_completion, format_get_request};

use crate::application::messaging::ReportRequest;
use crate::application::shared_state::SharedState;

const RX_BUFFER_SIZE: usize = 1024;
const TX_BUFFER_SIZE: usize = 512;
/// Enough of the response to hold the status line.
const HEAD_SIZE: usize = 32;
const LINGER_TIMEOUT: Duration = Duration::from_millis(500);

/// Performs each report request and hands the outcome back to the request guard.
pub struct HttpClient {
    stack: Stack<'static>,
    shared: &'static SharedState,
    rx_buffer: [u8; RX_BUFFER_SIZE],
    tx_buffer: [u8; TX_BUFFER_SIZE],
}

impl HttpClient {
    pub fn new(stack: Stack<'static>, shared: &'static SharedState) -> Self {
        Self {
            stack,
            shared,
            rx_buffer: [0; RX_BUFFER_SIZE],
            tx_buffer: [0; TX_BUFFER_SIZE],
        }
    }

    pub async fn run(&mut self) -> ! {
        let shared = self.shared;
        let receiver = shared.report_requests.receiver();
        let timeout = Duration::from_millis(shared.config.reporting.request_timeout_ms);
        loop {
            let request = receiver.receive().await;

            let mut socket = TcpSocket::new(self.stack, &mut self.rx_buffer, &mut self.tx_buffer);
            let completion = match with_timeout(timeout, exchange(&mut socket, &request)).await {
                Ok(completion) => completion,
                Err(_) => failed_completion(RequestResult::Timeout, 0),
            };

            if completion.result.ends_gracefully() {
                socket.close();
            } else {
                socket.abort();
            }
            // let the FIN or RST go out before the socket is dropped
            if let Err(e) = with_timeout(LINGER_TIMEOUT, socket.flush()).await.unwrap_or(Ok(())) {
                debug!("HTTP: flush on close failed ({})", e);
            }

            shared.request_guard.complete(request.ticket, &completion);
        }
    }
}

async fn exchange(socket: &mut TcpSocket<'_>, request: &ReportRequest) -> Completion {
    debug!("HTTP: GET {}", request.path_and_query.as_str());
    let [a, b, c, d] = request.address;
    let remote = (IpAddress::v4(a, b, c, d), request.port);

    if let Err(e) = socket.connect(remote).await {
        warn!("HTTP: connection to server failed ({})", e);
        return failed_completion(RequestResult::ConnectFailed, 0);
    }

    let Ok(head) = format_get_request(request.address, request.port, &request.path_and_query) else {
        return failed_completion(RequestResult::Io, 0);
    };
    if let Err(e) = socket.write_all(head.as_bytes()).await {
        warn!("HTTP: write failed ({})", e);
        return failed_completion(RequestResult::Io, 0);
    }

    let mut response_head = [0u8; HEAD_SIZE];
    let mut head_len = 0;
    let mut bytes_received = 0;
    let mut chunk = [0u8; 128];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let copy = n.min(HEAD_SIZE - head_len);
                response_head[head_len..head_len + copy].copy_from_slice(&chunk[..copy]);
                head_len += copy;
                bytes_received += n;
            }
            Err(e) => {
                warn!("HTTP: read failed ({})", e);
                return failed_completion(RequestResult::Io, bytes_received);
            }
        }
    }

    completion_from_response(&response_head[..head_len], bytes_received)
}
