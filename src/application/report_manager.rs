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

use defmt::{debug, info, warn};
use embassy_rp::adc::{self, Adc, Async};
use embassy_time::{Duration, Ticker};
use sentinel_core::hmi::status::format_decimal;
use sentinel_core::network::guard::{RequestTicket, TickOutcome};
use sentinel_core::network::report::{die_temperature_celsius, Report};

use crate::application::messaging::ReportRequest;
use crate::application::shared_state::SharedState;

/// Something that can tell whether the network is usable right now.
pub trait LinkStatus {
    fn is_up(&self) -> bool;
}

impl LinkStatus for embassy_net::Stack<'static> {
    fn is_up(&self) -> bool {
        self.is_link_up() && self.is_config_up()
    }
}

/// Samples temperature and flame every period and hands one report at a time to the HTTP client.
pub struct ReportManager<'d, L> {
    adc: Adc<'d, Async>,
    temperature_channel: adc::Channel<'d>,
    link: L,
    shared: &'static SharedState,
}

impl<'d, L> ReportManager<'d, L>
where
    L: LinkStatus,
{
    pub fn new(adc: Adc<'d, Async>, temperature_channel: adc::Channel<'d>, link: L, shared: &'static SharedState) -> Self {
        Self {
            adc,
            temperature_channel,
            link,
            shared,
        }
    }

    pub async fn run(&mut self) -> ! {
        let shared = self.shared;
        let guard = &shared.request_guard;
        let mut periodic_timer = Ticker::every(Duration::from_millis(shared.config.reporting.period_ms));
        loop {
            periodic_timer.next().await;

            match guard.on_tick(self.link.is_up()) {
                TickOutcome::LinkDown => debug!("Link down, report skipped"),
                TickOutcome::Waiting { missed } => debug!("Previous report still in flight ({} ticks)", missed),
                TickOutcome::Recovered => warn!("No completion for the last report, giving up on it"),
                TickOutcome::Dispatch(ticket) => {
                    let Some(request) = self.build_request(ticket).await else {
                        guard.dispatch_failed(ticket);
                        continue;
                    };
                    info!(
                        "HTTP: connecting to {}.{}.{}.{}:{}",
                        request.address[0], request.address[1], request.address[2], request.address[3], request.port
                    );
                    if shared.report_requests.try_send(request).is_err() {
                        warn!("HTTP client busy, report dropped");
                        guard.dispatch_failed(ticket);
                    }
                }
            }
        }
    }

    async fn build_request(&mut self, ticket: RequestTicket) -> Option<ReportRequest> {
        let raw = match self.adc.read(&mut self.temperature_channel).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Temperature read failed: {}", e);
                return None;
            }
        };
        let temperature_celsius = die_temperature_celsius(raw);
        debug!("Temperature: {} C", format_decimal::<16>(temperature_celsius, 2).as_str());

        let reporting = &self.shared.config.reporting;
        let report = Report {
            temperature_celsius,
            flame_level: self.shared.flame_level(),
            device_id: reporting.device_id,
        };
        let path_and_query = match report.path_and_query() {
            Ok(path) => path,
            Err(e) => {
                warn!("Report does not fit: {}", e);
                return None;
            }
        };

        Some(ReportRequest {
            ticket,
            address: reporting.server_address,
            port: reporting.server_port,
            path_and_query,
        })
    }
}
