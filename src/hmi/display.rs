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

use defmt::{error, warn};
use embassy_time::{Duration, Ticker};
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::Point;
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::text::{Baseline, Text};
use embedded_graphics::Drawable;
use sentinel_core::hmi::status::{render_status, NodeStatus, RefreshCounter, StatusDisplay};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::Ssd1306;

use crate::application::shared_state::SharedState;

const SMALL_TEXT_STYLE: MonoTextStyle<BinaryColor> = MonoTextStyleBuilder::new()
    .font(&FONT_6X10)
    .text_color(BinaryColor::On)
    .build();
const LARGE_TEXT_STYLE: MonoTextStyle<BinaryColor> = MonoTextStyleBuilder::new()
    .font(&FONT_10X20)
    .text_color(BinaryColor::On)
    .build();

/// Buffered SSD1306 panel as a status surface.
pub struct OledStatusDisplay<DI, SIZE>
where
    DI: WriteOnlyDataCommand,
    SIZE: DisplaySize,
{
    display: Ssd1306<DI, SIZE, BufferedGraphicsMode<SIZE>>,
}

impl<DI, SIZE> OledStatusDisplay<DI, SIZE>
where
    DI: WriteOnlyDataCommand,
    SIZE: DisplaySize,
{
    pub fn new(mut display: Ssd1306<DI, SIZE, BufferedGraphicsMode<SIZE>>) -> Self {
        let _ = display.init().map_err(|_| error!("Failed to init display"));
        Self { display }
    }
}

impl<DI, SIZE> StatusDisplay for OledStatusDisplay<DI, SIZE>
where
    DI: WriteOnlyDataCommand,
    SIZE: DisplaySize,
{
    type Error = <Ssd1306<DI, SIZE, BufferedGraphicsMode<SIZE>> as DrawTarget>::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.display.clear_buffer();
        Ok(())
    }

    fn draw_text(&mut self, x: i32, y: i32, scale: u8, text: &str) -> Result<(), Self::Error> {
        let style = if scale >= 2 { LARGE_TEXT_STYLE } else { SMALL_TEXT_STYLE };
        Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(&mut self.display)?;
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.display.flush()
    }
}

/// Redraws the status screen every refresh period and publishes the refresh counter.
pub struct DisplayManager<SD> {
    display: SD,
    counter: RefreshCounter,
    shared: &'static SharedState,
}

impl<SD> DisplayManager<SD>
where
    SD: StatusDisplay,
{
    pub fn new(display: SD, shared: &'static SharedState) -> Self {
        Self {
            display,
            counter: RefreshCounter::new(shared.config.display.counter_wrap),
            shared,
        }
    }

    pub async fn run(&mut self) -> ! {
        let mut periodic_timer = Ticker::every(Duration::from_millis(self.shared.config.display.refresh_period_ms));
        loop {
            let status = NodeStatus {
                counter: self.counter.advance(),
                flame_detected: self.shared.flame_detected(),
                weight_grams: self.shared.weight.peek(),
            };
            if render_status(&mut self.display, &status).is_err() {
                warn!("Display update failed");
            }
            self.shared.counter.write(status.counter);

            periodic_timer.next().await;
        }
    }
}
