#![no_std]
#![no_main]

mod application;
mod config;
mod hmi;
mod led;
mod network;
mod platform;

use embassy_executor::{Executor, Spawner};
use embassy_time::{Delay, Duration};
#[allow(unused_imports)]
use {defmt_rtt as _, panic_probe as _};

use crate::application::alarm_manager::AlarmManager;
use crate::application::report_manager::ReportManager;
use crate::application::shared_state::SharedState;
use crate::application::weighing_manager::WeighingManager;
use crate::config::built_info;
use crate::hmi::display::{DisplayManager, OledStatusDisplay};
use crate::hmi::inputs::{button_edge_watcher, button_press_handler};
use crate::led::blink_forever;
use crate::network::http_client::HttpClient;
use crate::network::wifi_manager;
use crate::platform::{CoreInterruptMask, EmbassyClock};
use assign_resources::assign_resources;
use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use defmt::{info, warn};
use embassy_net::StackResources;
use embassy_rp::adc::{self, Adc};
use embassy_rp::clocks::RoscRng;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, Config};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::{DMA_CH0, I2C1, PIO0};
use embassy_rp::pio::Pio;
use embassy_rp::{bind_interrupts, peripherals, pio};
use rand_core::RngCore;
use sentinel_core::weight::interface::hx711::{Hx711, Hx711Gain};
use ssd1306::{prelude::*, I2CDisplayInterface, Ssd1306};
use static_cell::StaticCell;

assign_resources! {
    wifi: WifiResources {
        pwr_pin: PIN_23,
        cs_pin: PIN_25,
        dio_pin: PIN_24,
        clk_pin: PIN_29,
        pio: PIO0,
        dma_channel: DMA_CH0,
    },
    display_i2c: DisplayI2cPins {
        sda_pin: PIN_14,
        scl_pin: PIN_15,
        i2c_peripheral: I2C1,
    },
    hmi_inputs: HmiInputPins {
        push_btn_pin: PIN_5,
    },
    status_led: StatusLedResources {
        led_pin: PIN_11,
    },
    alarm_io: AlarmResources {
        flame_pin: PIN_20,
        buzzer_pin: PIN_21,
    },
    temperature: TemperatureResources {
        adc: ADC,
        sensor: ADC_TEMP_SENSOR,
    },
    strain_gauge_io: StrainGaugeResources {
        clk_pin: PIN_19,
        data_pin: PIN_18,
    }
}

struct Core0Resources {
    wifi: WifiResources,
    display_i2c: DisplayI2cPins,
    hmi_inputs: HmiInputPins,
    status_led: StatusLedResources,
    alarm_io: AlarmResources,
    temperature: TemperatureResources,
}

struct Core1Resources {
    strain_gauge_io: StrainGaugeResources,
}

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => pio::InterruptHandler<PIO0>;
    I2C1_IRQ => i2c::InterruptHandler<I2C1>;
    ADC_IRQ_FIFO => adc::InterruptHandler;
});

static mut CORE1_STACK: Stack<4096> = Stack::new();
static EXECUTOR0: StaticCell<Executor> = StaticCell::new();
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();
static SHARED_STATE: StaticCell<SharedState> = StaticCell::new();

#[cortex_m_rt::entry]
fn main() -> ! {
    let p = embassy_rp::init(Default::default());
    let resources = split_resources! {p};

    info!(
        "{} v{} ({})",
        built_info::PKG_NAME,
        built_info::PKG_VERSION,
        built_info::GIT_COMMIT_HASH_SHORT.unwrap_or("unknown")
    );

    let shared: &'static SharedState = SHARED_STATE.init(SharedState::new(config::node_config()));

    let core0_resources = Core0Resources {
        wifi: resources.wifi,
        display_i2c: resources.display_i2c,
        hmi_inputs: resources.hmi_inputs,
        status_led: resources.status_led,
        alarm_io: resources.alarm_io,
        temperature: resources.temperature,
    };
    let core1_resources = Core1Resources { strain_gauge_io: resources.strain_gauge_io };

    warn!("Launching application across cores");

    spawn_core1(
        p.CORE1,
        unsafe { &mut *core::ptr::addr_of_mut!(CORE1_STACK) },
        move || {
            let executor1 = EXECUTOR1.init(Executor::new());
            executor1.run(|spawner| core1_main(spawner, core1_resources, shared));
        },
    );

    let executor0 = EXECUTOR0.init(Executor::new());
    executor0.run(|spawner| core0_main(spawner, core0_resources, shared));
}

fn core0_main(spawner: Spawner, resources: Core0Resources, shared: &'static SharedState) {
    spawner.spawn(display_task(resources.display_i2c, shared)).unwrap();
    spawner.spawn(alarm_task(resources.alarm_io, shared)).unwrap();
    spawner.spawn(button_edge_task(resources.hmi_inputs, shared)).unwrap();
    spawner.spawn(button_handler_task(shared)).unwrap();
    spawner.spawn(status_led_task(resources.status_led)).unwrap();
    spawner.spawn(network_task(resources.wifi, resources.temperature, shared)).unwrap();
}

fn core1_main(spawner: Spawner, resources: Core1Resources, shared: &'static SharedState) {
    spawner.spawn(weighing_task(resources.strain_gauge_io, shared)).unwrap();
}

#[embassy_executor::task]
async fn weighing_task(strain_gauge_resources: StrainGaugeResources, shared: &'static SharedState) {
    let clk_pin_out = Output::new(strain_gauge_resources.clk_pin, Level::Low);
    let data_pin = Input::new(strain_gauge_resources.data_pin, Pull::Up);
    let strain_gauge = Hx711::new(
        clk_pin_out,
        data_pin,
        Delay,
        EmbassyClock,
        CoreInterruptMask,
        Hx711Gain::Gain128,
    );

    WeighingManager::new(strain_gauge, Delay, shared).run().await;
}

#[embassy_executor::task]
async fn display_task(display_i2c_pins: DisplayI2cPins, shared: &'static SharedState) {
    let mut i2c_config = Config::default();
    i2c_config.frequency = 400_000;
    let i2c = i2c::I2c::new_async(
        display_i2c_pins.i2c_peripheral,
        display_i2c_pins.scl_pin,
        display_i2c_pins.sda_pin,
        Irqs,
        i2c_config,
    );

    let panel = Ssd1306::new(I2CDisplayInterface::new(i2c), DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    let display = OledStatusDisplay::new(panel);

    DisplayManager::new(display, shared).run().await;
}

#[embassy_executor::task]
async fn alarm_task(alarm_resources: AlarmResources, shared: &'static SharedState) {
    let flame_input = Input::new(alarm_resources.flame_pin, Pull::Up);
    let buzzer = Output::new(alarm_resources.buzzer_pin, Level::Low);

    AlarmManager::new(flame_input, buzzer, shared).run().await;
}

#[embassy_executor::task]
async fn button_edge_task(hmi_input_pins: HmiInputPins, shared: &'static SharedState) {
    let button = Input::new(hmi_input_pins.push_btn_pin, Pull::Up);
    button_edge_watcher(button, &shared.button_wake).await;
}

#[embassy_executor::task]
async fn button_handler_task(shared: &'static SharedState) {
    button_press_handler(&shared.button_wake, shared.config.button.hold_off_ms).await;
}

#[embassy_executor::task]
async fn status_led_task(status_led_resources: StatusLedResources) {
    let led = Output::new(status_led_resources.led_pin, Level::Low);
    blink_forever(led, Duration::from_millis(200)).await;
}

#[embassy_executor::task]
async fn cyw43_task(runner: cyw43::Runner<'static, Output<'static>, PioSpi<'static, PIO0, 0, DMA_CH0>>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn report_task(mut report_manager: ReportManager<'static, embassy_net::Stack<'static>>) {
    report_manager.run().await;
}

#[embassy_executor::task]
async fn http_client_task(stack: embassy_net::Stack<'static>, shared: &'static SharedState) {
    HttpClient::new(stack, shared).run().await;
}

/// Brings up the radio and network stack, starts the tasks that depend on it, then manages the link.
#[embassy_executor::task]
async fn network_task(wifi: WifiResources, temperature: TemperatureResources, shared: &'static SharedState) {
    let spawner = Spawner::for_current_executor().await;

    let fw = include_bytes!("../cyw43-firmware/43439A0.bin");
    let clm = include_bytes!("../cyw43-firmware/43439A0_clm.bin");

    let pwr = Output::new(wifi.pwr_pin, Level::Low);
    let cs = Output::new(wifi.cs_pin, Level::High);
    let mut pio = Pio::new(wifi.pio, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        wifi.dio_pin,
        wifi.clk_pin,
        wifi.dma_channel,
    );

    static CYW43_STATE: StaticCell<cyw43::State> = StaticCell::new();
    let (net_device, mut control, runner) = cyw43::new(CYW43_STATE.init(cyw43::State::new()), pwr, spi, fw).await;
    spawner.spawn(cyw43_task(runner)).unwrap();

    control.init(clm).await;
    control.set_power_management(cyw43::PowerManagementMode::PowerSave).await;

    static NET_RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();
    let (stack, net_runner) = embassy_net::new(
        net_device,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::new()),
        RoscRng.next_u64(),
    );
    spawner.spawn(net_task(net_runner)).unwrap();

    let adc = Adc::new(temperature.adc, Irqs, adc::Config::default());
    let temperature_channel = adc::Channel::new_temp_sensor(temperature.sensor);
    spawner
        .spawn(report_task(ReportManager::new(adc, temperature_channel, stack, shared)))
        .unwrap();
    spawner.spawn(http_client_task(stack, shared)).unwrap();

    wifi_manager(control, stack, config::WIFI_SSID, config::WIFI_PASSWORD).await;
}
