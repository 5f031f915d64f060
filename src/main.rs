//! Pendant firmware entry point for the STM32F103 (Blue Pill pinout).
//!
//! Wires the host-testable state machines from the library to the real
//! peripherals: GPIO matrix and selector, TIM2 in quadrature mode for
//! the handwheel, SPI1 for the ST7735 panel, and the USB device
//! peripheral. Everything input-side runs on a single 1 ms tick; the
//! USB stack and the HID writer run as their own tasks.

#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Input, Level, Output, OutputOpenDrain, Pull, Speed};
use embassy_stm32::peripherals;
use embassy_stm32::spi::{Config as SpiConfig, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::qei::{Qei, QeiPin};
use embassy_stm32::usb::Driver;
use embassy_time::{Delay, Duration, Instant, Ticker};
use embassy_usb::UsbDevice;
use embedded_hal_bus::spi::ExclusiveDevice;
use panic_probe as _;
use st7735_lcd::{Orientation, ST7735};

use hb04_pendant::config::{MATRIX_COLS, MATRIX_ROWS, RX_ITEM_MAX};
use hb04_pendant::io::hal::{EncoderCounter, MatrixPins, RotaryPins};
use hb04_pendant::io::{EncoderWheel, KeypadScanner, RotaryCode, RotaryDebouncer};
use hb04_pendant::screen::panel::Panel;
use hb04_pendant::screen::RenderMux;
use hb04_pendant::usb::hid_device::{self, ChannelSink};
use hb04_pendant::usb::outbound::ReportBuilder;
use hb04_pendant::usb::queue::Pop;

/// Keypad matrix GPIO: open-drain rows, pulled-up columns.
struct MatrixGpio {
    rows: [OutputOpenDrain<'static>; MATRIX_ROWS],
    cols: [Input<'static>; MATRIX_COLS],
}

impl MatrixPins for MatrixGpio {
    fn drive_row(&mut self, row: usize) {
        self.rows[row].set_low();
    }

    fn release_row(&mut self, row: usize) {
        self.rows[row].set_high();
    }

    fn col_active(&self, col: usize) -> bool {
        self.cols[col].is_low()
    }
}

/// Axis selector GPIO: six pulled-up inputs, the wiper grounds one.
struct RotaryGpio {
    positions: [Input<'static>; 6],
}

impl RotaryPins for RotaryGpio {
    fn position_active(&self, idx: usize) -> bool {
        self.positions[idx].is_low()
    }
}

/// TIM2 counting quadrature edges from the handwheel.
struct HandwheelCounter {
    qei: Qei<'static, peripherals::TIM2>,
}

impl EncoderCounter for HandwheelCounter {
    fn count(&self) -> u16 {
        self.qei.count()
    }
}

#[embassy_executor::task]
async fn usb_task(device: UsbDevice<'static, Driver<'static, peripherals::USB>>) -> ! {
    hid_device::run_usb_device(device).await
}

#[embassy_executor::task]
async fn writer_task(
    writer: embassy_usb::class::hid::HidWriter<'static, Driver<'static, peripherals::USB>, 8>,
) -> ! {
    hid_device::hid_writer_task(writer).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 8 MHz HSE * 9 = 72 MHz sysclk, 48 MHz USB clock.
    let mut config = embassy_stm32::Config::default();
    {
        use embassy_stm32::rcc::*;
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll = Some(Pll {
            src: PllSource::HSE,
            prediv: PllPreDiv::DIV1,
            mul: PllMul::MUL9,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV2;
        config.rcc.apb2_pre = APBPrescaler::DIV1;
    }
    let p = embassy_stm32::init(config);
    info!("pendant booting");

    let mut matrix = MatrixGpio {
        rows: [
            OutputOpenDrain::new(p.PB5, Level::High, Speed::Low),
            OutputOpenDrain::new(p.PB7, Level::High, Speed::Low),
            OutputOpenDrain::new(p.PB8, Level::High, Speed::Low),
            OutputOpenDrain::new(p.PB9, Level::High, Speed::Low),
        ],
        cols: [
            Input::new(p.PB12, Pull::Up),
            Input::new(p.PB13, Pull::Up),
            Input::new(p.PB14, Pull::Up),
            Input::new(p.PB15, Pull::Up),
        ],
    };

    let selector = RotaryGpio {
        positions: [
            Input::new(p.PA8, Pull::Up),
            Input::new(p.PA9, Pull::Up),
            Input::new(p.PA10, Pull::Up),
            Input::new(p.PB10, Pull::Up),
            Input::new(p.PB11, Pull::Up),
            Input::new(p.PB1, Pull::Up),
        ],
    };

    let counter = HandwheelCounter {
        qei: Qei::new(
            p.TIM2,
            QeiPin::new_ch1(p.PA0),
            QeiPin::new_ch2(p.PA1),
        ),
    };

    // ST7735 over SPI1, 160x128 landscape.
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = Hertz(18_000_000);
    let spi = Spi::new_blocking_txonly(p.SPI1, p.PA5, p.PA7, spi_config);
    let cs = Output::new(p.PA4, Level::High, Speed::VeryHigh);
    let dc = Output::new(p.PB0, Level::Low, Speed::VeryHigh);
    let rst = Output::new(p.PB6, Level::High, Speed::VeryHigh);
    // CS is a plain GPIO here, setting it cannot fail.
    let spi_dev = ExclusiveDevice::new_no_delay(spi, cs).unwrap();
    let mut lcd = ST7735::new(spi_dev, dc, rst, false, false, 160, 128);
    let _ = lcd.init(&mut Delay);
    let _ = lcd.set_orientation(&Orientation::Landscape);
    let mut panel = Panel::new(lcd);
    panel.clear();

    let usb = hid_device::init(p.USB, p.PA12, p.PA11);
    spawner.must_spawn(usb_task(usb.device));
    spawner.must_spawn(writer_task(usb.writer));

    let inbound = hid_device::inbound();
    let mut scanner = KeypadScanner::new();
    let mut selector_deb = RotaryDebouncer::new();
    let mut wheel = EncoderWheel::new(&counter);
    let mut builder = ReportBuilder::new();
    let mut sink = ChannelSink::new();
    let mut mux = RenderMux::new();
    let mut rx = [0u8; RX_ITEM_MAX];

    info!("entering scan loop");
    let mut ticker = Ticker::every(Duration::from_millis(1));
    loop {
        ticker.next().await;
        let now_ms = Instant::now().as_millis() as u32;

        scanner.tick(&mut matrix);
        let axis = selector_deb.read(&selector, now_ms);

        // Off discards wheel motion instead of banking it, so turning
        // the selector back on cannot replay a stale burst.
        if axis == RotaryCode::Off {
            wheel.resync(&counter);
        } else {
            builder.add_motion(wheel.read_detents(&counter));
        }

        loop {
            match inbound.try_pop(&mut rx) {
                Pop::Popped(n) => {
                    if let Some(frame) = mux.ingest(&rx[..n], now_ms) {
                        builder.set_day(frame.day);
                    }
                }
                // rx is sized to the queue's item maximum, so TooSmall
                // cannot occur; treat it like Empty rather than spin.
                Pop::Empty | Pop::TooSmall { .. } => break,
            }
        }

        builder.tick(scanner.fetch(), axis, &mut sink);
        mux.render(&mut panel, axis, now_ms);
    }
}
