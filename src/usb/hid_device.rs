//! USB vendor HID device on the STM32F103 full-speed peripheral.
//!
//! Initialises the Embassy USB stack and exposes one HID interface
//! with the pendant's input/feature report pair. Host feature reports
//! arrive in the control callback and are queued for the main loop;
//! input reports flow the other way through an embassy-sync channel so
//! the synchronous builder never blocks on the bus.

use crate::config::{
    self, CHUNK_LEN, FEATURE_REPORT_ID, IN_REPORT_LEN, RX_RING_SLOTS, USB_HID_POLL_MS,
};
use crate::usb::outbound::{ReportSink, SendError};
use crate::usb::queue::InboundQueue;
use defmt::{info, warn};
use embassy_stm32::usb::{Driver, InterruptHandler};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_usb::class::hid::{Config as HidConfig, HidWriter, ReportId, RequestHandler, State};
use embassy_usb::control::OutResponse;
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    USB_LP_CAN1_RX0 => InterruptHandler<peripherals::USB>;
});

/// Vendor-defined HID report descriptor: 5-byte input report ID 0x04,
/// 7-byte feature report ID 0x06 (lengths exclude the ID byte).
pub const PENDANT_REPORT_DESCRIPTOR: &[u8] = &[
    0x06, 0x00, 0xFF, // Usage Page (Vendor Defined 0xFF00)
    0x09, 0x01, //       Usage (Vendor Usage 1)
    0xA1, 0x01, //       Collection (Application)
    0x15, 0x00, //         Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x75, 0x08, //         Report Size (8)
    0x85, 0x04, //         Report ID (4)
    0x09, 0x02, //         Usage (Vendor Usage 2)
    0x95, 0x05, //         Report Count (5)
    0x81, 0x02, //         Input (Data, Var, Abs)
    0x85, 0x06, //         Report ID (6)
    0x09, 0x03, //         Usage (Vendor Usage 3)
    0x95, 0x07, //         Report Count (7)
    0xB1, 0x02, //         Feature (Data, Var, Abs)
    0xC0, //             End Collection
];

static HID_STATE: StaticCell<State> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 64]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static REQUEST_HANDLER: StaticCell<InboundHandler> = StaticCell::new();

/// Host -> device report ring, shared between the USB control callback
/// (producer) and the main loop (consumer).
static INBOUND: InboundQueue<RX_RING_SLOTS> = InboundQueue::new();

/// Device -> host report channel feeding the HID writer task.
static REPORTS: Channel<CriticalSectionRawMutex, [u8; IN_REPORT_LEN], 4> = Channel::new();

/// The inbound report ring. Pop from the main loop only.
pub fn inbound() -> &'static InboundQueue<RX_RING_SLOTS> {
    &INBOUND
}

struct InboundHandler;

impl RequestHandler for InboundHandler {
    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        let ReportId::Feature(FEATURE_REPORT_ID) = id else {
            return OutResponse::Rejected;
        };
        if data.len() < CHUNK_LEN {
            return OutResponse::Rejected;
        }

        // Re-prefix the ID byte the control transfer strips, so queued
        // items look the same as the wire format the decoder expects.
        let mut item = [0u8; 1 + CHUNK_LEN];
        item[0] = FEATURE_REPORT_ID;
        item[1..].copy_from_slice(&data[..CHUNK_LEN]);
        if !INBOUND.push(&item) {
            warn!("inbound ring full, report dropped ({} total)", INBOUND.dropped());
        }
        OutResponse::Accepted
    }
}

/// Non-blocking [`ReportSink`] over the report channel; the writer
/// task on the other end owns the actual endpoint.
pub struct ChannelSink {
    tx: Sender<'static, CriticalSectionRawMutex, [u8; IN_REPORT_LEN], 4>,
}

impl ChannelSink {
    pub fn new() -> Self {
        Self {
            tx: REPORTS.sender(),
        }
    }
}

impl Default for ChannelSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSink for ChannelSink {
    fn ready(&self) -> bool {
        !self.tx.is_full()
    }

    fn send(&mut self, report: &[u8; IN_REPORT_LEN]) -> Result<(), SendError> {
        self.tx.try_send(*report).map_err(|_| SendError::Busy)
    }
}

/// Build result: the USB runner plus the HID input endpoint writer.
pub struct UsbHidDevice {
    pub device: UsbDevice<'static, Driver<'static, peripherals::USB>>,
    pub writer: HidWriter<'static, Driver<'static, peripherals::USB>, 8>,
}

/// Initialise the USB stack. Must be called exactly once; all static
/// buffers are consumed here.
pub fn init(
    usb: peripherals::USB,
    dp: peripherals::PA12,
    dm: peripherals::PA11,
) -> UsbHidDevice {
    let driver = Driver::new(usb, Irqs, dp, dm);

    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100; // mA
    usb_config.max_packet_size_0 = 64;

    let config_desc = USB_CONFIG_DESC.init([0u8; 256]);
    let bos_desc = USB_BOS_DESC.init([0u8; 256]);
    let msos_desc = USB_MSOS_DESC.init([0u8; 64]);
    let ctrl_buf = USB_CTRL_BUF.init([0u8; 64]);

    let mut builder = Builder::new(
        driver,
        usb_config,
        config_desc,
        bos_desc,
        msos_desc,
        ctrl_buf,
    );

    let hid_state = HID_STATE.init(State::new());
    let handler = REQUEST_HANDLER.init(InboundHandler);
    let hid_config = HidConfig {
        report_descriptor: PENDANT_REPORT_DESCRIPTOR,
        request_handler: Some(handler),
        poll_ms: USB_HID_POLL_MS,
        max_packet_size: 8,
    };
    let writer = HidWriter::new(&mut builder, hid_state, hid_config);

    let device = builder.build();

    info!("USB vendor HID device initialised");

    UsbHidDevice { device, writer }
}

/// Run the USB device stack - must be spawned as a dedicated task.
pub async fn run_usb_device(
    mut device: UsbDevice<'static, Driver<'static, peripherals::USB>>,
) -> ! {
    info!("USB device task started");
    device.run().await
}

/// Drain the report channel onto the HID input endpoint.
pub async fn hid_writer_task(
    mut writer: HidWriter<'static, Driver<'static, peripherals::USB>, 8>,
) -> ! {
    let rx: Receiver<'static, CriticalSectionRawMutex, [u8; IN_REPORT_LEN], 4> = REPORTS.receiver();

    loop {
        let report = rx.receive().await;
        if writer.write(&report).await.is_err() {
            warn!("USB input report write failed");
        }
    }
}
