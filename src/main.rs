#![no_std]
#![no_main]

use static_cell::StaticCell;

use embassy_executor::Spawner;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};
use embassy_time::{Duration, Timer};

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{self as hal};
#[cfg(feature = "tls")]
use esp_mbedtls::Tls;
use esp_println::logger::init_logger;

use hal::{
    i2c::master::{BusTimeout, I2c},
    rng::Rng,
    time::Rate,
    timer::timg::TimerGroup,
};

use accel_track_core::AccelSample;

extern crate alloc;

pub mod config;
pub mod constants;
pub mod cstr;
mod mqtt;
mod publisher;
mod sampler;
pub mod sensors;
pub mod transport;
mod wifi;

use config::CONFIG;
use constants::*;
use publisher::Publisher;
use sampler::Sampler;
use sensors::mpu6050::{self, Mpu6050};
use transport::Connector;
use wifi::Wifi;

esp_bootloader_esp_idf::esp_app_desc!();

static SAMPLES: StaticCell<Channel<NoopRawMutex, AccelSample, SAMPLE_QUEUE_DEPTH>> =
    StaticCell::new();
#[cfg(feature = "tls")]
static TLS: StaticCell<Tls<'static>> = StaticCell::new();

static RX_BUF: StaticCell<[u8; RX_BUFFER_SIZE]> = StaticCell::new();
static TX_BUF: StaticCell<[u8; TX_BUFFER_SIZE]> = StaticCell::new();
static MQTT_RX_BUF: StaticCell<[u8; MQTT_RX_BUFFER_SIZE]> = StaticCell::new();
static MQTT_TX_BUF: StaticCell<[u8; MQTT_TX_BUFFER_SIZE]> = StaticCell::new();

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    init_logger(log::LevelFilter::Info);

    log::info!(
        "accel_track_and_pub {} starting as {:?}",
        VERSION,
        CONFIG.credentials.client_id
    );

    let peripherals = esp_hal::init(esp_hal::Config::default());

    let rng = Rng::new(peripherals.RNG);

    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let timg1 = TimerGroup::new(peripherals.TIMG1);

    esp_hal_embassy::init(timg0.timer0);

    // build.rs already rejects a bad cfg.toml, this guards against a stale OUT_DIR
    if let Err(e) = CONFIG.validate() {
        halt(e);
    }

    // possibly high transient required at init
    // https://github.com/esp-rs/esp-hal/issues/1626
    Timer::after(Duration::from_millis(1000)).await;

    let (sda, scl) = (peripherals.GPIO21, peripherals.GPIO22);

    let i2c_config = hal::i2c::master::Config::default()
        .with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ))
        .with_timeout(BusTimeout::BusCycles(24));

    let accelerometer = match I2c::new(peripherals.I2C0, i2c_config) {
        Ok(i2c) => {
            let i2c = i2c.with_sda(sda).with_scl(scl).into_async();
            Mpu6050::new(i2c, mpu6050::DEFAULT_ADDRESS)
                .await
                .inspect_err(|e| log::error!("MPU-6050 init failed: {:?}", e))
                .ok()
        }
        Err(e) => {
            log::error!("I2C init failed: {:?}", e);
            None
        }
    };

    let samples = SAMPLES.init(Channel::new());

    // start sampling right away, samples queue up while the network comes up
    let sampler = Sampler::new(accelerometer, samples.sender());
    if spawner.spawn(sampler::sampler_task(sampler)).is_err() {
        halt("sampler task");
    }

    let wifi = match Wifi::new(
        peripherals.WIFI,
        timg1.timer0,
        peripherals.RADIO_CLK,
        rng.clone(),
        spawner,
    )
    .await
    {
        Ok(wifi) => wifi,
        Err(e) => halt(e),
    };

    if let Err(e) = wifi.connect().await {
        halt(e);
    }

    #[cfg(feature = "tls")]
    let connector = {
        let mut tls = match Tls::new(peripherals.SHA) {
            Ok(tls) => tls.with_hardware_rsa(peripherals.RSA),
            Err(e) => halt(e),
        };
        tls.set_debug(0);

        Connector::new(wifi.stack, TLS.init(tls))
    };
    #[cfg(not(feature = "tls"))]
    let connector = Connector::new(wifi.stack);

    let connector = match connector {
        Ok(connector) => connector,
        Err(e) => halt(e),
    };

    let publisher = Publisher::new(
        connector,
        samples.receiver(),
        RX_BUF.init([0; RX_BUFFER_SIZE]),
        TX_BUF.init([0; TX_BUFFER_SIZE]),
        MQTT_RX_BUF.init([0; MQTT_RX_BUFFER_SIZE]),
        MQTT_TX_BUF.init([0; MQTT_TX_BUFFER_SIZE]),
    );

    if spawner.spawn(publisher::publisher_task(publisher)).is_err() {
        halt("publisher task");
    }
}

// Startup cannot continue, esp-backtrace prints the reason and halts
fn halt(reason: impl core::fmt::Debug) -> ! {
    log::error!("Startup failed: {:?}", reason);
    panic!("startup failed: {:?}", reason)
}
