use accel_track_core::{
    config::MAX_TLS_CA_LEN,
    credentials::{MAX_CLIENT_ID_LEN, MAX_MQTT_CREDENTIAL_LEN, MAX_MQTT_SERVER_LEN, MAX_TOPIC_LEN},
    payload::PAYLOAD_MAX,
};

/// Current firmware version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size of the heap in DRAM, shared by esp-wifi and esp-mbedtls
pub const HEAP_SIZE: usize = 72 * 1024;

/// Size of the TCP socket receive buffer for encrypted data
pub const RX_BUFFER_SIZE: usize = 4096;
/// Size of the TCP socket transmit buffer for encrypted data
pub const TX_BUFFER_SIZE: usize = 4096;

/// Maximum size of a null-terminated PEM certificate handed to mbedtls
pub const TLS_BUFFER_MAX: usize = MAX_TLS_CA_LEN + 1;
/// Maximum size of the null-terminated broker hostname (TLS SNI)
pub const HOSTNAME_BUFFER_MAX: usize = MAX_MQTT_SERVER_LEN + 1;

/// Size of the MQTT client receive buffer for application data
pub const MQTT_RX_BUFFER_SIZE: usize = 512;
/// Size of the MQTT client transmit buffer for application data
pub const MQTT_TX_BUFFER_SIZE: usize = 512;
/// Maximum number of MQTT v5 properties per packet
pub const MQTT_MAX_PROPERTIES: usize = 5;
/// Keep-alive announced to the broker
pub const MQTT_KEEP_ALIVE_SECS: u16 = 60;
/// Ping the broker when nothing was published for this long
pub const MQTT_PING_INTERVAL_SECS: u64 = 30;

/// Samples buffered between the sampler and the publisher
pub const SAMPLE_QUEUE_DEPTH: usize = 32;

/// I2C bus frequency for the MPU-6050
pub const I2C_FREQUENCY_KHZ: u32 = 400;

/// Delay before retrying a failed WiFi association
pub const WIFI_RECONNECT_DELAY_MS: u64 = 5000;
/// Upper bound on a single WiFi association attempt
pub const WIFI_CONNECT_TIMEOUT_SECS: u64 = 20;

/// First delay after a failed broker connection
pub const BROKER_RECONNECT_INITIAL_MS: u64 = 500;
/// Longest delay between two broker connection attempts
pub const BROKER_RECONNECT_MAX_MS: u64 = 30_000;

/// TCP socket inactivity timeout
pub const SOCKET_TIMEOUT_SECS: u64 = 30;

// CONNECT carries client ID, username and password, PUBLISH carries topic and payload
const _: () =
    assert!(MQTT_TX_BUFFER_SIZE >= 32 + MAX_CLIENT_ID_LEN + 2 * MAX_MQTT_CREDENTIAL_LEN + 3 * 2);
const _: () = assert!(MQTT_TX_BUFFER_SIZE >= 32 + MAX_TOPIC_LEN + 2 + PAYLOAD_MAX);
