pub use accel_track_core::{Config, Credentials, PayloadFormat};

// config values are generated at compile time from cfg.toml
include!(concat!(env!("OUT_DIR"), "/config.rs"));

/// Payload encoding selected by the `json` / `influx` cargo features.
pub const PAYLOAD_FORMAT: PayloadFormat = if cfg!(feature = "influx") {
    PayloadFormat::Influx
} else {
    PayloadFormat::Json
};
