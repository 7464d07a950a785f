//! Hardware-independent pieces of the `accel_track_and_pub` firmware.
//!
//! Everything here builds for the host as well as for the ESP32, so the
//! build script can validate `cfg.toml` with the same rules the firmware
//! re-checks at startup.

#![cfg_attr(not(test), no_std)]

pub mod backoff;
pub mod config;
pub mod credentials;
pub mod outbox;
pub mod payload;
pub mod sample;

pub use backoff::Backoff;
pub use config::{Config, ConfigError};
pub use credentials::{CredentialError, Credentials, Field};
pub use outbox::Outbox;
pub use payload::{Payload, PayloadFormat};
pub use sample::AccelSample;
