use core::fmt;

use crate::credentials::{CredentialError, Credentials};

pub const DEFAULT_SAMPLE_INTERVAL_MS: u32 = 100;
pub const MIN_SAMPLE_INTERVAL_MS: u32 = 10;
pub const MAX_SAMPLE_INTERVAL_MS: u32 = 60_000;

pub const DEFAULT_PUBLISH_QOS: u8 = 0;

/// Longest PEM CA chain accepted. The firmware copies it, NUL-terminated,
/// into an 8 KiB buffer for mbedtls.
pub const MAX_TLS_CA_LEN: usize = 8191;

const PEM_CERTIFICATE_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_CERTIFICATE_END: &str = "-----END CERTIFICATE-----";

/// Complete device configuration, generated from `cfg.toml` by the build script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config<'a> {
    pub credentials: Credentials<'a>,

    // PEM CA chain used to verify the broker (required with the `tls` feature)
    pub tls_ca: Option<&'a str>,

    // Delay between two accelerometer samples
    pub sample_interval_ms: u32,

    // QoS used for sample publications (0 or 1)
    pub publish_qos: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    Credentials(CredentialError),
    SampleIntervalOutOfRange(u32),
    InvalidQos(u8),
    CaTooLong(usize),
    InvalidCaCertificate,
}

impl From<CredentialError> for ConfigError {
    fn from(err: CredentialError) -> Self {
        ConfigError::Credentials(err)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Credentials(err) => fmt::Display::fmt(err, f),
            ConfigError::SampleIntervalOutOfRange(ms) => write!(
                f,
                "sample_interval_ms {} is outside {}..={}",
                ms, MIN_SAMPLE_INTERVAL_MS, MAX_SAMPLE_INTERVAL_MS
            ),
            ConfigError::InvalidQos(qos) => {
                write!(f, "publish_qos {} is not supported, use 0 or 1", qos)
            }
            ConfigError::CaTooLong(len) => write!(
                f,
                "tls_ca is {} bytes, at most {} are allowed",
                len, MAX_TLS_CA_LEN
            ),
            ConfigError::InvalidCaCertificate => {
                write!(f, "tls_ca does not contain a PEM certificate")
            }
        }
    }
}

impl Config<'_> {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.credentials.validate()?;

        if !(MIN_SAMPLE_INTERVAL_MS..=MAX_SAMPLE_INTERVAL_MS).contains(&self.sample_interval_ms) {
            return Err(ConfigError::SampleIntervalOutOfRange(
                self.sample_interval_ms,
            ));
        }

        if self.publish_qos > 1 {
            return Err(ConfigError::InvalidQos(self.publish_qos));
        }

        if let Some(ca) = self.tls_ca {
            if ca.len() > MAX_TLS_CA_LEN {
                return Err(ConfigError::CaTooLong(ca.len()));
            }
            let begin = ca
                .find(PEM_CERTIFICATE_BEGIN)
                .ok_or(ConfigError::InvalidCaCertificate)?;
            if !ca[begin..].contains(PEM_CERTIFICATE_END) {
                return Err(ConfigError::InvalidCaCertificate);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Field;

    const CA: &str = "-----BEGIN CERTIFICATE-----\nMIIBszCCAVmgAwIBAgIU\n-----END CERTIFICATE-----\n";

    fn config() -> Config<'static> {
        Config {
            credentials: Credentials {
                wifi_ssid: "workshop",
                wifi_password: "correct horse",
                mqtt_server: "broker.example.net",
                mqtt_port: 8883,
                mqtt_username: "tracker",
                mqtt_password: "s3cret",
                client_id: "accel-tracker-01",
                topic: "coordinates",
            },
            tls_ca: Some(CA),
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            publish_qos: DEFAULT_PUBLISH_QOS,
        }
    }

    #[test]
    fn default_settings_validate() {
        assert_eq!(config().validate(), Ok(()));
        let plain = Config {
            tls_ca: None,
            ..config()
        };
        assert_eq!(plain.validate(), Ok(()));
    }

    #[test]
    fn credential_errors_are_wrapped() {
        let mut cfg = config();
        cfg.credentials.mqtt_password = "YOUR_MQTT_PASSWORD";
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::Credentials(CredentialError::Placeholder(
                Field::MqttPassword
            )))
        );
    }

    #[test]
    fn sample_interval_bounds() {
        for (ms, ok) in [(9, false), (10, true), (60_000, true), (60_001, false)] {
            let cfg = Config {
                sample_interval_ms: ms,
                ..config()
            };
            assert_eq!(cfg.validate().is_ok(), ok, "interval {}", ms);
        }
    }

    #[test]
    fn qos_two_is_rejected() {
        let cfg = Config {
            publish_qos: 2,
            ..config()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidQos(2)));
    }

    #[test]
    fn ca_without_pem_block_is_rejected() {
        for ca in ["", "MIIBszCCAVmgAwIBAgIU", "-----BEGIN CERTIFICATE-----\nMIIB"] {
            let cfg = Config {
                tls_ca: Some(ca),
                ..config()
            };
            assert_eq!(cfg.validate(), Err(ConfigError::InvalidCaCertificate));
        }
    }

    #[test]
    fn oversized_ca_chain_is_rejected() {
        let block = CA.repeat(MAX_TLS_CA_LEN / CA.len() + 1);
        let cfg = Config {
            tls_ca: Some(&block),
            ..config()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::CaTooLong(block.len())));

        let fits = CA.repeat(MAX_TLS_CA_LEN / CA.len());
        let cfg = Config {
            tls_ca: Some(&fits),
            ..config()
        };
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn oversized_server_name_is_rejected() {
        let server = "b".repeat(200);
        let mut cfg = config();
        cfg.credentials.mqtt_server = &server;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::Credentials(CredentialError::TooLong {
                field: Field::MqttServer,
                len: 200,
                max: crate::credentials::MAX_MQTT_SERVER_LEN
            }))
        );
    }
}
