use core::fmt;

/// Longest SSID the 802.11 standard allows.
pub const MAX_WIFI_SSID_LEN: usize = 32;
/// Longest WPA passphrase (64 bytes is a raw hex PSK).
pub const MAX_WIFI_PASSWORD_LEN: usize = 64;
/// Longest broker hostname. The firmware hands it to mbedtls as a
/// NUL-terminated server name in a 128-byte buffer.
pub const MAX_MQTT_SERVER_LEN: usize = 127;
/// Longest client ID accepted. The client ID is also the DHCP hostname,
/// which embassy-net stores in a `heapless::String<32>`.
pub const MAX_CLIENT_ID_LEN: usize = 32;
/// Longest MQTT username or password. Together with the client ID this keeps
/// a CONNECT packet well inside the 512-byte MQTT transmit buffer.
pub const MAX_MQTT_CREDENTIAL_LEN: usize = 128;
/// Longest publish topic. Leaves room for a full payload in one PUBLISH
/// packet of the 512-byte MQTT transmit buffer.
pub const MAX_TOPIC_LEN: usize = 128;

/// Network and broker credentials baked into the firmware at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    // Wi-Fi SSID to join
    pub wifi_ssid: &'a str,

    // Wi-Fi pre-shared key
    pub wifi_password: &'a str,

    // MQTT broker hostname or IP address
    pub mqtt_server: &'a str,

    // MQTT broker port (1883 plain, 8883 TLS)
    pub mqtt_port: u16,

    // MQTT username for authentication
    pub mqtt_username: &'a str,

    // MQTT password for authentication
    pub mqtt_password: &'a str,

    // MQTT client identifier, also used as DHCP hostname
    pub client_id: &'a str,

    // Topic every sample is published to
    pub topic: &'a str,
}

/// One entry of the credentials template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    WifiSsid,
    WifiPassword,
    MqttServer,
    MqttPort,
    MqttUsername,
    MqttPassword,
    ClientId,
    Topic,
}

impl Field {
    /// All fields, in declaration order. Validation walks them in this order.
    pub const ALL: [Field; 8] = [
        Field::WifiSsid,
        Field::WifiPassword,
        Field::MqttServer,
        Field::MqttPort,
        Field::MqttUsername,
        Field::MqttPassword,
        Field::ClientId,
        Field::Topic,
    ];

    /// Key of this field in `cfg.toml`.
    pub const fn name(self) -> &'static str {
        match self {
            Field::WifiSsid => "wifi_ssid",
            Field::WifiPassword => "wifi_password",
            Field::MqttServer => "mqtt_server",
            Field::MqttPort => "mqtt_port",
            Field::MqttUsername => "mqtt_username",
            Field::MqttPassword => "mqtt_password",
            Field::ClientId => "client_id",
            Field::Topic => "topic",
        }
    }

    /// Longest value the firmware can use for this field, in bytes.
    pub const fn max_len(self) -> Option<usize> {
        match self {
            Field::WifiSsid => Some(MAX_WIFI_SSID_LEN),
            Field::WifiPassword => Some(MAX_WIFI_PASSWORD_LEN),
            Field::MqttServer => Some(MAX_MQTT_SERVER_LEN),
            Field::MqttPort => None,
            Field::MqttUsername | Field::MqttPassword => Some(MAX_MQTT_CREDENTIAL_LEN),
            Field::ClientId => Some(MAX_CLIENT_ID_LEN),
            Field::Topic => Some(MAX_TOPIC_LEN),
        }
    }

    /// Value shipped in `cfg.toml.example` that must be replaced before building.
    pub const fn placeholder(self) -> &'static str {
        match self {
            Field::WifiSsid => "YOUR_WIFI_SSID",
            Field::WifiPassword => "YOUR_WIFI_PASSWORD",
            Field::MqttServer => "YOUR_MQTT_SERVER",
            Field::MqttPort => "YOUR_MQTT_PORT",
            Field::MqttUsername => "YOUR_MQTT_USERNAME",
            Field::MqttPassword => "YOUR_MQTT_PASSWORD",
            Field::ClientId => "YOUR_CLIENT_ID",
            Field::Topic => "YOUR_TOPIC",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    Placeholder(Field),
    Empty(Field),
    InteriorNul(Field),
    PortOutOfRange(i64),
    InvalidPort,
    TooLong { field: Field, len: usize, max: usize },
    WildcardTopic,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::Placeholder(field) => write!(
                f,
                "{} still holds the placeholder {:?}",
                field,
                field.placeholder()
            ),
            CredentialError::Empty(field) => write!(f, "{} is empty", field),
            CredentialError::InteriorNul(field) => {
                write!(f, "{} contains a NUL byte", field)
            }
            CredentialError::PortOutOfRange(port) => {
                write!(f, "mqtt_port {} is outside 1..=65535", port)
            }
            CredentialError::InvalidPort => write!(f, "mqtt_port is not a number"),
            CredentialError::TooLong { field, len, max } => write!(
                f,
                "{} is {} bytes, at most {} are allowed",
                field, len, max
            ),
            CredentialError::WildcardTopic => {
                write!(f, "topic must not contain the MQTT wildcards '+' or '#'")
            }
        }
    }
}

/// Returns true when `value` is the untouched template text for `field`.
pub fn is_placeholder(field: Field, value: &str) -> bool {
    value.trim() == field.placeholder()
}

/// Parses a port given as text, e.g. from an environment override or a
/// quoted TOML value.
pub fn parse_port(value: &str) -> Result<u16, CredentialError> {
    if is_placeholder(Field::MqttPort, value) {
        return Err(CredentialError::Placeholder(Field::MqttPort));
    }
    let value = value.trim();
    if value.is_empty() {
        return Err(CredentialError::Empty(Field::MqttPort));
    }
    let port: i64 = value.parse().map_err(|_| CredentialError::InvalidPort)?;
    port_from_int(port)
}

pub fn port_from_int(port: i64) -> Result<u16, CredentialError> {
    match u16::try_from(port) {
        Ok(0) | Err(_) => Err(CredentialError::PortOutOfRange(port)),
        Ok(port) => Ok(port),
    }
}

impl<'a> Credentials<'a> {
    /// Text value of `field`. The port is numeric and has no text form here.
    pub fn get(&self, field: Field) -> Option<&'a str> {
        match field {
            Field::WifiSsid => Some(self.wifi_ssid),
            Field::WifiPassword => Some(self.wifi_password),
            Field::MqttServer => Some(self.mqtt_server),
            Field::MqttPort => None,
            Field::MqttUsername => Some(self.mqtt_username),
            Field::MqttPassword => Some(self.mqtt_password),
            Field::ClientId => Some(self.client_id),
            Field::Topic => Some(self.topic),
        }
    }

    /// Checks that every value has been filled in and is usable by the
    /// WiFi, TLS and MQTT layers. Reports the first offending field.
    pub fn validate(&self) -> Result<(), CredentialError> {
        for field in Field::ALL {
            let Some(value) = self.get(field) else {
                port_from_int(self.mqtt_port.into())?;
                continue;
            };

            if is_placeholder(field, value) {
                return Err(CredentialError::Placeholder(field));
            }
            // a passphrase made of spaces is still a valid WPA passphrase
            let blank = match field {
                Field::WifiPassword => value.is_empty(),
                _ => value.trim().is_empty(),
            };
            if blank {
                return Err(CredentialError::Empty(field));
            }
            if value.contains('\0') {
                return Err(CredentialError::InteriorNul(field));
            }
            if let Some(max) = field.max_len() {
                if value.len() > max {
                    return Err(CredentialError::TooLong {
                        field,
                        len: value.len(),
                        max,
                    });
                }
            }
            if field == Field::Topic && value.contains(['+', '#']) {
                return Err(CredentialError::WildcardTopic);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> Credentials<'static> {
        Credentials {
            wifi_ssid: "workshop",
            wifi_password: "correct horse",
            mqtt_server: "broker.example.net",
            mqtt_port: 8883,
            mqtt_username: "tracker",
            mqtt_password: "s3cret",
            client_id: "accel-tracker-01",
            topic: "coordinates",
        }
    }

    #[test]
    fn filled_credentials_are_valid() {
        assert_eq!(filled().validate(), Ok(()));
    }

    #[test]
    fn every_placeholder_is_rejected() {
        for field in Field::ALL {
            if field == Field::MqttPort {
                continue;
            }
            let mut creds = filled();
            let placeholder = field.placeholder();
            match field {
                Field::WifiSsid => creds.wifi_ssid = placeholder,
                Field::WifiPassword => creds.wifi_password = placeholder,
                Field::MqttServer => creds.mqtt_server = placeholder,
                Field::MqttUsername => creds.mqtt_username = placeholder,
                Field::MqttPassword => creds.mqtt_password = placeholder,
                Field::ClientId => creds.client_id = placeholder,
                Field::Topic => creds.topic = placeholder,
                Field::MqttPort => unreachable!(),
            }
            assert_eq!(creds.validate(), Err(CredentialError::Placeholder(field)));
        }
    }

    #[test]
    fn placeholder_with_surrounding_whitespace_is_still_a_placeholder() {
        let creds = Credentials {
            mqtt_server: "  YOUR_MQTT_SERVER\n",
            ..filled()
        };
        assert_eq!(
            creds.validate(),
            Err(CredentialError::Placeholder(Field::MqttServer))
        );
    }

    #[test]
    fn first_failing_field_wins() {
        let creds = Credentials {
            wifi_password: "",
            topic: "YOUR_TOPIC",
            ..filled()
        };
        assert_eq!(
            creds.validate(),
            Err(CredentialError::Empty(Field::WifiPassword))
        );
    }

    #[test]
    fn whitespace_only_is_empty() {
        let creds = Credentials {
            mqtt_username: "   ",
            ..filled()
        };
        assert_eq!(
            creds.validate(),
            Err(CredentialError::Empty(Field::MqttUsername))
        );
    }

    #[test]
    fn interior_nul_is_rejected() {
        let creds = Credentials {
            wifi_ssid: "work\0shop",
            ..filled()
        };
        assert_eq!(
            creds.validate(),
            Err(CredentialError::InteriorNul(Field::WifiSsid))
        );
    }

    #[test]
    fn zero_port_is_rejected() {
        let creds = Credentials {
            mqtt_port: 0,
            ..filled()
        };
        assert_eq!(creds.validate(), Err(CredentialError::PortOutOfRange(0)));
    }

    #[test]
    fn wildcard_topics_are_rejected() {
        for topic in ["sensors/+/accel", "sensors/#"] {
            let creds = Credentials { topic, ..filled() };
            assert_eq!(creds.validate(), Err(CredentialError::WildcardTopic));
        }
    }

    #[test]
    fn whitespace_wifi_password_is_accepted() {
        let creds = Credentials {
            wifi_password: "        ",
            ..filled()
        };
        assert_eq!(creds.validate(), Ok(()));

        let creds = Credentials {
            wifi_password: "",
            ..filled()
        };
        assert_eq!(
            creds.validate(),
            Err(CredentialError::Empty(Field::WifiPassword))
        );
    }

    #[test]
    fn long_client_id_is_rejected() {
        let creds = Credentials {
            client_id: "accel-tracker-with-a-very-long-name",
            ..filled()
        };
        assert_eq!(
            creds.validate(),
            Err(CredentialError::TooLong {
                field: Field::ClientId,
                len: 35,
                max: MAX_CLIENT_ID_LEN
            })
        );
    }

    #[test]
    fn client_id_is_reported_before_topic() {
        let creds = Credentials {
            client_id: "accel-tracker-with-a-very-long-name",
            topic: "sensors/#",
            ..filled()
        };
        assert_eq!(
            creds.validate(),
            Err(CredentialError::TooLong {
                field: Field::ClientId,
                len: 35,
                max: MAX_CLIENT_ID_LEN
            })
        );
    }

    #[test]
    fn every_length_bound_is_enforced() {
        let long = "x".repeat(256);
        for field in Field::ALL {
            let Some(max) = field.max_len() else {
                continue;
            };

            let mut creds = filled();
            let at_max = &long[..max];
            let over_max = &long[..=max];
            for (value, ok) in [(at_max, true), (over_max, false)] {
                match field {
                    Field::WifiSsid => creds.wifi_ssid = value,
                    Field::WifiPassword => creds.wifi_password = value,
                    Field::MqttServer => creds.mqtt_server = value,
                    Field::MqttUsername => creds.mqtt_username = value,
                    Field::MqttPassword => creds.mqtt_password = value,
                    Field::ClientId => creds.client_id = value,
                    Field::Topic => creds.topic = value,
                    Field::MqttPort => unreachable!(),
                }
                let expected = if ok {
                    Ok(())
                } else {
                    Err(CredentialError::TooLong {
                        field,
                        len: max + 1,
                        max,
                    })
                };
                assert_eq!(creds.validate(), expected, "{}", field);
            }
        }
    }

    #[test]
    fn oversized_ssid_is_rejected() {
        let creds = Credentials {
            wifi_ssid: "a-workshop-network-name-that-is-40-bytes",
            ..filled()
        };
        assert_eq!(
            creds.validate(),
            Err(CredentialError::TooLong {
                field: Field::WifiSsid,
                len: 40,
                max: MAX_WIFI_SSID_LEN
            })
        );
    }

    #[test]
    fn port_parsing() {
        assert_eq!(parse_port("1883"), Ok(1883));
        assert_eq!(parse_port(" 8883 "), Ok(8883));
        assert_eq!(
            parse_port("YOUR_MQTT_PORT"),
            Err(CredentialError::Placeholder(Field::MqttPort))
        );
        assert_eq!(parse_port("mqtt"), Err(CredentialError::InvalidPort));
        assert_eq!(parse_port(""), Err(CredentialError::Empty(Field::MqttPort)));
        assert_eq!(port_from_int(65535), Ok(65535));
        assert_eq!(port_from_int(65536), Err(CredentialError::PortOutOfRange(65536)));
        assert_eq!(port_from_int(-1), Err(CredentialError::PortOutOfRange(-1)));
    }

    #[test]
    fn error_messages_name_the_field() {
        let msg = CredentialError::Placeholder(Field::ClientId).to_string();
        assert_eq!(msg, "client_id still holds the placeholder \"YOUR_CLIENT_ID\"");
    }
}
