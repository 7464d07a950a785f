use accel_track_core::{
    payload::{encode, PayloadFormat},
    AccelSample, Credentials, CredentialError, Field,
};

const TEMPLATE: &str = include_str!("../../../cfg.toml.example");

fn template_value(key: &str) -> &'static str {
    TEMPLATE
        .lines()
        .find_map(|line| {
            let (k, v) = line.split_once('=')?;
            (k.trim() == key).then(|| v.trim().trim_matches('"'))
        })
        .unwrap_or_else(|| panic!("{} missing from cfg.toml.example", key))
}

#[test]
fn template_ships_every_placeholder() {
    for field in Field::ALL {
        assert_eq!(template_value(field.name()), field.placeholder());
    }
}

#[test]
fn untouched_template_does_not_validate() {
    let port = accel_track_core::credentials::parse_port(template_value("mqtt_port"));
    assert_eq!(port, Err(CredentialError::Placeholder(Field::MqttPort)));

    let creds = Credentials {
        wifi_ssid: template_value("wifi_ssid"),
        wifi_password: template_value("wifi_password"),
        mqtt_server: template_value("mqtt_server"),
        mqtt_port: 8883,
        mqtt_username: template_value("mqtt_username"),
        mqtt_password: template_value("mqtt_password"),
        client_id: template_value("client_id"),
        topic: template_value("topic"),
    };
    assert_eq!(
        creds.validate(),
        Err(CredentialError::Placeholder(Field::WifiSsid))
    );
}

#[test]
fn json_payloads_parse_for_backend() {
    let samples = [
        AccelSample::from_raw([952, -15996, 2680], 40796),
        AccelSample::unavailable(42459),
    ];

    for sample in samples {
        let payload = encode(&sample, PayloadFormat::Json, "tracker").unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["x"], sample.x);
        assert_eq!(value["y"], sample.y);
        assert_eq!(value["z"], sample.z);
        assert_eq!(value["timestamp"], sample.timestamp_ms);
    }
}

#[test]
fn sentinel_is_minus_one_on_the_wire() {
    let payload = encode(&AccelSample::unavailable(7), PayloadFormat::Json, "t").unwrap();
    assert_eq!(payload.as_str(), r#"{"x":-1,"y":-1,"z":-1,"timestamp":7}"#);
}
