use std::{env, error::Error, fs, path::Path};

use accel_track_core::{
    config::{DEFAULT_PUBLISH_QOS, DEFAULT_SAMPLE_INTERVAL_MS},
    credentials::{parse_port, port_from_int},
    Config, CredentialError, Credentials,
};
use serde::Deserialize;

const CONFIG_FILE: &str = "cfg.toml";

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPort {
    Number(i64),
    Text(String),
}

#[derive(Deserialize)]
struct RawConfig {
    wifi_ssid: String,
    wifi_password: String,
    mqtt_server: String,
    mqtt_port: RawPort,
    mqtt_username: String,
    mqtt_password: String,
    client_id: String,
    topic: String,
    tls_ca: Option<String>,
    sample_interval_ms: Option<u32>,
    publish_qos: Option<u8>,
}

impl RawPort {
    fn resolve(&self) -> Result<u16, CredentialError> {
        match self {
            RawPort::Number(port) => port_from_int(*port),
            RawPort::Text(port) => parse_port(port),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // Tell Cargo to rerun if toml changes
    println!("cargo:rerun-if-changed={CONFIG_FILE}");

    if !Path::new(CONFIG_FILE).exists() {
        return Err(format!(
            "{CONFIG_FILE} not found, copy cfg.toml.example to {CONFIG_FILE} and fill in your credentials"
        )
        .into());
    }

    // Read and parse
    let toml_str = fs::read_to_string(CONFIG_FILE)?;
    let raw: RawConfig = toml::from_str(&toml_str)?;

    let config = Config {
        credentials: Credentials {
            wifi_ssid: &raw.wifi_ssid,
            wifi_password: &raw.wifi_password,
            mqtt_server: &raw.mqtt_server,
            mqtt_port: raw
                .mqtt_port
                .resolve()
                .map_err(|e| format!("{CONFIG_FILE}: {e}"))?,
            mqtt_username: &raw.mqtt_username,
            mqtt_password: &raw.mqtt_password,
            client_id: &raw.client_id,
            topic: &raw.topic,
        },
        tls_ca: raw.tls_ca.as_deref(),
        sample_interval_ms: raw.sample_interval_ms.unwrap_or(DEFAULT_SAMPLE_INTERVAL_MS),
        publish_qos: raw.publish_qos.unwrap_or(DEFAULT_PUBLISH_QOS),
    };

    // Refuse to build firmware that still carries template values
    config
        .validate()
        .map_err(|e| format!("{CONFIG_FILE}: {e}"))?;

    if env::var_os("CARGO_FEATURE_TLS").is_some() && config.tls_ca.is_none() {
        return Err(format!("{CONFIG_FILE}: tls_ca is required when the `tls` feature is enabled").into());
    }

    // Generate Rust code
    let creds = &config.credentials;
    let code = format!(
        r#"
        pub const CONFIG: Config<'static> = Config {{
            credentials: Credentials {{
                wifi_ssid: {ssid:?},
                wifi_password: {psk:?},
                mqtt_server: {ms:?},
                mqtt_port: {mp},
                mqtt_username: {mu:?},
                mqtt_password: {mpw:?},
                client_id: {cid:?},
                topic: {topic:?},
            }},
            tls_ca: {ca:?},
            sample_interval_ms: {intv},
            publish_qos: {qos},
        }};
    "#,
        ssid = creds.wifi_ssid,
        psk = creds.wifi_password,
        ms = creds.mqtt_server,
        mp = creds.mqtt_port,
        mu = creds.mqtt_username,
        mpw = creds.mqtt_password,
        cid = creds.client_id,
        topic = creds.topic,
        ca = config.tls_ca,
        intv = config.sample_interval_ms,
        qos = config.publish_qos,
    );

    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("config.rs");
    fs::write(dest_path, code)?;
    Ok(())
}
