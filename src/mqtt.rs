use embedded_io_async::{Read, Write};
use rust_mqtt::{
    client::{
        client::MqttClient,
        client_config::{ClientConfig, MqttVersion},
    },
    packet::v5::{publish_packet::QualityOfService, reason_codes::ReasonCode},
    utils::rng_generator::CountingRng,
};

use crate::config::CONFIG;
use crate::constants::{MQTT_KEEP_ALIVE_SECS, MQTT_MAX_PROPERTIES, MQTT_RX_BUFFER_SIZE, MQTT_TX_BUFFER_SIZE};

#[derive(Debug)]
pub enum Error {
    #[allow(dead_code)]
    ConnectionFailed(ReasonCode),
    #[allow(dead_code)]
    PublishMessageFailed(ReasonCode),
    #[allow(dead_code)]
    PingFailed(ReasonCode),
}

/// Broker session authenticated with the credentials from `cfg.toml`.
pub struct Mqtt<'a, T>
where
    T: Read + Write,
{
    client: MqttClient<'a, T, MQTT_MAX_PROPERTIES, CountingRng>,
    qos: QualityOfService,
}

impl<'a, T> Mqtt<'a, T>
where
    T: Read + Write,
{
    pub async fn new(
        transport: T,
        tx_buffer: &'a mut [u8],
        rx_buffer: &'a mut [u8],
    ) -> Result<Self, Error> {
        let creds = &CONFIG.credentials;

        let mut config = ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
        config.add_client_id(creds.client_id);
        config.add_username(creds.mqtt_username);
        config.add_password(creds.mqtt_password);
        config.keep_alive = MQTT_KEEP_ALIVE_SECS;
        config.max_packet_size = MQTT_RX_BUFFER_SIZE as u32;

        let qos = qos_from_config(CONFIG.publish_qos);
        config.add_max_subscribe_qos(qos);

        let mut client = MqttClient::<_, MQTT_MAX_PROPERTIES, _>::new(
            transport,
            tx_buffer,
            MQTT_TX_BUFFER_SIZE,
            rx_buffer,
            MQTT_RX_BUFFER_SIZE,
            config,
        );

        match client.connect_to_broker().await {
            Ok(()) => {
                log::info!("MQTT connected to broker as {:?}", creds.client_id);
            }
            Err(e) => {
                log::error!("MQTT connect_to_broker failed: {:?}", e);
                return Err(Error::ConnectionFailed(e));
            }
        }

        Ok(Self { client, qos })
    }

    pub async fn publish(&mut self, topic: &str, message: &[u8]) -> Result<(), Error> {
        self.client
            .send_message(topic, message, self.qos, false)
            .await
            .map_err(|e| {
                log::error!("Failed to publish message: {:?}", e);
                Error::PublishMessageFailed(e)
            })
    }

    pub async fn ping(&mut self) -> Result<(), Error> {
        self.client.send_ping().await.map_err(Error::PingFailed)
    }

    pub async fn disconnect(mut self) {
        if let Err(e) = self.client.disconnect().await {
            log::debug!("MQTT disconnect failed: {:?}", e);
        }
    }
}

fn qos_from_config(qos: u8) -> QualityOfService {
    match qos {
        1 => QualityOfService::QoS1,
        _ => QualityOfService::QoS0,
    }
}
