use accel_track_core::{payload, AccelSample, Backoff, Outbox};
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Receiver};
use embassy_time::{with_timeout, Duration, Timer};
use embedded_io_async::{Read, Write};

use crate::config::{CONFIG, PAYLOAD_FORMAT};
use crate::constants::*;
use crate::mqtt::{self, Mqtt};
use crate::transport::{self, Connector};

pub type SampleReceiver = Receiver<'static, NoopRawMutex, AccelSample, SAMPLE_QUEUE_DEPTH>;

/// Log a progress line every this many publications
const PUBLISH_LOG_EVERY: u32 = 600;

#[derive(Debug)]
pub enum Error {
    #[allow(dead_code)]
    Transport(transport::Error),
    #[allow(dead_code)]
    Mqtt(mqtt::Error),
    Format,
}

/// Owns the broker session: connects, forwards queued samples and reconnects
/// with exponential backoff whenever the session breaks.
pub struct Publisher {
    connector: Connector,
    receiver: SampleReceiver,
    rx_buf: &'static mut [u8; RX_BUFFER_SIZE],
    tx_buf: &'static mut [u8; TX_BUFFER_SIZE],
    mqtt_rx_buf: &'static mut [u8; MQTT_RX_BUFFER_SIZE],
    mqtt_tx_buf: &'static mut [u8; MQTT_TX_BUFFER_SIZE],
    backoff: Backoff,
    outbox: Outbox,
    published: u32,
}

impl Publisher {
    pub fn new(
        connector: Connector,
        receiver: SampleReceiver,
        rx_buf: &'static mut [u8; RX_BUFFER_SIZE],
        tx_buf: &'static mut [u8; TX_BUFFER_SIZE],
        mqtt_rx_buf: &'static mut [u8; MQTT_RX_BUFFER_SIZE],
        mqtt_tx_buf: &'static mut [u8; MQTT_TX_BUFFER_SIZE],
    ) -> Self {
        Self {
            connector,
            receiver,
            rx_buf,
            tx_buf,
            mqtt_rx_buf,
            mqtt_tx_buf,
            backoff: Backoff::new(BROKER_RECONNECT_INITIAL_MS, BROKER_RECONNECT_MAX_MS),
            outbox: Outbox::new(),
            published: 0,
        }
    }

    pub async fn run(&mut self) {
        loop {
            if let Err(e) = self.session().await {
                let delay = self.backoff.next_delay_ms();
                log::error!("Broker session ended: {:?}, retrying in {} ms", e, delay);
                Timer::after_millis(delay).await;
            }
        }
    }

    async fn session(&mut self) -> Result<(), Error> {
        let transport = self
            .connector
            .connect(&mut self.rx_buf[..], &mut self.tx_buf[..])
            .await
            .map_err(Error::Transport)?;

        let mut mqtt = Mqtt::new(
            transport,
            &mut self.mqtt_tx_buf[..],
            &mut self.mqtt_rx_buf[..],
        )
        .await
        .map_err(Error::Mqtt)?;

        self.backoff.reset();

        let result = forward(
            &self.receiver,
            &mut mqtt,
            &mut self.outbox,
            &mut self.published,
        )
        .await;
        mqtt.disconnect().await;
        result
    }
}

// Publishes samples as they arrive and pings the broker when the queue stays
// empty. A sample whose publication failed goes out first on the next
// session. Only returns on error.
async fn forward<T: Read + Write>(
    receiver: &SampleReceiver,
    mqtt: &mut Mqtt<'_, T>,
    outbox: &mut Outbox,
    published: &mut u32,
) -> Result<(), Error> {
    let creds = &CONFIG.credentials;

    loop {
        let sample = match outbox.take() {
            Some(sample) => {
                log::info!("Resending sample from {} ms", sample.timestamp_ms);
                sample
            }
            None => match with_timeout(
                Duration::from_secs(MQTT_PING_INTERVAL_SECS),
                receiver.receive(),
            )
            .await
            {
                Ok(sample) => sample,
                Err(_) => {
                    log::debug!("No samples for {}s, pinging broker", MQTT_PING_INTERVAL_SECS);
                    mqtt.ping().await.map_err(Error::Mqtt)?;
                    continue;
                }
            },
        };

        let message = payload::encode(&sample, PAYLOAD_FORMAT, creds.client_id)
            .map_err(|_| Error::Format)?;
        log::debug!("Publishing {} to {}", message, creds.topic);

        if let Err(e) = mqtt.publish(creds.topic, message.as_bytes()).await {
            outbox.retain(sample);
            return Err(Error::Mqtt(e));
        }

        *published = published.wrapping_add(1);
        if *published % PUBLISH_LOG_EVERY == 0 {
            log::info!(
                "{} samples published to {}, {} resent",
                published,
                creds.topic,
                outbox.resent()
            );
        }
    }
}

#[embassy_executor::task]
pub async fn publisher_task(mut publisher: Publisher) {
    publisher.run().await
}
