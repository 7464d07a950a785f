use accel_track_core::AccelSample;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Sender};
use embassy_time::{Duration, Instant, Ticker};
use esp_hal::{i2c::master::I2c, Async};

use crate::config::CONFIG;
use crate::constants::SAMPLE_QUEUE_DEPTH;
use crate::sensors::{mpu6050::Mpu6050, Accelerometer};

pub type SampleSender = Sender<'static, NoopRawMutex, AccelSample, SAMPLE_QUEUE_DEPTH>;

/// Reads the accelerometer at the configured interval and queues the
/// samples for the publisher. A failed read is queued as the `-1` sentinel so
/// the backend still sees the gap.
pub struct Sampler<A> {
    sensor: Option<A>,
    sender: SampleSender,
    dropped: u32,
}

impl<A: Accelerometer> Sampler<A> {
    pub fn new(sensor: Option<A>, sender: SampleSender) -> Self {
        if sensor.is_none() {
            log::warn!("No accelerometer, publishing unavailable samples only");
        }

        Self {
            sensor,
            sender,
            dropped: 0,
        }
    }

    pub async fn sample(&mut self) -> AccelSample {
        let timestamp_ms = Instant::now().as_millis();

        let Some(sensor) = self.sensor.as_mut() else {
            return AccelSample::unavailable(timestamp_ms);
        };

        match sensor.measure(timestamp_ms).await {
            Ok(sample) => sample,
            Err(e) => {
                log::warn!("Accelerometer read failed: {:?}", e);
                AccelSample::unavailable(timestamp_ms)
            }
        }
    }

    pub async fn run(&mut self) {
        let mut ticker = Ticker::every(Duration::from_millis(CONFIG.sample_interval_ms.into()));

        loop {
            let sample = self.sample().await;
            log::debug!("Sample: {:?}, in g: {:?}", sample, sample.in_g());

            // never block the sampling cadence on a slow broker
            if self.sender.try_send(sample).is_err() {
                self.dropped = self.dropped.wrapping_add(1);
                if self.dropped % 100 == 1 {
                    log::warn!("Sample queue full, {} samples dropped so far", self.dropped);
                }
            }

            ticker.next().await;
        }
    }
}

#[embassy_executor::task]
pub async fn sampler_task(mut sampler: Sampler<Mpu6050<I2c<'static, Async>>>) {
    sampler.run().await
}
