#![allow(async_fn_in_trait)]

use accel_track_core::AccelSample;

pub mod mpu6050;

#[derive(Debug)]
pub enum SensorError {
    InitFailure,
    UnexpectedDevice(u8),
    MeasurementFailure,
}

/// A three-axis accelerometer reporting raw counts.
pub trait Accelerometer {
    async fn measure(&mut self, timestamp_ms: u64) -> Result<AccelSample, SensorError>;
}
