use accel_track_core::AccelSample;
use embassy_time::Timer;
use embedded_hal_async::i2c::I2c;
use log::info;

use super::{Accelerometer, SensorError};

/// I2C address with AD0 tied low
pub const DEFAULT_ADDRESS: u8 = 0x68;

const REG_SMPLRT_DIV: u8 = 0x19;
const REG_CONFIG: u8 = 0x1A;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_WHO_AM_I: u8 = 0x75;

const WHO_AM_I_VALUE: u8 = 0x68;

const PWR_DEVICE_RESET: u8 = 0x80;
// wake up, clock from the X gyro PLL
const PWR_CLKSEL_PLL_X: u8 = 0x01;
// 44 Hz low-pass on the accelerometer
const DLPF_44HZ: u8 = 0x03;
// ±2 g full scale
const ACCEL_FS_2G: u8 = 0x00;
// 1 kHz / (1 + 9) = 100 Hz output rate
const SAMPLE_RATE_DIV_100HZ: u8 = 9;

pub struct Mpu6050<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Mpu6050<I2C> {
    pub async fn new(i2c: I2C, address: u8) -> Result<Self, SensorError> {
        info!("Initialising MPU-6050 at {:#04x}...", address);
        let mut sensor = Self { i2c, address };

        let who_am_i = sensor
            .read_register(REG_WHO_AM_I)
            .await
            .map_err(|_| SensorError::InitFailure)?;
        if who_am_i != WHO_AM_I_VALUE {
            return Err(SensorError::UnexpectedDevice(who_am_i));
        }

        sensor.write_register(REG_PWR_MGMT_1, PWR_DEVICE_RESET).await?;
        Timer::after_millis(100).await;

        sensor.write_register(REG_PWR_MGMT_1, PWR_CLKSEL_PLL_X).await?;
        sensor.write_register(REG_CONFIG, DLPF_44HZ).await?;
        sensor
            .write_register(REG_SMPLRT_DIV, SAMPLE_RATE_DIV_100HZ)
            .await?;
        sensor.write_register(REG_ACCEL_CONFIG, ACCEL_FS_2G).await?;

        info!("Initialised MPU-6050");

        Ok(sensor)
    }

    async fn read_register(&mut self, register: u8) -> Result<u8, I2C::Error> {
        let mut value = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut value)
            .await?;
        Ok(value[0])
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[register, value])
            .await
            .map_err(|_| SensorError::InitFailure)
    }
}

impl<I2C: I2c> Accelerometer for Mpu6050<I2C> {
    async fn measure(&mut self, timestamp_ms: u64) -> Result<AccelSample, SensorError> {
        let mut regs = [0u8; 6];
        self.i2c
            .write_read(self.address, &[REG_ACCEL_XOUT_H], &mut regs)
            .await
            .map_err(|_| SensorError::MeasurementFailure)?;

        Ok(AccelSample::from_registers(&regs, timestamp_ms))
    }
}
