/// Value reported on every axis when the accelerometer could not be read.
pub const UNAVAILABLE: i32 = -1;

/// Raw counts per g at the ±2 g full-scale range.
pub const COUNTS_PER_G: f32 = 16384.0;

/// One accelerometer reading, in raw sensor counts, stamped with the
/// milliseconds elapsed since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelSample {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub timestamp_ms: u64,
}

impl AccelSample {
    pub fn from_raw(raw: [i16; 3], timestamp_ms: u64) -> Self {
        Self {
            x: raw[0].into(),
            y: raw[1].into(),
            z: raw[2].into(),
            timestamp_ms,
        }
    }

    /// Decodes the six `ACCEL_XOUT_H..ACCEL_ZOUT_L` registers (big-endian pairs).
    pub fn from_registers(regs: &[u8; 6], timestamp_ms: u64) -> Self {
        Self::from_raw(
            [
                i16::from_be_bytes([regs[0], regs[1]]),
                i16::from_be_bytes([regs[2], regs[3]]),
                i16::from_be_bytes([regs[4], regs[5]]),
            ],
            timestamp_ms,
        )
    }

    pub fn unavailable(timestamp_ms: u64) -> Self {
        Self {
            x: UNAVAILABLE,
            y: UNAVAILABLE,
            z: UNAVAILABLE,
            timestamp_ms,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.x == UNAVAILABLE && self.y == UNAVAILABLE && self.z == UNAVAILABLE
    }

    /// Acceleration in g, for logging.
    pub fn in_g(&self) -> (f32, f32, f32) {
        (
            self.x as f32 / COUNTS_PER_G,
            self.y as f32 / COUNTS_PER_G,
            self.z as f32 / COUNTS_PER_G,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_decode_big_endian_signed() {
        // 276, -16152, 2796
        let regs = [0x01, 0x14, 0xC0, 0xE8, 0x0A, 0xEC];
        let sample = AccelSample::from_registers(&regs, 40692);
        assert_eq!(
            sample,
            AccelSample {
                x: 276,
                y: -16152,
                z: 2796,
                timestamp_ms: 40692
            }
        );
        assert!(!sample.is_unavailable());
    }

    #[test]
    fn extremes_do_not_overflow() {
        let sample = AccelSample::from_registers(&[0x80, 0x00, 0x7F, 0xFF, 0xFF, 0xFF], 0);
        assert_eq!((sample.x, sample.y, sample.z), (-32768, 32767, -1));
    }

    #[test]
    fn sentinel_round_trips_through_is_unavailable() {
        let sample = AccelSample::unavailable(42459);
        assert!(sample.is_unavailable());
        assert_eq!(sample.timestamp_ms, 42459);
    }

    #[test]
    fn one_g_on_z() {
        let sample = AccelSample::from_raw([0, 0, 16384], 0);
        assert_eq!(sample.in_g(), (0.0, 0.0, 1.0));
    }
}
