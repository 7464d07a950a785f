use core::fmt::Write;

use heapless::String;

use crate::sample::AccelSample;

/// Large enough for either format with a 32 byte client ID and `i32::MIN`
/// on every axis.
pub const PAYLOAD_MAX: usize = 160;

pub type Payload = String<PAYLOAD_MAX>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadFormat {
    /// `{"x":..,"y":..,"z":..,"timestamp":..}`, what the tracking backend reads.
    #[default]
    Json,
    /// Influx line protocol, tagged with the client ID.
    Influx,
}

pub fn encode(
    sample: &AccelSample,
    format: PayloadFormat,
    client_id: &str,
) -> Result<Payload, core::fmt::Error> {
    let mut payload = Payload::new();

    match format {
        PayloadFormat::Json => write!(
            payload,
            "{{\"x\":{},\"y\":{},\"z\":{},\"timestamp\":{}}}",
            sample.x, sample.y, sample.z, sample.timestamp_ms
        )?,
        PayloadFormat::Influx => write!(
            payload,
            "accel,client_id={} x={}i,y={}i,z={}i {}",
            InfluxTag(client_id),
            sample.x,
            sample.y,
            sample.z,
            sample.timestamp_ms
        )?,
    }

    Ok(payload)
}

// Escapes commas, spaces and equal signs in a line protocol tag value.
struct InfluxTag<'a>(&'a str);

impl core::fmt::Display for InfluxTag<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for c in self.0.chars() {
            if matches!(c, ',' | ' ' | '=') {
                f.write_char('\\')?;
            }
            f.write_char(c)?;
        }
        Ok(())
    }
}
