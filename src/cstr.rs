use core::ffi::CStr;
use heapless::Vec;

#[derive(Debug)]
pub enum Error {
    BufferOverflow,
    InteriorNul,
}

// Writes `s` as a null-terminated C string into `buffer`, trimming surrounding
// newlines. Used for the TLS server name, which mbedtls needs as a `CStr`.
pub fn write_trimmed_c_str<'buf>(s: &str, buffer: &'buf mut [u8]) -> Result<&'buf CStr, Error> {
    let trimmed = s.trim_matches('\n');
    let bytes = trimmed.as_bytes();
    let len = bytes.len();

    if len + 1 > buffer.len() {
        return Err(Error::BufferOverflow);
    }

    buffer[..len].copy_from_slice(bytes);
    buffer[len] = 0;

    CStr::from_bytes_with_nul(&buffer[..=len]).map_err(|_| Error::InteriorNul)
}

// Copies a PEM document into a fixed-capacity buffer with a trailing NUL,
// the form `X509::pem` expects.
pub fn build_trimmed_c_str_vec<const N: usize>(s: &str) -> Result<Vec<u8, N>, Error> {
    let trimmed = s.trim_matches('\n');
    if trimmed.as_bytes().contains(&0) {
        return Err(Error::InteriorNul);
    }

    let mut buf: Vec<u8, N> = Vec::new();
    buf.extend_from_slice(trimmed.as_bytes())
        .map_err(|_| Error::BufferOverflow)?;
    buf.push(0).map_err(|_| Error::BufferOverflow)?;

    Ok(buf)
}
