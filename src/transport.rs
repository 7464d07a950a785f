use alloc::format;
use core::marker::PhantomData;

use embassy_net::{
    dns::{DnsQueryType, Error as DnsError},
    tcp::{ConnectError, TcpSocket},
    Stack,
};
use embassy_time::Duration;
use embedded_io_async::{ErrorType, Read, ReadExactError, Write};

#[cfg(feature = "tls")]
use {
    core::ffi::CStr,
    esp_mbedtls::{asynch::Session as TlsSession, Certificates, Mode, Tls, TlsError, TlsVersion, X509},
    static_cell::StaticCell,
};

use crate::config::CONFIG;
use crate::constants::SOCKET_TIMEOUT_SECS;
#[cfg(feature = "tls")]
use crate::constants::{HOSTNAME_BUFFER_MAX, TLS_BUFFER_MAX};
#[cfg(feature = "tls")]
use crate::cstr;

const MAX_RETRIES: usize = 3;

#[derive(Debug)]
pub enum Error {
    #[allow(dead_code)]
    DnsQueryFailed(DnsError),
    DnsLookupFailed,
    #[allow(dead_code)]
    SocketConnectionError(ConnectError),
    #[cfg(feature = "tls")]
    CaCertificateMissing,
    #[cfg(feature = "tls")]
    #[allow(dead_code)]
    CertificateConversion(cstr::Error),
    #[cfg(feature = "tls")]
    #[allow(dead_code)]
    TlsSessionFailed(TlsError),
    #[cfg(feature = "tls")]
    #[allow(dead_code)]
    TlsHandshakeFailed(TlsError),
}

/// Stream handed to the MQTT client.
#[cfg(feature = "tls")]
pub type Session<'a> = TlsSession<'a, TcpSocket<'a>>;
#[cfg(not(feature = "tls"))]
pub type Session<'a> = TcpSocket<'a>;

#[cfg(feature = "tls")]
static SERVERNAME: StaticCell<[u8; HOSTNAME_BUFFER_MAX]> = StaticCell::new();
#[cfg(feature = "tls")]
static CA_CHAIN: StaticCell<heapless::Vec<u8, TLS_BUFFER_MAX>> = StaticCell::new();

/// Opens connections to the configured broker.
pub struct Connector {
    stack: Stack<'static>,
    #[cfg(feature = "tls")]
    tls: &'static Tls<'static>,
    #[cfg(feature = "tls")]
    servername: &'static CStr,
    #[cfg(feature = "tls")]
    ca_chain: &'static [u8],
}

impl Connector {
    #[cfg(feature = "tls")]
    pub fn new(stack: Stack<'static>, tls: &'static Tls<'static>) -> Result<Self, Error> {
        let ca = CONFIG.tls_ca.ok_or(Error::CaCertificateMissing)?;
        let ca_chain: &'static heapless::Vec<u8, TLS_BUFFER_MAX> = CA_CHAIN.init(
            cstr::build_trimmed_c_str_vec::<TLS_BUFFER_MAX>(ca)
                .map_err(Error::CertificateConversion)?,
        );
        log::info!("CA certificate loaded: {} bytes", ca_chain.len());

        let servername = cstr::write_trimmed_c_str(
            CONFIG.credentials.mqtt_server,
            SERVERNAME.init([0; HOSTNAME_BUFFER_MAX]),
        )
        .map_err(Error::CertificateConversion)?;

        Ok(Self {
            stack,
            tls,
            servername,
            ca_chain: ca_chain.as_slice(),
        })
    }

    #[cfg(not(feature = "tls"))]
    pub fn new(stack: Stack<'static>) -> Result<Self, Error> {
        Ok(Self { stack })
    }

    async fn open_socket<'a>(
        &self,
        rx_buffer: &'a mut [u8],
        tx_buffer: &'a mut [u8],
    ) -> Result<TcpSocket<'a>, Error> {
        let hostname = CONFIG.credentials.mqtt_server;
        let port = CONFIG.credentials.mqtt_port;

        let mut socket = TcpSocket::new(self.stack, rx_buffer, tx_buffer);
        socket.set_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)));

        let addr = self
            .stack
            .dns_query(hostname, DnsQueryType::A)
            .await
            .map_err(Error::DnsQueryFailed)?
            .first()
            .copied()
            .ok_or(Error::DnsLookupFailed)?;

        log::info!("Connecting TCP socket to {}:{}", hostname, port);
        socket
            .connect((addr, port))
            .await
            .map_err(Error::SocketConnectionError)?;
        log::info!("TCP connected");

        Ok(socket)
    }

    #[cfg(feature = "tls")]
    pub async fn connect<'a>(
        &'a self,
        rx_buffer: &'a mut [u8],
        tx_buffer: &'a mut [u8],
    ) -> Result<Transport<'a, Session<'a>>, Error> {
        let socket = self.open_socket(rx_buffer, tx_buffer).await?;

        let certificates = Certificates {
            ca_chain: Some(X509::pem(self.ca_chain).map_err(Error::TlsSessionFailed)?),
            ..Default::default()
        };

        let mut session = TlsSession::new(
            socket,
            Mode::Client {
                servername: self.servername,
            },
            TlsVersion::Tls1_2,
            certificates,
            self.tls.reference(),
        )
        .map_err(Error::TlsSessionFailed)?;

        log::info!("Starting TLS handshake with {:?}", self.servername);
        session.connect().await.map_err(|e| {
            log::error!("TLS handshake failed: {:?}", e);
            Error::TlsHandshakeFailed(e)
        })?;
        log::info!("TLS handshake complete");

        Ok(Transport {
            session,
            _marker: PhantomData,
        })
    }

    #[cfg(not(feature = "tls"))]
    pub async fn connect<'a>(
        &'a self,
        rx_buffer: &'a mut [u8],
        tx_buffer: &'a mut [u8],
    ) -> Result<Transport<'a, Session<'a>>, Error> {
        let session = self.open_socket(rx_buffer, tx_buffer).await?;

        Ok(Transport {
            session,
            _marker: PhantomData,
        })
    }
}

/// Wraps a plain TCP socket or a TLS session and retries transient I/O errors.
pub struct Transport<'a, S>
where
    S: Read + Write + 'a,
{
    pub session: S,
    _marker: PhantomData<&'a ()>,
}

impl<'a, S> ErrorType for Transport<'a, S>
where
    S: ErrorType + Read + Write + 'a,
{
    type Error = S::Error;
}

impl<'a, S> Read for Transport<'a, S>
where
    S: ErrorType + Read + Write + 'a,
    S::Error: core::fmt::Debug,
{
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, S::Error> {
        let mut attempt = 0;
        loop {
            match self.session.read(buf).await {
                Ok(n) => return Ok(n),
                Err(e) => {
                    attempt += 1;
                    // EOF means the peer is gone, retrying cannot help
                    if is_eof_error(&e) || attempt == MAX_RETRIES {
                        return Err(e);
                    }
                    log::warn!("read attempt {} failed: {:?}", attempt, e);
                }
            }
        }
    }

    async fn read_exact(&mut self, mut buf: &mut [u8]) -> Result<(), ReadExactError<S::Error>> {
        while !buf.is_empty() {
            let mut retry = 0;
            loop {
                match self.session.read(buf).await {
                    Ok(0) => return Err(ReadExactError::UnexpectedEof),
                    Ok(n) => {
                        buf = &mut buf[n..];
                        break;
                    }
                    Err(e) => {
                        if is_eof_error(&e) {
                            log::debug!("EOF encountered in read_exact: {:?}", e);
                            return Err(ReadExactError::UnexpectedEof);
                        }

                        retry += 1;
                        log::warn!("read_exact attempt {} failed: {:?}", retry, e);
                        if retry >= MAX_RETRIES {
                            return Err(ReadExactError::Other(e));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl<'a, S> Write for Transport<'a, S>
where
    S: ErrorType + Read + Write + 'a,
    S::Error: core::fmt::Debug,
{
    async fn write(&mut self, buf: &[u8]) -> Result<usize, S::Error> {
        let mut attempt = 0;
        loop {
            match self.session.write(buf).await {
                Ok(n) => {
                    // rust-mqtt never flushes, the TLS session buffers until it does
                    self.session.flush().await?;
                    return Ok(n);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt == MAX_RETRIES {
                        return Err(e);
                    }
                    log::warn!("write attempt {} failed: {:?}", attempt, e);
                }
            }
        }
    }

    async fn flush(&mut self) -> Result<(), S::Error> {
        let mut attempt = 0;
        loop {
            match self.session.flush().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    attempt += 1;
                    if attempt == MAX_RETRIES {
                        return Err(e);
                    }
                    log::warn!("flush attempt {} failed: {:?}", attempt, e);
                }
            }
        }
    }
}

// Error types of the socket and TLS layers have no common EOF variant
fn is_eof_error<E: core::fmt::Debug>(error: &E) -> bool {
    let error_str = format!("{:?}", error);
    error_str.contains("Eof")
        || error_str.contains("ConnectionReset")
        || error_str.contains("ConnectionClosed")
        || error_str.contains("BrokenPipe")
}
