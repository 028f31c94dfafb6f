//! Trait abstraction for the device link to enable testing

use async_trait::async_trait;
use futures_util::StreamExt;
use std::fmt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use crate::config::DeviceConfig;
use crate::error::Result;
use crate::protocol::message::NOVA_SSDP_SEARCH_TARGET;

/// Host and port of the device's message endpoint
///
/// The device announces this endpoint over SSDP as
/// [`NOVA_SSDP_SEARCH_TARGET`]; the service is a WebSocket at the root path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// WebSocket URL of the endpoint
    ///
    /// ```
    /// use nova_bridge::connection::transport::Endpoint;
    ///
    /// assert_eq!(Endpoint::new("192.168.1.40", 2920).url(), "ws://192.168.1.40:2920");
    /// assert_eq!(Endpoint::new("fe80::1", 2920).url(), "ws://[fe80::1]:2920");
    /// ```
    pub fn url(&self) -> String {
        format!("ws://{}", self)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl From<&DeviceConfig> for Endpoint {
    fn from(device: &DeviceConfig) -> Self {
        Self::new(device.host.trim(), device.port)
    }
}

/// Data frame received from the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// Trait for an open message stream
#[async_trait]
pub trait FrameStream: Send {
    /// Wait for the next data frame
    ///
    /// Returns `None` once the remote side has closed the stream.
    async fn next_frame(&mut self) -> Option<Result<Frame>>;

    /// Close the stream
    async fn close(&mut self) -> Result<()>;
}

/// Trait for establishing the device link
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Perform the handshake with the device's message endpoint
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn FrameStream>>;
}

/// WebSocket connector used against real devices
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn FrameStream>> {
        let url = endpoint.url();
        debug!("Opening WebSocket to {} ({})", url, NOVA_SSDP_SEARCH_TARGET);

        let (socket, response) = tokio_tungstenite::connect_async(url.as_str()).await?;
        debug!("WebSocket handshake complete (HTTP {})", response.status());

        Ok(Box::new(WsFrameStream { socket }))
    }
}

/// Wrapper around a tungstenite stream that implements FrameStream
pub struct WsFrameStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FrameStream for WsFrameStream {
    async fn next_frame(&mut self) -> Option<Result<Frame>> {
        loop {
            match self.socket.next().await? {
                Ok(WsMessage::Text(text)) => return Some(Ok(Frame::Text(text))),
                Ok(WsMessage::Binary(data)) => return Some(Ok(Frame::Binary(data))),
                Ok(WsMessage::Close(frame)) => {
                    debug!("Device sent close frame: {:?}", frame);
                    return None;
                }
                // Pongs are queued by tungstenite itself
                Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) | Ok(WsMessage::Frame(_)) => {
                    trace!("Skipping control frame");
                }
                Err(tungstenite::Error::ConnectionClosed)
                | Err(tungstenite::Error::AlreadyClosed) => return None,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.socket.close(None).await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
