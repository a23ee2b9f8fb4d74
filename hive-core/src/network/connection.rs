//! A managed TCP connection to a drone.
//!
//! The socket is split into background reader and writer tasks bridged
//! by mpsc channels, so callers exchange [`Frame`]s without touching
//! the socket directly. A periodic keep-alive frame is sent while the
//! connection handle is alive.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::codec::DroneCodec;
use crate::error::HiveError;
use crate::frame::Frame;

/// Outbound keep-alive cadence.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Channel depth between caller and the socket tasks.
const CHANNEL_DEPTH: usize = 100;

// ── ConnectionInfo ───────────────────────────────────────────────

/// Host and port of a drone endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    host: String,
    port: u16,
}

impl ConnectionInfo {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl std::fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ── DroneConnection ──────────────────────────────────────────────

/// An established frame-level connection to a drone.
#[derive(Debug)]
pub struct DroneConnection {
    /// Channel into the background writer task.
    tx: mpsc::Sender<Frame>,
    /// Channel out of the background reader task.
    rx: mpsc::Receiver<Frame>,
}

impl DroneConnection {
    /// Wrap an already-connected stream and spawn the socket tasks.
    pub fn new(stream: TcpStream) -> Self {
        let (mut net_writer, mut net_reader) = Framed::new(stream, DroneCodec).split();

        // Caller -> network.
        let (user_tx, mut network_rx) = mpsc::channel::<Frame>(CHANNEL_DEPTH);
        // Network -> caller.
        let (network_tx, user_rx) = mpsc::channel::<Frame>(CHANNEL_DEPTH);

        tokio::spawn(async move {
            while let Some(frame) = network_rx.recv().await {
                if let Err(e) = net_writer.send(frame).await {
                    warn!("connection write failed: {e}");
                    break;
                }
            }
            debug!("writer task finished");
        });

        tokio::spawn(async move {
            while let Some(result) = net_reader.next().await {
                match result {
                    Ok(frame) => {
                        if network_tx.send(frame).await.is_err() {
                            // Caller dropped its handle; stop reading.
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("connection read failed: {e}");
                        break;
                    }
                }
            }
            debug!("reader task finished");
        });

        // Keep-alive until the caller's handle goes away.
        let heartbeat_tx = user_tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
            interval.tick().await; // first tick fires immediately; skip it
            loop {
                interval.tick().await;
                if heartbeat_tx.send(Frame::heartbeat()).await.is_err() {
                    break;
                }
            }
        });

        Self {
            tx: user_tx,
            rx: user_rx,
        }
    }

    /// Open a TCP connection to `info`. Fails fast; no retry.
    pub async fn connect(info: &ConnectionInfo) -> Result<Self, HiveError> {
        let stream = TcpStream::connect((info.host(), info.port())).await?;
        Ok(Self::new(stream))
    }

    /// Queue a frame for transmission.
    pub async fn send(&self, frame: Frame) -> Result<(), HiveError> {
        self.tx.send(frame).await.map_err(HiveError::from)
    }

    /// Receive the next inbound frame. `None` once the peer is gone.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }
}
