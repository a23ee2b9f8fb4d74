//! Typed RPC client for the drone control protocol.
//!
//! [`DroneClient`] owns one session: it dials, performs the Hello
//! version exchange, issues one call at a time, and matches responses
//! by request id. [`DroneRpc`] is the trait seam the session
//! orchestrator is written against, so workflows can be tested with a
//! scripted fake instead of a live socket.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::HiveError;
use crate::frame::Frame;
use crate::ident::PortId;
use crate::message::Method;
use crate::network::{ConnectionInfo, DroneConnection};
use crate::proto::{
    self, CaptureBuffer, Hello, PortIdList, PortInfo, PortStats, RpcFault, StreamConfigList,
    StreamIdList, PROTOCOL_VERSION,
};
use crate::state::ConnectionPhase;

/// Deadline applied to every call.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

// ── DroneRpc ─────────────────────────────────────────────────────

/// The remote surface of a drone, one method per RPC.
///
/// One call is in flight at a time; every method is fatal on error
/// (no retry happens at this layer).
#[async_trait]
pub trait DroneRpc: Send {
    /// Establish the session. Fails fast on an unreachable drone.
    async fn connect(&mut self) -> Result<(), HiveError>;

    /// Close the session gracefully. Safe to call when already closed.
    async fn disconnect(&mut self) -> Result<(), HiveError>;

    /// Whether the session is established and RPC-ready.
    fn is_connected(&self) -> bool;

    /// Identifiers of all ports on the drone.
    async fn port_id_list(&mut self) -> Result<Vec<PortId>, HiveError>;

    /// Name/description metadata for the given ports.
    async fn port_config(&mut self, ports: &PortIdList) -> Result<Vec<PortInfo>, HiveError>;

    /// Register stream ids on a port.
    async fn add_stream(&mut self, streams: &StreamIdList) -> Result<(), HiveError>;

    /// Push full configuration for previously added streams.
    async fn modify_stream(&mut self, config: &StreamConfigList) -> Result<(), HiveError>;

    /// Remove streams from a port.
    async fn delete_stream(&mut self, streams: &StreamIdList) -> Result<(), HiveError>;

    /// Zero the counters on the given ports.
    async fn clear_stats(&mut self, ports: &PortIdList) -> Result<(), HiveError>;

    /// Start transmitting configured streams.
    async fn start_transmit(&mut self, ports: &PortIdList) -> Result<(), HiveError>;

    /// Stop transmitting.
    async fn stop_transmit(&mut self, ports: &PortIdList) -> Result<(), HiveError>;

    /// Start recording received packets.
    async fn start_capture(&mut self, ports: &PortIdList) -> Result<(), HiveError>;

    /// Stop recording.
    async fn stop_capture(&mut self, ports: &PortIdList) -> Result<(), HiveError>;

    /// Counter snapshots for the given ports.
    async fn stats(&mut self, ports: &PortIdList) -> Result<Vec<PortStats>, HiveError>;

    /// The capture recording from one port.
    async fn capture_buffer(&mut self, port: PortId) -> Result<CaptureBuffer, HiveError>;
}

// ── DroneClient ──────────────────────────────────────────────────

/// A session to one drone endpoint.
///
/// Created disconnected; [`connect`](DroneRpc::connect) dials and
/// handshakes. Owned exclusively by one caller: concurrent workflows
/// use separate clients.
pub struct DroneClient {
    info: ConnectionInfo,
    phase: ConnectionPhase,
    conn: Option<DroneConnection>,
    next_request_id: u64,
    rpc_timeout: Duration,
}

impl DroneClient {
    pub fn new(info: ConnectionInfo) -> Self {
        Self {
            info,
            phase: ConnectionPhase::default(),
            conn: None,
            // 0 is reserved for heartbeats.
            next_request_id: 1,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
        }
    }

    /// Override the per-call deadline.
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    /// The endpoint this client dials.
    pub fn info(&self) -> &ConnectionInfo {
        &self.info
    }

    /// Current session phase.
    pub fn phase(&self) -> &ConnectionPhase {
        &self.phase
    }

    /// Send one request and wait for its matching response.
    ///
    /// Inbound heartbeats and stale responses are skipped. An
    /// `ERROR`-flagged response is decoded as an [`RpcFault`] and
    /// surfaced as [`HiveError::Rpc`].
    async fn exchange(&mut self, method: Method, payload: Vec<u8>) -> Result<Frame, HiveError> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let timeout = self.rpc_timeout;
        let conn = self
            .conn
            .as_mut()
            .ok_or(HiveError::WorkflowViolation("rpc attempted without a connection"))?;

        conn.send(Frame::new_request(request_id, method, payload)?).await?;

        let response = tokio::time::timeout(timeout, async {
            loop {
                match conn.recv().await {
                    Some(frame) if frame.is_heartbeat() => continue,
                    Some(frame) if frame.request_id() == request_id => break Ok(frame),
                    Some(frame) => {
                        debug!(
                            "dropping stale response for request {} while waiting on {}",
                            frame.request_id(),
                            request_id
                        );
                        continue;
                    }
                    None => break Err(HiveError::ChannelClosed),
                }
            }
        })
        .await
        .map_err(|_| HiveError::Timeout(timeout))??;

        if response.is_fault() {
            let fault: RpcFault = proto::decode(&response.decompressed_payload()?)?;
            return Err(HiveError::Rpc {
                method,
                message: fault.message,
            });
        }
        Ok(response)
    }

    /// `exchange` guarded by the no-RPC-while-disconnected invariant.
    async fn call(&mut self, method: Method, payload: Vec<u8>) -> Result<Frame, HiveError> {
        if !self.phase.is_connected() {
            return Err(HiveError::WorkflowViolation(
                "rpc attempted while not connected",
            ));
        }
        self.exchange(method, payload).await
    }

    /// `call` for methods whose success response carries no payload.
    async fn call_unit(&mut self, method: Method, payload: Vec<u8>) -> Result<(), HiveError> {
        self.call(method, payload).await.map(|_| ())
    }

    /// Run the Hello version exchange; returns the drone's agent string.
    async fn hello_exchange(&mut self) -> Result<String, HiveError> {
        let hello = Hello::new(concat!("hive-core/", env!("CARGO_PKG_VERSION")));
        let reply = self.exchange(Method::Hello, proto::encode(&hello)?).await?;
        let remote: Hello = proto::decode(&reply.decompressed_payload()?)?;
        if remote.version != PROTOCOL_VERSION {
            return Err(HiveError::UnsupportedVersion {
                local: PROTOCOL_VERSION,
                remote: remote.version,
            });
        }
        Ok(remote.agent)
    }
}

#[async_trait]
impl DroneRpc for DroneClient {
    async fn connect(&mut self) -> Result<(), HiveError> {
        self.phase.begin_connect()?;

        let conn = match DroneConnection::connect(&self.info).await {
            Ok(conn) => conn,
            Err(e) => {
                // Back to Disconnected so the session can be retried
                // by a fresh caller.
                self.phase.finish_disconnect()?;
                return Err(e);
            }
        };
        self.conn = Some(conn);
        self.phase.begin_handshake()?;

        match self.hello_exchange().await {
            Ok(agent) => {
                self.phase.complete_handshake()?;
                debug!("connected to {} ({agent})", self.info);
                Ok(())
            }
            Err(e) => {
                self.conn = None;
                self.phase.force_disconnect();
                Err(e)
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), HiveError> {
        if !self.phase.is_connected() {
            // Idempotent: tearing down an unconnected session is a no-op.
            self.conn = None;
            self.phase.force_disconnect();
            return Ok(());
        }

        self.phase.begin_disconnect()?;
        if let Some(conn) = &self.conn {
            // Goodbye expects no response; best effort on a dying link.
            let request_id = self.next_request_id;
            self.next_request_id += 1;
            let goodbye = Frame::new_request(request_id, Method::Goodbye, Vec::new())?;
            let _ = conn.send(goodbye).await;
        }
        self.conn = None;
        self.phase.finish_disconnect()?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.phase.is_connected()
    }

    async fn port_id_list(&mut self) -> Result<Vec<PortId>, HiveError> {
        let reply = self.call(Method::GetPortIdList, Vec::new()).await?;
        let list: PortIdList = proto::decode(&reply.decompressed_payload()?)?;
        Ok(list.ids)
    }

    async fn port_config(&mut self, ports: &PortIdList) -> Result<Vec<PortInfo>, HiveError> {
        let reply = self
            .call(Method::GetPortConfig, proto::encode(ports)?)
            .await?;
        proto::decode(&reply.decompressed_payload()?)
    }

    async fn add_stream(&mut self, streams: &StreamIdList) -> Result<(), HiveError> {
        self.call_unit(Method::AddStream, proto::encode(streams)?).await
    }

    async fn modify_stream(&mut self, config: &StreamConfigList) -> Result<(), HiveError> {
        self.call_unit(Method::ModifyStream, proto::encode(config)?).await
    }

    async fn delete_stream(&mut self, streams: &StreamIdList) -> Result<(), HiveError> {
        self.call_unit(Method::DeleteStream, proto::encode(streams)?).await
    }

    async fn clear_stats(&mut self, ports: &PortIdList) -> Result<(), HiveError> {
        self.call_unit(Method::ClearStats, proto::encode(ports)?).await
    }

    async fn start_transmit(&mut self, ports: &PortIdList) -> Result<(), HiveError> {
        self.call_unit(Method::StartTransmit, proto::encode(ports)?).await
    }

    async fn stop_transmit(&mut self, ports: &PortIdList) -> Result<(), HiveError> {
        self.call_unit(Method::StopTransmit, proto::encode(ports)?).await
    }

    async fn start_capture(&mut self, ports: &PortIdList) -> Result<(), HiveError> {
        self.call_unit(Method::StartCapture, proto::encode(ports)?).await
    }

    async fn stop_capture(&mut self, ports: &PortIdList) -> Result<(), HiveError> {
        self.call_unit(Method::StopCapture, proto::encode(ports)?).await
    }

    async fn stats(&mut self, ports: &PortIdList) -> Result<Vec<PortStats>, HiveError> {
        let reply = self.call(Method::GetStats, proto::encode(ports)?).await?;
        proto::decode(&reply.decompressed_payload()?)
    }

    async fn capture_buffer(&mut self, port: PortId) -> Result<CaptureBuffer, HiveError> {
        let reply = self
            .call(Method::GetCaptureBuffer, proto::encode(&port)?)
            .await?;
        proto::decode(&reply.decompressed_payload()?)
    }
}
