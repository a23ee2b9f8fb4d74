//! # hive-core
//!
//! Client library for driving a remote "drone" traffic generator:
//! configure a packet stream, transmit, capture, and collect results.
//!
//! This crate contains:
//! - **Wire types**: `FrameHeader`, `Frame`, `Method`, `MessageType`, `FrameFlags`
//! - **Payloads**: Structured request/response types for ports, streams, stats, capture
//! - **Codec**: `DroneCodec` for framed TCP I/O via `tokio_util`
//! - **Network**: `DroneConnection` for managed TCP connections with keep-alive
//! - **Client**: `DroneClient`, a typed RPC surface behind the `DroneRpc` trait
//! - **State**: Connection-phase and workflow-stage machines with validated transitions
//! - **Session**: `Orchestrator`, the configure→transmit→capture→collect workflow
//!   with guaranteed cleanup of remote state
//! - **Error**: `HiveError` — typed, `thiserror`-based error hierarchy

pub mod client;
pub mod codec;
pub mod error;
pub mod flags;
pub mod frame;
pub mod header;
pub mod ident;
pub mod message;
pub mod network;
pub mod proto;
pub mod session;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use client::{DroneClient, DroneRpc, DEFAULT_RPC_TIMEOUT};
pub use codec::DroneCodec;
pub use error::HiveError;
pub use flags::FrameFlags;
pub use frame::{Frame, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use header::{FrameHeader, HEADER_SIZE};
pub use ident::{PortId, StreamId};
pub use message::{MessageType, Method};
pub use network::{ConnectionInfo, DroneConnection};
pub use session::{
    choose_loopback, Orchestrator, RunPlan, RunReport, DEFAULT_TRANSMIT_WAIT,
};
pub use state::{ConnectionPhase, WorkflowStage};
