//! Session connection state machine.
//!
//! Models the lifecycle of one logical session to a drone, with
//! validated transitions that return `Result` instead of panicking.
//! No RPC call is valid unless the phase is `Connected`.

use std::time::Instant;

use crate::error::HiveError;

/// The current phase of a drone session.
///
/// ```text
///  Disconnected ──► Connecting ──► Handshaking ──► Connected
///       ▲                │               │              │
///       │                ▼               ▼              ▼
///       └──────── Disconnecting ◄────────┴──────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionPhase {
    /// No active session. Initial / terminal state.
    #[default]
    Disconnected,

    /// TCP connection initiated but not yet established.
    Connecting,

    /// TCP link is up; performing the Hello version exchange.
    Handshaking,

    /// Handshake complete; RPC calls are valid.
    Connected {
        /// When the session entered the `Connected` state.
        since: Instant,
    },

    /// Graceful shutdown in progress (Goodbye sent).
    Disconnecting,
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Handshaking => write!(f, "Handshaking"),
            Self::Connected { .. } => write!(f, "Connected"),
            Self::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}

impl ConnectionPhase {
    /// Returns `true` when the session is established and RPC-ready.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Returns `true` when the session is in its idle/terminal state.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// How long the session has been in the `Connected` state.
    ///
    /// Returns `None` for any other phase.
    pub fn connected_duration(&self) -> Option<std::time::Duration> {
        match self {
            Self::Connected { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Connecting`.
    ///
    /// Valid from: `Disconnected`.
    pub fn begin_connect(&mut self) -> Result<(), HiveError> {
        match self {
            Self::Disconnected => {
                *self = Self::Connecting;
                Ok(())
            }
            _ => Err(HiveError::WorkflowViolation(
                "cannot connect: not in Disconnected state",
            )),
        }
    }

    /// Transition to `Handshaking`.
    ///
    /// Valid from: `Connecting`.
    pub fn begin_handshake(&mut self) -> Result<(), HiveError> {
        match self {
            Self::Connecting => {
                *self = Self::Handshaking;
                Ok(())
            }
            _ => Err(HiveError::WorkflowViolation(
                "cannot handshake: not in Connecting state",
            )),
        }
    }

    /// Transition to `Connected`.
    ///
    /// Valid from: `Handshaking`.
    pub fn complete_handshake(&mut self) -> Result<(), HiveError> {
        match self {
            Self::Handshaking => {
                *self = Self::Connected {
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(HiveError::WorkflowViolation(
                "cannot complete handshake: not in Handshaking state",
            )),
        }
    }

    /// Transition to `Disconnecting`.
    ///
    /// Valid from: `Handshaking`, `Connected`.
    pub fn begin_disconnect(&mut self) -> Result<(), HiveError> {
        match self {
            Self::Handshaking | Self::Connected { .. } => {
                *self = Self::Disconnecting;
                Ok(())
            }
            _ => Err(HiveError::WorkflowViolation(
                "cannot disconnect: not in Handshaking or Connected state",
            )),
        }
    }

    /// Transition to `Disconnected`.
    ///
    /// Valid from: `Disconnecting`, `Connecting` (connect failure),
    /// `Handshaking` (handshake failure).
    pub fn finish_disconnect(&mut self) -> Result<(), HiveError> {
        match self {
            Self::Disconnecting | Self::Connecting | Self::Handshaking => {
                *self = Self::Disconnected;
                Ok(())
            }
            _ => Err(HiveError::WorkflowViolation(
                "cannot finish disconnect: not in a disconnectable state",
            )),
        }
    }

    /// Force-reset to `Disconnected` regardless of current state.
    ///
    /// Use this for unrecoverable errors (e.g. I/O failure mid-call).
    pub fn force_disconnect(&mut self) {
        *self = Self::Disconnected;
    }
}

// ── Tests ────────────────────────────────────────────────────────
