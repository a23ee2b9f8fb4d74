//! Linear workflow progression for a traffic run.
//!
//! The run has no branching on its success path; every stage has
//! exactly one successor, and [`WorkflowStage::advance`] rejects any
//! attempt to skip ahead. The orchestrator advances this machine as
//! each remote call completes.

use crate::error::HiveError;

/// Stages of the configure → transmit → capture → collect run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowStage {
    /// Nothing has happened yet.
    #[default]
    Idle,
    /// Session established and handshake complete.
    Connected,
    /// Port metadata fetched; tx/rx ports resolved.
    PortsDiscovered,
    /// Stream id registered on the tx port.
    StreamCreated,
    /// Full stream configuration pushed.
    StreamConfigured,
    /// Counters zeroed on tx and rx ports.
    StatsCleared,
    /// Capture and transmit both running.
    Running,
    /// Transmit stopped; capture still recording.
    TransmitStopped,
    /// Capture stopped.
    CaptureStopped,
    /// Counter snapshots fetched.
    StatsCollected,
    /// Stream removed from the drone.
    StreamDeleted,
    /// Session closed. Terminal.
    Disconnected,
}

impl WorkflowStage {
    /// The single stage that legally follows this one, if any.
    pub fn successor(&self) -> Option<WorkflowStage> {
        use WorkflowStage::*;
        match self {
            Idle => Some(Connected),
            Connected => Some(PortsDiscovered),
            PortsDiscovered => Some(StreamCreated),
            StreamCreated => Some(StreamConfigured),
            StreamConfigured => Some(StatsCleared),
            StatsCleared => Some(Running),
            Running => Some(TransmitStopped),
            TransmitStopped => Some(CaptureStopped),
            CaptureStopped => Some(StatsCollected),
            StatsCollected => Some(StreamDeleted),
            StreamDeleted => Some(Disconnected),
            Disconnected => None,
        }
    }

    /// Move to `next`, which must be the immediate successor.
    pub fn advance(&mut self, next: WorkflowStage) -> Result<(), HiveError> {
        if self.successor() == Some(next) {
            *self = next;
            Ok(())
        } else {
            Err(HiveError::WorkflowViolation(
                "workflow stages must advance strictly in order",
            ))
        }
    }

    /// Whether the run has reached its terminal stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStage::Disconnected)
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
