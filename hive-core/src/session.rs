//! Session orchestration: the configure → transmit → capture → collect
//! workflow, with guaranteed cleanup of remote state.
//!
//! The orchestrator drives a [`DroneRpc`] through the linear
//! [`WorkflowStage`] machine. Reversal actions are armed on an unwind
//! stack as remote state is created (stream added, capture started,
//! transmit started); on any failure the armed actions run in reverse
//! order, best effort, followed by a disconnect. Unwind failures are
//! logged and swallowed so the first real error is what the caller
//! sees.
//!
//! Port selection is injected as a closure so prompting (or any other
//! policy) stays outside this module; [`choose_loopback`] is the
//! default used when no explicit selection is supplied.

use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::DroneRpc;
use crate::error::HiveError;
use crate::ident::PortId;
use crate::proto::{
    select_loopback_port, CaptureBuffer, PortIdList, PortInfo, PortStats, StreamConfig,
    StreamConfigList, StreamIdList,
};
use crate::state::WorkflowStage;

/// How long transmit is left running before it is stopped.
pub const DEFAULT_TRANSMIT_WAIT: Duration = Duration::from_secs(7);

// ── Plan and report ──────────────────────────────────────────────

/// Everything a run needs, resolved up front and immutable thereafter.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// The stream definition pushed to the tx port.
    pub stream: StreamConfig,
    /// How long to let transmit run.
    pub transmit_wait: Duration,
    /// Where to persist the capture buffer, if anywhere.
    pub capture_to: Option<PathBuf>,
}

impl RunPlan {
    pub fn new(stream: StreamConfig) -> Self {
        Self {
            stream,
            transmit_wait: DEFAULT_TRANSMIT_WAIT,
            capture_to: None,
        }
    }

    pub fn transmit_wait(mut self, wait: Duration) -> Self {
        self.transmit_wait = wait;
        self
    }

    pub fn capture_to(mut self, path: PathBuf) -> Self {
        self.capture_to = Some(path);
        self
    }
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub tx_port: PortId,
    pub rx_port: PortId,
    pub tx_stats: PortStats,
    pub rx_stats: PortStats,
    pub capture: CaptureBuffer,
    /// Where the capture was persisted, when the plan asked for it.
    pub capture_path: Option<PathBuf>,
}

/// Default port selection: the first loopback-capable port carries
/// both tx and rx, mirroring a single-box test topology.
pub fn choose_loopback(ports: &[PortInfo]) -> Result<(PortId, PortId), HiveError> {
    let id = select_loopback_port(ports).ok_or(HiveError::NoLoopbackPort)?;
    Ok((id, id))
}

// ── Unwind stack ─────────────────────────────────────────────────

/// A reversal action armed when its forward step succeeded.
#[derive(Debug)]
enum UnwindAction {
    StopTransmit(PortId),
    StopCapture(PortId),
    DeleteStream(StreamIdList),
}

// ── Orchestrator ─────────────────────────────────────────────────

/// Drives one traffic run from idle to disconnected.
pub struct Orchestrator<R: DroneRpc> {
    drone: R,
    stage: WorkflowStage,
    armed: Vec<UnwindAction>,
    cancel: CancellationToken,
}

impl<R: DroneRpc> Orchestrator<R> {
    pub fn new(drone: R) -> Self {
        Self {
            drone,
            stage: WorkflowStage::default(),
            armed: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// A handle callers can trigger (e.g. from a Ctrl-C handler) to
    /// abort the run promptly; cleanup still happens.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current position in the workflow.
    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    /// Execute the full workflow.
    ///
    /// `choose_ports` receives the discovered port metadata and returns
    /// the (tx, rx) pair; the list is guaranteed non-empty when it is
    /// called.
    pub async fn run<F>(mut self, plan: RunPlan, choose_ports: F) -> Result<RunReport, HiveError>
    where
        F: FnOnce(&[PortInfo]) -> Result<(PortId, PortId), HiveError> + Send,
    {
        match self.execute(&plan, choose_ports).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.unwind().await;
                Err(e)
            }
        }
    }

    async fn execute<F>(&mut self, plan: &RunPlan, choose_ports: F) -> Result<RunReport, HiveError>
    where
        F: FnOnce(&[PortInfo]) -> Result<(PortId, PortId), HiveError> + Send,
    {
        info!("connecting to drone");
        self.drone.connect().await?;
        self.stage.advance(WorkflowStage::Connected)?;

        info!("retrieving port list");
        let ids = self.drone.port_id_list().await?;
        let ports = self.drone.port_config(&PortIdList::new(ids)).await?;
        if ports.is_empty() {
            return Err(HiveError::NoPorts);
        }
        let (tx_port, rx_port) = choose_ports(&ports)?;
        self.stage.advance(WorkflowStage::PortsDiscovered)?;
        info!("using tx {tx_port}, rx {rx_port}");

        let tx_list = PortIdList::single(tx_port);
        let rx_list = PortIdList::single(rx_port);
        let stream_id = plan.stream.stream_id;

        info!("adding {stream_id} on tx {tx_port}");
        let handle = StreamIdList::single(tx_port, stream_id);
        self.drone.add_stream(&handle).await?;
        self.armed.push(UnwindAction::DeleteStream(handle.clone()));
        self.stage.advance(WorkflowStage::StreamCreated)?;

        info!("configuring {stream_id}");
        let config = StreamConfigList::single(tx_port, plan.stream.clone());
        self.drone.modify_stream(&config).await?;
        self.stage.advance(WorkflowStage::StreamConfigured)?;

        info!("clearing tx/rx stats");
        self.drone.clear_stats(&tx_list).await?;
        self.drone.clear_stats(&rx_list).await?;
        self.stage.advance(WorkflowStage::StatsCleared)?;

        info!("starting capture");
        self.drone.start_capture(&rx_list).await?;
        self.armed.push(UnwindAction::StopCapture(rx_port));

        info!("starting transmit");
        self.drone.start_transmit(&tx_list).await?;
        self.armed.push(UnwindAction::StopTransmit(tx_port));
        self.stage.advance(WorkflowStage::Running)?;

        info!("waiting {:?} for transmit to finish", plan.transmit_wait);
        tokio::select! {
            _ = self.cancel.cancelled() => return Err(HiveError::Cancelled),
            _ = tokio::time::sleep(plan.transmit_wait) => {}
        }

        info!("stopping transmit");
        self.drone.stop_transmit(&tx_list).await?;
        self.disarm_transmit();
        self.stage.advance(WorkflowStage::TransmitStopped)?;

        info!("stopping capture");
        self.drone.stop_capture(&rx_list).await?;
        self.disarm_capture();
        self.stage.advance(WorkflowStage::CaptureStopped)?;

        info!("retrieving stats");
        let tx_stats = self.fetch_single_stats(&tx_list).await?;
        let rx_stats = self.fetch_single_stats(&rx_list).await?;
        self.stage.advance(WorkflowStage::StatsCollected)?;
        info!(
            "tx pkts = {}, rx pkts = {}",
            tx_stats.tx_pkts, rx_stats.rx_pkts
        );

        info!("retrieving rx capture buffer");
        let capture = self.drone.capture_buffer(rx_port).await?;
        let capture_path = match &plan.capture_to {
            Some(path) => {
                capture.persist(path)?;
                info!("capture saved to {}", path.display());
                Some(path.clone())
            }
            None => None,
        };

        info!("deleting {stream_id}");
        self.drone
            .delete_stream(&StreamIdList::single(tx_port, stream_id))
            .await?;
        self.armed.clear();
        self.stage.advance(WorkflowStage::StreamDeleted)?;

        info!("disconnecting");
        self.drone.disconnect().await?;
        self.stage.advance(WorkflowStage::Disconnected)?;

        Ok(RunReport {
            tx_port,
            rx_port,
            tx_stats,
            rx_stats,
            capture,
            capture_path,
        })
    }

    async fn fetch_single_stats(&mut self, ports: &PortIdList) -> Result<PortStats, HiveError> {
        self.drone
            .stats(ports)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HiveError::Other("drone returned an empty stats list".into()))
    }

    fn disarm_transmit(&mut self) {
        self.armed
            .retain(|a| !matches!(a, UnwindAction::StopTransmit(_)));
    }

    fn disarm_capture(&mut self) {
        self.armed
            .retain(|a| !matches!(a, UnwindAction::StopCapture(_)));
    }

    /// Best-effort reversal of everything armed, newest first, then a
    /// disconnect. Failures here are logged, never raised: the error
    /// that triggered the unwind is the one the caller must see.
    async fn unwind(&mut self) {
        while let Some(action) = self.armed.pop() {
            let result = match &action {
                UnwindAction::StopTransmit(port) => {
                    self.drone.stop_transmit(&PortIdList::single(*port)).await
                }
                UnwindAction::StopCapture(port) => {
                    self.drone.stop_capture(&PortIdList::single(*port)).await
                }
                UnwindAction::DeleteStream(handle) => self.drone.delete_stream(handle).await,
            };
            if let Err(e) = result {
                warn!("cleanup step {action:?} failed: {e}");
            }
        }
        if let Err(e) = self.drone.disconnect().await {
            warn!("disconnect during cleanup failed: {e}");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::StreamId;
    use crate::message::Method;
    use crate::proto::{CaptureFormat, StreamBuilder};
    use async_trait::async_trait;
    use tokio_test::assert_ok;

    use std::sync::{Arc, Mutex};

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    /// Scripted drone: records every call, optionally failing some.
    struct ScriptedDrone {
        log: CallLog,
        fail_on: Vec<&'static str>,
        ports: Vec<PortInfo>,
        connected: bool,
    }

    impl ScriptedDrone {
        fn new(ports: Vec<PortInfo>) -> Self {
            Self {
                log: Arc::new(Mutex::new(Vec::new())),
                fail_on: Vec::new(),
                ports,
                connected: false,
            }
        }

        fn failing_at(mut self, step: &'static str) -> Self {
            self.fail_on.push(step);
            self
        }

        /// Handle that outlives the orchestrator consuming the drone.
        fn log_handle(&self) -> CallLog {
            Arc::clone(&self.log)
        }

        fn step(&mut self, name: &'static str, method: Method) -> Result<(), HiveError> {
            self.log.lock().unwrap().push(name);
            if self.fail_on.contains(&name) {
                return Err(HiveError::Rpc {
                    method,
                    message: "scripted failure".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DroneRpc for ScriptedDrone {
        async fn connect(&mut self) -> Result<(), HiveError> {
            self.step("connect", Method::Hello)?;
            self.connected = true;
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<(), HiveError> {
            self.step("disconnect", Method::Goodbye)?;
            self.connected = false;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn port_id_list(&mut self) -> Result<Vec<PortId>, HiveError> {
            self.step("port_id_list", Method::GetPortIdList)?;
            Ok(self.ports.iter().map(|p| p.id).collect())
        }

        async fn port_config(&mut self, _: &PortIdList) -> Result<Vec<PortInfo>, HiveError> {
            self.step("port_config", Method::GetPortConfig)?;
            Ok(self.ports.clone())
        }

        async fn add_stream(&mut self, _: &StreamIdList) -> Result<(), HiveError> {
            self.step("add_stream", Method::AddStream)
        }

        async fn modify_stream(&mut self, _: &StreamConfigList) -> Result<(), HiveError> {
            self.step("modify_stream", Method::ModifyStream)
        }

        async fn delete_stream(&mut self, _: &StreamIdList) -> Result<(), HiveError> {
            self.step("delete_stream", Method::DeleteStream)
        }

        async fn clear_stats(&mut self, _: &PortIdList) -> Result<(), HiveError> {
            self.step("clear_stats", Method::ClearStats)
        }

        async fn start_transmit(&mut self, _: &PortIdList) -> Result<(), HiveError> {
            self.step("start_transmit", Method::StartTransmit)
        }

        async fn stop_transmit(&mut self, _: &PortIdList) -> Result<(), HiveError> {
            self.step("stop_transmit", Method::StopTransmit)
        }

        async fn start_capture(&mut self, _: &PortIdList) -> Result<(), HiveError> {
            self.step("start_capture", Method::StartCapture)
        }

        async fn stop_capture(&mut self, _: &PortIdList) -> Result<(), HiveError> {
            self.step("stop_capture", Method::StopCapture)
        }

        async fn stats(&mut self, ports: &PortIdList) -> Result<Vec<PortStats>, HiveError> {
            self.step("stats", Method::GetStats)?;
            Ok(vec![PortStats {
                port_id: ports.ids[0],
                tx_pkts: 5,
                rx_pkts: 5,
                ..Default::default()
            }])
        }

        async fn capture_buffer(&mut self, port: PortId) -> Result<CaptureBuffer, HiveError> {
            self.step("capture_buffer", Method::GetCaptureBuffer)?;
            Ok(CaptureBuffer::new(port, CaptureFormat::Pcap, vec![1, 2, 3]))
        }
    }

    fn loopback_ports() -> Vec<PortInfo> {
        vec![
            PortInfo::new(PortId(1), "eth0", ""),
            PortInfo::new(PortId(2), "lo", "loopback"),
        ]
    }

    fn demo_plan() -> RunPlan {
        let stream = StreamBuilder::new(StreamId(1))
            .packet_count(5)
            .unwrap()
            .mac(2, 1)
            .unwrap()
            .payload_marker()
            .build();
        RunPlan::new(stream).transmit_wait(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn happy_path_runs_every_step_in_order() {
        let drone = ScriptedDrone::new(loopback_ports());
        let log = drone.log_handle();
        let orch = Orchestrator::new(drone);
        let report = assert_ok!(orch.run(demo_plan(), choose_loopback).await);

        assert_eq!(report.tx_port, PortId(2));
        assert_eq!(report.rx_port, PortId(2));
        assert_eq!(report.tx_stats.tx_pkts, 5);
        assert_eq!(report.rx_stats.rx_pkts, 5);
        assert_eq!(report.capture.data, vec![1, 2, 3]);
        assert!(report.capture_path.is_none());

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "connect",
                "port_id_list",
                "port_config",
                "add_stream",
                "modify_stream",
                "clear_stats",
                "clear_stats",
                "start_capture",
                "start_transmit",
                "stop_transmit",
                "stop_capture",
                "stats",
                "stats",
                "capture_buffer",
                "delete_stream",
                "disconnect",
            ]
        );
    }

    #[tokio::test]
    async fn empty_port_list_aborts_before_stream_calls() {
        let drone = ScriptedDrone::new(Vec::new());
        let log = drone.log_handle();
        let orch = Orchestrator::new(drone);
        let err = orch.run(demo_plan(), choose_loopback).await.unwrap_err();
        assert!(matches!(err, HiveError::NoPorts));

        let log = log.lock().unwrap();
        assert!(!log.contains(&"add_stream"));
        // The session itself is still torn down.
        assert_eq!(log.last(), Some(&"disconnect"));
    }

    #[tokio::test]
    async fn modify_stream_failure_unwinds_stream_and_disconnects() {
        let drone = ScriptedDrone::new(loopback_ports()).failing_at("modify_stream");
        let log = drone.log_handle();
        let orch = Orchestrator::new(drone);
        let err = orch.run(demo_plan(), choose_loopback).await.unwrap_err();

        // The original error survives the unwind.
        assert!(matches!(
            err,
            HiveError::Rpc {
                method: Method::ModifyStream,
                ..
            }
        ));

        let log = log.lock().unwrap();
        let tail: Vec<_> = log.iter().skip_while(|s| **s != "modify_stream").collect();
        assert_eq!(tail, vec![&"modify_stream", &"delete_stream", &"disconnect"]);
        // Transmit and capture never started, so nothing stops them.
        assert!(!log.contains(&"stop_transmit"));
        assert!(!log.contains(&"stop_capture"));
    }

    #[tokio::test]
    async fn start_transmit_failure_stops_capture_first() {
        let drone = ScriptedDrone::new(loopback_ports()).failing_at("start_transmit");
        let log = drone.log_handle();
        let orch = Orchestrator::new(drone);
        let err = orch.run(demo_plan(), choose_loopback).await.unwrap_err();
        assert!(matches!(
            err,
            HiveError::Rpc {
                method: Method::StartTransmit,
                ..
            }
        ));

        let log = log.lock().unwrap();
        let tail: Vec<_> = log.iter().skip_while(|s| **s != "start_transmit").collect();
        assert_eq!(
            tail,
            vec![
                &"start_transmit",
                &"stop_capture",
                &"delete_stream",
                &"disconnect"
            ]
        );
    }

    #[tokio::test]
    async fn unwind_continues_past_failing_cleanup_steps() {
        // Transmit fails, and the stop_capture unwind step fails too;
        // stream deletion and disconnect still run, and the original
        // start_transmit error is what surfaces.
        let drone = ScriptedDrone::new(loopback_ports())
            .failing_at("start_transmit")
            .failing_at("stop_capture");
        let log = drone.log_handle();
        let orch = Orchestrator::new(drone);
        let err = orch.run(demo_plan(), choose_loopback).await.unwrap_err();
        assert!(matches!(
            err,
            HiveError::Rpc {
                method: Method::StartTransmit,
                ..
            }
        ));

        let log = log.lock().unwrap();
        assert!(log.contains(&"stop_capture"));
        assert!(log.contains(&"delete_stream"));
        assert_eq!(log.last(), Some(&"disconnect"));
    }

    #[tokio::test]
    async fn cancellation_during_wait_unwinds_everything() {
        let drone = ScriptedDrone::new(loopback_ports());
        let log = drone.log_handle();
        let orch = Orchestrator::new(drone);
        let cancel = orch.cancellation_token();
        cancel.cancel();

        let plan = demo_plan().transmit_wait(Duration::from_secs(60));
        let err = orch.run(plan, choose_loopback).await.unwrap_err();
        assert!(matches!(err, HiveError::Cancelled));

        let log = log.lock().unwrap();
        let tail: Vec<_> = log.iter().skip_while(|s| **s != "start_transmit").collect();
        assert_eq!(
            tail,
            vec![
                &"start_transmit",
                &"stop_transmit",
                &"stop_capture",
                &"delete_stream",
                &"disconnect"
            ]
        );
    }

    #[tokio::test]
    async fn loopback_chooser_errors_without_loopback() {
        let ports = vec![PortInfo::new(PortId(1), "eth0", "front panel")];
        assert!(matches!(
            choose_loopback(&ports),
            Err(HiveError::NoLoopbackPort)
        ));
    }

    #[test]
    fn plan_defaults() {
        let plan = demo_plan();
        assert!(plan.capture_to.is_none());
        let plan = RunPlan::new(plan.stream);
        assert_eq!(plan.transmit_wait, DEFAULT_TRANSMIT_WAIT);
    }
}
