//! Demo workflow wiring: build the stream definition, resolve ports,
//! run the orchestrator, report the results.
//!
//! The transmitted stream reproduces a layer-2 functional check: MAC
//! and VLAN headers plus a raw 802.1Q/AVTP control payload, looped
//! through the drone and captured on the rx side.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use hive_core::proto::{select_loopback_port, PortInfo, StreamBuilder, StreamConfig};
use hive_core::{
    choose_loopback, ConnectionInfo, DroneClient, HiveError, Orchestrator, PortId, RunPlan,
    StreamId,
};

use crate::config::{CtlConfig, TrafficConfig};
use crate::prompt;

// Addresses and tag from the layer-2 check this demo reproduces.
const DST_MAC: u64 = 0x000E_C6C3_425F;
const SRC_MAC: u64 = 0x0012_3456_7800;
const VLAN_TAG: u32 = 0x4002;

/// Hex text of the raw control payload carried after the VLAN header.
fn control_payload_hex() -> String {
    // 802.1Q: tag protocol identifier, PCP/CFI nibble, VLAN id.
    let tpid = "8100";
    let pcp_cfi = "3";
    let vlan_id = "111";
    // Ethertype for the control payload.
    let ethertype = "22f0";
    // AVTP control header: subtype, version nibble, NTSCF length and
    // sequence, then the 64-bit stream id.
    let subtype = "82";
    let version = "8";
    let ntscf = "00F00";
    let stream_id = "00123456780081ff";
    format!("{tpid}{pcp_cfi}{vlan_id}{ethertype}{subtype}{version}{ntscf}{stream_id}")
}

/// Build the demo stream definition from the traffic settings.
pub fn demo_stream(traffic: &TrafficConfig) -> Result<StreamConfig, HiveError> {
    Ok(StreamBuilder::new(StreamId(traffic.stream_id))
        .enabled(true)
        .packet_count(traffic.packet_count)?
        .mac(DST_MAC, SRC_MAC)?
        .vlan(VLAN_TAG)?
        .raw_hex(&control_payload_hex())?
        .payload_marker()
        .build())
}

/// Expected wiring, printed before anything is touched.
pub fn banner() {
    println!();
    println!("This demo expects the following topology -");
    println!();
    println!(" +-------+          +-------+");
    println!(" |       |Tx--->----|       |");
    println!(" | Drone |          |  DUT  |");
    println!(" |       |Rx---<----|       |");
    println!(" +-------+          +-------+");
    println!();
    println!("Drone has 2 ports connected to DUT. Packets sent on the Tx port");
    println!("are expected to be received back on the Rx port");
    println!();
    println!("An easy way to simulate the above topology is to select the loopback");
    println!("port as both Tx and Rx ports");
    println!();
}

fn print_port_list(ports: &[PortInfo]) {
    println!("Port List");
    println!("---------");
    for port in ports {
        println!("{}.{} ({})", port.id.id(), port.name, port.description);
    }
}

/// Interactive port resolution: list what was discovered, default to
/// the loopback port, let the operator override tx and rx.
fn choose_interactively(ports: &[PortInfo]) -> Result<(PortId, PortId), HiveError> {
    print_port_list(ports);
    let default = select_loopback_port(ports).map(|p| p.id()).unwrap_or(0);
    let tx = prompt::id("Tx Port Id", default)?;
    let rx = prompt::id("Rx Port Id", default)?;
    Ok((PortId(tx), PortId(rx)))
}

/// Execute the full demo run.
pub async fn run(config: CtlConfig, use_defaults: bool) -> Result<(), HiveError> {
    banner();

    let host = if use_defaults {
        config.drone.host.clone()
    } else {
        prompt::text("Drone's Hostname/IP", &config.drone.host)?
    };

    let info = ConnectionInfo::new(host, config.drone.port);
    let client = DroneClient::new(info);
    let orch = Orchestrator::new(client);

    // Ctrl-C aborts the run; armed remote state is still unwound.
    let cancel = orch.cancellation_token();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("interrupt received, unwinding");
        cancel.cancel();
    });

    let plan = RunPlan::new(demo_stream(&config.traffic)?)
        .transmit_wait(Duration::from_secs(config.traffic.transmit_secs))
        .capture_to(PathBuf::from(&config.capture.path));

    let report = if use_defaults {
        orch.run(plan, |ports| {
            print_port_list(ports);
            choose_loopback(ports)
        })
        .await?
    } else {
        orch.run(plan, choose_interactively).await?
    };

    info!(
        "run complete: tx {} sent {} pkts, rx {} received {} pkts",
        report.tx_port, report.tx_stats.tx_pkts, report.rx_port, report.rx_stats.rx_pkts
    );
    if let Some(path) = &report.capture_path {
        info!(
            "rx capture ({} bytes) saved to {}",
            report.capture.len(),
            path.display()
        );
    }
    Ok(())
}
