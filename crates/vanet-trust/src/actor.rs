//! Roadside unit actor: one tokio task per RSU, driven by a command channel.
//!
//! Every inbound update for a unit goes through its single task, so the
//! detector's evaluate, count and commit sequence never interleaves for that
//! unit. Different units run in parallel and meet only at the shared ledger.

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use vanet_core::{RsuId, TrafficSummary, VehicleId, VehicleSnapshot};

use crate::block::LedgerBlock;
use crate::detector::DetectionOutcome;
use crate::error::TrustError;
use crate::rsu::RoadsideUnit;

const COMMAND_BUFFER: usize = 256;

/// A command sent to a roadside unit's task.
pub enum RsuCommand {
    /// Evaluate a vehicle's telemetry.
    Telemetry {
        snapshot: VehicleSnapshot,
        reply: oneshot::Sender<Result<DetectionOutcome, TrustError>>,
    },
    /// Read the current traffic summary.
    TrafficSummary {
        reply: oneshot::Sender<TrafficSummary>,
    },
    /// Refresh traffic and append an RSU snapshot block.
    PublishSnapshot {
        now: DateTime<Utc>,
        reply: oneshot::Sender<Result<LedgerBlock, TrustError>>,
    },
    /// List the vehicles currently tracked.
    TrackedVehicles {
        reply: oneshot::Sender<Vec<VehicleId>>,
    },
}

/// Cloneable handle to a running roadside unit.
///
/// The task stops once every handle has been dropped, and its
/// [`JoinHandle`] then yields the final unit state.
#[derive(Debug, Clone)]
pub struct RsuHandle {
    id: RsuId,
    command_tx: mpsc::Sender<RsuCommand>,
}

impl RsuHandle {
    /// Move `rsu` onto its own task. Must be called inside a tokio runtime.
    pub fn spawn(rsu: RoadsideUnit) -> (Self, JoinHandle<RoadsideUnit>) {
        let (command_tx, command_rx) = mpsc::channel::<RsuCommand>(COMMAND_BUFFER);
        let id = rsu.id().clone();
        let task = tokio::spawn(run(rsu, command_rx));
        (Self { id, command_tx }, task)
    }

    pub fn id(&self) -> &RsuId {
        &self.id
    }

    pub async fn submit_telemetry(
        &self,
        snapshot: VehicleSnapshot,
    ) -> Result<DetectionOutcome, TrustError> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(RsuCommand::Telemetry { snapshot, reply }).await?;
        reply_rx.await.map_err(|_| self.stopped())?
    }

    pub async fn traffic_summary(&self) -> Result<TrafficSummary, TrustError> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(RsuCommand::TrafficSummary { reply }).await?;
        reply_rx.await.map_err(|_| self.stopped())
    }

    pub async fn publish_snapshot(&self, now: DateTime<Utc>) -> Result<LedgerBlock, TrustError> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(RsuCommand::PublishSnapshot { now, reply }).await?;
        reply_rx.await.map_err(|_| self.stopped())?
    }

    pub async fn tracked_vehicles(&self) -> Result<Vec<VehicleId>, TrustError> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(RsuCommand::TrackedVehicles { reply }).await?;
        reply_rx.await.map_err(|_| self.stopped())
    }

    async fn send(&self, command: RsuCommand) -> Result<(), TrustError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| self.stopped())
    }

    fn stopped(&self) -> TrustError {
        TrustError::RsuStopped(self.id.to_string())
    }
}

async fn run(mut rsu: RoadsideUnit, mut command_rx: mpsc::Receiver<RsuCommand>) -> RoadsideUnit {
    tracing::info!(rsu_id = %rsu.id(), location = %rsu.location(), "roadside unit started");

    while let Some(command) = command_rx.recv().await {
        handle_command(&mut rsu, command);
    }

    tracing::info!(
        rsu_id = %rsu.id(),
        tracked = rsu.detector().tracked_count(),
        "roadside unit stopped"
    );
    rsu
}

/// Replies are best-effort: a caller that stopped waiting is not an error.
fn handle_command(rsu: &mut RoadsideUnit, command: RsuCommand) {
    match command {
        RsuCommand::Telemetry { snapshot, reply } => {
            let _ = reply.send(rsu.handle_telemetry(snapshot));
        }
        RsuCommand::TrafficSummary { reply } => {
            let _ = reply.send(rsu.traffic());
        }
        RsuCommand::PublishSnapshot { now, reply } => {
            let result = rsu.publish_snapshot(now);
            if let Err(e) = &result {
                tracing::error!(rsu_id = %rsu.id(), error = %e, "failed to publish snapshot");
            }
            let _ = reply.send(result);
        }
        RsuCommand::TrackedVehicles { reply } => {
            let _ = reply.send(rsu.tracked_vehicles());
        }
    }
}
