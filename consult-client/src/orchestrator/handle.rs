use tokio::sync::{mpsc, oneshot, watch};

use crate::error::OrchestratorError;
use crate::orchestrator::events::Phase;
use crate::orchestrator::media::LocalTrack;

#[derive(Debug)]
pub(crate) enum Command {
    Start,
    AddTrack(LocalTrack),
    Retry,
    Shutdown(oneshot::Sender<()>),
}

/// Control surface of a running orchestrator. Clones drive the same call.
#[derive(Clone)]
pub struct OrchestratorHandle {
    command_tx: mpsc::Sender<Command>,
    phase_rx: watch::Receiver<Phase>,
}

impl OrchestratorHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, phase_rx: watch::Receiver<Phase>) -> Self {
        Self {
            command_tx,
            phase_rx,
        }
    }

    /// Acquires media, builds the engine and joins the session. Ignored
    /// unless the call is idle.
    pub async fn start(&self) -> Result<(), OrchestratorError> {
        self.send(Command::Start).await
    }

    /// Adds a local track mid-call, which renegotiates.
    pub async fn add_track(&self, track: LocalTrack) -> Result<(), OrchestratorError> {
        self.send(Command::AddTrack(track)).await
    }

    /// Rebuilds a failed call from scratch and re-arms automatic recovery.
    pub async fn retry(&self) -> Result<(), OrchestratorError> {
        self.send(Command::Retry).await
    }

    /// Tears everything down and waits for it. Calling it again, or after
    /// the orchestrator stopped, does nothing.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.command_tx.send(Command::Shutdown(ack)).await.is_ok() {
            let _ = done.await;
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase_rx.clone()
    }

    /// Resolves with the first phase, current one included, that matches.
    pub async fn wait_for(
        &self,
        predicate: impl Fn(&Phase) -> bool,
    ) -> Result<Phase, OrchestratorError> {
        let mut rx = self.phase_rx.clone();
        let phase = rx
            .wait_for(|phase| predicate(phase))
            .await
            .map_err(|_| OrchestratorError::Stopped)?;
        Ok(phase.clone())
    }

    async fn send(&self, cmd: Command) -> Result<(), OrchestratorError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| OrchestratorError::Stopped)
    }
}
