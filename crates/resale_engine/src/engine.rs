use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use resale_core::{LensRequest, RequestId, RunId, RunRequest};
use tokio_util::sync::CancellationToken;

use crate::fetch::{ChannelFrameSink, ReqwestStreamer, StreamSettings, Streamer};
use crate::lens::{CandidateSource, ReqwestLensClient};
use crate::EngineEvent;

enum EngineCommand {
    StartRun { run_id: RunId, request: RunRequest },
    CancelRun { run_id: RunId },
    FetchCandidates { request_id: RequestId, request: LensRequest },
}

type TokenMap = Arc<Mutex<HashMap<RunId, CancellationToken>>>;

/// Runs network work on a background tokio runtime and reports back over a channel.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: StreamSettings) -> std::io::Result<Self> {
        Self::with_backends(
            Arc::new(ReqwestStreamer::new(settings.clone())),
            Arc::new(ReqwestLensClient::new(settings)),
        )
    }

    pub fn with_backends(
        streamer: Arc<dyn Streamer>,
        lens: Arc<dyn CandidateSource>,
    ) -> std::io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::spawn(move || {
            let tokens: TokenMap = Arc::new(Mutex::new(HashMap::new()));
            while let Ok(command) = cmd_rx.recv() {
                handle_command(
                    &runtime,
                    command,
                    &streamer,
                    &lens,
                    &tokens,
                    event_tx.clone(),
                );
            }
            engine_debug!("Engine command channel closed");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn start_run(&self, run_id: RunId, request: RunRequest) {
        let _ = self.cmd_tx.send(EngineCommand::StartRun { run_id, request });
    }

    pub fn cancel_run(&self, run_id: RunId) {
        let _ = self.cmd_tx.send(EngineCommand::CancelRun { run_id });
    }

    pub fn fetch_candidates(&self, request_id: RequestId, request: LensRequest) {
        let _ = self.cmd_tx.send(EngineCommand::FetchCandidates {
            request_id,
            request,
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

/// A panic while holding the lock leaves the map itself intact, so keep using it.
fn lock_tokens(tokens: &TokenMap) -> MutexGuard<'_, HashMap<RunId, CancellationToken>> {
    tokens.lock().unwrap_or_else(|poisoned| {
        engine_warn!("Run token map was poisoned; recovering");
        poisoned.into_inner()
    })
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    command: EngineCommand,
    streamer: &Arc<dyn Streamer>,
    lens: &Arc<dyn CandidateSource>,
    tokens: &TokenMap,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::StartRun { run_id, request } => {
            let token = CancellationToken::new();
            lock_tokens(tokens).insert(run_id, token.clone());
            let streamer = streamer.clone();
            let tokens = tokens.clone();
            runtime.spawn(async move {
                let sink = ChannelFrameSink::new(event_tx.clone());
                let result = streamer
                    .stream_run(run_id, &request, &token, &sink)
                    .await;
                lock_tokens(&tokens).remove(&run_id);
                let _ = event_tx.send(EngineEvent::RunFinished { run_id, result });
            });
        }
        EngineCommand::CancelRun { run_id } => {
            let token = lock_tokens(tokens).get(&run_id).cloned();
            match token {
                Some(token) => {
                    engine_info!("Cancelling run_id={}", run_id);
                    token.cancel();
                }
                None => engine_debug!("Cancel for finished or unknown run_id={}", run_id),
            }
        }
        EngineCommand::FetchCandidates {
            request_id,
            request,
        } => {
            let lens = lens.clone();
            runtime.spawn(async move {
                let result = lens.fetch_candidates(&request).await;
                let _ = event_tx.send(EngineEvent::CandidatesFetched { request_id, result });
            });
        }
    }
}
