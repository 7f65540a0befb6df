use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use resale_core::{Effect, Msg, RunOutcome};
use resale_engine::{EngineEvent, EngineHandle, PreviewRegistry, StreamSettings};

/// Executes core effects against the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    previews: PreviewRegistry,
}

impl EffectRunner {
    pub fn new(settings: StreamSettings) -> std::io::Result<Self> {
        Ok(Self {
            engine: EngineHandle::new(settings)?,
            previews: PreviewRegistry::new(),
        })
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartRun { run_id, request } => {
                    engine_info!(
                        "StartRun run_id={} mode={} image={}",
                        run_id,
                        request.mode,
                        request.main_image.path.display()
                    );
                    self.engine.start_run(run_id, request);
                }
                Effect::CancelRun { run_id } => self.engine.cancel_run(run_id),
                Effect::FetchCandidates {
                    request_id,
                    request,
                } => {
                    engine_info!("FetchCandidates request_id={}", request_id);
                    self.engine.fetch_candidates(request_id, request);
                }
                Effect::AcquirePreview { image } => {
                    if let Err(err) = self.previews.acquire(&image) {
                        engine_warn!("Preview for image_id={} unavailable: {}", image.id, err);
                    }
                }
                Effect::ReleasePreview { image_id } => {
                    self.previews.release(image_id);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Frame { run_id, frame } => Msg::RunFrame { run_id, frame },
        EngineEvent::RunFinished { run_id, result } => Msg::RunFinished {
            run_id,
            outcome: match result {
                Ok(_) => RunOutcome::Completed,
                Err(err) if err.is_cancelled() => RunOutcome::Cancelled,
                Err(err) => {
                    engine_warn!("Run {} failed: {}", run_id, err);
                    RunOutcome::Failed(err.user_message())
                }
            },
        },
        EngineEvent::CandidatesFetched { request_id, result } => Msg::CandidatesLoaded {
            request_id,
            result: result
                .map(|response| response.candidates)
                .map_err(|err| err.user_message()),
        },
    }
}
