use crate::frame::StreamFrame;
use crate::guided::{LensCandidate, RequestId};
use crate::inputs::ImageFile;
use crate::run::{RunId, RunMode, SearchMode};

/// How a streamed run ended, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Stream closed normally, with or without a result frame.
    Completed,
    Failed(String),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User picked, replaced or cleared the main image.
    MainImageChanged(Option<ImageFile>),
    /// User changed the set of extra images.
    ExtraImagesChanged(Vec<ImageFile>),
    /// User edited the free-text description.
    TextChanged(String),
    /// User edited the item name used to refine the search.
    ItemNameChanged(String),
    /// User asked for a comparison run.
    RunRequested(RunMode),
    /// User asked to stop the run driving this mode.
    CancelRequested(RunMode),
    /// Transport decoded a frame for a run.
    RunFrame { run_id: RunId, frame: StreamFrame },
    /// Transport finished a run. Always sent exactly once per started run.
    RunFinished { run_id: RunId, outcome: RunOutcome },
    /// User hid a listing from the results of one mode.
    ListingDismissed { mode: SearchMode, key: String },
    /// User started the guided identification lookup.
    IdentifyRequested,
    /// Candidate lookup completed.
    CandidatesLoaded {
        request_id: RequestId,
        result: Result<Vec<LensCandidate>, String>,
    },
    /// User picked a candidate in the guided flow.
    CandidateSelected(String),
    /// User edited the guided title draft.
    TitleEdited(String),
    /// User confirmed the guided title and wants the analysis.
    GuidedRunConfirmed,
    /// Owning view is going away; release everything.
    Teardown,
    /// Fallback for placeholder wiring.
    NoOp,
}
