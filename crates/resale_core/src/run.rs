use std::fmt;

use serde::{Deserialize, Serialize};

use crate::frame::{StepSignal, StreamFrame};
use crate::payload::SearchPayload;

pub type RunId = u64;

/// One logical result slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Active,
    Sold,
}

/// What a single request asks the service for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Active,
    Sold,
    Both,
}

impl RunMode {
    /// Wire value for the `mode` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Active => "active",
            RunMode::Sold => "sold",
            RunMode::Both => "both",
        }
    }

    /// Slots whose state a run of this mode drives.
    pub fn slots(self) -> &'static [SearchMode] {
        match self {
            RunMode::Active => &[SearchMode::Active],
            RunMode::Sold => &[SearchMode::Sold],
            RunMode::Both => &[SearchMode::Active, SearchMode::Sold],
        }
    }

    pub fn includes(self, slot: SearchMode) -> bool {
        self.slots().contains(&slot)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StepStatus {
    #[default]
    Pending,
    Active,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEntry {
    pub id: String,
    pub status: StepStatus,
    pub label: Option<String>,
    pub detail: Option<String>,
}

impl StepEntry {
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: StepStatus::Pending,
            label: None,
            detail: None,
        }
    }
}

/// Ordered pipeline steps shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPlan(Vec<String>);

impl StepPlan {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn pending_steps(&self) -> Vec<StepEntry> {
        self.0.iter().map(StepEntry::pending).collect()
    }
}

impl Default for StepPlan {
    fn default() -> Self {
        Self::new(["prepare", "identify", "search", "filter", "analyze"])
    }
}

/// Progress and outcome of the latest run for one slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunState {
    pub run_id: Option<RunId>,
    pub data: Option<SearchPayload>,
    pub loading: bool,
    pub progress: f64,
    pub steps: Vec<StepEntry>,
    pub error: String,
    /// Set once the transport has reported the end of this run.
    pub finished: bool,
}

impl RunState {
    /// Fresh state for a run that is about to start.
    pub fn started(run_id: RunId, plan: &StepPlan) -> Self {
        Self {
            run_id: Some(run_id),
            data: None,
            loading: true,
            progress: 0.0,
            steps: plan.pending_steps(),
            error: String::new(),
            finished: false,
        }
    }

    /// True while a started run has not yet been closed by its `RunFinished`.
    /// An error frame stops `loading` earlier than this.
    pub fn awaiting_finish(&self) -> bool {
        self.run_id.is_some() && !self.finished
    }

    pub fn step_status(&self, id: &str) -> Option<StepStatus> {
        self.steps.iter().find(|s| s.id == id).map(|s| s.status)
    }

    /// Position of the earliest step that is not done yet.
    pub fn lead_index(&self) -> usize {
        lead_index(&self.steps)
    }

    fn step_index_or_append(&mut self, id: &str) -> usize {
        match self.steps.iter().position(|s| s.id == id) {
            Some(index) => index,
            None => {
                self.steps.push(StepEntry::pending(id));
                self.steps.len() - 1
            }
        }
    }

    fn advance_progress(&mut self, pct: Option<f64>) {
        if let Some(pct) = pct {
            self.progress = self.progress.max(pct.clamp(0.0, 1.0));
        }
    }
}

/// Index of the first active step, else the length of the done prefix.
pub fn lead_index(steps: &[StepEntry]) -> usize {
    steps
        .iter()
        .position(|s| s.status == StepStatus::Active)
        .unwrap_or_else(|| {
            steps
                .iter()
                .take_while(|s| s.status == StepStatus::Done)
                .count()
        })
}

/// Applies one stream frame to a run. Steps only ever move forward.
pub fn apply_frame(mut state: RunState, frame: &StreamFrame) -> RunState {
    match frame {
        StreamFrame::Step {
            step_id,
            status,
            pct,
            label,
            detail,
        } => {
            let target = state.step_index_or_append(step_id);
            let starting = *status == StepSignal::Start;
            for (index, step) in state.steps.iter_mut().enumerate() {
                // Only a start hands the active marker over; a late done leaves it alone.
                let closes = starting && index != target && step.status == StepStatus::Active;
                if index < target || closes {
                    step.status = StepStatus::Done;
                }
            }
            let step = &mut state.steps[target];
            step.status = match (*status, step.status) {
                (_, StepStatus::Done) | (StepSignal::Done, _) => StepStatus::Done,
                (StepSignal::Start, _) => StepStatus::Active,
            };
            if label.is_some() {
                step.label.clone_from(label);
            }
            if detail.is_some() {
                step.detail.clone_from(detail);
            }
            state.advance_progress(*pct);
        }
        StreamFrame::Result(payload) => {
            state.data = Some(payload.as_ref().clone());
            state.progress = 1.0;
            for step in &mut state.steps {
                if step.status == StepStatus::Active {
                    step.status = StepStatus::Done;
                }
            }
        }
        StreamFrame::Error(message) => {
            state.error.clone_from(message);
            state.loading = false;
        }
    }
    state
}
