use serde::{Deserialize, Serialize};

use crate::run::RunId;

pub type RequestId = u64;

/// A reverse-image-search match offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LensCandidate {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuidedPhase {
    #[default]
    Inputs,
    Identifying,
    PickMatch,
    ReadyToAnalyze,
    Analyzing,
    Done,
}

/// Guided identification flow: candidate lookup, pick, confirm, analyze.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuidedState {
    pub(crate) phase: GuidedPhase,
    pub(crate) candidates: Vec<LensCandidate>,
    pub(crate) selected_id: Option<String>,
    pub(crate) title_draft: String,
    pub(crate) original_title: String,
    pub(crate) pending_request: Option<RequestId>,
    pub(crate) run_id: Option<RunId>,
    pub(crate) error: Option<String>,
}

impl GuidedState {
    pub fn phase(&self) -> GuidedPhase {
        self.phase
    }

    pub fn candidates(&self) -> &[LensCandidate] {
        &self.candidates
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn title_draft(&self) -> &str {
        &self.title_draft
    }

    pub fn run_id(&self) -> Option<RunId> {
        self.run_id
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Selection and title are frozen while the analysis runs.
    pub fn is_locked(&self) -> bool {
        self.phase == GuidedPhase::Analyzing
    }

    /// Normalised title the run would use; empty when nothing usable is typed.
    pub fn confirmed_title(&self) -> String {
        normalize_title(&self.title_draft)
    }

    /// True when the draft differs in substance from the picked candidate's title.
    pub fn title_was_edited(&self) -> bool {
        self.selected_id.is_some() && normalize_title(&self.title_draft) != self.original_title
    }

    pub(crate) fn begin_identify(&mut self, request_id: RequestId) {
        *self = Self {
            phase: GuidedPhase::Identifying,
            pending_request: Some(request_id),
            ..Self::default()
        };
    }

    pub(crate) fn candidates_loaded(&mut self, result: Result<Vec<LensCandidate>, String>) {
        self.pending_request = None;
        match result {
            Ok(candidates) if !candidates.is_empty() => {
                self.candidates = candidates;
                self.phase = GuidedPhase::PickMatch;
            }
            Ok(_) => {
                self.phase = GuidedPhase::Inputs;
                self.error = Some("No matching products found.".to_string());
            }
            Err(message) => {
                self.phase = GuidedPhase::Inputs;
                self.error = Some(message);
            }
        }
    }

    pub(crate) fn select(&mut self, id: &str) -> bool {
        if !self.accepts_edits() {
            return false;
        }
        let Some(candidate) = self.candidates.iter().find(|c| c.id == id) else {
            return false;
        };
        let title = normalize_title(&candidate.title);
        self.selected_id = Some(candidate.id.clone());
        self.title_draft.clone_from(&title);
        self.original_title = title;
        self.refresh_readiness();
        true
    }

    pub(crate) fn edit_title(&mut self, text: String) -> bool {
        if !self.accepts_edits() {
            return false;
        }
        self.title_draft = text;
        self.refresh_readiness();
        true
    }

    pub(crate) fn can_confirm(&self) -> bool {
        matches!(
            self.phase,
            GuidedPhase::PickMatch | GuidedPhase::ReadyToAnalyze
        ) && !self.confirmed_title().is_empty()
    }

    pub(crate) fn begin_analyzing(&mut self, run_id: RunId) {
        self.phase = GuidedPhase::Analyzing;
        self.run_id = Some(run_id);
        self.error = None;
    }

    pub(crate) fn run_finished(&mut self, run_id: RunId) -> bool {
        if self.phase == GuidedPhase::Analyzing && self.run_id == Some(run_id) {
            self.phase = GuidedPhase::Done;
            return true;
        }
        false
    }

    fn accepts_edits(&self) -> bool {
        matches!(
            self.phase,
            GuidedPhase::PickMatch | GuidedPhase::ReadyToAnalyze
        )
    }

    fn refresh_readiness(&mut self) {
        self.phase = if self.selected_id.is_some() && !self.confirmed_title().is_empty() {
            GuidedPhase::ReadyToAnalyze
        } else {
            GuidedPhase::PickMatch
        };
    }
}

/// Trims the title and strips one trailing "…" or "..." plus surrounding whitespace.
pub fn normalize_title(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_suffix('…')
        .or_else(|| trimmed.strip_suffix("..."))
        .unwrap_or(trimmed);
    stripped.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_trailing_ellipsis() {
        assert_eq!(normalize_title("  Vintage lamp …  "), "Vintage lamp");
        assert_eq!(normalize_title("Vintage lamp..."), "Vintage lamp");
        assert_eq!(normalize_title("Vintage...lamp"), "Vintage...lamp");
        assert_eq!(normalize_title(" ... "), "");
    }
}
