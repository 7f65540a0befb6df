use std::collections::BTreeSet;

use crate::combined::{combined_payload, combined_steps, overall_progress, SideView};
use crate::guided::{GuidedState, RequestId};
use crate::inputs::SearchInputs;
use crate::listing::{visible_listings, DismissedKeys};
use crate::run::{RunId, RunMode, RunState, SearchMode, StepPlan};
use crate::view_model::{AppViewModel, GuidedView, ListingRow, RunView, StepView};

/// Latest run of one mode plus the listings the user hid from it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModeSlot {
    pub(crate) run: RunState,
    pub(crate) dismissed: DismissedKeys,
}

impl ModeSlot {
    pub fn run(&self) -> &RunState {
        &self.run
    }

    pub fn dismissed(&self) -> &DismissedKeys {
        &self.dismissed
    }

    fn side(&self) -> Option<SideView<'_>> {
        self.run.data.as_ref().map(|payload| SideView {
            payload,
            dismissed: &self.dismissed,
        })
    }

    /// Id of the run still streaming into this slot.
    pub(crate) fn in_flight(&self) -> Option<RunId> {
        self.run.run_id.filter(|_| self.run.loading)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub(crate) inputs: SearchInputs,
    pub(crate) active: ModeSlot,
    pub(crate) sold: ModeSlot,
    pub(crate) requested: Option<RunMode>,
    pub(crate) guided: GuidedState,
    pub(crate) plan: StepPlan,
    next_run_id: RunId,
    next_request_id: RequestId,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_plan(StepPlan::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plan(plan: StepPlan) -> Self {
        Self {
            inputs: SearchInputs::default(),
            active: ModeSlot::default(),
            sold: ModeSlot::default(),
            requested: None,
            guided: GuidedState::default(),
            plan,
            next_run_id: 1,
            next_request_id: 1,
            dirty: false,
        }
    }

    pub fn inputs(&self) -> &SearchInputs {
        &self.inputs
    }

    pub fn slot(&self, mode: SearchMode) -> &ModeSlot {
        match mode {
            SearchMode::Active => &self.active,
            SearchMode::Sold => &self.sold,
        }
    }

    pub(crate) fn slot_mut(&mut self, mode: SearchMode) -> &mut ModeSlot {
        match mode {
            SearchMode::Active => &mut self.active,
            SearchMode::Sold => &mut self.sold,
        }
    }

    pub fn guided(&self) -> &GuidedState {
        &self.guided
    }

    pub fn requested(&self) -> Option<RunMode> {
        self.requested
    }

    /// Returns and clears the render-needed flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn allocate_run_id(&mut self) -> RunId {
        let id = self.next_run_id;
        self.next_run_id += 1;
        id
    }

    pub(crate) fn allocate_request_id(&mut self) -> RequestId {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Distinct in-flight run ids for the slots a mode covers.
    pub(crate) fn in_flight_runs(&self, mode: RunMode) -> BTreeSet<RunId> {
        mode.slots()
            .iter()
            .filter_map(|slot| self.slot(*slot).in_flight())
            .collect()
    }

    /// Slots currently bound to `run_id`.
    pub(crate) fn slots_for_run(&self, run_id: RunId) -> Vec<SearchMode> {
        [SearchMode::Active, SearchMode::Sold]
            .into_iter()
            .filter(|mode| self.slot(*mode).run.run_id == Some(run_id))
            .collect()
    }

    fn requested_runs(&self) -> Vec<&RunState> {
        self.requested
            .map(|mode| mode.slots().iter().map(|slot| &self.slot(*slot).run).collect())
            .unwrap_or_default()
    }

    pub fn view(&self) -> AppViewModel {
        let combined_steps = match self.requested {
            Some(RunMode::Both) => Some(
                combined_steps(&self.active.run, &self.sold.run)
                    .iter()
                    .map(StepView::from)
                    .collect(),
            ),
            _ => None,
        };

        AppViewModel {
            requested: self.requested,
            has_main_image: self.inputs.main_image.is_some(),
            active: run_view(&self.active),
            sold: run_view(&self.sold),
            combined_steps,
            overall_progress: overall_progress(&self.requested_runs()),
            combined: combined_payload(self.active.side(), self.sold.side()),
            guided: GuidedView {
                phase: self.guided.phase(),
                candidates: self.guided.candidates().to_vec(),
                selected_id: self.guided.selected_id().map(ToOwned::to_owned),
                title_draft: self.guided.title_draft().to_string(),
                title_edited: self.guided.title_was_edited(),
                locked: self.guided.is_locked(),
                error: self.guided.error().map(ToOwned::to_owned),
            },
            dirty: self.dirty,
        }
    }
}

fn run_view(slot: &ModeSlot) -> RunView {
    let run = &slot.run;
    let (listings, price_range, visible_priced) = match &run.data {
        Some(payload) => (
            visible_listings(&payload.listings, &slot.dismissed)
                .into_iter()
                .map(|(key, listing)| ListingRow::new(key, listing))
                .collect(),
            crate::analytics::price_range(&payload.listings, &slot.dismissed),
            crate::analytics::visible_priced_count(&payload.listings, &slot.dismissed),
        ),
        None => (Vec::new(), None, 0),
    };

    RunView {
        loading: run.loading,
        progress: run.progress,
        error: (!run.error.is_empty()).then(|| run.error.clone()),
        steps: run.steps.iter().map(StepView::from).collect(),
        has_result: run.data.is_some(),
        listings,
        price_range,
        visible_priced,
    }
}
