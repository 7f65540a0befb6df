use std::collections::BTreeSet;

use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::effect::{LensRequest, RunRequest};
use crate::frame::StreamFrame;
use crate::inputs::{ImageFile, ImageId, SearchInputs};
use crate::msg::RunOutcome;
use crate::run::{apply_frame, RunId, RunMode, RunState};
use crate::{AppState, Effect, Msg};

/// Shown when a run or lookup is requested without a main image.
pub const MISSING_IMAGE_ERROR: &str = "Please select a main image first.";

/// Error text recorded for a run the user stopped.
pub const CANCELLED_ERROR: &str = "Cancelled";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::MainImageChanged(image) => {
            if state.inputs.main_image == image {
                return (state, Vec::new());
            }
            let before = held_images(&state.inputs);
            state.inputs.main_image = image;
            // A new image invalidates whatever was identified so far.
            state.guided = Default::default();
            state.mark_dirty();
            preview_changes(&before, &held_images(&state.inputs))
        }
        Msg::ExtraImagesChanged(images) => {
            let before = held_images(&state.inputs);
            state.inputs.extra_images = images;
            state.mark_dirty();
            preview_changes(&before, &held_images(&state.inputs))
        }
        Msg::TextChanged(text) => {
            state.inputs.text = text;
            state.mark_dirty();
            Vec::new()
        }
        Msg::ItemNameChanged(name) => {
            state.inputs.item_name = name;
            state.mark_dirty();
            Vec::new()
        }
        Msg::RunRequested(mode) => {
            let item_name = state.inputs.item_name_field();
            start_run(&mut state, mode, item_name).1
        }
        Msg::CancelRequested(mode) => {
            let runs = state.in_flight_runs(mode);
            engine_info!("Cancel requested for mode={} runs={:?}", mode, runs);
            runs.into_iter()
                .map(|run_id| Effect::CancelRun { run_id })
                .collect()
        }
        Msg::RunFrame { run_id, frame } => {
            apply_run_frame(&mut state, run_id, &frame);
            Vec::new()
        }
        Msg::RunFinished { run_id, outcome } => {
            finish_run(&mut state, run_id, outcome);
            Vec::new()
        }
        Msg::ListingDismissed { mode, key } => {
            let slot = state.slot_mut(mode);
            if slot.dismissed.insert(key) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::IdentifyRequested => {
            if state.guided.is_locked() {
                return (state, Vec::new());
            }
            let Some(main_image) = state.inputs.main_image.clone() else {
                state.guided.error = Some(MISSING_IMAGE_ERROR.to_string());
                state.mark_dirty();
                return (state, Vec::new());
            };
            let request_id = state.allocate_request_id();
            state.guided.begin_identify(request_id);
            state.mark_dirty();
            vec![Effect::FetchCandidates {
                request_id,
                request: LensRequest {
                    main_image,
                    text: state.inputs.text_field(),
                },
            }]
        }
        Msg::CandidatesLoaded { request_id, result } => {
            if state.guided.pending_request == Some(request_id) {
                state.guided.candidates_loaded(result);
                state.mark_dirty();
            } else {
                engine_debug!("Ignoring stale candidate response request_id={}", request_id);
            }
            Vec::new()
        }
        Msg::CandidateSelected(id) => {
            if state.guided.select(&id) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TitleEdited(text) => {
            if state.guided.edit_title(text) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::GuidedRunConfirmed => {
            if !state.guided.can_confirm() {
                return (state, Vec::new());
            }
            let title = state.guided.confirmed_title();
            let (run_id, effects) = start_run(&mut state, RunMode::Both, Some(title));
            if let Some(run_id) = run_id {
                state.guided.begin_analyzing(run_id);
            }
            effects
        }
        Msg::Teardown => {
            let mut effects: Vec<Effect> = state
                .in_flight_runs(RunMode::Both)
                .into_iter()
                .map(|run_id| Effect::CancelRun { run_id })
                .collect();
            effects.extend(preview_changes(&held_images(&state.inputs), &[]));
            state.inputs.main_image = None;
            state.inputs.extra_images.clear();
            state.mark_dirty();
            effects
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Resets the targeted slots and emits the request. Returns the new run id
/// when a request was actually issued.
fn start_run(
    state: &mut AppState,
    mode: RunMode,
    item_name: Option<String>,
) -> (Option<RunId>, Vec<Effect>) {
    state.mark_dirty();
    let Some(main_image) = state.inputs.main_image.clone() else {
        engine_warn!("Run requested for mode={} without a main image", mode);
        for slot in mode.slots() {
            state.slot_mut(*slot).run.error = MISSING_IMAGE_ERROR.to_string();
        }
        return (None, Vec::new());
    };

    let mut effects: Vec<Effect> = state
        .in_flight_runs(mode)
        .into_iter()
        .map(|run_id| Effect::CancelRun { run_id })
        .collect();

    let run_id = state.allocate_run_id();
    let plan = state.plan.clone();
    for target in mode.slots() {
        let slot = state.slot_mut(*target);
        slot.run = RunState::started(run_id, &plan);
        slot.dismissed.clear();
    }
    state.requested = Some(mode);

    engine_info!(
        "StartRun run_id={} mode={} extra_images={}",
        run_id,
        mode,
        state.inputs.extra_images.len()
    );
    effects.push(Effect::StartRun {
        run_id,
        request: build_request(state, mode, main_image, item_name),
    });
    (Some(run_id), effects)
}

fn held_images(inputs: &SearchInputs) -> Vec<ImageFile> {
    inputs.all_images().cloned().collect()
}

/// Preview effects for moving from `before` to `after`. Ownership follows the
/// image id, so an id shared by several inputs is acquired and released once.
fn preview_changes(before: &[ImageFile], after: &[ImageFile]) -> Vec<Effect> {
    let holds = |images: &[ImageFile], id: ImageId| images.iter().any(|image| image.id == id);
    let mut released = BTreeSet::new();
    let mut acquired = BTreeSet::new();
    let mut effects: Vec<Effect> = before
        .iter()
        .filter(|old| !holds(after, old.id) && released.insert(old.id))
        .map(|old| Effect::ReleasePreview { image_id: old.id })
        .collect();
    effects.extend(
        after
            .iter()
            .filter(|new| !holds(before, new.id) && acquired.insert(new.id))
            .map(|new| Effect::AcquirePreview { image: new.clone() }),
    );
    effects
}

fn build_request(
    state: &AppState,
    mode: RunMode,
    main_image: ImageFile,
    item_name: Option<String>,
) -> RunRequest {
    RunRequest {
        mode,
        main_image,
        extra_images: state.inputs.extra_images.clone(),
        text: state.inputs.text_field(),
        item_name,
    }
}

fn apply_run_frame(state: &mut AppState, run_id: RunId, frame: &StreamFrame) {
    let slots = state.slots_for_run(run_id);
    if slots.is_empty() {
        engine_debug!("Ignoring frame for stale run_id={}", run_id);
        return;
    }
    for mode in slots {
        let slot = state.slot_mut(mode);
        slot.run = apply_frame(std::mem::take(&mut slot.run), frame);
    }
    state.mark_dirty();
}

fn finish_run(state: &mut AppState, run_id: RunId, outcome: RunOutcome) {
    for mode in state.slots_for_run(run_id) {
        let run = &mut state.slot_mut(mode).run;
        run.loading = false;
        run.finished = true;
        match &outcome {
            RunOutcome::Completed => {}
            RunOutcome::Failed(message) => run.error.clone_from(message),
            RunOutcome::Cancelled => run.error = CANCELLED_ERROR.to_string(),
        }
    }
    if state.guided.run_finished(run_id) {
        engine_info!("Guided analysis finished run_id={} outcome={:?}", run_id, outcome);
    }
    state.mark_dirty();
}
