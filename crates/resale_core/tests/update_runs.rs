use std::sync::Once;

use pretty_assertions::assert_eq;
use resale_core::{
    parse_frame, update, AppState, Effect, ImageFile, Msg, RunId, RunMode, RunOutcome,
    SearchMode, StepStatus, StreamFrame, CANCELLED_ERROR, MISSING_IMAGE_ERROR,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn with_image() -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::MainImageChanged(Some(ImageFile::new(1, "/tmp/lamp.jpg"))),
    );
    state
}

fn started_run(effects: &[Effect]) -> RunId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::StartRun { run_id, .. } => Some(*run_id),
            _ => None,
        })
        .expect("start effect")
}

fn frame(line: &str) -> StreamFrame {
    parse_frame(line).expect("valid frame")
}

fn result_with_listings() -> StreamFrame {
    frame(
        r#"{"type":"result","data":{"listings":[
            {"product_id":"a","title":"A","price":{"raw":"$10","extracted":10}},
            {"product_id":"b","title":"B","price":{"raw":"$20","extracted":20}},
            {"product_id":"c","title":"C","price":{"raw":"$900","extracted":900}}
        ]}}"#,
    )
}

#[test]
fn run_without_main_image_reports_validation_error() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::RunRequested(RunMode::Both));

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.active.error.as_deref(), Some(MISSING_IMAGE_ERROR));
    assert_eq!(view.sold.error.as_deref(), Some(MISSING_IMAGE_ERROR));
    assert!(!view.active.loading);
}

#[test]
fn run_request_resets_slot_and_emits_request() {
    init_logging();
    let state = with_image();
    let (state, _) = update(state, Msg::TextChanged("  brass desk lamp ".to_string()));
    let (state, _) = update(state, Msg::ItemNameChanged("Anglepoise".to_string()));
    let (state, effects) = update(state, Msg::RunRequested(RunMode::Sold));

    assert_eq!(
        effects,
        vec![Effect::StartRun {
            run_id: 1,
            request: resale_core::RunRequest {
                mode: RunMode::Sold,
                main_image: ImageFile::new(1, "/tmp/lamp.jpg"),
                extra_images: Vec::new(),
                text: Some("brass desk lamp".to_string()),
                item_name: Some("Anglepoise".to_string()),
            },
        }]
    );
    let view = state.view();
    assert!(view.sold.loading);
    assert_eq!(view.sold.progress, 0.0);
    assert!(view.sold.steps.iter().all(|s| s.status == StepStatus::Pending));
    assert!(!view.active.loading);
}

#[test]
fn restarting_a_mode_cancels_its_previous_run() {
    init_logging();
    let (state, effects) = update(with_image(), Msg::RunRequested(RunMode::Active));
    let first = started_run(&effects);

    let (state, effects) = update(state, Msg::RunRequested(RunMode::Active));
    let second = started_run(&effects);

    assert_eq!(effects[0], Effect::CancelRun { run_id: first });
    assert_ne!(first, second);

    // Late frames from the cancelled run are ignored.
    let (state, _) = update(
        state,
        Msg::RunFrame {
            run_id: first,
            frame: result_with_listings(),
        },
    );
    assert!(!state.view().active.has_result);
}

#[test]
fn both_run_fans_frames_out_to_both_slots() {
    init_logging();
    let (state, effects) = update(with_image(), Msg::RunRequested(RunMode::Both));
    let run_id = started_run(&effects);
    assert_eq!(effects.len(), 1);

    let (state, _) = update(
        state,
        Msg::RunFrame {
            run_id,
            frame: frame(r#"{"type":"step","step_id":"search","status":"start","pct":0.5}"#),
        },
    );
    let view = state.view();
    assert_eq!(view.active.progress, 0.5);
    assert_eq!(view.sold.progress, 0.5);
    assert_eq!(view.overall_progress, 0.5);

    let (state, _) = update(
        state,
        Msg::RunFrame {
            run_id,
            frame: result_with_listings(),
        },
    );
    let (state, _) = update(
        state,
        Msg::RunFinished {
            run_id,
            outcome: RunOutcome::Completed,
        },
    );
    let view = state.view();
    assert!(view.active.has_result && view.sold.has_result);
    assert!(!view.active.loading && !view.sold.loading);
    assert_eq!(view.active.error, None);
}

#[test]
fn cancel_round_trip_reports_cancelled_and_next_run_clears_it() {
    init_logging();
    let (state, effects) = update(with_image(), Msg::RunRequested(RunMode::Active));
    let run_id = started_run(&effects);
    let (state, _) = update(
        state,
        Msg::RunFrame {
            run_id,
            frame: result_with_listings(),
        },
    );
    let (state, _) = update(
        state,
        Msg::ListingDismissed {
            mode: SearchMode::Active,
            key: "c".to_string(),
        },
    );

    let (state, effects) = update(state, Msg::CancelRequested(RunMode::Active));
    assert_eq!(effects, vec![Effect::CancelRun { run_id }]);
    let (state, _) = update(
        state,
        Msg::RunFinished {
            run_id,
            outcome: RunOutcome::Cancelled,
        },
    );
    let view = state.view();
    assert_eq!(view.active.error.as_deref(), Some(CANCELLED_ERROR));
    assert!(!view.active.loading);

    let (state, effects) = update(state, Msg::RunRequested(RunMode::Active));
    assert!(effects
        .iter()
        .all(|effect| !matches!(effect, Effect::CancelRun { .. })));
    let view = state.view();
    assert_eq!(view.active.error, None);
    assert!(state.slot(SearchMode::Active).dismissed().is_empty());
}

#[test]
fn failure_outcome_sets_error_and_clears_loading() {
    init_logging();
    let (state, effects) = update(with_image(), Msg::RunRequested(RunMode::Sold));
    let run_id = started_run(&effects);
    let (state, _) = update(
        state,
        Msg::RunFinished {
            run_id,
            outcome: RunOutcome::Failed("HTTP 502: bad gateway".to_string()),
        },
    );

    let view = state.view();
    assert_eq!(view.sold.error.as_deref(), Some("HTTP 502: bad gateway"));
    assert!(!view.sold.loading);
}

#[test]
fn dismissal_hides_listing_and_updates_stats_until_next_run() {
    init_logging();
    let (state, effects) = update(with_image(), Msg::RunRequested(RunMode::Active));
    let run_id = started_run(&effects);
    let (state, _) = update(
        state,
        Msg::RunFrame {
            run_id,
            frame: result_with_listings(),
        },
    );
    assert_eq!(state.view().active.price_range.unwrap().high, 900.0);

    let (mut state, _) = update(
        state,
        Msg::ListingDismissed {
            mode: SearchMode::Active,
            key: "c".to_string(),
        },
    );
    assert!(state.consume_dirty());
    let view = state.view();
    let keys: Vec<&str> = view.active.listings.iter().map(|l| l.key.as_str()).collect();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(view.active.visible_priced, 2);
    assert_eq!(view.active.price_range.as_ref().unwrap().high, 20.0);
    let combined = view.combined.expect("combined payload");
    assert_eq!(combined.market_analysis.unwrap().active_count, Some(2));

    // Dismissing again is a no-op.
    let (mut state, _) = update(
        state,
        Msg::ListingDismissed {
            mode: SearchMode::Active,
            key: "c".to_string(),
        },
    );
    assert!(!state.consume_dirty());

    let (state, _) = update(state, Msg::RunRequested(RunMode::Active));
    assert!(state.slot(SearchMode::Active).dismissed().is_empty());
    assert!(!state.view().active.has_result);
}

#[test]
fn overall_progress_only_averages_requested_modes() {
    init_logging();
    let (state, effects) = update(with_image(), Msg::RunRequested(RunMode::Both));
    let both = started_run(&effects);
    let (state, _) = update(
        state,
        Msg::RunFrame {
            run_id: both,
            frame: frame(r#"{"type":"step","step_id":"search","status":"start","pct":0.8}"#),
        },
    );
    let (state, _) = update(
        state,
        Msg::RunFinished {
            run_id: both,
            outcome: RunOutcome::Completed,
        },
    );

    let (state, effects) = update(state, Msg::RunRequested(RunMode::Active));
    let active = started_run(&effects);
    let (state, _) = update(
        state,
        Msg::RunFrame {
            run_id: active,
            frame: frame(r#"{"type":"step","step_id":"prepare","status":"start","pct":0.2}"#),
        },
    );

    let view = state.view();
    assert_eq!(view.requested, Some(RunMode::Active));
    assert_eq!(view.sold.progress, 0.8);
    assert_eq!(view.overall_progress, 0.2);
    assert!(view.combined_steps.is_none());
}

#[test]
fn cancelling_one_slot_of_a_both_run_cancels_the_shared_request() {
    init_logging();
    let (state, effects) = update(with_image(), Msg::RunRequested(RunMode::Both));
    let run_id = started_run(&effects);

    let (state, effects) = update(state, Msg::CancelRequested(RunMode::Sold));
    assert_eq!(effects, vec![Effect::CancelRun { run_id }]);

    let (state, _) = update(
        state,
        Msg::RunFinished {
            run_id,
            outcome: RunOutcome::Cancelled,
        },
    );
    let view = state.view();
    assert_eq!(view.active.error.as_deref(), Some(CANCELLED_ERROR));
    assert_eq!(view.sold.error.as_deref(), Some(CANCELLED_ERROR));
}
