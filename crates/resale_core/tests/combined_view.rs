use pretty_assertions::assert_eq;
use resale_core::{
    apply_frame, combined_payload, combined_steps, combined_timing, lead_index, DismissedKeys,
    RunState, SearchPayload, SideView, StepPlan, StepSignal, StepStatus, StreamFrame,
};
use serde_json::json;

fn run_at(step_id: Option<&str>) -> RunState {
    let state = RunState::started(1, &StepPlan::default());
    match step_id {
        Some(id) => apply_frame(
            state,
            &StreamFrame::Step {
                step_id: id.to_string(),
                status: StepSignal::Start,
                pct: None,
                label: None,
                detail: None,
            },
        ),
        None => state,
    }
}

fn statuses(steps: &[resale_core::StepEntry]) -> Vec<StepStatus> {
    steps.iter().map(|s| s.status).collect()
}

#[test]
fn slower_run_gates_combined_steps() {
    let active = run_at(Some("search"));
    let sold = run_at(Some("prepare"));
    assert_eq!(active.lead_index(), 2);
    assert_eq!(sold.lead_index(), 0);

    let steps = combined_steps(&active, &sold);
    assert_eq!(
        statuses(&steps),
        vec![
            StepStatus::Active,
            StepStatus::Pending,
            StepStatus::Pending,
            StepStatus::Pending,
            StepStatus::Pending,
        ]
    );
}

#[test]
fn combined_lead_is_min_and_order_independent() {
    let names = [None, Some("prepare"), Some("identify"), Some("search"), Some("analyze")];
    for a in names {
        for b in names {
            let active = run_at(a);
            let sold = run_at(b);
            let expected = active.lead_index().min(sold.lead_index());

            let forward = combined_steps(&active, &sold);
            let backward = combined_steps(&sold, &active);
            assert_eq!(forward, backward);
            assert_eq!(
                forward.iter().position(|s| s.status == StepStatus::Active),
                Some(expected)
            );
        }
    }
}

#[test]
fn finished_runs_mark_lead_step_done() {
    let mut active = run_at(Some("filter"));
    let mut sold = run_at(Some("filter"));
    active.loading = false;
    sold.loading = false;

    let steps = combined_steps(&active, &sold);
    assert_eq!(
        statuses(&steps),
        vec![
            StepStatus::Done,
            StepStatus::Done,
            StepStatus::Done,
            StepStatus::Done,
            StepStatus::Pending,
        ]
    );
}

#[test]
fn all_done_runs_give_all_done_steps() {
    let mut active = run_at(None);
    for step in &mut active.steps {
        step.status = StepStatus::Done;
    }
    let sold = active.clone();
    assert_eq!(lead_index(&active.steps), 5);

    let steps = combined_steps(&active, &sold);
    assert!(steps.iter().all(|s| s.status == StepStatus::Done));
}

fn payload(value: serde_json::Value) -> SearchPayload {
    serde_json::from_value(value).unwrap()
}

#[test]
fn combined_payload_recomputes_counts_from_visible_listings() {
    let active = payload(json!({
        "listings": [
            {"product_id": "a1", "price": {"extracted": 10}},
            {"product_id": "a2", "price": {"extracted": 30}},
        ],
        "market_analysis": {"count": 99, "active_count": 50, "rarity": "common"},
        "summary": "Plenty listed.",
        "timing_sec": 2.0,
    }));
    let sold = payload(json!({
        "listings": [
            {"product_id": "s1", "price": {"extracted": 20}},
            {"product_id": "s2", "price": {"extracted": 500}},
            {"product_id": "s3"},
        ],
        "market_analysis": {"sell_velocity": "fast"},
        "summary": "Sells quickly.",
        "timing_sec": 3.25,
    }));
    let none = DismissedKeys::new();
    let sold_dismissed: DismissedKeys = ["s2".to_string()].into_iter().collect();

    let combined = combined_payload(
        Some(SideView {
            payload: &active,
            dismissed: &none,
        }),
        Some(SideView {
            payload: &sold,
            dismissed: &sold_dismissed,
        }),
    )
    .expect("combined");

    let analysis = combined.market_analysis.expect("analysis");
    assert_eq!(analysis.active_count, Some(2));
    assert_eq!(analysis.sold_count, Some(1));
    assert_eq!(analysis.count, Some(3));
    assert_eq!(analysis.sold_price_range.as_ref().unwrap().high, 20.0);
    assert_eq!(analysis.price_range.as_ref().unwrap().median, 20.0);
    assert_eq!(analysis.sell_velocity.as_deref(), Some("fast"));
    assert_eq!(analysis.rarity.as_deref(), Some("common"));
    assert_eq!(combined.listings.len(), 4);
    assert_eq!(
        combined.summary.as_deref(),
        Some("Plenty listed.\n\nSells quickly.")
    );
    assert_eq!(combined.timing_sec, Some(5.3));
}

#[test]
fn combined_payload_needs_at_least_one_side() {
    assert_eq!(combined_payload(None, None), None);
}

#[test]
fn missing_velocity_and_rarity_fall_back_to_unknown() {
    let sold = payload(json!({"listings": []}));
    let none = DismissedKeys::new();
    let combined = combined_payload(
        None,
        Some(SideView {
            payload: &sold,
            dismissed: &none,
        }),
    )
    .unwrap();

    let analysis = combined.market_analysis.unwrap();
    assert_eq!(analysis.sell_velocity.as_deref(), Some("unknown"));
    assert_eq!(analysis.rarity.as_deref(), Some("unknown"));
    assert_eq!(analysis.price_range, None);
}

// The two timing branches disagree (sum vs. mean); both are pinned here until
// product intent is confirmed.
#[test]
fn timing_sums_when_both_sides_report_it() {
    assert_eq!(combined_timing(Some(Some(1.26)), Some(Some(2.0))), Some(3.3));
}

#[test]
fn timing_averages_when_only_one_side_reports_it() {
    assert_eq!(combined_timing(Some(Some(4.0)), Some(None)), Some(2.0));
    assert_eq!(combined_timing(Some(Some(4.0)), None), Some(4.0));
    assert_eq!(combined_timing(None, Some(None)), None);
}
