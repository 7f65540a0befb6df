//! Views derived from the active and sold runs together.
//!
//! Everything here is a pure function of the latest run states, so the
//! result does not depend on how the two streams interleaved.

use crate::analytics::{price_range, visible_priced_count};
use crate::listing::{DismissedKeys, Listing};
use crate::payload::SearchPayload;
use crate::run::{lead_index, RunState, StepEntry, StepStatus};

/// Merged step list for a run that covers both modes.
///
/// The slower run gates the merged lead index.
pub fn combined_steps(active: &RunState, sold: &RunState) -> Vec<StepEntry> {
    let mut steps: Vec<StepEntry> = active.steps.clone();
    for step in &sold.steps {
        if !steps.iter().any(|s| s.id == step.id) {
            steps.push(step.clone());
        }
    }

    let lead = lead_index(&active.steps).min(lead_index(&sold.steps));
    let still_loading = active.loading || sold.loading;
    let count = steps.len();
    for (index, step) in steps.iter_mut().enumerate() {
        step.status = if lead >= count || index < lead {
            StepStatus::Done
        } else if index == lead {
            if still_loading {
                StepStatus::Active
            } else {
                StepStatus::Done
            }
        } else {
            StepStatus::Pending
        };
    }
    steps
}

/// Mean progress of the requested runs; zero when nothing was requested.
pub fn overall_progress(requested: &[&RunState]) -> f64 {
    if requested.is_empty() {
        return 0.0;
    }
    requested.iter().map(|run| run.progress).sum::<f64>() / requested.len() as f64
}

/// A payload with the dismissed keys of its slot.
#[derive(Debug, Clone, Copy)]
pub struct SideView<'a> {
    pub payload: &'a SearchPayload,
    pub dismissed: &'a DismissedKeys,
}

impl SideView<'_> {
    fn visible(&self) -> Vec<Listing> {
        self.payload
            .listings
            .iter()
            .enumerate()
            .filter(|(index, listing)| !self.dismissed.contains(&listing.key(*index)))
            .map(|(_, listing)| listing.clone())
            .collect()
    }
}

/// Builds the synthetic payload shown when either side has data.
///
/// Counts and ranges are recomputed from listings minus dismissed keys; the
/// server's embedded figures are only kept for fields not recomputed here.
pub fn combined_payload<'a>(
    active: Option<SideView<'a>>,
    sold: Option<SideView<'a>>,
) -> Option<SearchPayload> {
    let base = active.or(sold)?;
    let empty = DismissedKeys::new();

    let active_listings = active.map(|side| side.visible()).unwrap_or_default();
    let sold_listings = sold.map(|side| side.visible()).unwrap_or_default();
    let all: Vec<Listing> = active_listings
        .iter()
        .chain(sold_listings.iter())
        .cloned()
        .collect();

    let mut analysis = base
        .payload
        .market_analysis
        .clone()
        .unwrap_or_default();
    analysis.active_count = Some(visible_priced_count(&active_listings, &empty));
    analysis.sold_count = Some(visible_priced_count(&sold_listings, &empty));
    analysis.count = Some(visible_priced_count(&all, &empty));
    analysis.active_price_range = price_range(&active_listings, &empty);
    analysis.sold_price_range = price_range(&sold_listings, &empty);
    analysis.price_range = price_range(&all, &empty);
    analysis.sell_velocity = Some(
        fallback_text(active, sold, base, SearchPayload::sell_velocity).to_string(),
    );
    analysis.rarity = Some(fallback_text(active, sold, base, SearchPayload::rarity).to_string());

    let summaries: Vec<&str> = [active, sold]
        .iter()
        .flatten()
        .filter_map(|side| side.payload.summary.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut combined = base.payload.clone();
    combined.listings = all;
    combined.market_analysis = Some(analysis);
    combined.summary = (!summaries.is_empty()).then(|| summaries.join("\n\n"));
    combined.timing_sec = combined_timing(
        active.map(|side| side.payload.timing_sec),
        sold.map(|side| side.payload.timing_sec),
    );
    Some(combined)
}

/// Combined `timing_sec`.
///
/// Both timings present: their sum rounded to one decimal. One timing
/// present: divided by the number of payloads present. These two branches
/// are intentionally left as observed; tests pin both.
pub fn combined_timing(active: Option<Option<f64>>, sold: Option<Option<f64>>) -> Option<f64> {
    let payloads = usize::from(active.is_some()) + usize::from(sold.is_some());
    match (active.flatten(), sold.flatten()) {
        (Some(a), Some(b)) => Some(((a + b) * 10.0).round() / 10.0),
        (Some(only), None) | (None, Some(only)) => Some(only / payloads.max(1) as f64),
        (None, None) => None,
    }
}

fn fallback_text<'a>(
    active: Option<SideView<'a>>,
    sold: Option<SideView<'a>>,
    base: SideView<'a>,
    field: fn(&'a SearchPayload) -> Option<&'a str>,
) -> &'a str {
    active
        .and_then(|side| field(side.payload))
        .or_else(|| sold.and_then(|side| field(side.payload)))
        .or_else(|| field(base.payload))
        .unwrap_or("unknown")
}
