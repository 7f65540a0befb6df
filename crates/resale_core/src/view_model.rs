use crate::analytics::PriceRange;
use crate::guided::{GuidedPhase, LensCandidate};
use crate::listing::{Listing, ListingKey};
use crate::payload::SearchPayload;
use crate::run::{RunMode, StepEntry, StepStatus};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub requested: Option<RunMode>,
    pub has_main_image: bool,
    pub active: RunView,
    pub sold: RunView,
    /// Only present when both modes were requested together.
    pub combined_steps: Option<Vec<StepView>>,
    pub overall_progress: f64,
    pub combined: Option<SearchPayload>,
    pub guided: GuidedView,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunView {
    pub loading: bool,
    pub progress: f64,
    pub error: Option<String>,
    pub steps: Vec<StepView>,
    pub has_result: bool,
    pub listings: Vec<ListingRow>,
    pub price_range: Option<PriceRange>,
    pub visible_priced: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub id: String,
    pub label: String,
    pub status: StepStatus,
}

impl From<&StepEntry> for StepView {
    fn from(step: &StepEntry) -> Self {
        Self {
            id: step.id.clone(),
            label: step.label.clone().unwrap_or_else(|| step.id.clone()),
            status: step.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    pub key: ListingKey,
    pub title: String,
    pub price_text: Option<String>,
    pub price: Option<f64>,
    pub condition: Option<String>,
    pub link: Option<String>,
}

impl ListingRow {
    pub(crate) fn new(key: ListingKey, listing: &Listing) -> Self {
        Self {
            key,
            title: listing.title.clone().unwrap_or_default(),
            price_text: listing.price.as_ref().and_then(|p| p.raw.clone()),
            price: listing.extracted_price(),
            condition: listing.condition.clone(),
            link: listing.link.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuidedView {
    pub phase: GuidedPhase,
    pub candidates: Vec<LensCandidate>,
    pub selected_id: Option<String>,
    pub title_draft: String,
    pub title_edited: bool,
    pub locked: bool,
    pub error: Option<String>,
}
