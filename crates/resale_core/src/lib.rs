//! Resale core: pure state machine, stream reducer and price analytics.
mod analytics;
mod combined;
mod effect;
mod frame;
mod guided;
mod inputs;
mod listing;
mod msg;
mod payload;
mod run;
mod state;
mod update;
mod view_model;

pub use analytics::{price_range, range_of, visible_priced_count, visible_prices, PriceRange};
pub use combined::{combined_payload, combined_steps, combined_timing, overall_progress, SideView};
pub use effect::{Effect, LensRequest, RunRequest};
pub use frame::{error_message, parse_frame, StepSignal, StreamFrame};
pub use guided::{normalize_title, GuidedPhase, GuidedState, LensCandidate, RequestId};
pub use inputs::{ImageFile, ImageId, SearchInputs};
pub use listing::{visible_listings, DismissedKeys, Listing, ListingKey, Price};
pub use msg::{Msg, RunOutcome};
pub use payload::{MarketAnalysis, SearchPayload};
pub use run::{
    apply_frame, lead_index, RunId, RunMode, RunState, SearchMode, StepEntry, StepPlan,
    StepStatus,
};
pub use state::{AppState, ModeSlot};
pub use update::{update, CANCELLED_ERROR, MISSING_IMAGE_ERROR};
pub use view_model::{AppViewModel, GuidedView, ListingRow, RunView, StepView};
