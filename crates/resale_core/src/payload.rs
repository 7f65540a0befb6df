use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analytics::PriceRange;
use crate::listing::Listing;

/// Market analysis block embedded in a result payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_price_range: Option<PriceRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_price_range: Option<PriceRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_velocity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Final payload of a comparison run, carried by a `result` frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(default)]
    pub listings: Vec<Listing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_analysis: Option<MarketAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_sec: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchPayload {
    pub fn sell_velocity(&self) -> Option<&str> {
        self.market_analysis
            .as_ref()
            .and_then(|m| m.sell_velocity.as_deref())
    }

    pub fn rarity(&self) -> Option<&str> {
        self.market_analysis.as_ref().and_then(|m| m.rarity.as_deref())
    }
}
