use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Identity of a listing within one result set.
pub type ListingKey = String;

/// Keys the user has hidden for the current run of a mode.
pub type DismissedKeys = BTreeSet<ListingKey>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Price {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub extracted: Option<f64>,
}

/// One marketplace listing as reported by the comparison service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_similarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Listing {
    /// Numeric price usable for statistics, if any.
    pub fn extracted_price(&self) -> Option<f64> {
        self.price
            .as_ref()
            .and_then(|price| price.extracted)
            .filter(|value| value.is_finite())
    }

    /// Identity key: `product_id`, else `link`, else `title|price|index`.
    ///
    /// `index` is the listing's position in its result set, so the composite
    /// stays stable across re-renders of the same payload.
    pub fn key(&self, index: usize) -> ListingKey {
        if let Some(id) = non_empty(self.product_id.as_deref()) {
            return id.to_string();
        }
        if let Some(link) = non_empty(self.link.as_deref()) {
            return link.to_string();
        }
        let title = self.title.as_deref().unwrap_or_default();
        let price = match (&self.price, self.extracted_price()) {
            (_, Some(value)) => value.to_string(),
            (Some(price), None) => price.raw.clone().unwrap_or_default(),
            (None, None) => String::new(),
        };
        format!("{title}|{price}|{index}")
    }
}

/// Listings the user still sees: everything not dismissed, priced or not.
pub fn visible_listings<'a>(
    listings: &'a [Listing],
    dismissed: &DismissedKeys,
) -> Vec<(ListingKey, &'a Listing)> {
    listings
        .iter()
        .enumerate()
        .map(|(index, listing)| (listing.key(index), listing))
        .filter(|(key, _)| !dismissed.contains(key))
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Accepts JSON numbers; anything else (strings, null, objects) becomes `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(json: &str) -> Listing {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn key_prefers_product_id_then_link() {
        let with_id = listing(r#"{"product_id":"p1","link":"https://x"}"#);
        assert_eq!(with_id.key(3), "p1");

        let with_link = listing(r#"{"product_id":"  ","link":"https://x"}"#);
        assert_eq!(with_link.key(3), "https://x");
    }

    #[test]
    fn key_falls_back_to_composite() {
        let bare = listing(r#"{"title":"Lamp","price":{"raw":"$12","extracted":12.5}}"#);
        assert_eq!(bare.key(4), "Lamp|12.5|4");

        let raw_only = listing(r#"{"title":"Lamp","price":{"raw":"ask"}}"#);
        assert_eq!(raw_only.key(0), "Lamp|ask|0");
    }

    #[test]
    fn non_numeric_prices_are_unpriced() {
        let text_price = listing(r#"{"price":{"raw":"$5","extracted":"5"}}"#);
        assert_eq!(text_price.extracted_price(), None);
        assert_eq!(text_price.price.unwrap().raw.as_deref(), Some("$5"));
    }
}
