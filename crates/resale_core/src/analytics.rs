use serde::{Deserialize, Serialize};

use crate::listing::{DismissedKeys, Listing};

/// Price statistics over the visible priced listings.
///
/// `q1`/`q3` are only defined once there are at least four prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub n: usize,
    pub low: f64,
    #[serde(default)]
    pub q1: Option<f64>,
    pub median: f64,
    #[serde(default)]
    pub q3: Option<f64>,
    pub high: f64,
}

/// Prices of listings that have a numeric price and are not dismissed.
pub fn visible_prices(listings: &[Listing], dismissed: &DismissedKeys) -> Vec<f64> {
    listings
        .iter()
        .enumerate()
        .filter(|(index, listing)| !dismissed.contains(&listing.key(*index)))
        .filter_map(|(_, listing)| listing.extracted_price())
        .collect()
}

/// Number of listings that count towards statistics.
pub fn visible_priced_count(listings: &[Listing], dismissed: &DismissedKeys) -> usize {
    visible_prices(listings, dismissed).len()
}

/// Computes the price range, or `None` when nothing priced is visible.
pub fn price_range(listings: &[Listing], dismissed: &DismissedKeys) -> Option<PriceRange> {
    range_of(visible_prices(listings, dismissed))
}

/// Exclusive-median statistics over raw prices.
pub fn range_of(mut prices: Vec<f64>) -> Option<PriceRange> {
    prices.retain(|p| p.is_finite());
    if prices.is_empty() {
        return None;
    }
    prices.sort_by(f64::total_cmp);

    let n = prices.len();
    let (q1, q3) = if n >= 4 {
        let lower = &prices[..n / 2];
        let upper = &prices[(n + 1) / 2..];
        (Some(median(lower)), Some(median(upper)))
    } else {
        (None, None)
    };

    Some(PriceRange {
        n,
        low: prices[0],
        q1,
        median: median(&prices),
        q3,
        high: prices[n - 1],
    })
}

/// Median of a sorted, non-empty slice.
fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_count_excludes_middle_from_halves() {
        let range = range_of(vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(range.median, 3.0);
        assert_eq!(range.q1, Some(1.5));
        assert_eq!(range.q3, Some(4.5));
    }

    #[test]
    fn empty_input_has_no_range() {
        assert_eq!(range_of(Vec::new()), None);
    }
}
