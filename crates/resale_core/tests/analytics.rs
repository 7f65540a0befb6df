use pretty_assertions::assert_eq;
use resale_core::{price_range, DismissedKeys, Listing, PriceRange};
use serde_json::json;

fn priced(id: &str, price: f64) -> Listing {
    serde_json::from_value(json!({
        "product_id": id,
        "title": format!("Item {id}"),
        "price": { "raw": format!("${price}"), "extracted": price },
    }))
    .unwrap()
}

fn unpriced(id: &str) -> Listing {
    serde_json::from_value(json!({ "product_id": id, "price": { "raw": "Best offer" } })).unwrap()
}

#[test]
fn four_prices_produce_exclusive_quartiles() {
    let listings = vec![
        priced("d", 40.0),
        priced("a", 10.0),
        priced("c", 30.0),
        priced("b", 20.0),
    ];

    let range = price_range(&listings, &DismissedKeys::new()).expect("range");
    assert_eq!(
        range,
        PriceRange {
            n: 4,
            low: 10.0,
            q1: Some(15.0),
            median: 25.0,
            q3: Some(35.0),
            high: 40.0,
        }
    );
}

#[test]
fn fewer_than_four_prices_have_no_quartiles() {
    let listings = vec![priced("a", 5.0), priced("b", 9.0), priced("c", 7.0)];

    let range = price_range(&listings, &DismissedKeys::new()).expect("range");
    assert_eq!(range.n, 3);
    assert_eq!(range.median, 7.0);
    assert_eq!(range.q1, None);
    assert_eq!(range.q3, None);
}

#[test]
fn unpriced_and_dismissed_listings_are_excluded() {
    let listings = vec![
        priced("a", 10.0),
        unpriced("b"),
        priced("c", 1000.0),
        priced("d", 20.0),
    ];
    let dismissed: DismissedKeys = ["c".to_string()].into_iter().collect();

    let range = price_range(&listings, &dismissed).expect("range");
    assert_eq!(range.n, 2);
    assert_eq!(range.low, 10.0);
    assert_eq!(range.high, 20.0);
    assert_eq!(range.median, 15.0);
}

#[test]
fn no_visible_prices_yields_none_not_zero() {
    let listings = vec![unpriced("a"), priced("b", 12.0)];
    let dismissed: DismissedKeys = ["b".to_string()].into_iter().collect();

    assert_eq!(price_range(&listings, &dismissed), None);
    assert_eq!(price_range(&[], &DismissedKeys::new()), None);

    let zero = price_range(&[priced("z", 0.0)], &DismissedKeys::new()).expect("zero price");
    assert_eq!(zero.low, 0.0);
    assert_eq!(zero.high, 0.0);
}

#[test]
fn quartiles_stay_ordered_for_many_sizes() {
    for n in 1..=25usize {
        let listings: Vec<Listing> = (0..n)
            .map(|i| priced(&format!("p{i}"), ((i * 37) % 101) as f64 + 0.5))
            .collect();
        let range = price_range(&listings, &DismissedKeys::new()).expect("range");

        assert_eq!(range.n, n);
        assert!(range.low <= range.median && range.median <= range.high);
        match (range.q1, range.q3) {
            (Some(q1), Some(q3)) => {
                assert!(n >= 4);
                assert!(range.low <= q1 && q1 <= range.median);
                assert!(range.median <= q3 && q3 <= range.high);
            }
            (None, None) => assert!(n < 4),
            other => panic!("mismatched quartiles {other:?} for n={n}"),
        }
    }
}
