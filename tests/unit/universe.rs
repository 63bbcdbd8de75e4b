//! Unit tests for instrument selection

use vision_mirror::universe::select_instruments;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_usdt_default_and_exclusion() {
    let all = strings(&["BTCUSDT", "ETHUSDT", "BTCBUSD"]);
    assert_eq!(select_instruments(&all, &[], &[]), strings(&["BTCUSDT", "ETHUSDT"]));
    assert_eq!(
        select_instruments(&all, &[], &strings(&["ETHUSDT"])),
        strings(&["BTCUSDT"])
    );
}

#[test]
fn test_allow_list_intersects_catalog() {
    let all = strings(&["BTCUSDT", "ETHUSDT", "BTCBUSD"]);
    let selected = select_instruments(&all, &strings(&["ETHUSDT", "BTCBUSD", "LUNAUSDT"]), &[]);
    assert_eq!(selected, strings(&["ETHUSDT", "BTCBUSD"]));
}

#[test]
fn test_everything_excluded_is_empty() {
    let all = strings(&["BTCUSDT"]);
    assert!(select_instruments(&all, &[], &all).is_empty());
}
