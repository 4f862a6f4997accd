use margo_core::address::{highlight_address, parse_highlight_address};
use margo_core::index_key::index_key;

#[test]
fn index_key_strips_and_lowercases() {
    assert_eq!(index_key("My Paper (v2).pdf"), "mypaperv2pdf");
    assert_eq!(index_key("1708.08021.pdf"), "170808021pdf");
    assert_eq!(index_key("ALLCAPS.PDF"), "allcapspdf");
}

#[test]
fn index_key_is_stable_for_a_given_name() {
    assert_eq!(index_key("report.pdf"), index_key("report.pdf"));
}

#[test]
fn distinct_names_can_collide() {
    // Accepted limitation: normalization is lossy.
    assert_eq!(index_key("a-b.pdf"), index_key("ab.pdf"));
}

#[test]
fn index_key_of_non_alphanumeric_name_is_empty() {
    assert_eq!(index_key("¡¿!?"), "");
}

#[test]
fn address_round_trips() {
    let address = highlight_address("4fe2");
    assert_eq!(address, "highlight-4fe2");
    assert_eq!(parse_highlight_address(&address), Some("4fe2"));
}

#[test]
fn address_tolerates_fragment_prefix() {
    assert_eq!(parse_highlight_address("#highlight-4fe2"), Some("4fe2"));
}

#[test]
fn unrecognized_addresses_mean_no_selection() {
    assert_eq!(parse_highlight_address(""), None);
    assert_eq!(parse_highlight_address("#"), None);
    assert_eq!(parse_highlight_address("highlight-"), None);
    assert_eq!(parse_highlight_address("bookmark-4fe2"), None);
}
