//! Highlight address parsing and formatting.
//!
//! The selection pointer round-trips through a navigable address of the
//! form `highlight-<id>` (carried as a URL fragment in the original web
//! shell). An empty or unrecognized address means no active selection.

const ADDRESS_PREFIX: &str = "highlight-";

/// Format the navigable address for a highlight id.
pub fn highlight_address(id: &str) -> String {
    format!("{ADDRESS_PREFIX}{id}")
}

/// Extract the highlight id from an address, tolerating a leading `#`.
///
/// Returns `None` for anything that is not a non-empty `highlight-<id>`
/// address.
pub fn parse_highlight_address(address: &str) -> Option<&str> {
    let address = address.strip_prefix('#').unwrap_or(address);
    address
        .strip_prefix(ADDRESS_PREFIX)
        .filter(|id| !id.is_empty())
}
