//! Index key derivation.
//!
//! A document's index key is its filename with every character outside
//! `[a-zA-Z0-9]` stripped and the remainder lower-cased. The key addresses
//! both the document's archive entry and the assistant's retrieval index,
//! so it must be stable for a given file across a session. Distinct
//! filenames that normalize identically collide; this is an accepted
//! limitation.

/// Derive the index key for a filename.
pub fn index_key(file_name: &str) -> String {
    file_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
