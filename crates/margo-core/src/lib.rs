//! margo-core
//!
//! Pure domain types, thread operations, and key conventions.
//! No I/O and no async; this is the shared vocabulary of the margo system.

pub mod address;
pub mod index_key;
pub mod models;
