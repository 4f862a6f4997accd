//! margo-archive
//!
//! The durable archive: a single JSON document on local disk mapping each
//! document identity to its highlights and conversation threads. The file
//! is loaded and replaced as one atomic unit on every mutation; callers
//! never touch the backing file directly.

pub mod document;
pub mod error;
pub mod events;
pub mod store;
