//! margo-assistant
//!
//! The remote assistant boundary: request shapes, the answer/metadata
//! stream demultiplexer, and the streaming HTTP transport.

pub mod demux;
pub mod error;
pub mod request;
pub mod transport;
