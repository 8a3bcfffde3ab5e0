//! relay-dataset runtime
//!
//! Drives one export run:
//! - Atomic staging of output batches (temp file + rename)
//! - CSV and JSON snapshot writing
//! - Fetch → extract/partition → write pipeline with a run summary

pub mod atomic;
pub mod writer;
pub mod pipeline;

pub use atomic::*;
pub use writer::*;
pub use pipeline::*;
