//! relay-dataset core - data model for the Onionoo relay export
//!
//! This crate provides the pure, I/O-free parts of the exporter:
//! - Onionoo details document model with pass-through fields
//! - OR endpoint address parsing
//! - Per-relay endpoint extraction into CSV rows
//! - Guard/exit partitioning ranked by consensus weight

pub mod address;
pub mod record;
pub mod extract;
pub mod partition;

pub use address::*;
pub use record::*;
pub use extract::*;
pub use partition::*;

/// Header row of every tabular file
pub const CSV_HEADER: [&str; 3] = ["fingerprint", "ipaddr", "port"];
