//! relay-dataset Onionoo layer
//!
//! Fetches the relay details document:
//! - HTTP client construction (optionally through a Tor SOCKS5h proxy)
//! - Single-shot details fetch and decoding

pub mod client;
pub mod fetch;

pub use client::*;
pub use fetch::*;
