//! # Stegano Web
//!
//! Hides an arbitrary file inside a carrier media file and recovers it exactly.
//!
//! - [`codec`]: the steganographic core (capacity, LSB and tail-append embedding,
//!   type sniffing). Pure functions over in-memory buffers.
//! - [`server`]: HTTP transport that stores uploads, runs the codec on a bounded
//!   worker pool and returns downloads.
//! - [`common`]: configuration.
//! - [`utils`]: logging setup.

pub mod codec;
pub mod common;
pub mod server;
pub mod utils;

pub use codec::{decode, encode, estimate_capacity, Decoded, StegoError};
