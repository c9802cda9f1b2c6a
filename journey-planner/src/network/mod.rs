//! Network generations and the query service over them.
//!
//! A [`TransitNetwork`] is built single-threaded in dependency order, then
//! published through a [`NetworkHandle`]. From then on it is only read.
//! Rebuilding means building a fresh generation and publishing it; queries
//! already running finish on the generation they started with.

mod handle;
mod service;
mod transit;

pub use handle::{NetworkHandle, ReadScope};
pub use service::JourneyService;
pub use transit::TransitNetwork;
