//! Interchange classification.
//!
//! Decides once, before any search, at which stations a passenger may change
//! between routes.

mod classify;

pub use classify::{InterchangeStation, InterchangeType, Interchanges};
