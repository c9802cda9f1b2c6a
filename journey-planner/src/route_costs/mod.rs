//! Route-to-route change counts.
//!
//! For every ordered pair of routes, the fewest changes needed to get from
//! one to the other. The search uses this as a lower bound when pruning, and
//! it answers "how many changes between these two places" queries.

mod costs;
mod hops;

pub use costs::{NumberOfChanges, RouteToRouteCosts};
pub use hops::DestinationHops;
