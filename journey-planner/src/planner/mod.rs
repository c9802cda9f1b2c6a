//! Journey planning over a built transit network.
//!
//! A request is validated and its endpoints resolved once, then searched
//! from several candidate start times. Each candidate search is a
//! label-setting search over the time-expanded graph; their results are
//! merged, deduplicated and ranked.

mod calculator;
mod config;
mod rank;
mod request;
mod search;

#[cfg(test)]
mod scenarios;

pub use calculator::{PreparedQuery, RouteCalculator};
pub use config::SearchConfig;
pub use rank::{RankOrder, deduplicate, merge_candidates, rank_journeys};
pub use request::{JourneyRequest, Location};
pub use search::{CancelFlag, CandidateOutcome, SearchError, SearchResult};
