//! Multi-modal public transport journey planner.
//!
//! Builds a time-expanded graph and supporting indexes from a timetable
//! snapshot, then answers "how do I get from here to there" queries over it:
//! earliest arrival after a time, or latest departure arriving by one.

pub mod config;
pub mod data;
pub mod domain;
pub mod graph;
pub mod interchange;
pub mod locations;
pub mod network;
pub mod planner;
pub mod route_costs;

#[cfg(test)]
mod test_support;
