//! The transit graph.
//!
//! Stations and route stations are nodes. A passenger at a station boards a
//! route station, rides timed edges from route station to route station
//! along one trip, and alights back to a station. Walking edges join
//! neighbouring stations. Calendars and closures are checked at search time,
//! so one graph serves every date.

mod build;
mod filter;
mod model;

pub use filter::GraphFilter;
pub use model::{Edge, EdgeIndex, EdgeKind, Node, NodeIndex, Ride, TransitGraph};
