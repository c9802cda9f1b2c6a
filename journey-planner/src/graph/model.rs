use std::collections::BTreeMap;
use std::fmt;

use chrono::Duration;

use crate::domain::{
    PlatformId, RouteId, RouteStationId, ServiceId, ServiceTime, StationId, TransportMode, TripId,
};

pub type NodeIndex = usize;
pub type EdgeIndex = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Station(StationId),
    RouteStation { id: RouteStationId, mode: TransportMode },
}

impl Node {
    /// The station this node belongs to.
    pub fn station(&self) -> &StationId {
        match self {
            Node::Station(id) => id,
            Node::RouteStation { id, .. } => &id.station,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Station(id) => write!(f, "station {id}"),
            Node::RouteStation { id, mode } => write!(f, "route_station {id} {mode}"),
        }
    }
}

/// One leg of one trip between consecutive calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ride {
    pub trip: TripId,
    pub service: ServiceId,
    pub route: RouteId,
    pub departure: ServiceTime,
    pub arrival: ServiceTime,
    /// Passengers may board at the start of this leg.
    pub pickup: bool,
    /// Passengers may alight at the end of this leg.
    pub dropoff: bool,
    /// Platform at the start of this leg.
    pub platform: Option<PlatformId>,
    /// The trip's following leg.
    pub next: Option<EdgeIndex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeKind {
    /// Station to route station.
    Board { interchange: bool },
    /// Route station to station.
    Alight { interchange: bool },
    Ride(Ride),
    /// Station to neighbouring station.
    Walk { cost: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeIndex,
    pub to: NodeIndex,
    pub kind: EdgeKind,
}

/// A directed graph of stations and route stations.
///
/// Node and edge indexes are assigned in a deterministic order, so two
/// graphs built from the same input are identical.
#[derive(Debug, Clone, Default)]
pub struct TransitGraph {
    pub(super) nodes: Vec<Node>,
    pub(super) edges: Vec<Edge>,
    pub(super) station_nodes: BTreeMap<StationId, NodeIndex>,
    pub(super) route_station_nodes: BTreeMap<RouteStationId, NodeIndex>,
    /// Board, alight and walk edges leaving each node.
    pub(super) outgoing: Vec<Vec<EdgeIndex>>,
    /// Ride edges leaving each route station, by departure time then trip.
    pub(super) departures: Vec<Vec<EdgeIndex>>,
}

impl TransitGraph {
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index]
    }

    pub fn edge(&self, index: EdgeIndex) -> &Edge {
        &self.edges[index]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn station_node(&self, station: &StationId) -> Option<NodeIndex> {
        self.station_nodes.get(station).copied()
    }

    pub fn route_station_node(&self, id: &RouteStationId) -> Option<NodeIndex> {
        self.route_station_nodes.get(id).copied()
    }

    /// Board, alight and walk edges leaving `node`.
    pub fn outgoing(&self, node: NodeIndex) -> impl Iterator<Item = (EdgeIndex, &Edge)> {
        self.outgoing[node].iter().map(|e| (*e, &self.edges[*e]))
    }

    /// Ride edges leaving `node` at or after `time`, earliest first.
    pub fn departures_from(&self, node: NodeIndex, time: ServiceTime) -> impl Iterator<Item = (EdgeIndex, &Ride)> {
        let departures = &self.departures[node];
        let start = departures.partition_point(|e| match &self.edges[*e].kind {
            EdgeKind::Ride(ride) => ride.departure < time,
            _ => true,
        });
        departures[start..].iter().filter_map(|e| match &self.edges[*e].kind {
            EdgeKind::Ride(ride) => Some((*e, ride)),
            _ => None,
        })
    }

    /// The ride carried by `edge`, if it is a ride edge.
    pub fn ride(&self, edge: EdgeIndex) -> Option<&Ride> {
        match &self.edges[edge].kind {
            EdgeKind::Ride(ride) => Some(ride),
            _ => None,
        }
    }

    /// A sorted description of every node and edge, without indexes.
    ///
    /// Two graphs with equal signatures have the same nodes and edges.
    pub fn signature(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.nodes.iter().map(Node::to_string).collect();
        for edge in &self.edges {
            let from = &self.nodes[edge.from];
            let to = &self.nodes[edge.to];
            let line = match &edge.kind {
                EdgeKind::Board { interchange } => format!("board {from} -> {to} interchange={interchange}"),
                EdgeKind::Alight { interchange } => format!("alight {from} -> {to} interchange={interchange}"),
                EdgeKind::Walk { cost } => format!("walk {from} -> {to} {}m", cost.num_minutes()),
                EdgeKind::Ride(ride) => format!(
                    "ride {} {from} {} -> {to} {} pickup={} dropoff={} platform={:?} last={}",
                    ride.trip,
                    ride.departure,
                    ride.arrival,
                    ride.pickup,
                    ride.dropoff,
                    ride.platform,
                    ride.next.is_none(),
                ),
            };
            lines.push(line);
        }
        lines.sort();
        lines
    }
}
