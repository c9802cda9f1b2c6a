use std::collections::BTreeMap;

use chrono::Duration;
use tracing::{debug, info};

use crate::data::TransportData;
use crate::domain::{PlatformId, RouteStationId};
use crate::interchange::Interchanges;
use crate::locations::Neighbours;

use super::{Edge, EdgeKind, GraphFilter, Node, NodeIndex, Ride, TransitGraph};

impl TransitGraph {
    /// Compile the transport data into a graph.
    ///
    /// Only active route stations of routes the filter includes become
    /// nodes. Every station becomes a node, and every neighbour pair gets a
    /// walking edge in each direction.
    pub fn build(
        data: &TransportData,
        interchanges: &Interchanges,
        neighbours: &Neighbours,
        filter: &GraphFilter,
    ) -> Self {
        let mut graph = TransitGraph::default();

        for station in data.stations() {
            let index = graph.add_node(Node::Station(station.id.clone()));
            graph.station_nodes.insert(station.id.clone(), index);
        }

        for route_station in data.route_stations() {
            if !route_station.is_active() {
                continue;
            }
            let Some(route) = data.route(route_station.route()) else {
                continue;
            };
            if !filter.includes(route) {
                continue;
            }
            let Some(station_node) = graph.station_node(route_station.station()) else {
                continue;
            };

            let node = graph.add_node(Node::RouteStation {
                id: route_station.id.clone(),
                mode: route_station.mode,
            });
            graph.route_station_nodes.insert(route_station.id.clone(), node);

            let interchange = interchanges.is_interchange(route_station.station());
            if route_station.pickup {
                graph.add_edge(station_node, node, EdgeKind::Board { interchange });
            }
            if route_station.dropoff {
                graph.add_edge(node, station_node, EdgeKind::Alight { interchange });
            }
        }

        let mut skipped_trips = 0usize;
        for trip in data.trips() {
            let included = data.route(&trip.route).is_some_and(|r| filter.includes(r));
            if !included {
                skipped_trips += 1;
                continue;
            }

            let mut previous: Option<usize> = None;
            for (from, to) in trip.legs() {
                let from_id = RouteStationId::new(trip.route.clone(), from.station.clone());
                let to_id = RouteStationId::new(trip.route.clone(), to.station.clone());
                // A stop that neither picks up nor sets down on any trip has
                // no node; the trip is cut there.
                let (Some(from_node), Some(to_node)) =
                    (graph.route_station_node(&from_id), graph.route_station_node(&to_id))
                else {
                    previous = None;
                    continue;
                };

                let platform = from
                    .platform
                    .as_deref()
                    .and_then(|n| PlatformId::for_station(&from.station, n).ok());
                let edge = graph.add_edge(
                    from_node,
                    to_node,
                    EdgeKind::Ride(Ride {
                        trip: trip.id.clone(),
                        service: trip.service.clone(),
                        route: trip.route.clone(),
                        departure: from.departure,
                        arrival: to.arrival,
                        pickup: from.pickup,
                        dropoff: to.dropoff,
                        platform,
                        next: None,
                    }),
                );
                if let Some(prev) = previous {
                    if let EdgeKind::Ride(ride) = &mut graph.edges[prev].kind {
                        ride.next = Some(edge);
                    }
                }
                previous = Some(edge);
            }
        }
        if skipped_trips > 0 {
            debug!(skipped_trips, "Trips left out by graph filter");
        }

        let mut walks: BTreeMap<(NodeIndex, NodeIndex), Duration> = BTreeMap::new();
        for (a, b, cost) in neighbours.pairs() {
            if let (Some(a), Some(b)) = (graph.station_node(a), graph.station_node(b)) {
                walks.insert((a, b), cost);
                walks.insert((b, a), cost);
            }
        }
        for ((from, to), cost) in walks {
            graph.add_edge(from, to, EdgeKind::Walk { cost });
        }

        graph.sort_departures();

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            route_stations = graph.route_station_nodes.len(),
            filtered = filter.is_active(),
            "Transit graph built"
        );
        graph
    }

    fn add_node(&mut self, node: Node) -> NodeIndex {
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.departures.push(Vec::new());
        self.nodes.len() - 1
    }

    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind) -> usize {
        let index = self.edges.len();
        if matches!(kind, EdgeKind::Ride(_)) {
            self.departures[from].push(index);
        } else {
            self.outgoing[from].push(index);
        }
        self.edges.push(Edge { from, to, kind });
        index
    }

    fn sort_departures(&mut self) {
        let edges = &self.edges;
        for departures in &mut self.departures {
            departures.sort_by(|a, b| {
                let key = |e: &usize| match &edges[*e].kind {
                    EdgeKind::Ride(ride) => Some((ride.departure, ride.trip.clone())),
                    _ => None,
                };
                key(a).cmp(&key(b))
            });
        }
    }
}
