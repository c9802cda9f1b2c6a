use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::config::PlannerConfig;
use crate::data::{BuildError, Closures, TransportData, TransportDataSnapshot};
use crate::domain::{LatLong, RouteStationId, StationId};
use crate::graph::{GraphFilter, TransitGraph};
use crate::interchange::Interchanges;
use crate::locations::{Nearby, Neighbours, StationLocations};
use crate::planner::{Location, RouteCalculator, SearchError};
use crate::route_costs::{NumberOfChanges, RouteToRouteCosts};

/// One generation of the network: the data and every index built from it.
///
/// Built once, then only read.
#[derive(Debug)]
pub struct TransitNetwork {
    data: TransportData,
    locations: StationLocations,
    neighbours: Neighbours,
    interchanges: Interchanges,
    costs: RouteToRouteCosts,
    graph: TransitGraph,
    closures: Closures,
    config: PlannerConfig,
}

impl TransitNetwork {
    /// Build every index over `data`, in dependency order.
    pub fn build(data: TransportData, config: &PlannerConfig) -> Self {
        let started = Instant::now();

        let locations = StationLocations::new(&data);
        let neighbours = Neighbours::build(&data, &locations, &config.walking);
        let interchanges = Interchanges::classify(
            &data,
            &neighbours,
            &config.interchanges,
            !config.search.change_at_interchange_only,
        );
        let costs = RouteToRouteCosts::build(&data, &interchanges, &neighbours);
        let graph = TransitGraph::build(&data, &interchanges, &neighbours, &GraphFilter::all());
        let closures = Closures::new(&config.closures);

        info!(
            stations = data.station_count(),
            routes = data.route_count(),
            interchanges = interchanges.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Transit network ready"
        );

        Self {
            data,
            locations,
            neighbours,
            interchanges,
            costs,
            graph,
            closures,
            config: config.clone(),
        }
    }

    /// Load a JSON snapshot, keep the configured modes and build.
    pub fn load(snapshot: impl AsRef<Path>, config: &PlannerConfig) -> Result<Self, BuildError> {
        let data = TransportDataSnapshot::from_json_file(snapshot)?
            .into_builder()
            .only_modes(config.modes.iter().copied())
            .build()?;
        Ok(Self::build(data, config))
    }

    pub fn data(&self) -> &TransportData {
        &self.data
    }

    pub fn locations(&self) -> &StationLocations {
        &self.locations
    }

    pub fn neighbours(&self) -> &Neighbours {
        &self.neighbours
    }

    pub fn interchanges(&self) -> &Interchanges {
        &self.interchanges
    }

    pub fn costs(&self) -> &RouteToRouteCosts {
        &self.costs
    }

    pub fn graph(&self) -> &TransitGraph {
        &self.graph
    }

    pub fn closures(&self) -> &Closures {
        &self.closures
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// A journey planner reading this network.
    pub fn calculator(&self) -> RouteCalculator<'_> {
        RouteCalculator {
            data: &self.data,
            graph: &self.graph,
            interchanges: &self.interchanges,
            costs: &self.costs,
            locations: &self.locations,
            neighbours: &self.neighbours,
            closures: &self.closures,
            config: &self.config,
        }
    }

    /// Fewest and most changes between two locations over the sampled dates
    /// and times. `Ok(None)` if they are never connected.
    pub fn number_of_changes(&self, from: &Location, to: &Location) -> Result<Option<NumberOfChanges>, SearchError> {
        let calculator = self.calculator();
        let from = calculator.stations_for(from)?;
        let to = calculator.stations_for(to)?;
        Ok(self
            .costs
            .number_of_changes(&self.data, &from, &to, &self.config.route_costs))
    }

    pub fn is_interchange(&self, station: &StationId) -> bool {
        self.interchanges.is_interchange(station)
    }

    /// Stations within `radius_m` of `point`, nearest first.
    pub fn stations_near(&self, point: &LatLong, radius_m: f64) -> Vec<Nearby<StationId>> {
        self.locations.find_near(point, radius_m)
    }

    /// Fewest changes from `route_station` to a route setting down at one of
    /// `destinations`.
    pub fn hops_calculator(&self, route_station: &RouteStationId, destinations: &BTreeSet<StationId>) -> Option<usize> {
        self.costs.hops_calculator(&self.data, route_station, destinations)
    }
}
