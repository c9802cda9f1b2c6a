use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use moka::future::Cache as MokaCache;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::domain::{LatLong, RouteStationId, StationId};
use crate::locations::Nearby;
use crate::planner::{CancelFlag, JourneyRequest, Location, SearchError, SearchResult};
use crate::route_costs::NumberOfChanges;

use super::NetworkHandle;

/// Cache key: the generation answered from, and the request.
type ResultKey = (u64, JourneyRequest);

/// The query surface over the active network generation.
///
/// Each request reads one generation from start to finish. Candidate start
/// times are searched in parallel on the blocking pool and merged in
/// candidate order, so the result does not depend on which finishes first.
#[derive(Clone)]
pub struct JourneyService {
    handle: NetworkHandle,
    results: MokaCache<ResultKey, Arc<SearchResult>>,
}

impl JourneyService {
    pub fn new(handle: NetworkHandle, config: &CacheConfig) -> Self {
        let results = MokaCache::builder()
            .time_to_live(config.ttl())
            .max_capacity(config.max_capacity)
            .build();
        Self { handle, results }
    }

    pub fn handle(&self) -> &NetworkHandle {
        &self.handle
    }

    /// Plan a journey, giving up after the configured timeout.
    pub async fn plan(&self, request: JourneyRequest) -> Result<Arc<SearchResult>, SearchError> {
        self.plan_with_cancel(request, CancelFlag::new()).await
    }

    /// Plan a journey, stopping early if `cancel` is raised.
    pub async fn plan_with_cancel(
        &self,
        request: JourneyRequest,
        cancel: CancelFlag,
    ) -> Result<Arc<SearchResult>, SearchError> {
        let scope = self.handle.read().await?;
        let key = (scope.generation(), request);
        if let Some(hit) = self.results.get(&key).await {
            debug!(generation = key.0, "Journey cache hit");
            return Ok(hit);
        }

        let network = scope.network().clone();
        let query = Arc::new(network.calculator().prepare(&key.1)?);
        let timeout = network.config().search.timeout();
        let deadline = Instant::now() + timeout;

        let tasks = query.candidates().iter().map(|start| {
            let network = network.clone();
            let query = query.clone();
            let cancel = cancel.clone();
            let start = *start;
            tokio::task::spawn_blocking(move || {
                network
                    .calculator()
                    .search_candidate(&query, start, &cancel, Some(deadline))
            })
        });

        let Ok(joined) = tokio::time::timeout(timeout, join_all(tasks)).await else {
            cancel.cancel();
            warn!(
                origin = %key.1.origin,
                destination = %key.1.destination,
                timeout_ms = timeout.as_millis() as u64,
                "Journey search timed out"
            );
            return Err(SearchError::Timeout);
        };

        let mut outcomes = Vec::with_capacity(joined.len());
        for task in joined {
            let outcome = task.map_err(|e| SearchError::Task(e.to_string()))??;
            outcomes.push(outcome);
        }

        let result = Arc::new(network.calculator().finish(&query, outcomes));
        self.results.insert(key, result.clone()).await;
        Ok(result)
    }

    pub async fn number_of_changes(
        &self,
        from: &Location,
        to: &Location,
    ) -> Result<Option<NumberOfChanges>, SearchError> {
        let scope = self.handle.read().await?;
        scope.network().number_of_changes(from, to)
    }

    pub async fn is_interchange(&self, station: &StationId) -> Result<bool, SearchError> {
        let scope = self.handle.read().await?;
        Ok(scope.network().is_interchange(station))
    }

    pub async fn stations_near(&self, point: &LatLong, radius_m: f64) -> Result<Vec<Nearby<StationId>>, SearchError> {
        let scope = self.handle.read().await?;
        Ok(scope.network().stations_near(point, radius_m))
    }

    pub async fn hops_calculator(
        &self,
        route_station: &RouteStationId,
        destinations: &BTreeSet<StationId>,
    ) -> Result<Option<usize>, SearchError> {
        let scope = self.handle.read().await?;
        Ok(scope.network().hops_calculator(route_station, destinations))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test_support::{config, ll, network, network_with, query_date, rid, sid, t};

    fn service() -> JourneyService {
        JourneyService::new(NetworkHandle::with_network(network()), &CacheConfig::default())
    }

    fn first_to_beyond(at: &str) -> JourneyRequest {
        JourneyRequest::new(
            sid("First"),
            sid("Beyond"),
            query_date(),
            t(at),
            &config().search,
        )
    }

    #[tokio::test]
    async fn plan_matches_sequential_search() {
        let service = service();
        let request = first_to_beyond("08:00");

        let planned = service.plan(request.clone()).await.unwrap();
        let scope = service.handle().read().await.unwrap();
        let sequential = scope
            .network()
            .calculator()
            .calculate(&request, &CancelFlag::new())
            .unwrap();

        assert!(!planned.is_exhausted());
        assert_eq!(planned.journeys, sequential.journeys);
    }

    #[tokio::test]
    async fn parallel_candidates_merge_in_order() {
        let mut config = config();
        config.search.number_of_queries = 3;
        let network = network_with(&config);
        let request = JourneyRequest::new(
            sid("First"),
            sid("Last"),
            query_date(),
            t("08:00"),
            &config.search,
        );
        let sequential = network
            .calculator()
            .calculate(&request, &CancelFlag::new())
            .unwrap();

        let service = JourneyService::new(NetworkHandle::with_network(network), &config.cache);
        for _ in 0..3 {
            service.results.invalidate_all();
            let planned = service.plan(request.clone()).await.unwrap();
            assert_eq!(planned.journeys, sequential.journeys);
            assert_eq!(planned.candidates_searched, 3);
        }
    }

    #[tokio::test]
    async fn repeated_requests_are_cached() {
        let service = service();
        let first = service.plan(first_to_beyond("08:00")).await.unwrap();
        let second = service.plan(first_to_beyond("08:00")).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = service.plan(first_to_beyond("09:00")).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[tokio::test]
    async fn new_generation_is_not_served_from_cache() {
        let service = service();
        let before = service.plan(first_to_beyond("08:00")).await.unwrap();
        service.handle().publish(network());
        let after = service.plan(first_to_beyond("08:00")).await.unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.journeys, after.journeys);
    }

    #[tokio::test]
    async fn cancelled_search_is_aborted() {
        let service = service();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = service.plan_with_cancel(first_to_beyond("08:00"), cancel).await;
        assert_eq!(result.unwrap_err(), SearchError::Aborted);
        assert_eq!(service.handle().active_scopes(), 0);
    }

    #[tokio::test]
    async fn zero_timeout_reports_timeout() {
        let mut config = config();
        config.search.timeout_ms = 0;
        let service = JourneyService::new(
            NetworkHandle::with_network(network_with(&config)),
            &config.cache,
        );
        let result = service.plan(first_to_beyond("08:00")).await;
        assert_eq!(result.unwrap_err(), SearchError::Timeout);
    }

    #[tokio::test]
    async fn waits_for_a_network() {
        let service = JourneyService::new(NetworkHandle::new(), &CacheConfig::default());
        let pending = tokio::time::timeout(
            Duration::from_millis(50),
            service.plan(first_to_beyond("08:00")),
        )
        .await;
        assert!(pending.is_err());

        service.handle().publish(network());
        assert!(service.plan(first_to_beyond("08:00")).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let service = service();
        let request = first_to_beyond("08:00").with_max_changes(-1);
        assert!(matches!(
            service.plan(request).await,
            Err(SearchError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn auxiliary_queries() {
        let service = service();
        assert!(service.is_interchange(&sid("Interchange")).await.unwrap());
        assert!(!service.is_interchange(&sid("Last")).await.unwrap());

        let near = service.stations_near(&ll(53.0, -1.995), 500.0).await.unwrap();
        assert_eq!(near.len(), 2);

        let changes = service
            .number_of_changes(&Location::Station(sid("First")), &Location::Station(sid("Beyond")))
            .await
            .unwrap();
        assert_eq!(changes, Some(NumberOfChanges { min: 1, max: 1 }));

        let hops = service
            .hops_calculator(
                &RouteStationId::new(rid("A"), sid("First")),
                &BTreeSet::from([sid("Beyond")]),
            )
            .await
            .unwrap();
        assert_eq!(hops, Some(1));
    }
}
