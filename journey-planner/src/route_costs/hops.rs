use std::collections::BTreeMap;

use crate::domain::RouteId;

use super::costs::UNREACHABLE;

/// Lower bounds on the changes needed to reach a fixed set of destination
/// routes, computed once per query.
#[derive(Debug, Clone)]
pub struct DestinationHops {
    index: BTreeMap<RouteId, usize>,
    min: Vec<u8>,
}

impl DestinationHops {
    pub(super) fn new(index: BTreeMap<RouteId, usize>, min: Vec<u8>) -> Self {
        Self { index, min }
    }

    /// Fewest changes from `route` to a destination route; `None` if none
    /// can be reached.
    pub fn min_hops(&self, route: &RouteId) -> Option<usize> {
        let hops = *self.min.get(*self.index.get(route)?)?;
        (hops != UNREACHABLE).then_some(hops as usize)
    }

    /// True if `route` can reach a destination route at all.
    pub fn can_reach(&self, route: &RouteId) -> bool {
        self.min_hops(route).is_some()
    }
}
