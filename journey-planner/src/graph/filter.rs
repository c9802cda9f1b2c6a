use std::collections::BTreeSet;

use crate::domain::{AgencyId, Route, RouteId};

/// Restricts graph construction to some routes or agencies.
///
/// An unset restriction allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphFilter {
    pub routes: Option<BTreeSet<RouteId>>,
    pub agencies: Option<BTreeSet<AgencyId>>,
}

impl GraphFilter {
    /// A filter that allows everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only_routes(routes: impl IntoIterator<Item = RouteId>) -> Self {
        Self {
            routes: Some(routes.into_iter().collect()),
            agencies: None,
        }
    }

    pub fn only_agencies(agencies: impl IntoIterator<Item = AgencyId>) -> Self {
        Self {
            routes: None,
            agencies: Some(agencies.into_iter().collect()),
        }
    }

    pub fn includes(&self, route: &Route) -> bool {
        self.routes.as_ref().is_none_or(|r| r.contains(&route.id))
            && self.agencies.as_ref().is_none_or(|a| a.contains(&route.agency))
    }

    pub fn is_active(&self) -> bool {
        self.routes.is_some() || self.agencies.is_some()
    }
}
