//! Transport modes.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of vehicle (or walking) a route or stage uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Tram,
    Bus,
    Train,
    Subway,
    Ferry,
    Walk,
}

impl TransportMode {
    /// Every mode a vehicle route can have.
    pub const VEHICLES: [TransportMode; 5] = [
        TransportMode::Tram,
        TransportMode::Bus,
        TransportMode::Train,
        TransportMode::Subway,
        TransportMode::Ferry,
    ];

    /// Marine modes may legitimately have legs longer than twelve hours.
    pub fn is_marine(&self) -> bool {
        matches!(self, TransportMode::Ferry)
    }

    /// All vehicle modes as a set.
    pub fn all_vehicles() -> BTreeSet<TransportMode> {
        Self::VEHICLES.into_iter().collect()
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportMode::Tram => "Tram",
            TransportMode::Bus => "Bus",
            TransportMode::Train => "Train",
            TransportMode::Subway => "Subway",
            TransportMode::Ferry => "Ferry",
            TransportMode::Walk => "Walk",
        };
        f.write_str(name)
    }
}
