//! Identifier types for transport entities.
//!
//! Entities reference each other by id rather than by pointer, so every
//! relationship in the model is an id set or map. Ids are interned as
//! `Arc<str>` which keeps clones cheap in search code.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid id: {reason}")]
pub struct InvalidId {
    reason: &'static str,
}

fn validate(s: &str) -> Result<(), InvalidId> {
    if s.trim().is_empty() {
        return Err(InvalidId {
            reason: "must not be blank",
        });
    }
    if s.chars().any(char::is_control) {
        return Err(InvalidId {
            reason: "must not contain control characters",
        });
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Arc<str>);

        impl $name {
            /// Parse an id, rejecting blank strings and control characters.
            pub fn parse(s: &str) -> Result<Self, InvalidId> {
                validate(s)?;
                Ok(Self(Arc::from(s)))
            }

            /// Returns the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidId;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identity of a physical stop or station.
    StationId
);
string_id!(
    /// Identity of a composite station (a named cluster of stops).
    StationGroupId
);
string_id!(
    /// Identity of a route: one agency, one mode, one direction.
    RouteId
);
string_id!(
    /// Identity of a single vehicle trip.
    TripId
);
string_id!(
    /// Identity of a service calendar.
    ServiceId
);
string_id!(
    /// Identity of an operating agency.
    AgencyId
);
string_id!(
    /// Identity of a postcode area centroid.
    PostcodeId
);
string_id!(
    /// Identity of a platform, derived from its station and platform number.
    PlatformId
);

impl PlatformId {
    /// Derive a platform id from the owning station and the platform number.
    ///
    /// ```
    /// use journey_planner::domain::{PlatformId, StationId};
    ///
    /// let station = StationId::parse("9400ZZMAPIC").unwrap();
    /// let platform = PlatformId::for_station(&station, "2").unwrap();
    /// assert_eq!(platform.as_str(), "9400ZZMAPIC2");
    /// ```
    pub fn for_station(station: &StationId, number: &str) -> Result<Self, InvalidId> {
        if number.trim().is_empty() {
            return Err(InvalidId {
                reason: "platform number must not be blank",
            });
        }
        Self::parse(&format!("{}{}", station.as_str(), number))
    }
}

/// Identity of a route's presence at a station.
///
/// Composed from both ids, so two `RouteStationId`s are equal exactly when
/// they name the same route at the same station.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteStationId {
    pub route: RouteId,
    pub station: StationId,
}

impl RouteStationId {
    /// Compose an id from a route and a station.
    pub fn new(route: RouteId, station: StationId) -> Self {
        Self { route, station }
    }
}

impl fmt::Debug for RouteStationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteStationId({}_{})", self.route, self.station)
    }
}

impl fmt::Display for RouteStationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.route, self.station)
    }
}
