//! Trips and their stop calls.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{RouteId, ServiceId, ServiceTime, StationId, TripId};

/// One stop of a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopCall {
    pub sequence: u16,
    pub station: StationId,
    /// Platform number at the station, if the feed gives one.
    #[serde(default)]
    pub platform: Option<String>,
    pub arrival: ServiceTime,
    pub departure: ServiceTime,
    /// Passengers may board here.
    #[serde(default = "yes")]
    pub pickup: bool,
    /// Passengers may alight here.
    #[serde(default = "yes")]
    pub dropoff: bool,
}

fn yes() -> bool {
    true
}

impl StopCall {
    /// A call allowing both pickup and dropoff.
    pub fn new(
        sequence: u16,
        station: StationId,
        arrival: ServiceTime,
        departure: ServiceTime,
    ) -> Self {
        Self {
            sequence,
            station,
            platform: None,
            arrival,
            departure,
            pickup: true,
            dropoff: true,
        }
    }

    pub fn at_platform(mut self, number: impl Into<String>) -> Self {
        self.platform = Some(number.into());
        self
    }

    pub fn no_pickup(mut self) -> Self {
        self.pickup = false;
        self
    }

    pub fn no_dropoff(mut self) -> Self {
        self.dropoff = false;
        self
    }

    /// Time from leaving this call to arriving at `next`.
    ///
    /// `None` if `next` arrives before this call departs.
    pub fn cost_to(&self, next: &StopCall) -> Option<Duration> {
        let cost = next.arrival.signed_duration_since(self.departure);
        if cost < Duration::zero() {
            None
        } else {
            Some(cost)
        }
    }
}

/// A single vehicle journey along a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub route: RouteId,
    pub service: ServiceId,
    #[serde(default)]
    pub headsign: String,
    /// Calls in sequence order.
    pub calls: Vec<StopCall>,
}

impl Trip {
    pub fn new(
        id: TripId,
        route: RouteId,
        service: ServiceId,
        headsign: impl Into<String>,
        calls: Vec<StopCall>,
    ) -> Self {
        Self {
            id,
            route,
            service,
            headsign: headsign.into(),
            calls,
        }
    }

    /// Consecutive pairs of calls.
    pub fn legs(&self) -> impl Iterator<Item = (&StopCall, &StopCall)> {
        self.calls.iter().zip(self.calls.iter().skip(1))
    }

    /// Departure from the first call.
    pub fn departure_time(&self) -> Option<ServiceTime> {
        self.calls.first().map(|c| c.departure)
    }

    /// Arrival at the last call.
    pub fn arrival_time(&self) -> Option<ServiceTime> {
        self.calls.last().map(|c| c.arrival)
    }

    /// True if the trip calls at `station` at all.
    pub fn calls_at(&self, station: &StationId) -> bool {
        self.calls.iter().any(|c| &c.station == station)
    }
}
