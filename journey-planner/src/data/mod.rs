//! The in-memory transport data snapshot.
//!
//! Entities live in id-keyed maps and refer to each other only by id. The
//! snapshot is built once through [`TransportDataBuilder`] and is read-only
//! afterwards.

mod builder;
mod closures;
mod error;
mod transport_data;

pub use builder::{TransportDataBuilder, TransportDataSnapshot};
pub use closures::{Closures, StationClosure};
pub use error::{BuildError, Exclusion, ExclusionReason};
pub use transport_data::TransportData;
