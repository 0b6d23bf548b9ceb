//! Payment intent identifiers, statuses, snapshots, and confirmation parameters.

pub mod id;
pub mod params;
pub mod snapshot;
pub mod status;

pub use id::*;
pub use params::*;
pub use snapshot::*;
pub use status::*;
