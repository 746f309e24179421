//! Prelude module for convenient imports
//!
//! Everything needed to feed a registry and read it back:
//! ```
//! use tinyscan::prelude::*;
//! ```

pub use crate::BlockPool;
pub use crate::Handle;
pub use crate::PoolError;

pub use crate::backend::fixedpool::{BlockInfo, FixedBlockPool, PoolDiagnostics};

pub use crate::registry::{
    DEFAULT_CAPACITY, DeviceRegistry, Observation, Recency, RegistryError, SignalRanking,
};

pub use crate::record::{AdvertisementRecord, TrackedDevice, WireError};

pub use crate::clock::{Clock, ManualClock};

#[cfg(feature = "std")]
pub use crate::clock::SystemClock;

#[cfg(feature = "wire")]
pub use crate::utils::wire::parse_advertisement;
