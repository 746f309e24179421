//! Utilities around the registry
//!
//! Provides decoding of raw advertisement events.

#[cfg(feature = "wire")]
pub mod wire;
