//! Block pool implementations
//!
//! This module contains the concrete storage behind the registry.

/// Fixed block pool with an intrusive free-index list
pub mod fixedpool;
