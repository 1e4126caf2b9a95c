//! Storage tiers.
//!
//! - `hot`: in-memory source of truth for non-demoted keys
//! - `traits`: the [`ColdStore`](traits::ColdStore) seam and shared errors
//! - `sqlite`: durable cold tier
//! - `memory`: volatile cold tier for tests

pub mod traits;
pub mod hot;
pub mod memory;
pub mod sqlite;
