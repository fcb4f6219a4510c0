//! The two cache tiers composed by [`TieredCache`](super::TieredCache).
//!
//! Tiers are plain data structures: they take the current time as an
//! argument and rely on the coordinator's lock for synchronization.

mod fast;
mod persistent;

pub use fast::FastTier;
pub use persistent::PersistentTier;
