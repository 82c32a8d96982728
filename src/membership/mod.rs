//! Membership tiers and their state machine.

pub mod model;
pub mod tier;
pub mod validate;

pub use model::{make_membership, Membership, TierChange};
pub use tier::Tier;
