//! Core data model shared by the pipeline, runners and persistence
//!
//! Targets are immutable units of work. Every processed target yields exactly
//! one [`TargetResult`], whose outcome is expressed with typed enums rather
//! than loosely keyed rows.

mod result;
mod target;

pub use result::{
    DiscoveryStrategy, EmailSource, FailureReason, SiteType, TargetResult, TargetStatus,
};
pub use target::Target;
