//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod lead_repo;
pub mod resource_repo;
pub mod resource_usage_repo;

pub use lead_repo::LeadRepo;
pub use resource_repo::ResourceRepo;
pub use resource_usage_repo::ResourceUsageRepo;
