//! Domain logic for commercial resources: placeholder templating, resource
//! model, access control and the resource service.
//!
//! This crate has no database or HTTP dependencies. Storage is abstracted by
//! [`store::ResourceStore`].

pub mod error;
pub mod lead;
pub mod placeholders;
pub mod resolution;
pub mod resource;
pub mod roles;
pub mod service;
pub mod store;
pub mod types;
pub mod usage;
pub mod validation;
