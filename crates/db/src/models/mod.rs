//! Database row structs.
//!
//! Each submodule contains a `FromRow` struct matching the table row and a
//! conversion into the matching `lapublica_core` domain type. Enum columns are
//! stored as TEXT and parsed on the way out, so a row with an unknown value
//! surfaces as [`CoreError::Internal`](lapublica_core::error::CoreError).

pub mod lead;
pub mod resource;
pub mod usage;
