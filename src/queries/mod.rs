//! SQL builders, one module per table
//!
//! Every function returns a finished SQLite statement string built with sea-query;
//! execution lives with the owning store module.

pub mod ddl;
pub mod generations;
pub mod metadata;
pub mod sessions;
pub mod stats;
pub mod users;
pub mod voices;
