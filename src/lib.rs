// Library interface for the server binary and tests

pub mod audio;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod db;
pub mod error;
pub mod gateway;
pub mod generations;
pub mod models;
pub mod queries;
pub mod regenerate;
pub mod schema;
pub mod serve;
pub mod sessions;
pub mod stats;
pub mod users;
pub mod voices;

// Re-export the expected database version for convenience
pub use constants::EXPECTED_DB_VERSION;
