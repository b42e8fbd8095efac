pub mod auth;
pub mod collectors;
pub mod config;
pub mod dedup;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod harvest;
pub mod host;
pub mod models;
pub mod routes;
