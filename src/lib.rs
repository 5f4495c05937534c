//! Spotter Lookup Library
//!
//! Enriches IP indicators by querying an index search API. A token is
//! obtained once per batch (credential exchange or a pre-supplied token),
//! every entity is searched concurrently, and the responses are normalized
//! into lookup results.
//!
//! # Modules
//!
//! - `aggregator`: Fan-in of per-entity outcomes.
//! - `auth`: Authentication strategies, token exchange and token cache.
//! - `config`: Configuration management.
//! - `enrichment`: Concurrent entity lookup engine.
//! - `errors`: Error handling types.
//! - `gateway_client`: HTTP client with fixed TLS/proxy settings.
//! - `integration`: Startup, option validation and lookup entry points.
//! - `models`: Entities, options, results and response normalization.
//! - `validation`: Option validation.

pub mod aggregator;
pub mod auth;
pub mod config;
pub mod enrichment;
pub mod errors;
pub mod gateway_client;
pub mod integration;
pub mod models;
pub mod validation;

pub use integration::Integration;
