//! Adaptive vocabulary learning backend: an SM-2 spaced-repetition engine,
//! practice ingestion, session planning, stats and analytics, and
//! pronunciation scoring, persisted in sled and served over HTTP.

pub mod adapters;
pub mod config;
pub mod constants;
pub mod events;
pub mod extractors;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod services;
pub mod srs;
pub mod state;
pub mod store;
pub mod validation;
pub mod workers;
