//! Domain services composing the SRS engine, the store, and the adapters.
//!
//! Routes stay thin: they parse, call one service function, and wrap the
//! result. All scheduling, planning, and scoring rules live here.

pub mod analytics;
pub mod ingest;
pub mod planner;
pub mod pronunciation;
pub mod stats;
