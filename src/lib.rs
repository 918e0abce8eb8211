//! This crate provides the data service behind an epidemiological dashboard. It exposes
//! COVID-19 time-series data held in an analytical warehouse, together with free-form
//! user annotations held in a document store, through a small HTTP query surface
//! consumed by a visualization client.
//!
//! The service consists of a handful of components:
//!
//! * A warehouse client owning a single, lazily-established session to the warehouse's
//!   HTTP SQL API.
//! * A document store client used to persist user comments.
//! * A response cache that memoizes warehouse results keyed by the literal query text.
//! * A pattern detection engine that scans ordered per-region case counts for multi-day
//!   increasing-case streaks.
//! * An HTTP gateway tying the above together.
//!
//! The service is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team on top of various popular
//!   components, including the [hyper] HTTP library.
//! * [Serde](serde) performs (de)serialisation of JSON request and response data.
//! * [reqwest] is used to talk to the HTTP APIs of the backing stores.

pub mod app;
pub mod app_state;
pub mod cache;
pub mod cli;
pub mod document_store;
pub mod error;
pub mod metrics;
pub mod models;
pub mod patterns;
pub mod queries;
pub mod server;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod validated_json;
pub mod warehouse;
