//! HTTP client for the remote generation service.
//!
//! Provides the typed wire messages, a [`reqwest`]-backed API wrapper,
//! the [`service::GenerationService`] seam the workflows are written
//! against, and environment-driven service configuration.

pub mod api;
pub mod config;
pub mod messages;
pub mod service;
