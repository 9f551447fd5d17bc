//! Domain types shared by every GenStudio crate.
//!
//! Holds the workflow catalogue, request/result shapes, media locator
//! resolution, and the local validation rules that run before anything
//! touches the network.

pub mod error;
pub mod generation;
pub mod media;
pub mod types;
