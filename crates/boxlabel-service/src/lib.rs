//! Boxlabel Service - derived image tiers and label storage
//!
//! This crate owns everything on disk for a dataset:
//! - Folder preprocessing passes that fill the preprocessed tier
//!   ([`PreprocessCoordinator`]), at most one pass per folder at a time
//! - The processed tier: rotation plus box overlay ([`Renderer`])
//! - `labels.json` and `fields.json` per folder ([`LabelStore`])
//!
//! [`AnnotationService`] ties them together for the routing layer. Codec
//! work runs on tokio's blocking pool; logging goes through `tracing`, and
//! installing a subscriber is left to the host binary.

mod config;
mod coordinator;
mod error;
mod labels;
mod renderer;
mod service;
mod store;

#[cfg(test)]
mod test_support;

pub use config::ServiceConfig;
pub use coordinator::{PassOutcome, PassReport, PreprocessCoordinator};
pub use error::ServiceError;
pub use labels::{LabelMap, LabelStore};
pub use renderer::{Initialized, Renderer};
pub use service::{AnnotationService, ListMode};
pub use store::{validate_name, DerivedStore, Tier};

pub use boxlabel_core;
