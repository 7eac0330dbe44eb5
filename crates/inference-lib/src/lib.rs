//! Core library for the model inference engine
//!
//! This crate provides the functionality behind a thin serving layer:
//! - Versioned model artifact discovery with safe degradation to a
//!   deterministic builtin fallback model
//! - Bounded retry with exponential backoff around remote model calls
//! - A composed inference façade exposing predict / converse / describe

pub mod artifact;
pub mod chat;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod models;
pub mod observability;
pub mod retry;

pub use config::EngineConfig;
pub use engine::{ConverseError, InferenceEngine, PredictError};
pub use models::*;
pub use observability::EngineMetrics;
