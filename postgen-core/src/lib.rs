#![doc = "postgen-core: generation, editing and export logic for postgen."]

//! This crate contains every part of postgen with a behavioural contract: the
//! inference adapters and their local fallbacks, the concurrent orchestrator,
//! draft editing and the file exports (CSV, plain text, composite PNG).
//! The command-line surface lives in the `postgen` crate.
//!
//! # Usage
//! Build a [`orchestrator::GenerationOrchestrator`] from an
//! [`config::InferenceConfig`], submit a [`contract::GenerationRequest`] and
//! turn the resulting outcome into a [`draft::PostDraft`] for editing and export.

pub mod config;
pub mod contract;
pub mod csv_export;
pub mod draft;
pub mod export;
pub mod image_gen;
pub mod orchestrator;
pub mod platform;
pub mod render;
pub mod settle;
pub mod text_gen;
pub mod transport;
