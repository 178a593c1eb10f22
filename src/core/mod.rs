//! Shared primitives: errors, configuration, store access, logging, audit,
//! and the text-generation capability.

pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod output;
pub mod store;
