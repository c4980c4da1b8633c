//! Core infrastructure for pyscent.
//!
//! This crate provides the language-independent half of the engine:
//! - The symbol table built from analyzed sources
//! - Error types and exit codes
//! - Tags file persistence and upward discovery
//! - Completion contexts, matching strategies, and resolution

pub mod builtins;
pub mod complete;
pub mod context;
pub mod error;
pub mod matchers;
pub mod table;
pub mod tags;
