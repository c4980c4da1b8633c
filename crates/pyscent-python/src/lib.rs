//! Python source analysis for pyscent.
//!
//! This crate provides the language-facing half of the engine:
//! - Parsing with single-line repair for mid-edit buffers
//! - The module walker that fills the symbol table
//! - Package discovery through `__init__.py` markers
//! - Completion-context detection at a cursor position
//! - Project indexing over package trees

pub mod detect;
pub mod enclosing;
pub mod names;
pub mod parse;
pub mod probe;
pub mod project;
pub mod render;
pub mod walker;
