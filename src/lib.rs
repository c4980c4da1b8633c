//! Pyscent: static-analysis autocompletion for Python sources
//!
//! A completion engine that indexes Python packages into a symbol table and
//! answers cursor-position queries with ranked candidate lists, without ever
//! importing the analyzed code.

// Core infrastructure - re-exported from pyscent-core
pub use pyscent_core::complete;
pub use pyscent_core::context;
pub use pyscent_core::error;
pub use pyscent_core::matchers;
pub use pyscent_core::table;
pub use pyscent_core::tags;

// Python analysis - re-exported from pyscent-python
pub use pyscent_python::detect;
pub use pyscent_python::probe;
pub use pyscent_python::project;

// Front door for the scent binary
pub mod cli;
