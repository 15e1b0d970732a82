//! YAML Loader module
//!
//! Parse endpoint definitions from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `load_endpoint` - read and validate a definition file
//! - `load_endpoint_from_str` - the same for an in-memory document
//! - `validate_endpoint` - checks that need more than the YAML schema

mod parser;

pub use parser::{load_endpoint, load_endpoint_from_str, validate_endpoint};
