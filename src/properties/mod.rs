//! Property-file decoding for propload.
//!
//! This module handles:
//! - Logical line assembly (comments, blank lines, continuations)
//! - Key/value splitting on `=`, `:` or whitespace
//! - Escape decoding, including `\uXXXX` sequences

pub mod parser;

use std::collections::BTreeMap;

pub use parser::{ParseError, parse_properties_bytes, parse_properties_str};

/// Key/value pairs decoded from a single properties resource.
pub type PropertyMap = BTreeMap<String, String>;
