//! Infrastructure implementations.
//!
//! File formats and process environment: XML sheets and YAML rules in,
//! JSON records out.

pub mod export;
pub mod importers;
pub mod ports;
pub mod settings;
