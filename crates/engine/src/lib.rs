//! Sheetforge Engine library.
//!
//! Turns Fantasy Grounds character sheet exports into flat JSON records.
//!
//! ## Structure
//!
//! - `infrastructure/` - Sheet and rule file loading, record writers, settings
//! - `use_cases/` - Extraction and the end-to-end sheet export
//! - `cli` - Command line arguments for the `sheetforge` binary

pub mod cli;
pub mod infrastructure;
pub mod use_cases;

/// Test fixtures module for unit tests.
#[cfg(test)]
pub mod test_fixtures;
