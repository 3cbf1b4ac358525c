//! Test fixtures shared across engine tests.
//!
//! The sample sheet lives in `test_data/` and the rules are the ones shipped
//! in `config/`, so tests exercise the real rule file.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::{sample_rules, sample_sheet};
//!
//! #[test]
//! fn extracts_rook() {
//!     let root = Element::parse(sample_sheet()).expect("valid xml");
//!     // ... test logic
//! }
//! ```

use std::path::PathBuf;

/// The shipped D&D 5e rule file.
pub fn sample_rules() -> &'static str {
    include_str!("../../../../config/dnd5e_rules.yaml")
}

/// A level 5 wizard exported from Fantasy Grounds.
pub fn sample_sheet() -> &'static str {
    include_str!("../../test_data/rook.xml")
}

/// Path of a file under `test_data/`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(name)
}
