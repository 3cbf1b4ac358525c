//! Value objects - Immutable objects defined by their attributes

mod dice;
mod modifier;
mod node_path;

pub use dice::{with_explicit_count, DiceFormula, DiceParseError};
pub use modifier::{capitalize, parse_lenient_int, Modifier};
pub use node_path::{DocumentNode, NodePath, NodePathError};
