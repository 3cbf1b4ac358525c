//! Dice expressions as they appear on exported character sheets
//!
//! Hit dice come as "d10" or "1d10"; weapon damage components as bare dice
//! like "d6" or compound text the sheet author typed in.

use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Error when parsing a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    /// The formula string is empty
    #[error("Empty dice formula")]
    Empty,
    /// Invalid format - expected XdY or dY
    #[error("Invalid dice format: {0}")]
    InvalidFormat(String),
    /// Die size must be at least 2
    #[error("Die size must be at least 2")]
    InvalidDieSize,
}

/// A dice formula like "5d10"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceFormula {
    /// Number of dice (X in XdY)
    pub dice_count: u32,
    /// Size of each die (Y in XdY)
    pub die_size: u32,
}

impl DiceFormula {
    /// Parse "XdY", or "dY" as one die of size Y.
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let (count, size) = input.split_once('d').ok_or_else(|| {
            DiceParseError::InvalidFormat(format!("Missing 'd' separator in '{}'", input))
        })?;

        let dice_count: u32 = if count.is_empty() {
            1 // "d10" means "1d10"
        } else {
            count.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid dice count: '{}'", count))
            })?
        };
        let die_size: u32 = size.parse().map_err(|_| {
            DiceParseError::InvalidFormat(format!("Invalid die size: '{}'", size))
        })?;
        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }

        Ok(Self {
            dice_count,
            die_size,
        })
    }

    /// Same die rolled `count` times (e.g. a class hit die at a given level).
    pub fn with_count(self, count: u32) -> Self {
        Self {
            dice_count: count,
            ..self
        }
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.dice_count, self.die_size)
    }
}

/// Give a dice expression an explicit count when it starts with the bare die ("d8" -> "1d8").
///
/// Anything else, including compound expressions the parser does not
/// understand, is returned untouched.
pub fn with_explicit_count(dice: &str) -> Cow<'_, str> {
    if dice.starts_with('d') {
        Cow::Owned(format!("1{}", dice))
    } else {
        Cow::Borrowed(dice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_counted_and_shorthand_dice() {
        assert_eq!(
            DiceFormula::parse("1d10"),
            Ok(DiceFormula {
                dice_count: 1,
                die_size: 10
            })
        );
        assert_eq!(DiceFormula::parse(" D8 ").map(|f| f.to_string()), Ok("1d8".to_string()));
    }

    #[test]
    fn rejects_invalid_formulas() {
        assert_eq!(DiceFormula::parse(""), Err(DiceParseError::Empty));
        assert!(matches!(
            DiceFormula::parse("ten"),
            Err(DiceParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            DiceFormula::parse("2d6+1"),
            Err(DiceParseError::InvalidFormat(_))
        ));
        assert_eq!(DiceFormula::parse("1d1"), Err(DiceParseError::InvalidDieSize));
    }

    #[test]
    fn with_count_replaces_number_of_dice() {
        let hit_die = DiceFormula::parse("1d10").expect("valid formula");
        assert_eq!(hit_die.with_count(5).to_string(), "5d10");
        assert_eq!(hit_die.with_count(0).to_string(), "0d10");
    }

    #[test]
    fn explicit_count_only_touches_bare_dice() {
        assert_eq!(with_explicit_count("d6"), "1d6");
        assert_eq!(with_explicit_count("2d6"), "2d6");
        assert_eq!(with_explicit_count(""), "");
    }
}
