//! Dice formula value objects and parsing
//!
//! Supports formulas like "1d20", "2d6+3", "1d8-1". Model output rarely hands
//! over a clean formula, so [`DiceFormula::find_in`] also scans free text such
//! as `"2d6 slashing"` for the first dice expression.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error when parsing a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    /// The formula string is empty
    #[error("Empty dice formula")]
    Empty,
    /// Invalid format - expected XdY or XdY+Z
    #[error("Invalid dice format: {0}")]
    InvalidFormat(String),
    /// Dice count must be at least 1
    #[error("Dice count must be at least 1")]
    InvalidDiceCount,
    /// Die size must be at least 2
    #[error("Die size must be at least 2")]
    InvalidDieSize,
}

/// A parsed dice formula like "2d6+3"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceFormula {
    /// Number of dice to roll (X in XdY)
    pub dice_count: u16,
    /// Size of each die (Y in XdY)
    pub die_size: u16,
    /// Flat modifier (+Z or -Z)
    pub modifier: i32,
}

impl DiceFormula {
    /// Create a new dice formula
    pub fn new(dice_count: u16, die_size: u16, modifier: i32) -> Result<Self, DiceParseError> {
        if dice_count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }
        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }
        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }

    /// Parse a whole string as a dice formula.
    ///
    /// Supported formats:
    /// - "XdY" - Roll X dice of size Y
    /// - "XdY+Z" / "XdY - Z" - with a flat modifier (whitespace ignored)
    /// - "dY" - Roll 1 die of size Y (shorthand)
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let compact: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if compact.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let d_pos = compact.find('d').ok_or_else(|| {
            DiceParseError::InvalidFormat(format!("Missing 'd' separator in '{}'", compact))
        })?;

        let count_str = &compact[..d_pos];
        let dice_count: u16 = if count_str.is_empty() {
            1
        } else {
            count_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid dice count: '{}'", count_str))
            })?
        };

        let after_d = &compact[d_pos + 1..];
        let sign_pos = after_d.find(['+', '-']);
        let (size_str, modifier) = match sign_pos {
            Some(0) => {
                return Err(DiceParseError::InvalidFormat(format!(
                    "Invalid die size: '{}'",
                    after_d
                )))
            }
            Some(pos) => {
                let modifier: i32 = after_d[pos..].trim_start_matches('+').parse().map_err(|_| {
                    DiceParseError::InvalidFormat(format!("Invalid modifier: '{}'", &after_d[pos..]))
                })?;
                (&after_d[..pos], modifier)
            }
            None => (after_d, 0),
        };

        let die_size: u16 = size_str.parse().map_err(|_| {
            DiceParseError::InvalidFormat(format!("Invalid die size: '{}'", size_str))
        })?;

        Self::new(dice_count, die_size, modifier)
    }

    /// Find the first `<N>d<M>` expression embedded in free text, together with
    /// a directly attached modifier (`"1d8+1 piercing"` yields 1d8+1).
    pub fn find_in(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        let lower = text.to_ascii_lowercase();
        let lower = lower.as_bytes();

        for (i, &b) in lower.iter().enumerate() {
            if b != b'd' || i == 0 || !bytes[i - 1].is_ascii_digit() {
                continue;
            }
            let count_start = lower[..i]
                .iter()
                .rposition(|c| !c.is_ascii_digit())
                .map_or(0, |p| p + 1);
            let size_end = lower[i + 1..]
                .iter()
                .position(|c| !c.is_ascii_digit())
                .map_or(lower.len(), |p| i + 1 + p);
            if size_end == i + 1 {
                continue;
            }

            let dice_count: u16 = text[count_start..i].parse().ok()?;
            let die_size: u16 = text[i + 1..size_end].parse().ok()?;
            let modifier = attached_modifier(&text[size_end..]).unwrap_or(0);
            if let Ok(formula) = Self::new(dice_count, die_size, modifier) {
                return Some(formula);
            }
        }
        None
    }

    /// The dice part alone, without modifier (e.g., "2d6")
    pub fn dice(&self) -> String {
        format!("{}d{}", self.dice_count, self.die_size)
    }

    /// Format as a display string (e.g., "1d20+5")
    pub fn display(&self) -> String {
        match self.modifier {
            0 => self.dice(),
            m if m > 0 => format!("{}+{}", self.dice(), m),
            m => format!("{}{}", self.dice(), m),
        }
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// `"+ 2 fire"` -> 2, `"-1"` -> -1, anything else -> None.
fn attached_modifier(rest: &str) -> Option<i32> {
    let rest = rest.trim_start();
    let (sign, tail) = match rest.chars().next()? {
        '+' => (1, &rest[1..]),
        '-' => (-1, &rest[1..]),
        _ => return None,
    };
    let tail = tail.trim_start();
    let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<i32>().ok().map(|n| sign * n)
}

/// Normalise a loosely-typed bonus into a signed string.
///
/// `"3"` -> `"+3"`, `"+3"` -> `"+3"`, `"-1"` -> `"-1"`, `"0"`/`""` -> None.
/// Non-numeric bonuses (e.g. `"@mod"`) are kept verbatim with a leading `+`.
pub fn signed_bonus(raw: &str) -> Option<String> {
    let trimmed: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.trim_start_matches('+').parse::<i64>() {
        return match n {
            0 => None,
            n if n > 0 => Some(format!("+{}", n)),
            n => Some(n.to_string()),
        };
    }
    if trimmed.starts_with('+') || trimmed.starts_with('-') {
        Some(trimmed)
    } else {
        Some(format!("+{}", trimmed))
    }
}
