//! Dice rolling value objects and parsing
//!
//! Supports notation like "1d20+5", "2d6-1", "3d8". Whitespace and case are
//! ignored, so "2D6 + 1" parses the same as "2d6+1".
//!
//! Randomness is never owned by the domain. Every roll takes a closure
//! `FnMut(min, max) -> i32` returning a uniform integer in `[min, max]`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on dice per roll.
pub const MAX_DICE_COUNT: u32 = 100;
/// Upper bound on faces per die.
pub const MAX_DIE_SIZE: u32 = 1000;
/// Upper bound on the flat modifier, in either direction.
pub const MAX_MODIFIER: i32 = 1000;

/// Error when parsing dice notation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    /// The notation string is empty
    #[error("Invalid dice notation: empty")]
    Empty,
    /// Malformed - expected NdS, NdS+M or NdS-M
    #[error("Invalid dice notation: {0}")]
    InvalidFormat(String),
    /// Dice count must be between 1 and MAX_DICE_COUNT
    #[error("Invalid dice notation: dice count must be between 1 and 100")]
    InvalidDiceCount,
    /// Die size must be between 1 and MAX_DIE_SIZE
    #[error("Invalid dice notation: die size must be between 1 and 1000")]
    InvalidDieSize,
    /// Modifier must be between -MAX_MODIFIER and MAX_MODIFIER
    #[error("Invalid dice notation: modifier must be between -1000 and 1000")]
    InvalidModifier,
}

/// A parsed dice formula like "2d6+3"
///
/// Serializes as its notation string, so persisted enemies carry `"1d6+1"`
/// rather than a nested object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceFormula {
    /// Number of dice to roll (N in NdS)
    pub dice_count: u32,
    /// Size of each die (S in NdS)
    pub die_size: u32,
    /// Modifier added after rolling (+M or -M)
    pub modifier: i32,
}

impl DiceFormula {
    /// Create a new dice formula
    pub fn new(dice_count: u32, die_size: u32, modifier: i32) -> Result<Self, DiceParseError> {
        if dice_count == 0 || dice_count > MAX_DICE_COUNT {
            return Err(DiceParseError::InvalidDiceCount);
        }
        if die_size == 0 || die_size > MAX_DIE_SIZE {
            return Err(DiceParseError::InvalidDieSize);
        }
        if !(-MAX_MODIFIER..=MAX_MODIFIER).contains(&modifier) {
            return Err(DiceParseError::InvalidModifier);
        }
        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }

    /// Parse notation like "1d20+5", "2d6-1", "1d8".
    ///
    /// The count is mandatory: "d20" is rejected.
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let compact: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if compact.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let (count_str, after_d) = compact.split_once('d').ok_or_else(|| {
            DiceParseError::InvalidFormat(format!("missing 'd' separator in '{}'", input.trim()))
        })?;

        if count_str.is_empty() || !count_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DiceParseError::InvalidFormat(format!(
                "invalid dice count '{}'",
                count_str
            )));
        }
        let dice_count: u32 = count_str
            .parse()
            .map_err(|_| DiceParseError::InvalidDiceCount)?;

        let (size_str, modifier) = match after_d.find(['+', '-']) {
            Some(pos) => {
                let sign = if after_d.as_bytes()[pos] == b'-' { -1 } else { 1 };
                let mod_str = &after_d[pos + 1..];
                if mod_str.is_empty() || !mod_str.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(DiceParseError::InvalidFormat(format!(
                        "invalid modifier in '{}'",
                        input.trim()
                    )));
                }
                let magnitude: i32 = mod_str
                    .parse()
                    .map_err(|_| DiceParseError::InvalidModifier)?;
                (&after_d[..pos], sign * magnitude)
            }
            None => (after_d, 0),
        };

        if size_str.is_empty() || !size_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DiceParseError::InvalidFormat(format!(
                "invalid die size '{}'",
                size_str
            )));
        }
        let die_size: u32 = size_str
            .parse()
            .map_err(|_| DiceParseError::InvalidDieSize)?;

        Self::new(dice_count, die_size, modifier)
    }

    /// Roll the dice using the injected random source.
    ///
    /// Values produced by `rng` are clamped into `[1, die_size]`.
    pub fn roll_with<R>(&self, rng: &mut R) -> DiceRollResult
    where
        R: FnMut(i32, i32) -> i32,
    {
        let faces = self.die_size as i32;
        let individual_rolls: Vec<i32> = (0..self.dice_count)
            .map(|_| rng(1, faces).clamp(1, faces))
            .collect();

        let dice_total: i32 = individual_rolls.iter().sum();

        DiceRollResult {
            formula: *self,
            individual_rolls,
            dice_total,
            modifier_applied: self.modifier,
            total: dice_total.saturating_add(self.modifier),
        }
    }

    /// Same formula with an extra flat modifier.
    pub fn with_bonus(&self, bonus: i32) -> Self {
        Self {
            modifier: self.modifier.saturating_add(bonus),
            ..*self
        }
    }
}

impl FromStr for DiceFormula {
    type Err = DiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DiceFormula {
    type Error = DiceParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DiceFormula> for String {
    fn from(value: DiceFormula) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.dice_count, self.die_size),
            m if m > 0 => write!(f, "{}d{}+{}", self.dice_count, self.die_size, m),
            m => write!(f, "{}d{}{}", self.dice_count, self.die_size, m),
        }
    }
}

/// Result of rolling dice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRollResult {
    /// The formula that was rolled
    pub formula: DiceFormula,
    /// Individual die results
    pub individual_rolls: Vec<i32>,
    /// Sum of dice before modifier
    pub dice_total: i32,
    /// Modifier that was applied
    pub modifier_applied: i32,
    /// Final total (dice_total + modifier)
    pub total: i32,
}

impl DiceRollResult {
    /// Format as a breakdown string, e.g. "1d20(14) + 5 = 19" or "2d6[4, 5] = 9"
    pub fn breakdown(&self) -> String {
        let dice = if self.individual_rolls.len() == 1 {
            format!(
                "{}d{}({})",
                self.formula.dice_count, self.formula.die_size, self.individual_rolls[0]
            )
        } else {
            let rolls: Vec<String> = self
                .individual_rolls
                .iter()
                .map(|r| r.to_string())
                .collect();
            format!(
                "{}d{}[{}]",
                self.formula.dice_count,
                self.formula.die_size,
                rolls.join(", ")
            )
        };

        match self.modifier_applied {
            0 => format!("{} = {}", dice, self.total),
            m if m > 0 => format!("{} + {} = {}", dice, m, self.total),
            m => format!("{} - {} = {}", dice, -m, self.total),
        }
    }

    /// Check if this is a natural 20 on a single d20
    pub fn is_natural_20(&self) -> bool {
        self.formula.die_size == 20
            && self.formula.dice_count == 1
            && self.individual_rolls.first() == Some(&20)
    }

    /// Check if this is a natural 1 on a single d20
    pub fn is_natural_1(&self) -> bool {
        self.formula.die_size == 20
            && self.formula.dice_count == 1
            && self.individual_rolls.first() == Some(&1)
    }
}

/// A d20 attack roll: the natural die plus a flat bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRoll {
    pub natural: i32,
    pub bonus: i32,
    pub total: i32,
}

impl AttackRoll {
    pub fn is_critical(&self) -> bool {
        self.natural == 20
    }

    pub fn is_fumble(&self) -> bool {
        self.natural == 1
    }
}

/// Parse and roll notation in one step.
pub fn roll<R>(notation: &str, rng: &mut R) -> Result<DiceRollResult, DiceParseError>
where
    R: FnMut(i32, i32) -> i32,
{
    Ok(DiceFormula::parse(notation)?.roll_with(rng))
}

/// Roll 1d20 + bonus.
pub fn roll_attack<R>(bonus: i32, rng: &mut R) -> AttackRoll
where
    R: FnMut(i32, i32) -> i32,
{
    let natural = rng(1, 20).clamp(1, 20);
    AttackRoll {
        natural,
        bonus,
        total: natural.saturating_add(bonus),
    }
}

/// Roll 1d6 initiative for one side of a fight.
pub fn roll_initiative<R>(rng: &mut R) -> i32
where
    R: FnMut(i32, i32) -> i32,
{
    rng(1, 6).clamp(1, 6)
}
