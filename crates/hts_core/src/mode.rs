//! Harmonic modes and mode sets.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Largest accepted mode: one cycle per day of a leap year.
pub const MAX_MODE: u32 = 366;

/// A harmonic frequency in cycles per year.
///
/// Always in `1..=MAX_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Mode(NonZeroU32);

impl Mode {
    /// Create a mode, rejecting zero and values above [`MAX_MODE`].
    pub fn new(value: u32) -> Result<Self> {
        NonZeroU32::new(value)
            .filter(|v| v.get() <= MAX_MODE)
            .map(Self)
            .ok_or(CoreError::InvalidMode(i64::from(value)))
    }

    /// Get the mode as an integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Get the mode as a frequency multiplier for angular time.
    #[must_use]
    pub fn frequency(self) -> f64 {
        f64::from(self.get())
    }
}

impl TryFrom<u32> for Mode {
    type Error = CoreError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<i64> for Mode {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self> {
        u32::try_from(value)
            .ok()
            .and_then(|v| Self::new(v).ok())
            .ok_or(CoreError::InvalidMode(value))
    }
}

impl From<Mode> for u32 {
    fn from(mode: Mode) -> Self {
        mode.get()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// How the set of modes is specified in configuration.
///
/// `Count(n)` is the canonical form and expands to modes `1..=n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSpec {
    /// The first `n` harmonics.
    Count(u32),
    /// An explicit list of harmonics, kept in the given order.
    Explicit(Vec<i64>),
}

impl Default for ModeSpec {
    fn default() -> Self {
        Self::Count(3)
    }
}

impl ModeSpec {
    /// Validate and expand into a [`ModeSet`].
    pub fn resolve(&self) -> Result<ModeSet> {
        match self {
            Self::Count(n) => ModeSet::first(*n),
            Self::Explicit(values) => ModeSet::from_values(values),
        }
    }
}

/// An ordered, non-empty, duplicate-free set of harmonic modes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModeSet {
    modes: Vec<Mode>,
}

impl ModeSet {
    /// Modes `1..=count`.
    pub fn first(count: u32) -> Result<Self> {
        if count == 0 {
            return Err(CoreError::EmptyModeSet);
        }
        if count > MAX_MODE {
            return Err(CoreError::InvalidMode(i64::from(count)));
        }
        let modes = (1..=count).map(Mode::new).collect::<Result<Vec<_>>>()?;
        Ok(Self { modes })
    }

    /// Build from already-validated modes.
    pub fn new(modes: Vec<Mode>) -> Result<Self> {
        if modes.is_empty() {
            return Err(CoreError::EmptyModeSet);
        }
        for (i, mode) in modes.iter().enumerate() {
            if modes[..i].contains(mode) {
                return Err(CoreError::DuplicateMode(mode.get()));
            }
        }
        Ok(Self { modes })
    }

    /// Build from raw integers, rejecting non-positive and duplicate values.
    pub fn from_values(values: &[i64]) -> Result<Self> {
        let modes = values
            .iter()
            .map(|&v| Mode::try_from(v))
            .collect::<Result<Vec<_>>>()?;
        Self::new(modes)
    }

    /// Number of modes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    /// Always false; kept for API symmetry with collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Check whether a mode is part of the set.
    #[must_use]
    pub fn contains(&self, mode: Mode) -> bool {
        self.modes.contains(&mode)
    }

    /// Iterate over the modes in order.
    pub fn iter(&self) -> impl Iterator<Item = Mode> + '_ {
        self.modes.iter().copied()
    }

    /// Get the modes as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Mode] {
        &self.modes
    }
}

impl<'a> IntoIterator for &'a ModeSet {
    type Item = Mode;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Mode>>;

    fn into_iter(self) -> Self::IntoIter {
        self.modes.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_modes() {
        let modes = ModeSet::first(3).unwrap();
        let values: Vec<u32> = modes.iter().map(Mode::get).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_mode_set() {
        assert!(matches!(ModeSet::first(0), Err(CoreError::EmptyModeSet)));
        assert!(matches!(ModeSet::from_values(&[]), Err(CoreError::EmptyModeSet)));
    }

    #[test]
    fn test_invalid_modes() {
        assert!(matches!(ModeSet::from_values(&[1, 0]), Err(CoreError::InvalidMode(0))));
        assert!(matches!(ModeSet::from_values(&[-2]), Err(CoreError::InvalidMode(-2))));
        assert!(matches!(ModeSet::from_values(&[1, 2, 1]), Err(CoreError::DuplicateMode(1))));
    }

    #[test]
    fn test_mode_upper_bound() {
        assert!(matches!(ModeSet::first(4_000_000_000), Err(CoreError::InvalidMode(4_000_000_000))));
        assert!(matches!(ModeSet::from_values(&[1, 367]), Err(CoreError::InvalidMode(367))));
        assert!(matches!(Mode::new(MAX_MODE + 1), Err(CoreError::InvalidMode(_))));
        assert_eq!(ModeSet::first(MAX_MODE).unwrap().len(), MAX_MODE as usize);
    }

    #[test]
    fn test_explicit_order_kept() {
        let modes = ModeSet::from_values(&[4, 1, 2]).unwrap();
        let values: Vec<u32> = modes.iter().map(Mode::get).collect();
        assert_eq!(values, vec![4, 1, 2]);
    }

    #[test]
    fn test_mode_spec_serialization() {
        let spec = ModeSpec::Explicit(vec![1, 3]);
        let json = serde_json::to_string(&spec).unwrap();
        let restored: ModeSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, restored);
        assert_eq!(restored.resolve().unwrap().len(), 2);

        let count: ModeSpec = serde_json::from_str(r#"{"count": 2}"#).unwrap();
        assert_eq!(count, ModeSpec::Count(2));
    }

    #[test]
    fn test_mode_rejects_zero_on_deserialize() {
        assert!(serde_json::from_str::<Mode>("0").is_err());
        assert_eq!(serde_json::from_str::<Mode>("2").unwrap().get(), 2);
    }
}
