//! Typed band names.
//!
//! Every band the pipeline generates has a structured name: the regression
//! terms (`constant`, `t`, `cos_<m>`, `sin_<m>`), their fitted coefficients
//! (`<term>_coef`), the derived `phase_<m>` / `amplitude_<m>` bands and the
//! `fitted` reconstruction. Raw input bands such as `ndvi` are kept as
//! [`BandName::Input`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::mode::Mode;

/// An independent variable of the harmonic regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    /// Intercept band of ones.
    Constant,
    /// Angular time in radians (`2π` per year since 1970).
    Time,
    /// `cos(t * mode)`.
    Cos(Mode),
    /// `sin(t * mode)`.
    Sin(Mode),
}

impl Term {
    /// The mode of a harmonic term.
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Self::Cos(m) | Self::Sin(m) => Some(*m),
            Self::Constant | Self::Time => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant => f.write_str("constant"),
            Self::Time => f.write_str("t"),
            Self::Cos(m) => write!(f, "cos_{m}"),
            Self::Sin(m) => write!(f, "sin_{m}"),
        }
    }
}

impl FromStr for Term {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "constant" => Ok(Self::Constant),
            "t" => Ok(Self::Time),
            _ => {
                if let Some(m) = s.strip_prefix("cos_") {
                    Ok(Self::Cos(parse_mode(m, s)?))
                } else if let Some(m) = s.strip_prefix("sin_") {
                    Ok(Self::Sin(parse_mode(m, s)?))
                } else {
                    Err(CoreError::Parse(format!("'{s}' is not a regression term")))
                }
            }
        }
    }
}

fn parse_mode(digits: &str, whole: &str) -> Result<Mode> {
    let value: u32 = digits
        .parse()
        .map_err(|_| CoreError::Parse(format!("invalid mode in '{whole}'")))?;
    Mode::new(value)
}

/// Broad category of a band, used for band selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandKind {
    /// A raw input band such as the dependent variable.
    Input,
    /// The constant or time term.
    Design,
    /// A `cos_<m>` or `sin_<m>` band.
    Harmonic,
    /// A fitted `<term>_coef` band.
    Coefficient,
    /// A `phase_<m>` band.
    Phase,
    /// An `amplitude_<m>` band.
    Amplitude,
    /// Values reconstructed from the fitted model.
    Fitted,
}

/// The name of a band within an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BandName {
    /// A band supplied by the caller.
    Input(String),
    /// A regression term.
    Term(Term),
    /// The fitted coefficient of a regression term.
    Coefficient(Term),
    /// Phase derived from the coefficients of one mode.
    Phase(Mode),
    /// Amplitude derived from the coefficients of one mode.
    Amplitude(Mode),
    /// The model evaluated at each observation's time.
    Fitted,
}

impl BandName {
    /// Name a raw input band.
    pub fn input(name: impl Into<String>) -> Self {
        Self::Input(name.into())
    }

    /// Band category.
    #[must_use]
    pub fn kind(&self) -> BandKind {
        match self {
            Self::Input(_) => BandKind::Input,
            Self::Term(Term::Constant | Term::Time) => BandKind::Design,
            Self::Term(Term::Cos(_) | Term::Sin(_)) => BandKind::Harmonic,
            Self::Coefficient(_) => BandKind::Coefficient,
            Self::Phase(_) => BandKind::Phase,
            Self::Amplitude(_) => BandKind::Amplitude,
            Self::Fitted => BandKind::Fitted,
        }
    }
}

impl From<Term> for BandName {
    fn from(term: Term) -> Self {
        Self::Term(term)
    }
}

impl fmt::Display for BandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(name) => f.write_str(name),
            Self::Term(term) => write!(f, "{term}"),
            Self::Coefficient(term) => write!(f, "{term}_coef"),
            Self::Phase(m) => write!(f, "phase_{m}"),
            Self::Amplitude(m) => write!(f, "amplitude_{m}"),
            Self::Fitted => f.write_str("fitted"),
        }
    }
}

impl FromStr for BandName {
    type Err = CoreError;

    /// Parse a band name. Names that do not match a generated pattern are
    /// treated as input bands; an empty name is an error.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(CoreError::Parse("empty band name".to_string()));
        }
        if s == "fitted" {
            return Ok(Self::Fitted);
        }
        if let Ok(term) = s.parse::<Term>() {
            return Ok(Self::Term(term));
        }
        if let Some(term) = s.strip_suffix("_coef").and_then(|t| t.parse::<Term>().ok()) {
            return Ok(Self::Coefficient(term));
        }
        if let Some(mode) = s.strip_prefix("phase_").and_then(|m| parse_mode(m, s).ok()) {
            return Ok(Self::Phase(mode));
        }
        if let Some(mode) = s.strip_prefix("amplitude_").and_then(|m| parse_mode(m, s).ok()) {
            return Ok(Self::Amplitude(mode));
        }
        Ok(Self::Input(s.to_string()))
    }
}

impl Serialize for BandName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BandName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
