//! Configuration for harmonic and Fourier models.

use std::path::Path;

use hts_core::{BandKind, BandName, ModeSpec};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::fourier::PhaseConvention;
use crate::reduce::ScaleRange;
use crate::select::BandSelection;

/// Configuration for [`HarmonicTimeSeries`](crate::HarmonicTimeSeries) and
/// [`FourierTransform`](crate::FourierTransform).
///
/// # Example
///
/// ```rust
/// use hts_core::ModeSpec;
/// use hts_model::HarmonicConfig;
///
/// let config = HarmonicConfig::new("evi").with_modes(ModeSpec::Explicit(vec![1, 2, 4]));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonicConfig {
    /// Name of the band to model.
    pub dependent_variable: String,
    /// Harmonic modes to fit.
    pub modes: ModeSpec,
    /// Whether to include the constant term.
    pub include_constant: bool,
    /// Argument order of the phase arctangent.
    pub phase_convention: PhaseConvention,
    /// Target range of the final rescaling.
    pub scale_range: ScaleRange,
    /// Bands kept in the final composite.
    pub selection: BandSelection,
}

impl Default for HarmonicConfig {
    fn default() -> Self {
        Self {
            dependent_variable: "ndvi".to_string(),
            modes: ModeSpec::default(),
            include_constant: true,
            phase_convention: PhaseConvention::default(),
            scale_range: ScaleRange::default(),
            selection: BandSelection::default(),
        }
    }
}

impl HarmonicConfig {
    /// Create a configuration for a dependent variable with default settings.
    #[must_use]
    pub fn new(dependent_variable: impl Into<String>) -> Self {
        Self {
            dependent_variable: dependent_variable.into(),
            ..Default::default()
        }
    }

    /// Set the modes.
    #[must_use]
    pub fn with_modes(mut self, modes: ModeSpec) -> Self {
        self.modes = modes;
        self
    }

    /// Include or drop the constant term.
    #[must_use]
    pub fn with_constant(mut self, include: bool) -> Self {
        self.include_constant = include;
        self
    }

    /// Set the phase convention.
    #[must_use]
    pub fn with_phase_convention(mut self, convention: PhaseConvention) -> Self {
        self.phase_convention = convention;
        self
    }

    /// Set the rescaling range.
    #[must_use]
    pub fn with_scale_range(mut self, scale_range: ScaleRange) -> Self {
        self.scale_range = scale_range;
        self
    }

    /// Set the band selection.
    #[must_use]
    pub fn with_selection(mut self, selection: BandSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Check every field.
    pub fn validate(&self) -> Result<()> {
        if self.dependent_variable.is_empty() {
            return Err(ModelError::InvalidConfig("dependent_variable must not be empty".to_string()));
        }
        let dependent: BandName = self.dependent_variable.parse()?;
        if dependent.kind() != BandKind::Input {
            return Err(ModelError::InvalidConfig(format!(
                "dependent variable '{}' collides with a generated band name",
                self.dependent_variable
            )));
        }
        self.modes.resolve()?;
        self.scale_range.validate()?;
        Ok(())
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ModelError::InvalidConfig(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
