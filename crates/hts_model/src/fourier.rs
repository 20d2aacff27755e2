//! Phase and amplitude of the fitted harmonics, and the Fourier composite.
//!
//! [`FourierTransform`] wraps a [`HarmonicTimeSeries`] rather than extending
//! it. The derivation itself only reads a [`HarmonicFit`] through
//! [`FourierDeriver`].

use hts_core::{Band, BandName, Image, ImageCollection, Mode, ModeSet};
use ndarray::{Array1, Zip};
use serde::{Deserialize, Serialize};

use crate::config::HarmonicConfig;
use crate::error::{ModelError, Result};
use crate::pipeline::{HarmonicFit, HarmonicTimeSeries};
use crate::reduce::{unit_scale, Median, ScaleRange};
use crate::select::BandSelection;

/// Argument order of the phase arctangent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseConvention {
    /// `atan2(cos_coef, sin_coef)`: angle measured from the sine axis.
    #[default]
    CosSin,
    /// `atan2(sin_coef, cos_coef)`: the textbook phase of `A cos(ωt - φ)`.
    SinCos,
}

impl PhaseConvention {
    /// Phase of one pixel.
    #[must_use]
    pub fn phase(self, cos: f64, sin: f64) -> f64 {
        match self {
            Self::CosSin => cos.atan2(sin),
            Self::SinCos => sin.atan2(cos),
        }
    }
}

/// Derives per-mode phase and amplitude from fitted coefficients.
#[derive(Debug, Clone, Copy)]
pub struct FourierDeriver<'a> {
    fit: &'a HarmonicFit,
    convention: PhaseConvention,
}

impl<'a> FourierDeriver<'a> {
    /// Create a deriver over a fit.
    #[must_use]
    pub fn new(fit: &'a HarmonicFit, convention: PhaseConvention) -> Self {
        Self { fit, convention }
    }

    /// `phase_<m>` per pixel.
    pub fn phase(&self, mode: Mode) -> Result<Array1<f64>> {
        let (cos, sin) = self.fit.harmonic_pair(mode)?;
        let convention = self.convention;
        Ok(Zip::from(cos).and(sin).map_collect(|&c, &s| convention.phase(c, s)))
    }

    /// `amplitude_<m>` per pixel.
    pub fn amplitude(&self, mode: Mode) -> Result<Array1<f64>> {
        let (cos, sin) = self.fit.harmonic_pair(mode)?;
        Ok(Zip::from(cos).and(sin).map_collect(|&c, &s| c.hypot(s)))
    }

    /// Phase and amplitude bands for every mode of the fit, interleaved per mode.
    pub fn derive_all(&self) -> Result<Image> {
        let mut image = Image::empty(self.fit.image().n_pixels());
        for mode in self.fit.modes() {
            image.push(Band::new(BandName::Phase(mode), self.phase(mode)?))?;
            image.push(Band::new(BandName::Amplitude(mode), self.amplitude(mode)?))?;
        }
        Ok(image)
    }
}

/// Harmonic fit followed by phase/amplitude, temporal median and rescaling.
///
/// # Example
///
/// ```rust,ignore
/// use hts_core::ModeSet;
/// use hts_model::FourierTransform;
///
/// let composite = FourierTransform::new(collection, "ndvi", ModeSet::first(3)?)?.process()?;
/// for name in composite.band_names() {
///     println!("{name}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FourierTransform {
    series: HarmonicTimeSeries,
    convention: PhaseConvention,
    scale: ScaleRange,
    selection: BandSelection,
}

impl FourierTransform {
    /// Create a Fourier pipeline over `dataset`, modelling `dependent`.
    pub fn new(dataset: ImageCollection, dependent: &str, modes: ModeSet) -> Result<Self> {
        Ok(Self::from_series(HarmonicTimeSeries::new(dataset, dependent, modes)?))
    }

    /// Wrap an existing harmonic pipeline, fitted or not.
    #[must_use]
    pub fn from_series(series: HarmonicTimeSeries) -> Self {
        Self {
            series,
            convention: PhaseConvention::default(),
            scale: ScaleRange::default(),
            selection: BandSelection::default(),
        }
    }

    /// Create a Fourier pipeline from a configuration.
    pub fn from_config(dataset: ImageCollection, config: &HarmonicConfig) -> Result<Self> {
        let series = HarmonicTimeSeries::from_config(dataset, config)?;
        Ok(Self::from_series(series)
            .with_phase_convention(config.phase_convention)
            .with_scale_range(config.scale_range)
            .with_selection(config.selection.clone()))
    }

    /// Set the phase convention.
    #[must_use]
    pub fn with_phase_convention(mut self, convention: PhaseConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Set the rescaling range.
    #[must_use]
    pub fn with_scale_range(mut self, scale: ScaleRange) -> Self {
        self.scale = scale;
        self
    }

    /// Set the band-selection postfilter.
    #[must_use]
    pub fn with_selection(mut self, selection: BandSelection) -> Self {
        self.selection = selection;
        self
    }

    /// The wrapped harmonic pipeline.
    #[must_use]
    pub fn series(&self) -> &HarmonicTimeSeries {
        &self.series
    }

    /// Unwrap the harmonic pipeline.
    #[must_use]
    pub fn into_series(self) -> HarmonicTimeSeries {
        self.series
    }

    /// Run the harmonic fit (constant, time, harmonics, trend, coefficients).
    pub fn fit_harmonics(mut self) -> Result<Self> {
        self.series = self.series.process()?;
        Ok(self)
    }

    fn require_fit(&self, step: &'static str) -> Result<&HarmonicFit> {
        self.series.fit().ok_or_else(|| ModelError::MissingDependency {
            step,
            requires: "coefficients (call compute_coefficients first)".to_string(),
        })
    }

    /// Append `phase_<m>` to every observation.
    pub fn compute_phase(self, mode: Mode) -> Result<Self> {
        let fit = self.require_fit("compute_phase")?;
        let phase = FourierDeriver::new(fit, self.convention).phase(mode)?;
        let band = Band::new(BandName::Phase(mode), phase);
        self.broadcast(band)
    }

    /// Append `amplitude_<m>` to every observation.
    pub fn compute_amplitude(self, mode: Mode) -> Result<Self> {
        let fit = self.require_fit("compute_amplitude")?;
        let amplitude = FourierDeriver::new(fit, self.convention).amplitude(mode)?;
        let band = Band::new(BandName::Amplitude(mode), amplitude);
        self.broadcast(band)
    }

    fn broadcast(mut self, band: Band) -> Result<Self> {
        let image = Image::from_bands(vec![band])?;
        self.series = self.series.map_dataset(|dataset| dataset.add_bands(&image))?;
        Ok(self)
    }

    /// Temporal median of every band, rescaled per band to the scale range.
    ///
    /// The result has no time dimension.
    pub fn transform(&self) -> Result<Image> {
        self.scale.validate()?;
        let composite = self.series.dataset().reduce(&Median)?;
        Ok(unit_scale(composite, self.scale))
    }

    /// Fit, derive phase and amplitude for every mode, reduce, rescale and
    /// apply the band selection.
    pub fn process(self) -> Result<Image> {
        let mut this = if self.series.fit().is_some() {
            self
        } else {
            self.fit_harmonics()?
        };
        let modes = this.series.modes().clone();
        for mode in &modes {
            this = this.compute_phase(mode)?.compute_amplitude(mode)?;
        }
        let composite = this.transform()?;
        let selected = this.selection.apply(&composite, this.series.dependent());
        tracing::info!(
            n_bands = selected.n_bands(),
            n_pixels = selected.n_pixels(),
            "built Fourier composite"
        );
        Ok(selected)
    }
}
