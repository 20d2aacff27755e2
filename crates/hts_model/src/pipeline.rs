//! The harmonic time series pipeline.
//!
//! [`HarmonicTimeSeries`] is a consuming builder: each step takes the
//! pipeline by value and returns the updated pipeline, so the collection and
//! its independent-variable list can never be aliased between steps.
//!
//! ```text
//! collection ─► add_constant ─► add_time ─► add_harmonics ─► compute_trend ─► compute_coefficients
//! ```

use hts_core::{Band, BandKind, BandName, CoreError, Image, ImageCollection, Mode, ModeSet, Term, Transform};
use ndarray::Array1;

use crate::config::HarmonicConfig;
use crate::design::{design_transform, harmonic_terms, AddConstant, AddHarmonics, AddTime};
use crate::error::{ModelError, Result};
use crate::regression::{LinearRegression, Trend};

/// Fitted coefficients of a harmonic model.
///
/// This is everything the Fourier stage needs: one `<term>_coef` band per
/// independent variable, in term order.
#[derive(Debug, Clone)]
pub struct HarmonicFit {
    terms: Vec<Term>,
    modes: ModeSet,
    coefficients: Image,
    rmse: Array1<f64>,
}

impl HarmonicFit {
    fn from_trend(trend: &Trend, modes: ModeSet) -> Result<Self> {
        let coefficients = trend.coefficient_image()?;
        debug_assert_eq!(coefficients.n_bands(), trend.terms().len());
        Ok(Self {
            terms: trend.terms().to_vec(),
            modes,
            coefficients,
            rmse: trend.rmse().clone(),
        })
    }

    /// Independent variables in coefficient order.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Modes the model was built with.
    #[must_use]
    pub fn modes(&self) -> &ModeSet {
        &self.modes
    }

    /// The coefficient bands.
    #[must_use]
    pub fn image(&self) -> &Image {
        &self.coefficients
    }

    /// Root-mean-square residual per pixel.
    #[must_use]
    pub fn rmse(&self) -> &Array1<f64> {
        &self.rmse
    }

    /// Coefficients of one term across pixels.
    pub fn coefficient(&self, term: Term) -> Result<&Array1<f64>> {
        Ok(self.coefficients.values(&BandName::Coefficient(term))?)
    }

    /// The `(cos_m_coef, sin_m_coef)` pair of one mode.
    pub fn harmonic_pair(&self, mode: Mode) -> Result<(&Array1<f64>, &Array1<f64>)> {
        if !self.modes.contains(mode) {
            return Err(ModelError::UnknownMode(mode.get()));
        }
        Ok((self.coefficient(Term::Cos(mode))?, self.coefficient(Term::Sin(mode))?))
    }

    /// Evaluate the model for one observation's design bands.
    ///
    /// Every term of the fit must be present in `design`.
    pub fn predict(&self, design: &Image) -> Result<Array1<f64>> {
        Ok(self.evaluate(design)?)
    }

    fn evaluate(&self, design: &Image) -> hts_core::Result<Array1<f64>> {
        let mut fitted = Array1::zeros(design.n_pixels());
        for &term in &self.terms {
            let x = design.values(&BandName::Term(term))?;
            fitted = fitted + self.coefficients.values(&BandName::Coefficient(term))? * x;
        }
        Ok(fitted)
    }

    /// Evaluate the model at the timestamps of another collection.
    ///
    /// The result has the same timestamps and a single `fitted` band; the
    /// input bands are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the pixel count differs from the fit.
    pub fn predict_collection(&self, collection: ImageCollection) -> Result<ImageCollection> {
        let n_pixels = self.coefficients.n_pixels();
        if collection.n_pixels() != n_pixels {
            return Err(CoreError::PixelCountMismatch {
                expected: n_pixels,
                got: collection.n_pixels(),
            }
            .into());
        }
        let design = design_transform(&self.terms)?;
        let predicted = collection.map_fn(|obs| {
            let obs = design.apply(obs.with_image(Image::empty(n_pixels)))?;
            let fitted = self.evaluate(obs.image())?;
            Ok(obs.with_image(Image::from_bands(vec![Band::new(BandName::Fitted, fitted)])?))
        })?;
        tracing::debug!(observations = predicted.len(), "predicted collection");
        Ok(predicted)
    }
}

/// Builds the design matrix and fits a per-pixel harmonic regression.
///
/// # Example
///
/// ```rust,ignore
/// use hts_core::ModeSet;
/// use hts_model::HarmonicTimeSeries;
///
/// let series = HarmonicTimeSeries::new(collection, "ndvi", ModeSet::first(3)?)?
///     .process()?;
/// let fit = series.fit().expect("coefficients computed");
/// ```
#[derive(Debug, Clone)]
pub struct HarmonicTimeSeries {
    dataset: ImageCollection,
    dependent: BandName,
    modes: ModeSet,
    include_constant: bool,
    independents: Vec<Term>,
    trend: Option<Trend>,
    fit: Option<HarmonicFit>,
}

impl HarmonicTimeSeries {
    /// Create a pipeline over `dataset`, modelling `dependent`.
    ///
    /// Only the dependent band is kept from the input collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the dependent name collides with a generated band
    /// name or is missing from any observation.
    pub fn new(dataset: ImageCollection, dependent: &str, modes: ModeSet) -> Result<Self> {
        let dependent = parse_dependent(dependent)?;
        if !dataset.has_band(&dependent) {
            return Err(ModelError::UnknownDependent(dependent.to_string()));
        }
        let dataset = dataset.select(std::slice::from_ref(&dependent))?;
        tracing::debug!(
            dependent = %dependent,
            observations = dataset.len(),
            n_pixels = dataset.n_pixels(),
            modes = modes.len(),
            "created harmonic time series"
        );
        Ok(Self {
            dataset,
            dependent,
            modes,
            include_constant: true,
            independents: Vec::new(),
            trend: None,
            fit: None,
        })
    }

    /// Create a pipeline from a configuration.
    pub fn from_config(dataset: ImageCollection, config: &HarmonicConfig) -> Result<Self> {
        config.validate()?;
        let modes = config.modes.resolve()?;
        Ok(Self::new(dataset, &config.dependent_variable, modes)?.with_constant(config.include_constant))
    }

    /// Whether [`process`](Self::process) adds the constant term.
    #[must_use]
    pub fn with_constant(mut self, include: bool) -> Self {
        self.include_constant = include;
        self
    }

    /// The current collection.
    #[must_use]
    pub fn dataset(&self) -> &ImageCollection {
        &self.dataset
    }

    /// Take the collection out of the pipeline.
    #[must_use]
    pub fn into_dataset(self) -> ImageCollection {
        self.dataset
    }

    /// The dependent band.
    #[must_use]
    pub fn dependent(&self) -> &BandName {
        &self.dependent
    }

    /// The configured modes.
    #[must_use]
    pub fn modes(&self) -> &ModeSet {
        &self.modes
    }

    /// Registered independent variables, in coefficient order.
    #[must_use]
    pub fn independents(&self) -> &[Term] {
        &self.independents
    }

    /// The regression output, once [`compute_trend`](Self::compute_trend) ran.
    #[must_use]
    pub fn trend(&self) -> Option<&Trend> {
        self.trend.as_ref()
    }

    /// The fitted coefficients, once [`compute_coefficients`](Self::compute_coefficients) ran.
    #[must_use]
    pub fn fit(&self) -> Option<&HarmonicFit> {
        self.fit.as_ref()
    }

    /// Append the `constant` band and register it.
    pub fn add_constant(self) -> Result<Self> {
        self.add_terms("add_constant", vec![Term::Constant], &AddConstant)
    }

    /// Append the angular time band `t` and register it.
    pub fn add_time(self) -> Result<Self> {
        self.add_terms("add_time", vec![Term::Time], &AddTime)
    }

    /// Append `cos_<m>` / `sin_<m>` for every mode and register them.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingDependency`] if [`add_time`](Self::add_time)
    /// has not run.
    pub fn add_harmonics(self) -> Result<Self> {
        if !self.independents.contains(&Term::Time) {
            return Err(ModelError::MissingDependency {
                step: "add_harmonics",
                requires: "the time band 't' (call add_time first)".to_string(),
            });
        }
        let terms = harmonic_terms(&self.modes);
        let transform = AddHarmonics::new(self.modes.clone());
        self.add_terms("add_harmonics", terms, &transform)
    }

    fn add_terms<T: hts_core::Transform>(mut self, step: &'static str, terms: Vec<Term>, transform: &T) -> Result<Self> {
        if self.fit.is_some() {
            return Err(ModelError::AlreadyFitted(step));
        }
        if let Some(dup) = terms.iter().find(|t| self.independents.contains(*t)) {
            return Err(ModelError::DuplicateTerm(dup.to_string()));
        }
        if self.trend.take().is_some() {
            tracing::debug!(step, "design changed, discarding previous trend");
        }
        self.dataset = self.dataset.map(transform)?;
        self.independents.extend(terms);
        tracing::debug!(step, n_terms = self.independents.len(), "added design bands");
        Ok(self)
    }

    /// Fit the dependent band against the registered independent variables.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnderDetermined`] if there are fewer observations
    /// than independent variables.
    pub fn compute_trend(mut self) -> Result<Self> {
        if self.fit.is_some() {
            return Err(ModelError::AlreadyFitted("compute_trend"));
        }
        let regression = LinearRegression::new(self.dependent.clone(), self.independents.clone());
        let trend = self.dataset.reduce(&regression)?;
        debug_assert_eq!(trend.terms().len(), self.independents.len());
        self.trend = Some(trend);
        Ok(self)
    }

    /// Flatten the trend into `<term>_coef` bands and broadcast them onto
    /// every observation.
    pub fn compute_coefficients(mut self) -> Result<Self> {
        if self.fit.is_some() {
            return Err(ModelError::AlreadyFitted("compute_coefficients"));
        }
        let trend = self.trend.as_ref().ok_or_else(|| ModelError::MissingDependency {
            step: "compute_coefficients",
            requires: "a trend (call compute_trend first)".to_string(),
        })?;
        let fit = HarmonicFit::from_trend(trend, self.modes.clone())?;
        self.dataset = self.dataset.add_bands(fit.image())?;
        tracing::debug!(n_coefficients = fit.image().n_bands(), "broadcast coefficients");
        self.fit = Some(fit);
        Ok(self)
    }

    /// Append the `fitted` band: the model evaluated at every observation.
    pub fn compute_fitted(self) -> Result<Self> {
        let fit = self.fit.clone().ok_or_else(|| ModelError::MissingDependency {
            step: "compute_fitted",
            requires: "coefficients (call compute_coefficients first)".to_string(),
        })?;
        self.map_dataset(|dataset| {
            dataset.map_fn(|obs| {
                let fitted = fit.evaluate(obs.image())?;
                obs.add_band(Band::new(BandName::Fitted, fitted))
            })
        })
    }

    /// Run constant (if enabled), time, harmonics, trend and coefficients.
    pub fn process(self) -> Result<Self> {
        let include_constant = self.include_constant;
        let series = if include_constant { self.add_constant()? } else { self };
        series
            .add_time()?
            .add_harmonics()?
            .compute_trend()?
            .compute_coefficients()
    }

    /// Replace the collection through a fallible function.
    pub(crate) fn map_dataset<F>(mut self, f: F) -> Result<Self>
    where
        F: FnOnce(ImageCollection) -> hts_core::Result<ImageCollection>,
    {
        self.dataset = f(self.dataset)?;
        Ok(self)
    }
}

fn parse_dependent(name: &str) -> Result<BandName> {
    let parsed: BandName = name.parse()?;
    if parsed.kind() != BandKind::Input {
        return Err(ModelError::InvalidConfig(format!(
            "dependent variable '{name}' collides with a generated band name"
        )));
    }
    Ok(parsed)
}
