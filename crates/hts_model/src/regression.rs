//! Per-pixel ordinary least squares over a pooled collection.
//!
//! Every observation contributes one row of the design matrix. Each pixel is
//! fitted independently from the observations where its dependent value and
//! all of its design values are unmasked.

use hts_core::{Band, BandName, Image, ImageCollection, Reducer, Term};
use nalgebra::{DMatrix, DVector, SVD};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;

use crate::error::{ModelError, Result};

/// Linear regression of a dependent band against a list of term bands.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    dependent: BandName,
    terms: Vec<Term>,
}

impl LinearRegression {
    /// Create a regression reducer.
    #[must_use]
    pub fn new(dependent: BandName, terms: Vec<Term>) -> Self {
        Self { dependent, terms }
    }

    /// Independent variables in coefficient order.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }
}

/// Result of fitting one pixel.
struct PixelFit {
    coefficients: Option<Vec<f64>>,
    rmse: f64,
    n_valid: usize,
}

impl PixelFit {
    fn masked(n_valid: usize) -> Self {
        Self {
            coefficients: None,
            rmse: f64::NAN,
            n_valid,
        }
    }
}

impl Reducer for LinearRegression {
    type Output = Trend;
    type Error = ModelError;

    fn reduce(&self, collection: &ImageCollection) -> Result<Trend> {
        let n_terms = self.terms.len();
        if n_terms == 0 {
            return Err(ModelError::MissingDependency {
                step: "compute_trend",
                requires: "at least one independent variable".to_string(),
            });
        }
        if collection.len() < n_terms {
            return Err(ModelError::UnderDetermined {
                observations: collection.len(),
                terms: n_terms,
            });
        }

        let term_names: Vec<BandName> = self.terms.iter().copied().map(BandName::Term).collect();
        let rows = collection
            .iter()
            .map(|obs| {
                let image = obs.image();
                let y = image.values(&self.dependent)?;
                let xs = term_names
                    .iter()
                    .map(|name| image.values(name))
                    .collect::<hts_core::Result<Vec<_>>>()?;
                Ok((y, xs))
            })
            .collect::<Result<Vec<_>>>()?;

        let n_pixels = collection.n_pixels();
        let fits: Vec<PixelFit> = (0..n_pixels)
            .into_par_iter()
            .map(|px| fit_pixel(&rows, px, n_terms))
            .collect();

        let degenerate = fits.iter().filter(|f| f.coefficients.is_none()).count();
        if degenerate > 0 {
            tracing::warn!(
                degenerate,
                n_pixels,
                "pixels have too few valid observations or a rank-deficient design; coefficients masked"
            );
        }

        let coefficients = Array2::from_shape_fn((n_pixels, n_terms), |(px, k)| {
            fits[px].coefficients.as_ref().map_or(f64::NAN, |c| c[k])
        });
        let rmse = fits.iter().map(|f| f.rmse).collect::<Array1<f64>>();
        let n_valid = fits.iter().map(|f| f.n_valid).collect();

        tracing::info!(
            observations = collection.len(),
            terms = n_terms,
            n_pixels,
            "fitted harmonic regression"
        );

        Ok(Trend {
            terms: self.terms.clone(),
            coefficients,
            rmse,
            n_valid,
        })
    }
}

fn fit_pixel(rows: &[(&Array1<f64>, Vec<&Array1<f64>>)], px: usize, n_terms: usize) -> PixelFit {
    let valid: Vec<(f64, Vec<f64>)> = rows
        .iter()
        .filter_map(|(y, xs)| {
            let y = y[px];
            let x: Vec<f64> = xs.iter().map(|band| band[px]).collect();
            (y.is_finite() && x.iter().all(|v| v.is_finite())).then_some((y, x))
        })
        .collect();

    let n_valid = valid.len();
    if n_valid < n_terms {
        return PixelFit::masked(n_valid);
    }

    let design = DMatrix::from_fn(n_valid, n_terms, |i, j| valid[i].1[j]);
    let target = DVector::from_iterator(n_valid, valid.iter().map(|(y, _)| *y));

    let svd = SVD::new(design.clone(), true, true);
    let max_sv = svd.singular_values.iter().copied().fold(0.0, f64::max);
    let eps = max_sv * n_valid.max(n_terms) as f64 * f64::EPSILON;
    if max_sv == 0.0 || svd.rank(eps) < n_terms {
        return PixelFit::masked(n_valid);
    }

    let Ok(beta) = svd.solve(&target, eps) else {
        return PixelFit::masked(n_valid);
    };
    if !beta.iter().all(|b| b.is_finite()) {
        return PixelFit::masked(n_valid);
    }
    let residuals = &target - &design * &beta;
    let rmse = (residuals.norm_squared() / n_valid as f64).sqrt();

    PixelFit {
        coefficients: Some(beta.iter().copied().collect()),
        rmse,
        n_valid,
    }
}

/// Per-pixel regression output.
#[derive(Debug, Clone)]
pub struct Trend {
    terms: Vec<Term>,
    /// `(n_pixels, n_terms)`, `NaN` where the pixel could not be fitted.
    coefficients: Array2<f64>,
    rmse: Array1<f64>,
    n_valid: Vec<usize>,
}

impl Trend {
    /// Independent variables in coefficient order.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Coefficient matrix of shape `(n_pixels, n_terms)`.
    #[must_use]
    pub fn coefficients(&self) -> &Array2<f64> {
        &self.coefficients
    }

    /// Coefficients of one term across pixels.
    #[must_use]
    pub fn coefficient(&self, term: Term) -> Option<ArrayView1<'_, f64>> {
        let k = self.terms.iter().position(|&t| t == term)?;
        Some(self.coefficients.index_axis(Axis(1), k))
    }

    /// Root-mean-square residual per pixel.
    #[must_use]
    pub fn rmse(&self) -> &Array1<f64> {
        &self.rmse
    }

    /// Number of observations used for each pixel.
    #[must_use]
    pub fn n_valid(&self) -> &[usize] {
        &self.n_valid
    }

    /// Number of pixels whose coefficients are masked.
    #[must_use]
    pub fn n_degenerate(&self) -> usize {
        self.coefficients
            .axis_iter(Axis(0))
            .filter(|row| row.iter().any(|v| v.is_nan()))
            .count()
    }

    /// Flatten into one `<term>_coef` band per term, in term order.
    pub fn coefficient_image(&self) -> Result<Image> {
        let bands = self
            .terms
            .iter()
            .zip(self.coefficients.axis_iter(Axis(1)))
            .map(|(&term, column)| Band::new(BandName::Coefficient(term), column.to_owned()))
            .collect();
        let image = Image::from_bands(bands)?;
        debug_assert_eq!(image.n_bands(), self.terms.len());
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use hts_core::{Mode, ModeSet, Observation};
    use ndarray::array;

    use crate::design::{AddConstant, AddHarmonics, AddTime};

    fn ndvi() -> BandName {
        BandName::input("ndvi")
    }

    /// Two pixels: pixel 0 follows `2 + 3cos(t) + 4sin(t)`, pixel 1 `-1 + 0.5sin(t)`.
    fn collection(n: usize) -> ImageCollection {
        let start = Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap();
        let observations = (0..n)
            .map(|i| {
                let ts = start + Duration::days(17 * i as i64);
                let t = hts_core::angular_time(ts);
                let values = array![2.0 + 3.0 * t.cos() + 4.0 * t.sin(), -1.0 + 0.5 * t.sin()];
                Observation::new(ts, Image::from_bands(vec![Band::new(ndvi(), values)]).unwrap())
            })
            .collect();
        ImageCollection::new(observations)
            .unwrap()
            .map(&AddConstant)
            .unwrap()
            .map(&AddTime)
            .unwrap()
            .map(&AddHarmonics::new(ModeSet::first(1).unwrap()))
            .unwrap()
    }

    fn terms() -> Vec<Term> {
        let one = Mode::new(1).unwrap();
        vec![Term::Constant, Term::Cos(one), Term::Sin(one)]
    }

    #[test]
    fn test_recovers_exact_coefficients() {
        let trend = LinearRegression::new(ndvi(), terms()).reduce(&collection(40)).unwrap();
        let one = Mode::new(1).unwrap();

        assert!((trend.coefficient(Term::Constant).unwrap()[0] - 2.0).abs() < 1e-6);
        assert!((trend.coefficient(Term::Cos(one)).unwrap()[0] - 3.0).abs() < 1e-6);
        assert!((trend.coefficient(Term::Sin(one)).unwrap()[0] - 4.0).abs() < 1e-6);

        assert!((trend.coefficient(Term::Constant).unwrap()[1] + 1.0).abs() < 1e-6);
        assert!(trend.coefficient(Term::Cos(one)).unwrap()[1].abs() < 1e-6);
        assert!(trend.rmse()[0] < 1e-9);
        assert_eq!(trend.n_valid(), &[40, 40]);
        assert_eq!(trend.n_degenerate(), 0);
    }

    #[test]
    fn test_under_determined() {
        let err = LinearRegression::new(ndvi(), terms()).reduce(&collection(2)).unwrap_err();
        assert!(matches!(err, ModelError::UnderDetermined { observations: 2, terms: 3 }));
    }

    #[test]
    fn test_no_terms() {
        let err = LinearRegression::new(ndvi(), vec![]).reduce(&collection(5)).unwrap_err();
        assert!(matches!(err, ModelError::MissingDependency { .. }));
    }

    #[test]
    fn test_masked_pixel_yields_nan() {
        let collection = collection(10)
            .map_fn(|obs| {
                let mut values = obs.image().values(&ndvi())?.clone();
                values[1] = f64::NAN;
                let image = obs.image().select_where(|n| n != &ndvi()).add_band(Band::new(ndvi(), values))?;
                Ok(obs.with_image(image))
            })
            .unwrap();

        let trend = LinearRegression::new(ndvi(), terms()).reduce(&collection).unwrap();
        assert!(trend.coefficient(Term::Constant).unwrap()[1].is_nan());
        assert!((trend.coefficient(Term::Constant).unwrap()[0] - 2.0).abs() < 1e-6);
        assert_eq!(trend.n_valid()[1], 0);
        assert_eq!(trend.n_degenerate(), 1);
    }

    #[test]
    fn test_rank_deficient_design_is_masked() {
        // the same column twice
        let trend = LinearRegression::new(ndvi(), vec![Term::Constant, Term::Constant])
            .reduce(&collection(10))
            .unwrap();
        assert_eq!(trend.n_degenerate(), 2);
        assert!(trend.rmse()[0].is_nan());
    }

    #[test]
    fn test_coefficient_image_names() {
        let trend = LinearRegression::new(ndvi(), terms()).reduce(&collection(12)).unwrap();
        let image = trend.coefficient_image().unwrap();
        let names: Vec<String> = image.band_names().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["constant_coef", "cos_1_coef", "sin_1_coef"]);
    }
}
