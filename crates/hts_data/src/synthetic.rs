//! Synthetic image collections with a known harmonic model.
//!
//! Values follow
//!
//! ```text
//! y(t) = offset + trend·t + Σ_m (cos_m·cos(m·t) + sin_m·sin(m·t)) + noise
//! ```
//!
//! where `t` is angular time, so a noise-free series is fitted exactly by the
//! harmonic regression.

use chrono::{DateTime, Duration, TimeZone, Utc};
use hts_core::{Band, BandName, Image, ImageCollection, Mode, Observation, Seed};
use ndarray::Array1;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::error::{DataError, Result};

/// Builder for a synthetic collection.
///
/// # Example
///
/// ```rust
/// use hts_data::SyntheticSeries;
///
/// let collection = SyntheticSeries::new("ndvi")
///     .with_observations(30)
///     .with_offset(0.4)
///     .with_harmonic(1, 0.2, -0.1)
///     .generate()
///     .unwrap();
/// assert_eq!(collection.len(), 30);
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticSeries {
    band: String,
    n_observations: usize,
    n_pixels: usize,
    start: DateTime<Utc>,
    step_days: i64,
    offset: f64,
    trend: f64,
    harmonics: Vec<(u32, f64, f64)>,
    noise_std: f64,
    mask_fraction: f64,
    seed: Seed,
}

impl SyntheticSeries {
    /// Create a generator for one band with no signal.
    ///
    /// Defaults: 46 observations eight days apart from 2018-01-01, one pixel,
    /// no noise and no masking.
    #[must_use]
    pub fn new(band: impl Into<String>) -> Self {
        Self {
            band: band.into(),
            n_observations: 46,
            n_pixels: 1,
            start: Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).single().unwrap_or_default(),
            step_days: 8,
            offset: 0.0,
            trend: 0.0,
            harmonics: Vec::new(),
            noise_std: 0.0,
            mask_fraction: 0.0,
            seed: Seed::default(),
        }
    }

    /// Set the number of observations.
    #[must_use]
    pub fn with_observations(mut self, n: usize) -> Self {
        self.n_observations = n;
        self
    }

    /// Set the number of pixels.
    #[must_use]
    pub fn with_pixels(mut self, n: usize) -> Self {
        self.n_pixels = n;
        self
    }

    /// Set the first timestamp.
    #[must_use]
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    /// Set the spacing between observations.
    #[must_use]
    pub fn with_step_days(mut self, days: i64) -> Self {
        self.step_days = days;
        self
    }

    /// Set the constant offset.
    #[must_use]
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Set the slope per radian of angular time.
    #[must_use]
    pub fn with_trend(mut self, trend: f64) -> Self {
        self.trend = trend;
        self
    }

    /// Add a harmonic with the given cosine and sine amplitudes.
    #[must_use]
    pub fn with_harmonic(mut self, mode: u32, cos: f64, sin: f64) -> Self {
        self.harmonics.push((mode, cos, sin));
        self
    }

    /// Add zero-mean Gaussian noise with the given standard deviation.
    #[must_use]
    pub fn with_noise(mut self, std: f64) -> Self {
        self.noise_std = std;
        self
    }

    /// Mask (set to `NaN`) roughly this fraction of pixel values.
    #[must_use]
    pub fn with_mask_fraction(mut self, fraction: f64) -> Self {
        self.mask_fraction = fraction;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    /// The noise-free model value at a timestamp.
    #[must_use]
    pub fn signal(&self, timestamp: DateTime<Utc>) -> f64 {
        let t = hts_core::angular_time(timestamp);
        self.harmonics
            .iter()
            .fold(self.offset + self.trend * t, |acc, &(mode, cos, sin)| {
                let mt = f64::from(mode) * t;
                acc + cos * mt.cos() + sin * mt.sin()
            })
    }

    fn validate(&self) -> Result<()> {
        if self.n_observations == 0 || self.n_pixels == 0 {
            return Err(DataError::InvalidInput(
                "at least one observation and one pixel are required".to_string(),
            ));
        }
        if self.step_days <= 0 {
            return Err(DataError::InvalidInput(format!(
                "step_days must be positive, got {}",
                self.step_days
            )));
        }
        if !(0.0..1.0).contains(&self.mask_fraction) {
            return Err(DataError::InvalidInput(format!(
                "mask_fraction must be in [0, 1), got {}",
                self.mask_fraction
            )));
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(DataError::InvalidInput(format!(
                "noise std must be non-negative, got {}",
                self.noise_std
            )));
        }
        for &(mode, _, _) in &self.harmonics {
            Mode::new(mode)?;
        }
        Ok(())
    }

    /// Generate the collection.
    pub fn generate(&self) -> Result<ImageCollection> {
        self.validate()?;
        let name: BandName = self.band.parse()?;
        let mut noise_rng = self.seed.derive("noise").to_rng();
        let mut mask_rng = self.seed.derive("mask").to_rng();

        let observations = (0..self.n_observations)
            .map(|i| {
                let timestamp = self.start + Duration::days(self.step_days * i as i64);
                let signal = self.signal(timestamp);
                let values = (0..self.n_pixels)
                    .map(|_| {
                        let noise = if self.noise_std > 0.0 {
                            self.noise_std * standard_normal(&mut noise_rng)
                        } else {
                            0.0
                        };
                        let masked = self.mask_fraction > 0.0 && mask_rng.gen::<f64>() < self.mask_fraction;
                        if masked {
                            f64::NAN
                        } else {
                            signal + noise
                        }
                    })
                    .collect::<Array1<f64>>();
                let image = Image::from_bands(vec![Band::new(name.clone(), values)])?;
                Ok(Observation::new(timestamp, image))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            band = %self.band,
            observations = self.n_observations,
            n_pixels = self.n_pixels,
            harmonics = self.harmonics.len(),
            "generated synthetic collection"
        );
        Ok(ImageCollection::new(observations)?)
    }
}

/// Box-Muller sample from N(0, 1).
fn standard_normal(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_free_signal() {
        let series = SyntheticSeries::new("ndvi")
            .with_observations(10)
            .with_pixels(3)
            .with_offset(2.0)
            .with_harmonic(1, 3.0, 4.0);
        let collection = series.generate().unwrap();
        assert_eq!(collection.len(), 10);
        assert_eq!(collection.n_pixels(), 3);

        for obs in &collection {
            let t = hts_core::angular_time(obs.timestamp());
            let expected = 2.0 + 3.0 * t.cos() + 4.0 * t.sin();
            let values = obs.image().values(&BandName::input("ndvi")).unwrap();
            assert!(values.iter().all(|&v| (v - expected).abs() < 1e-12));
        }
    }

    #[test]
    fn test_step_and_start() {
        let collection = SyntheticSeries::new("evi").with_observations(3).with_step_days(16).generate().unwrap();
        let days: Vec<i64> = collection
            .iter()
            .map(|o| (o.timestamp() - collection.first().timestamp()).num_days())
            .collect();
        assert_eq!(days, vec![0, 16, 32]);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let build = |seed| {
            SyntheticSeries::new("ndvi")
                .with_observations(20)
                .with_pixels(4)
                .with_noise(0.1)
                .with_seed(Seed::new(seed))
                .generate()
                .unwrap()
        };
        assert_eq!(build(7), build(7));
        assert_ne!(build(7), build(8));
    }

    #[test]
    fn test_masking() {
        let collection = SyntheticSeries::new("ndvi")
            .with_observations(50)
            .with_pixels(20)
            .with_mask_fraction(0.3)
            .generate()
            .unwrap();
        let masked = collection
            .iter()
            .flat_map(|o| o.image().values(&BandName::input("ndvi")).unwrap().to_vec())
            .filter(|v| v.is_nan())
            .count();
        assert!(masked > 100 && masked < 500);
    }

    #[test]
    fn test_invalid_settings() {
        assert!(SyntheticSeries::new("ndvi").with_observations(0).generate().is_err());
        assert!(SyntheticSeries::new("ndvi").with_mask_fraction(1.0).generate().is_err());
        assert!(SyntheticSeries::new("ndvi").with_harmonic(0, 1.0, 1.0).generate().is_err());
        assert!(SyntheticSeries::new("ndvi").with_step_days(0).generate().is_err());
    }
}
