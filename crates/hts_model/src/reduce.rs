//! Temporal reduction and per-band rescaling.

use hts_core::{Band, Image, ImageCollection, Reducer};
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Per-pixel temporal median of every band.
///
/// Masked (`NaN`) values are ignored; a pixel masked in every observation
/// stays masked. With an even number of values the two middle values are
/// averaged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Median;

impl Reducer for Median {
    type Output = Image;
    type Error = ModelError;

    fn reduce(&self, collection: &ImageCollection) -> Result<Image> {
        let names = collection.band_names();
        let n_pixels = collection.n_pixels();

        let bands = names
            .into_par_iter()
            .map(|name| {
                let series = collection
                    .iter()
                    .map(|obs| obs.image().values(&name))
                    .collect::<hts_core::Result<Vec<_>>>()?;
                let values = (0..n_pixels)
                    .map(|px| median(series.iter().map(|band| band[px])))
                    .collect::<Array1<f64>>();
                Ok(Band::new(name, values))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(n_bands = bands.len(), observations = collection.len(), "median composite");
        Ok(Image::from_bands(bands)?)
    }
}

/// Median of the finite values, `NaN` if there are none.
#[must_use]
pub fn median(values: impl Iterator<Item = f64>) -> f64 {
    let mut finite: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.sort_by(f64::total_cmp);
    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        midpoint(finite[mid - 1], finite[mid])
    } else {
        finite[mid]
    }
}

/// Mean of two finite values without overflowing near `f64::MAX`.
fn midpoint(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum.is_finite() {
        sum / 2.0
    } else {
        a / 2.0 + b / 2.0
    }
}

/// Target range for unit-scale normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRange {
    /// Value the band minimum maps to.
    pub low: f64,
    /// Value the band maximum maps to.
    pub high: f64,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self { low: -1.0, high: 1.0 }
    }
}

impl ScaleRange {
    /// Create a range, checking `low < high` and both finite.
    pub fn new(low: f64, high: f64) -> Result<Self> {
        let range = Self { low, high };
        range.validate()?;
        Ok(range)
    }

    /// Check `low < high` and a finite width.
    pub fn validate(&self) -> Result<()> {
        if !(self.low < self.high && self.width().is_finite()) {
            return Err(ModelError::InvalidConfig(format!(
                "scale range [{}, {}] must be finite with low < high",
                self.low, self.high
            )));
        }
        Ok(())
    }

    /// Midpoint of the range.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        midpoint(self.low, self.high)
    }

    fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Rescale every band independently from its own `[min, max]` to `range`.
///
/// Masked values stay masked and infinities become masked; a constant band
/// maps to the range midpoint.
#[must_use]
pub fn unit_scale(image: Image, range: ScaleRange) -> Image {
    image.map_values(|_, values| scale_band(values, range))
}

fn scale_band(values: Array1<f64>, range: ScaleRange) -> Array1<f64> {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if min > max {
        return values.mapv(|_| f64::NAN);
    }
    if min == max {
        let mid = range.midpoint();
        return values.mapv(|v| if v.is_finite() { mid } else { f64::NAN });
    }
    // Halve before subtracting when the band is wider than f64::MAX.
    let halve = !(max - min).is_finite();
    let offset = |v: f64| if halve { v / 2.0 - min / 2.0 } else { v - min };
    let span = offset(max);
    let width = range.width();
    values.mapv(|v| {
        if v.is_finite() {
            (range.low + offset(v) / span * width).clamp(range.low, range.high)
        } else {
            f64::NAN
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use hts_core::{BandName, Observation};
    use ndarray::array;

    fn collection(rows: Vec<Array1<f64>>) -> ImageCollection {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let observations = rows
            .into_iter()
            .enumerate()
            .map(|(i, values)| {
                let image = Image::from_bands(vec![Band::new(BandName::input("b"), values)]).unwrap();
                Observation::new(start + Duration::days(i as i64), image)
            })
            .collect();
        ImageCollection::new(observations).unwrap()
    }

    #[test]
    fn test_median_values() {
        assert_eq!(median([3.0, 1.0, 2.0].into_iter()), 2.0);
        assert_eq!(median([4.0, 1.0, 2.0, 3.0].into_iter()), 2.5);
        assert_eq!(median([f64::NAN, 5.0].into_iter()), 5.0);
        assert!(median([f64::NAN].into_iter()).is_nan());
    }

    #[test]
    fn test_median_reducer() {
        let c = collection(vec![array![1.0, f64::NAN], array![5.0, f64::NAN], array![3.0, f64::NAN]]);
        let image = c.reduce(&Median).unwrap();
        let values = image.values(&BandName::input("b")).unwrap();
        assert_eq!(values[0], 3.0);
        assert!(values[1].is_nan());
    }

    #[test]
    fn test_unit_scale_range() {
        let image = Image::from_bands(vec![
            Band::new(BandName::input("a"), array![-250.0, 0.0, 1e6, f64::NAN]),
            Band::new(BandName::input("flat"), array![7.0, 7.0, 7.0, 7.0]),
        ])
        .unwrap();

        let scaled = unit_scale(image, ScaleRange::default());
        let a = scaled.values(&BandName::input("a")).unwrap();
        assert_eq!(a[0], -1.0);
        assert_eq!(a[2], 1.0);
        assert!(a[1] > -1.0 && a[1] < 1.0);
        assert!(a[3].is_nan());

        let flat = scaled.values(&BandName::input("flat")).unwrap();
        assert!(flat.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_median_near_float_max() {
        assert_eq!(median([1.7e308, 1.7e308].into_iter()), 1.7e308);
        assert_eq!(median([-f64::MAX, f64::MAX].into_iter()), 0.0);

        let c = collection(vec![array![1.7e308, 0.0], array![1.7e308, 1.0]]);
        let image = c.reduce(&Median).unwrap();
        let values = image.values(&BandName::input("b")).unwrap();
        assert_eq!(values[0], 1.7e308);
        assert_eq!(values[1], 0.5);

        let scaled = unit_scale(image, ScaleRange::default());
        let b = scaled.values(&BandName::input("b")).unwrap();
        assert_eq!(b[0], 1.0);
        assert_eq!(b[1], -1.0);
    }

    #[test]
    fn test_unit_scale_wider_than_float_max() {
        let image = Image::from_bands(vec![Band::new(
            BandName::input("wide"),
            array![-1e308, 0.0, 1e308, -f64::MAX, f64::MAX],
        )])
        .unwrap();
        let scaled = unit_scale(image, ScaleRange::default());
        let wide = scaled.values(&BandName::input("wide")).unwrap();
        assert!(wide.iter().all(|v| (-1.0..=1.0).contains(v)), "{wide:?}");
        assert_eq!(wide[3], -1.0);
        assert_eq!(wide[4], 1.0);
        assert!(wide[1].abs() < 1e-12);
        assert!(wide[0] < wide[1] && wide[1] < wide[2]);
    }

    #[test]
    fn test_unit_scale_masks_infinities() {
        let image = Image::from_bands(vec![
            Band::new(BandName::input("a"), array![f64::INFINITY, 1.0, 3.0]),
            Band::new(BandName::input("b"), array![f64::NEG_INFINITY, f64::NAN, f64::INFINITY]),
        ])
        .unwrap();
        let scaled = unit_scale(image, ScaleRange::default());
        let a = scaled.values(&BandName::input("a")).unwrap();
        assert!(a[0].is_nan());
        assert_eq!(a[1], -1.0);
        assert_eq!(a[2], 1.0);
        assert!(scaled.values(&BandName::input("b")).unwrap().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_unit_scale_tiny_span() {
        let tiny = f64::from_bits(1);
        let image = Image::from_bands(vec![Band::new(BandName::input("t"), array![0.0, tiny])]).unwrap();
        let scaled = unit_scale(image, ScaleRange::default());
        let t = scaled.values(&BandName::input("t")).unwrap();
        assert_eq!(t[0], -1.0);
        assert_eq!(t[1], 1.0);
    }

    #[test]
    fn test_scale_range_validation() {
        assert!(ScaleRange::new(1.0, -1.0).is_err());
        assert!(ScaleRange::new(0.0, f64::INFINITY).is_err());
        assert!(ScaleRange::new(-f64::MAX, f64::MAX).is_err());
        assert!(ScaleRange::new(0.0, f64::NAN).is_err());
        assert!(ScaleRange::new(0.0, 1.0).is_ok());
    }
}
