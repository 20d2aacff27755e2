//! Image collections: an ordered sequence of observations.

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use crate::band::BandName;
use crate::error::{CoreError, Result};
use crate::image::{Image, Observation};
use crate::transform::Transform;

/// A whole-collection reduction.
///
/// Reducers collapse the time dimension of a collection, e.g. a temporal
/// median or a per-pixel regression.
pub trait Reducer {
    /// What the reduction produces.
    type Output;
    /// Error returned when the reduction cannot be computed.
    type Error;

    /// Reduce the collection.
    fn reduce(&self, collection: &ImageCollection) -> std::result::Result<Self::Output, Self::Error>;
}

/// An ordered, non-empty sequence of observations with a shared pixel count.
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use hts_core::{Band, BandName, Image, ImageCollection, Observation};
///
/// let image = Image::from_bands(vec![Band::constant(BandName::input("ndvi"), 0.5, 4)]).unwrap();
/// let ts = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
/// let collection = ImageCollection::new(vec![Observation::new(ts, image)]).unwrap();
/// assert_eq!(collection.len(), 1);
/// assert_eq!(collection.n_pixels(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCollection {
    n_pixels: usize,
    observations: Vec<Observation>,
}

impl ImageCollection {
    /// Create a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if `observations` is empty or pixel counts differ.
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        let n_pixels = observations
            .first()
            .map(|o| o.image().n_pixels())
            .ok_or(CoreError::EmptyCollection)?;
        if let Some(bad) = observations.iter().find(|o| o.image().n_pixels() != n_pixels) {
            return Err(CoreError::PixelCountMismatch {
                expected: n_pixels,
                got: bad.image().n_pixels(),
            });
        }
        Ok(Self {
            n_pixels,
            observations,
        })
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Always false for a constructed collection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of pixels per band.
    #[must_use]
    pub fn n_pixels(&self) -> usize {
        self.n_pixels
    }

    /// Observations in order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// The first observation.
    #[must_use]
    pub fn first(&self) -> &Observation {
        &self.observations[0]
    }

    /// Iterate over observations.
    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Band names of the first observation.
    #[must_use]
    pub fn band_names(&self) -> Vec<BandName> {
        self.first().image().band_names()
    }

    /// Check that every observation carries a band.
    #[must_use]
    pub fn has_band(&self, name: &BandName) -> bool {
        self.observations.iter().all(|o| o.image().contains(name))
    }

    /// Apply a transform to every observation.
    ///
    /// Observations are processed in parallel; order is preserved.
    pub fn map<T: Transform + ?Sized>(self, transform: &T) -> Result<Self> {
        tracing::trace!(transform = transform.name(), n = self.len(), "mapping collection");
        let observations = self
            .observations
            .into_par_iter()
            .map(|obs| transform.apply(obs))
            .collect::<Result<Vec<_>>>()?;
        Self::new(observations)
    }

    /// Apply a closure to every observation.
    pub fn map_fn<F>(self, f: F) -> Result<Self>
    where
        F: Fn(Observation) -> Result<Observation> + Send + Sync,
    {
        let observations = self
            .observations
            .into_par_iter()
            .map(f)
            .collect::<Result<Vec<_>>>()?;
        Self::new(observations)
    }

    /// Keep only the listed bands in every observation.
    pub fn select(self, names: &[BandName]) -> Result<Self> {
        self.map_fn(|obs| {
            let image = obs.image().select(names)?;
            Ok(obs.with_image(image))
        })
    }

    /// Append the same image to every observation.
    pub fn add_bands(self, image: &Image) -> Result<Self> {
        if image.n_pixels() != self.n_pixels {
            return Err(CoreError::PixelCountMismatch {
                expected: self.n_pixels,
                got: image.n_pixels(),
            });
        }
        self.map_fn(|obs| obs.add_bands(image))
    }

    /// Keep observations with `start <= timestamp < end`.
    pub fn filter_date(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        let observations = self
            .observations
            .into_iter()
            .filter(|o| o.timestamp() >= start && o.timestamp() < end)
            .collect();
        Self::new(observations)
    }

    /// Sort observations by timestamp (stable).
    #[must_use]
    pub fn sort_by_time(mut self) -> Self {
        self.observations.sort_by_key(Observation::timestamp);
        self
    }

    /// The time series of one band at one pixel.
    pub fn pixel_series(&self, name: &BandName, pixel: usize) -> Result<Vec<f64>> {
        if pixel >= self.n_pixels {
            return Err(CoreError::Other(format!(
                "pixel {} out of bounds for {} pixels",
                pixel, self.n_pixels
            )));
        }
        self.observations
            .iter()
            .map(|o| o.image().values(name).map(|v| v[pixel]))
            .collect()
    }

    /// Run a reducer over the collection.
    pub fn reduce<R: Reducer>(&self, reducer: &R) -> std::result::Result<R::Output, R::Error> {
        reducer.reduce(self)
    }
}

impl<'a> IntoIterator for &'a ImageCollection {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Band;
    use chrono::TimeZone;
    use ndarray::array;

    fn obs(year: i32, values: ndarray::Array1<f64>) -> Observation {
        let ts = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
        Observation::new(ts, Image::from_bands(vec![Band::new(BandName::input("y"), values)]).unwrap())
    }

    #[test]
    fn test_empty_collection_rejected() {
        assert!(matches!(ImageCollection::new(vec![]), Err(CoreError::EmptyCollection)));
    }

    #[test]
    fn test_pixel_count_mismatch() {
        let result = ImageCollection::new(vec![obs(2020, array![1.0, 2.0]), obs(2021, array![1.0])]);
        assert!(matches!(result, Err(CoreError::PixelCountMismatch { expected: 2, got: 1 })));
    }

    #[test]
    fn test_map_preserves_order() {
        let collection =
            ImageCollection::new((2000..2020).map(|y| obs(y, array![f64::from(y)])).collect()).unwrap();
        let mapped = collection
            .map_fn(|o| {
                let v = o.image().values(&BandName::input("y"))?.mapv(|x| x * 2.0);
                o.add_band(Band::new(BandName::input("y2"), v))
            })
            .unwrap();

        let series = mapped.pixel_series(&BandName::input("y2"), 0).unwrap();
        let expected: Vec<f64> = (2000..2020).map(|y| f64::from(y) * 2.0).collect();
        assert_eq!(series, expected);
    }

    #[test]
    fn test_filter_and_sort() {
        let collection =
            ImageCollection::new(vec![obs(2022, array![3.0]), obs(2019, array![1.0]), obs(2020, array![2.0])])
                .unwrap();
        let start = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();

        let filtered = collection.filter_date(start, end).unwrap().sort_by_time();
        assert_eq!(filtered.pixel_series(&BandName::input("y"), 0).unwrap(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_pixel_series_bounds() {
        let collection = ImageCollection::new(vec![obs(2020, array![1.0])]).unwrap();
        assert!(collection.pixel_series(&BandName::input("y"), 1).is_err());
        assert!(collection.pixel_series(&BandName::input("z"), 0).is_err());
    }
}
