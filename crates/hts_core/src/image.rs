//! Multi-band images and timestamped observations.
//!
//! An image is an ordered list of named bands, each a vector of per-pixel
//! values. Pixels are independent; `NaN` marks a masked pixel.

use chrono::{DateTime, Utc};
use ndarray::Array1;

use crate::band::BandName;
use crate::error::{CoreError, Result};

/// A named band of per-pixel values.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    name: BandName,
    values: Array1<f64>,
}

impl Band {
    /// Create a new band.
    pub fn new(name: impl Into<BandName>, values: Array1<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// A band holding the same value at every pixel.
    pub fn constant(name: impl Into<BandName>, value: f64, n_pixels: usize) -> Self {
        Self::new(name, Array1::from_elem(n_pixels, value))
    }

    /// Band name.
    #[must_use]
    pub fn name(&self) -> &BandName {
        &self.name
    }

    /// Per-pixel values.
    #[must_use]
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Number of pixels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the band has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A static multi-band raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    n_pixels: usize,
    bands: Vec<Band>,
}

impl Image {
    /// Create an image with no bands.
    #[must_use]
    pub fn empty(n_pixels: usize) -> Self {
        Self {
            n_pixels,
            bands: Vec::new(),
        }
    }

    /// Create an image from bands, checking pixel counts and name uniqueness.
    ///
    /// # Errors
    ///
    /// Returns an error if no band is given, pixel counts differ or a name repeats.
    pub fn from_bands(bands: Vec<Band>) -> Result<Self> {
        let n_pixels = bands
            .first()
            .map(Band::len)
            .ok_or_else(|| CoreError::Other("an image needs at least one band".to_string()))?;
        let mut image = Self::empty(n_pixels);
        for band in bands {
            image.push(band)?;
        }
        Ok(image)
    }

    /// Number of pixels in every band.
    #[must_use]
    pub fn n_pixels(&self) -> usize {
        self.n_pixels
    }

    /// Number of bands.
    #[must_use]
    pub fn n_bands(&self) -> usize {
        self.bands.len()
    }

    /// Bands in order.
    #[must_use]
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Band names in order.
    #[must_use]
    pub fn band_names(&self) -> Vec<BandName> {
        self.bands.iter().map(|b| b.name.clone()).collect()
    }

    /// Check if a band exists.
    #[must_use]
    pub fn contains(&self, name: &BandName) -> bool {
        self.bands.iter().any(|b| &b.name == name)
    }

    /// Look up a band.
    pub fn band(&self, name: &BandName) -> Result<&Band> {
        self.bands
            .iter()
            .find(|b| &b.name == name)
            .ok_or_else(|| CoreError::MissingBand(name.to_string()))
    }

    /// Look up a band's values.
    pub fn values(&self, name: &BandName) -> Result<&Array1<f64>> {
        self.band(name).map(Band::values)
    }

    /// Append a band in place.
    pub fn push(&mut self, band: Band) -> Result<()> {
        if band.len() != self.n_pixels {
            return Err(CoreError::PixelCountMismatch {
                expected: self.n_pixels,
                got: band.len(),
            });
        }
        if self.contains(&band.name) {
            return Err(CoreError::DuplicateBand(band.name.to_string()));
        }
        self.bands.push(band);
        Ok(())
    }

    /// Append a band, consuming and returning the image.
    pub fn add_band(mut self, band: Band) -> Result<Self> {
        self.push(band)?;
        Ok(self)
    }

    /// Append every band of another image.
    pub fn add_bands(mut self, other: &Image) -> Result<Self> {
        for band in &other.bands {
            self.push(band.clone())?;
        }
        Ok(self)
    }

    /// Keep only the listed bands, in the listed order.
    pub fn select(&self, names: &[BandName]) -> Result<Self> {
        let mut image = Self::empty(self.n_pixels);
        for name in names {
            image.push(self.band(name)?.clone())?;
        }
        Ok(image)
    }

    /// Keep the bands matching a predicate, in image order.
    #[must_use]
    pub fn select_where(&self, mut keep: impl FnMut(&BandName) -> bool) -> Self {
        Self {
            n_pixels: self.n_pixels,
            bands: self.bands.iter().filter(|b| keep(&b.name)).cloned().collect(),
        }
    }

    /// Mask every band at pixels where `mask` is zero or masked.
    ///
    /// The mask band itself is left untouched.
    pub fn update_mask(mut self, mask: &BandName) -> Result<Self> {
        let keep = self.values(mask)?.mapv(|m| m.is_finite() && m != 0.0);
        for band in self.bands.iter_mut().filter(|b| &b.name != mask) {
            for (v, &k) in band.values.iter_mut().zip(keep.iter()) {
                if !k {
                    *v = f64::NAN;
                }
            }
        }
        Ok(self)
    }

    /// Apply a function to every band's values.
    #[must_use]
    pub fn map_values(self, mut f: impl FnMut(&BandName, Array1<f64>) -> Array1<f64>) -> Self {
        let bands = self
            .bands
            .into_iter()
            .map(|b| {
                let values = f(&b.name, b.values);
                Band::new(b.name, values)
            })
            .collect();
        Self {
            n_pixels: self.n_pixels,
            bands,
        }
    }
}

/// A timestamped image.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    timestamp: DateTime<Utc>,
    image: Image,
}

impl Observation {
    /// Create an observation.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, image: Image) -> Self {
        Self { timestamp, image }
    }

    /// Acquisition time.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The observation's bands.
    #[must_use]
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Replace the image, keeping the timestamp.
    #[must_use]
    pub fn with_image(self, image: Image) -> Self {
        Self {
            timestamp: self.timestamp,
            image,
        }
    }

    /// Append a band.
    pub fn add_band(self, band: Band) -> Result<Self> {
        let timestamp = self.timestamp;
        Ok(Self::new(timestamp, self.image.add_band(band)?))
    }

    /// Append every band of another image.
    pub fn add_bands(self, other: &Image) -> Result<Self> {
        let timestamp = self.timestamp;
        Ok(Self::new(timestamp, self.image.add_bands(other)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ndarray::array;

    fn ndvi() -> BandName {
        BandName::input("ndvi")
    }

    #[test]
    fn test_push_checks_pixels_and_names() {
        let mut image = Image::empty(3);
        image.push(Band::new(ndvi(), array![0.1, 0.2, 0.3])).unwrap();

        let err = image.push(Band::new(BandName::input("b4"), array![1.0])).unwrap_err();
        assert!(matches!(err, CoreError::PixelCountMismatch { expected: 3, got: 1 }));

        let err = image.push(Band::constant(ndvi(), 0.0, 3)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateBand(_)));
    }

    #[test]
    fn test_select_orders_bands() {
        let image = Image::from_bands(vec![
            Band::constant(BandName::input("a"), 1.0, 2),
            Band::constant(BandName::input("b"), 2.0, 2),
        ])
        .unwrap();

        let selected = image.select(&[BandName::input("b"), BandName::input("a")]).unwrap();
        assert_eq!(selected.band_names(), vec![BandName::input("b"), BandName::input("a")]);
        assert!(image.select(&[BandName::input("c")]).is_err());
    }

    #[test]
    fn test_update_mask() {
        let image = Image::from_bands(vec![
            Band::new(ndvi(), array![0.5, 0.6, 0.7]),
            Band::new(BandName::input("clear"), array![1.0, 0.0, 1.0]),
        ])
        .unwrap()
        .update_mask(&BandName::input("clear"))
        .unwrap();

        let values = image.values(&ndvi()).unwrap();
        assert_eq!(values[0], 0.5);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 0.7);
        assert_eq!(image.values(&BandName::input("clear")).unwrap()[1], 0.0);
    }

    #[test]
    fn test_observation_add_band_keeps_timestamp() {
        let ts = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();
        let obs = Observation::new(ts, Image::from_bands(vec![Band::constant(ndvi(), 0.4, 2)]).unwrap());
        let obs = obs.add_band(Band::constant(BandName::input("x"), 1.0, 2)).unwrap();

        assert_eq!(obs.timestamp(), ts);
        assert_eq!(obs.image().n_bands(), 2);
    }
}
