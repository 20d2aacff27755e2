//! # hts
//!
//! Harmonic (Fourier) time series modelling of raster image collections.
//!
//! hts-rs fits a per-pixel linear model of the form
//!
//! ```text
//! y(t) = β₀ + β₁·t + Σ_m (a_m·cos(m·t) + b_m·sin(m·t))
//! ```
//!
//! to a time-ordered collection of images, where `t` is angular time
//! (`2π` per year since 1970), and summarises each harmonic by its phase and
//! amplitude:
//!
//! - **Core**: bands, images, observations, collections and harmonic modes
//! - **Data**: long-format CSV I/O and synthetic collections
//! - **Model**: design bands, per-pixel regression, Fourier composites
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hts::prelude::*;
//!
//! let collection = read_csv_collection("ndvi.csv")?;
//!
//! // Coefficients only
//! let series = HarmonicTimeSeries::new(collection.clone(), "ndvi", ModeSet::first(3)?)?
//!     .process()?;
//! let fit = series.fit().expect("fitted");
//!
//! // Phase/amplitude composite rescaled to [-1, 1]
//! let composite = FourierTransform::new(collection, "ndvi", ModeSet::first(3)?)?.process()?;
//! write_image_csv(&composite, "composite.csv")?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export all crates
pub use hts_core as core;
pub use hts_data as data;
pub use hts_model as model;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use hts::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use hts_core::{
        Band, BandKind, BandName, Image, ImageCollection, Mode, ModeSet, ModeSpec, Observation,
        Reducer, Seed, Term, Transform,
    };

    // Data
    pub use hts_data::{
        image_to_json, read_csv_collection, write_csv_collection, write_image_csv, SyntheticSeries,
    };

    // Model
    pub use hts_model::{
        BandSelection, FourierTransform, HarmonicConfig, HarmonicFit, HarmonicTimeSeries, Median,
        PhaseConvention, ScaleRange,
    };
}

/// All module for importing everything.
pub mod all {
    pub use super::prelude::*;

    // Additional exports
    pub use hts_core::{angular_time, fractional_years, Compose, CoreError};
    pub use hts_data::{
        read_csv_collection_from, write_csv_collection_to, write_image_csv_to, DataError,
    };
    pub use hts_model::{
        design_transform, harmonic_terms, median, unit_scale, AddConstant, AddHarmonics, AddTime,
        FourierDeriver, LinearRegression, ModelError, Trend,
    };
}
