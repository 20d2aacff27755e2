//! # hts_model
//!
//! Harmonic regression of image collections and Fourier phase/amplitude
//! composites.
//!
//! This crate provides:
//! - Design-band transforms ([`AddConstant`], [`AddTime`], [`AddHarmonics`])
//! - Per-pixel least squares ([`LinearRegression`] producing a [`Trend`])
//! - The [`HarmonicTimeSeries`] pipeline and its [`HarmonicFit`]
//! - The [`FourierTransform`] composite (phase, amplitude, median, rescaling)
//! - [`BandSelection`] for the final band set
//! - [`HarmonicConfig`] for JSON configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use hts_model::{FourierTransform, HarmonicConfig};
//!
//! let config = HarmonicConfig::from_file("harmonics.json")?;
//! let composite = FourierTransform::from_config(collection, &config)?.process()?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod design;
pub mod error;
pub mod fourier;
pub mod pipeline;
pub mod reduce;
pub mod regression;
pub mod select;

pub use config::HarmonicConfig;
pub use design::{design_transform, harmonic_terms, AddConstant, AddHarmonics, AddTime};
pub use error::{ModelError, Result};
pub use fourier::{FourierDeriver, FourierTransform, PhaseConvention};
pub use pipeline::{HarmonicFit, HarmonicTimeSeries};
pub use reduce::{median, unit_scale, Median, ScaleRange};
pub use regression::{LinearRegression, Trend};
pub use select::BandSelection;
