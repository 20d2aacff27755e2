//! # hts_core
//!
//! Core types for hts-rs harmonic time series modelling.
//!
//! This crate provides:
//! - [`Mode`] and [`ModeSet`] for harmonic frequencies
//! - [`Term`] and [`BandName`] for typed band names
//! - [`Band`], [`Image`] and [`Observation`] for per-pixel rasters
//! - [`ImageCollection`] with the [`Transform`] and [`Reducer`] seams
//! - [`angular_time`] for converting timestamps to radians
//! - [`Seed`] for reproducible synthetic data
//! - Error types
//!
//! ## Data Convention
//!
//! A band is a vector of per-pixel `f64` values. Pixels are independent and
//! `NaN` marks a masked pixel. Every band of every observation in a
//! collection has the same pixel count.
//!
//! ## Example
//!
//! ```rust
//! use hts_core::{BandName, ModeSet, Term};
//!
//! let modes = ModeSet::first(2).unwrap();
//! let names: Vec<String> = modes.iter().map(|m| Term::Cos(m).to_string()).collect();
//! assert_eq!(names, vec!["cos_1", "cos_2"]);
//! assert_eq!("sin_2_coef".parse::<BandName>().unwrap().to_string(), "sin_2_coef");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod band;
mod collection;
mod error;
mod image;
mod mode;
mod seed;
mod time;
mod transform;

pub use band::{BandKind, BandName, Term};
pub use collection::{ImageCollection, Reducer};
pub use error::{CoreError, Result};
pub use image::{Band, Image, Observation};
pub use mode::{Mode, ModeSet, ModeSpec, MAX_MODE};
pub use seed::Seed;
pub use time::{angular_time, fractional_years};
pub use transform::{Compose, Transform};
