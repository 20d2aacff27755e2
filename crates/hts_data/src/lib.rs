//! # hts_data
//!
//! Loading, exporting and generating image collections for hts-rs.
//!
//! This crate provides:
//! - Long-format CSV readers and writers for [`ImageCollection`](hts_core::ImageCollection)
//! - CSV and JSON export of composite images
//! - [`SyntheticSeries`] for collections with a known harmonic model
//!
//! ## Example
//!
//! ```rust,ignore
//! use hts_data::{read_csv_collection, write_image_csv};
//!
//! let collection = read_csv_collection("ndvi.csv")?;
//! // ... fit a model ...
//! write_image_csv(&composite, "composite.csv")?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod io;
pub mod synthetic;

pub use error::{DataError, Result};
pub use io::{
    image_to_json, read_csv_collection, read_csv_collection_from, write_csv_collection,
    write_csv_collection_to, write_image_csv, write_image_csv_to,
};
pub use synthetic::SyntheticSeries;
