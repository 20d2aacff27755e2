//! CSV and JSON I/O for image collections and composites.
//!
//! Collections use a long CSV layout, one row per observation and pixel:
//!
//! ```text
//! timestamp,pixel,ndvi,qa
//! 2020-01-01T00:00:00Z,0,0.41,1
//! 2020-01-01T00:00:00Z,1,,0
//! ```
//!
//! Empty cells and `NaN` are masked values. Timestamps are RFC 3339 or plain
//! `YYYY-MM-DD` dates (midnight UTC).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use hts_core::{Band, BandName, Image, ImageCollection, Observation};
use ndarray::Array1;
use serde_json::{json, Value};

use crate::error::{DataError, Result};

const TIMESTAMP: &str = "timestamp";
const PIXEL: &str = "pixel";

type PixelRows = Vec<(usize, Vec<f64>)>;

/// Read a collection from a long-format CSV file.
///
/// # Arguments
///
/// * `path` - Path to the CSV file
///
/// # Returns
///
/// The collection, sorted by timestamp.
pub fn read_csv_collection<P: AsRef<Path>>(path: P) -> Result<ImageCollection> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let collection = read_csv_collection_from(file)?;
    tracing::info!(
        path = %path.display(),
        observations = collection.len(),
        n_pixels = collection.n_pixels(),
        "loaded collection"
    );
    Ok(collection)
}

/// Read a collection from any reader in long CSV format.
pub fn read_csv_collection_from<R: Read>(reader: R) -> Result<ImageCollection> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.len() < 3 || &headers[0] != TIMESTAMP || &headers[1] != PIXEL {
        return Err(DataError::FormatError(format!(
            "expected header '{TIMESTAMP},{PIXEL},<band>...', got '{}'",
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }
    let names = headers
        .iter()
        .skip(2)
        .map(str::parse)
        .collect::<hts_core::Result<Vec<BandName>>>()?;

    let mut grouped: BTreeMap<DateTime<Utc>, PixelRows> = BTreeMap::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);
        let parse_err = |message: String| DataError::Parse { line, message };

        let timestamp = parse_timestamp(&record[0]).map_err(parse_err)?;
        let pixel: usize = record[1]
            .parse()
            .map_err(|_| parse_err(format!("invalid pixel index '{}'", &record[1])))?;
        let values = record
            .iter()
            .skip(2)
            .map(parse_value)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(parse_err)?;
        grouped.entry(timestamp).or_default().push((pixel, values));
    }

    let observations = grouped
        .into_iter()
        .map(|(timestamp, rows)| {
            let image = assemble_image(&names, rows).map_err(|e| match e {
                DataError::FormatError(msg) => DataError::FormatError(format!("{timestamp}: {msg}")),
                other => other,
            })?;
            Ok(Observation::new(timestamp, image))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ImageCollection::new(observations)?)
}

/// Build one image from the rows of a single timestamp.
///
/// Pixel indices must cover `0..n` exactly once.
fn assemble_image(names: &[BandName], rows: PixelRows) -> Result<Image> {
    let n_pixels = rows.len();
    let mut columns = vec![Array1::from_elem(n_pixels, f64::NAN); names.len()];
    let mut seen = vec![false; n_pixels];

    for (pixel, values) in rows {
        if pixel >= n_pixels || seen[pixel] {
            return Err(DataError::FormatError(format!(
                "pixel indices must be 0..{n_pixels} without repeats, found {pixel}"
            )));
        }
        seen[pixel] = true;
        for (column, value) in columns.iter_mut().zip(values) {
            column[pixel] = value;
        }
    }

    let bands = names
        .iter()
        .cloned()
        .zip(columns)
        .map(|(name, values)| Band::new(name, values))
        .collect();
    Ok(Image::from_bands(bands)?)
}

fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| format!("invalid timestamp '{s}'"))
}

fn parse_value(s: &str) -> std::result::Result<f64, String> {
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    s.parse().map_err(|_| format!("invalid value '{s}'"))
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

/// Write a collection to a CSV file in long format.
pub fn write_csv_collection<P: AsRef<Path>>(collection: &ImageCollection, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_csv_collection_to(collection, file)
}

/// Write a collection to any writer in long CSV format.
///
/// Columns follow the band order of the first observation.
pub fn write_csv_collection_to<W: Write>(collection: &ImageCollection, writer: W) -> Result<()> {
    let names = collection.band_names();
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![TIMESTAMP.to_string(), PIXEL.to_string()];
    header.extend(names.iter().map(ToString::to_string));
    wtr.write_record(&header)?;

    for obs in collection {
        let timestamp = obs.timestamp().to_rfc3339_opts(SecondsFormat::Secs, true);
        let columns = names
            .iter()
            .map(|name| obs.image().values(name))
            .collect::<hts_core::Result<Vec<_>>>()?;
        for pixel in 0..collection.n_pixels() {
            let mut record = vec![timestamp.clone(), pixel.to_string()];
            record.extend(columns.iter().map(|c| format_value(c[pixel])));
            wtr.write_record(&record)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Write a single image (e.g. a composite) to a CSV file.
pub fn write_image_csv<P: AsRef<Path>>(image: &Image, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_image_csv_to(image, file)
}

/// Write a single image as `pixel,<band>...` rows.
pub fn write_image_csv_to<W: Write>(image: &Image, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![PIXEL.to_string()];
    header.extend(image.band_names().iter().map(ToString::to_string));
    wtr.write_record(&header)?;

    for pixel in 0..image.n_pixels() {
        let mut record = vec![pixel.to_string()];
        record.extend(image.bands().iter().map(|b| format_value(b.values()[pixel])));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Convert an image to JSON.
///
/// Bands keep their order; masked values become `null`.
#[must_use]
pub fn image_to_json(image: &Image) -> Value {
    let bands: Vec<Value> = image
        .bands()
        .iter()
        .map(|band| {
            let values: Vec<Value> = band.values().iter().map(|&v| Value::from(v)).collect();
            json!({ "name": band.name().to_string(), "values": values })
        })
        .collect();
    json!({ "n_pixels": image.n_pixels(), "bands": bands })
}
