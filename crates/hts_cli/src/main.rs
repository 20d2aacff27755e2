//! hts-rs CLI for fitting harmonic models and building Fourier composites.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hts_core::{ModeSpec, Seed, Term};
use hts_data::{
    image_to_json, read_csv_collection, write_csv_collection, write_image_csv, SyntheticSeries,
};
use hts_model::{
    BandSelection, FourierTransform, HarmonicConfig, HarmonicTimeSeries, PhaseConvention,
};

#[derive(Parser)]
#[command(name = "hts")]
#[command(author, version)]
#[command(about = "Harmonic time series modelling of raster observations")]
#[command(long_about = "hts-rs: per-pixel harmonic regression and Fourier composites.

Input collections are long-format CSV files with the header
'timestamp,pixel,<band>...'. Empty cells are masked pixels.

EXAMPLES:
  # Generate a synthetic NDVI collection
  hts simulate --output ndvi.csv --pixels 16 --harmonic 1:0.2:0.1 --noise 0.01

  # Fit three harmonics and write coefficients plus fitted values
  hts fit --input ndvi.csv --modes 3 --output fitted.csv

  # Build the phase/amplitude composite
  hts fourier --input ndvi.csv --modes 2 --output composite.json")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by `fit` and `fourier`.
#[derive(clap::Args)]
struct ModelArgs {
    /// Input collection (long-format CSV)
    #[arg(long, value_name = "CSV")]
    input: PathBuf,

    /// JSON configuration file; flags below override it
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Band to model
    #[arg(long, value_name = "BAND")]
    dependent: Option<String>,

    /// Fit the first N harmonics
    #[arg(long, value_name = "N", conflicts_with = "explicit_modes")]
    modes: Option<u32>,

    /// Fit an explicit list of harmonics (e.g. 1,2,4)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    explicit_modes: Option<Vec<i64>>,

    /// Drop the constant term
    #[arg(long)]
    no_constant: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Selection {
    /// Every band
    All,
    /// Dependent variable, coefficients, amplitude and phase
    Summary,
}

#[derive(Clone, Copy, ValueEnum)]
enum Convention {
    /// atan2(cos_coef, sin_coef)
    CosSin,
    /// atan2(sin_coef, cos_coef)
    SinCos,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a per-pixel harmonic regression
    Fit {
        #[command(flatten)]
        model: ModelArgs,

        /// Write the collection with coefficient and fitted bands
        #[arg(long, value_name = "CSV")]
        output: Option<PathBuf>,
    },
    /// Build a Fourier phase/amplitude composite
    Fourier {
        #[command(flatten)]
        model: ModelArgs,

        /// Bands to keep in the composite
        #[arg(long, value_enum)]
        select: Option<Selection>,

        /// Phase arctangent argument order
        #[arg(long, value_enum)]
        phase_convention: Option<Convention>,

        /// Output path (.json for JSON, anything else for CSV)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Generate a synthetic collection with a known harmonic model
    Simulate {
        /// Output CSV path
        #[arg(long, value_name = "CSV")]
        output: PathBuf,

        /// Band name
        #[arg(long, default_value = "ndvi", value_name = "BAND")]
        band: String,

        /// Number of observations
        #[arg(long, default_value = "46", value_name = "N")]
        observations: usize,

        /// Number of pixels
        #[arg(long, default_value = "1", value_name = "N")]
        pixels: usize,

        /// First observation date (YYYY-MM-DD)
        #[arg(long, default_value = "2018-01-01", value_name = "DATE")]
        start: String,

        /// Days between observations
        #[arg(long, default_value = "8", value_name = "DAYS")]
        step_days: i64,

        /// Constant offset
        #[arg(long, default_value = "0.0")]
        offset: f64,

        /// Slope per radian of angular time
        #[arg(long, default_value = "0.0")]
        trend: f64,

        /// Harmonic as MODE:COS:SIN, repeatable
        #[arg(long, value_name = "MODE:COS:SIN")]
        harmonic: Vec<String>,

        /// Standard deviation of Gaussian noise
        #[arg(long, default_value = "0.0")]
        noise: f64,

        /// Fraction of masked pixel values
        #[arg(long, default_value = "0.0")]
        mask_fraction: f64,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42", value_name = "SEED")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    match cli.command {
        Commands::Fit { model, output } => handle_fit(&model, output.as_deref()),
        Commands::Fourier {
            model,
            select,
            phase_convention,
            output,
        } => handle_fourier(&model, select, phase_convention, output.as_deref()),
        Commands::Simulate {
            output,
            band,
            observations,
            pixels,
            start,
            step_days,
            offset,
            trend,
            harmonic,
            noise,
            mask_fraction,
            seed,
        } => {
            let start = NaiveDate::parse_from_str(&start, "%Y-%m-%d")
                .with_context(|| format!("Invalid start date '{start}'"))?
                .and_hms_opt(0, 0, 0)
                .context("Invalid start time")?;
            let mut series = SyntheticSeries::new(band)
                .with_observations(observations)
                .with_pixels(pixels)
                .with_start(Utc.from_utc_datetime(&start))
                .with_step_days(step_days)
                .with_offset(offset)
                .with_trend(trend)
                .with_noise(noise)
                .with_mask_fraction(mask_fraction)
                .with_seed(Seed::new(seed));
            for spec in &harmonic {
                let (mode, cos, sin) = parse_harmonic(spec)?;
                series = series.with_harmonic(mode, cos, sin);
            }
            handle_simulate(&series, &output)
        }
    }
}

/// Merge the configuration file (if any) with command-line overrides.
fn build_config(args: &ModelArgs) -> Result<HarmonicConfig> {
    let mut config = match &args.config {
        Some(path) => HarmonicConfig::from_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => HarmonicConfig::default(),
    };
    if let Some(dependent) = &args.dependent {
        config.dependent_variable = dependent.clone();
    }
    if let Some(n) = args.modes {
        config.modes = ModeSpec::Count(n);
    }
    if let Some(list) = &args.explicit_modes {
        config.modes = ModeSpec::Explicit(list.clone());
    }
    if args.no_constant {
        config.include_constant = false;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn handle_fit(args: &ModelArgs, output: Option<&Path>) -> Result<()> {
    let config = build_config(args)?;
    let collection = read_csv_collection(&args.input)
        .with_context(|| format!("Failed to read '{}'", args.input.display()))?;

    println!("Fitting harmonic model");
    println!("  Input:        {}", args.input.display());
    println!("  Observations: {}", collection.len());
    println!("  Pixels:       {}", collection.n_pixels());
    println!("  Dependent:    {}", config.dependent_variable);

    let series = HarmonicTimeSeries::from_config(collection, &config)?
        .process()?
        .compute_fitted()?;
    let Some(fit) = series.fit() else {
        bail!("Model was not fitted");
    };
    let Some(trend) = series.trend() else {
        bail!("Model has no trend");
    };

    println!("\nCoefficients (mean over fitted pixels):");
    println!("─────────────────────────────────────────");
    for &term in fit.terms() {
        let values = fit.coefficient(term)?;
        println!("  {:<14} {:>12.6}", format!("{}_coef", term), finite_mean(values.iter().copied()));
    }
    println!("─────────────────────────────────────────");
    println!("  Mean RMSE:        {:.6}", finite_mean(fit.rmse().iter().copied()));
    println!("  Degenerate pixels: {}", trend.n_degenerate());

    for mode in series.modes() {
        let cos = finite_mean(fit.coefficient(Term::Cos(mode))?.iter().copied());
        let sin = finite_mean(fit.coefficient(Term::Sin(mode))?.iter().copied());
        tracing::debug!(mode = mode.get(), cos, sin, "mean harmonic coefficients");
    }

    if let Some(path) = output {
        write_csv_collection(series.dataset(), path)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        println!("\nWrote {}", path.display());
    }
    Ok(())
}

fn handle_fourier(
    args: &ModelArgs,
    select: Option<Selection>,
    convention: Option<Convention>,
    output: Option<&Path>,
) -> Result<()> {
    let mut config = build_config(args)?;
    if let Some(select) = select {
        config.selection = match select {
            Selection::All => BandSelection::All,
            Selection::Summary => BandSelection::Summary,
        };
    }
    if let Some(convention) = convention {
        config.phase_convention = match convention {
            Convention::CosSin => PhaseConvention::CosSin,
            Convention::SinCos => PhaseConvention::SinCos,
        };
    }

    let collection = read_csv_collection(&args.input)
        .with_context(|| format!("Failed to read '{}'", args.input.display()))?;
    let composite = FourierTransform::from_config(collection, &config)?
        .process()
        .context("Fourier transform failed")?;

    println!("Fourier composite: {} bands x {} pixels", composite.n_bands(), composite.n_pixels());
    for band in composite.bands() {
        println!("  {:<16} mean {:>9.4}", band.name().to_string(), finite_mean(band.values().iter().copied()));
    }

    if let Some(path) = output {
        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            let json = serde_json::to_string_pretty(&image_to_json(&composite))?;
            std::fs::write(path, json).with_context(|| format!("Failed to write '{}'", path.display()))?;
        } else {
            write_image_csv(&composite, path)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
        }
        println!("\nWrote {}", path.display());
    }
    Ok(())
}

fn handle_simulate(series: &SyntheticSeries, output: &Path) -> Result<()> {
    let collection = series.generate().context("Failed to generate collection")?;
    write_csv_collection(&collection, output)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;
    println!(
        "Wrote {} observations x {} pixels to {}",
        collection.len(),
        collection.n_pixels(),
        output.display()
    );
    Ok(())
}

/// Parse `MODE:COS:SIN`.
fn parse_harmonic(spec: &str) -> Result<(u32, f64, f64)> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        bail!("Invalid harmonic '{}'. Expected MODE:COS:SIN, e.g. 1:0.2:0.1", spec);
    }
    let mode = parts[0]
        .parse::<u32>()
        .with_context(|| format!("Invalid mode in '{spec}'"))?;
    let cos = parts[1]
        .parse::<f64>()
        .with_context(|| format!("Invalid cosine amplitude in '{spec}'"))?;
    let sin = parts[2]
        .parse::<f64>()
        .with_context(|| format!("Invalid sine amplitude in '{spec}'"))?;
    Ok((mode, cos, sin))
}

fn finite_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_harmonic() {
        let (mode, cos, sin) = parse_harmonic("2:0.5:-1").unwrap();
        assert_eq!(mode, 2);
        assert!((cos - 0.5).abs() < 1e-12);
        assert!((sin + 1.0).abs() < 1e-12);
        assert!(parse_harmonic("2:0.5").is_err());
        assert!(parse_harmonic("x:0.5:1").is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "hts", "fourier", "--input", "in.csv", "--dependent", "evi", "--explicit-modes", "1,3",
            "--no-constant", "--select", "all",
        ]);
        let Commands::Fourier { model, select, .. } = cli.command else {
            panic!("expected fourier subcommand");
        };
        let config = build_config(&model).unwrap();
        assert_eq!(config.dependent_variable, "evi");
        assert_eq!(config.modes, ModeSpec::Explicit(vec![1, 3]));
        assert!(!config.include_constant);
        assert!(matches!(select, Some(Selection::All)));
    }

    #[test]
    fn test_huge_mode_count_rejected() {
        let cli = Cli::parse_from(["hts", "fit", "--input", "in.csv", "--modes", "4000000000"]);
        let Commands::Fit { model, .. } = cli.command else {
            panic!("expected fit subcommand");
        };
        assert!(build_config(&model).is_err());
    }

    #[test]
    fn test_finite_mean() {
        assert!((finite_mean([1.0, f64::NAN, 3.0].into_iter()) - 2.0).abs() < 1e-12);
        assert!(finite_mean([f64::NAN].into_iter()).is_nan());
    }
}
