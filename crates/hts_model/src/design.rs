//! Design-matrix bands: constant, angular time and harmonics.

use hts_core::{angular_time, Band, BandName, Compose, ModeSet, Observation, Result, Term, Transform};

/// Appends the `constant` band (all ones).
#[derive(Debug, Clone, Default)]
pub struct AddConstant;

impl Transform for AddConstant {
    fn apply(&self, obs: Observation) -> Result<Observation> {
        let n = obs.image().n_pixels();
        obs.add_band(Band::constant(Term::Constant, 1.0, n))
    }

    fn name(&self) -> &str {
        "AddConstant"
    }
}

/// Appends the angular time band `t`.
#[derive(Debug, Clone, Default)]
pub struct AddTime;

impl Transform for AddTime {
    fn apply(&self, obs: Observation) -> Result<Observation> {
        let n = obs.image().n_pixels();
        let t = angular_time(obs.timestamp());
        obs.add_band(Band::constant(Term::Time, t, n))
    }

    fn name(&self) -> &str {
        "AddTime"
    }
}

/// Appends `cos_<m>` and `sin_<m>` bands computed from `t`.
///
/// All cosines come first in mode order, then all sines.
#[derive(Debug, Clone)]
pub struct AddHarmonics {
    modes: ModeSet,
}

impl AddHarmonics {
    /// Create the transform for a mode set.
    #[must_use]
    pub fn new(modes: ModeSet) -> Self {
        Self { modes }
    }

    /// The terms this transform appends, in band order.
    #[must_use]
    pub fn terms(&self) -> Vec<Term> {
        harmonic_terms(&self.modes)
    }
}

/// Cosine terms for every mode followed by sine terms for every mode.
#[must_use]
pub fn harmonic_terms(modes: &ModeSet) -> Vec<Term> {
    modes
        .iter()
        .map(Term::Cos)
        .chain(modes.iter().map(Term::Sin))
        .collect()
}

/// The transforms that generate the bands of `terms` from a bare observation.
///
/// `t` is generated whenever a harmonic term is requested.
pub fn design_transform(terms: &[Term]) -> Result<Compose> {
    let mut design = Compose::new();
    if terms.contains(&Term::Constant) {
        design.push(AddConstant);
    }
    let modes: Vec<_> = terms
        .iter()
        .filter_map(|t| match t {
            Term::Cos(m) => Some(*m),
            _ => None,
        })
        .collect();
    if terms.contains(&Term::Time) || !modes.is_empty() {
        design.push(AddTime);
    }
    if !modes.is_empty() {
        design.push(AddHarmonics::new(ModeSet::new(modes)?));
    }
    Ok(design)
}

impl Transform for AddHarmonics {
    fn apply(&self, obs: Observation) -> Result<Observation> {
        let t = obs.image().values(&BandName::Term(Term::Time))?.clone();
        let mut image = obs.image().clone();
        for mode in &self.modes {
            let f = mode.frequency();
            image.push(Band::new(Term::Cos(mode), t.mapv(|t| (t * f).cos())))?;
        }
        for mode in &self.modes {
            let f = mode.frequency();
            image.push(Band::new(Term::Sin(mode), t.mapv(|t| (t * f).sin())))?;
        }
        Ok(obs.with_image(image))
    }

    fn name(&self) -> &str {
        "AddHarmonics"
    }
}
