//! Per-observation transform trait.

use crate::error::Result;
use crate::image::Observation;

/// A pure function applied to every observation of a collection.
///
/// Transforms are the band-algebra building blocks of the harmonic pipeline:
/// each one reads some bands of an observation and appends new ones.
///
/// # Implementation Notes
///
/// - Transforms must not depend on other observations
/// - Transforms should append bands rather than overwrite them
/// - Transforms should return `Result` instead of panicking
///
/// # Example
///
/// ```rust
/// use hts_core::{Band, BandName, Observation, Result, Transform};
///
/// struct AddOnes;
///
/// impl Transform for AddOnes {
///     fn apply(&self, obs: Observation) -> Result<Observation> {
///         let n = obs.image().n_pixels();
///         obs.add_band(Band::constant(BandName::input("ones"), 1.0, n))
///     }
/// }
/// ```
pub trait Transform: Send + Sync {
    /// Apply the transform to one observation.
    fn apply(&self, obs: Observation) -> Result<Observation>;

    /// Get the name of this transform for logging/debugging.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A composed transform that applies multiple transforms in sequence.
#[derive(Default)]
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    /// Create a new empty composition.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Add a transform to the composition.
    pub fn push<T: Transform + 'static>(&mut self, transform: T) {
        self.transforms.push(Box::new(transform));
    }

    /// Add a transform, returning the composition.
    #[must_use]
    pub fn then<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.push(transform);
        self
    }

    /// Number of transforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Check if the composition is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Transform for Compose {
    fn apply(&self, mut obs: Observation) -> Result<Observation> {
        for transform in &self.transforms {
            obs = transform.apply(obs)?;
        }
        Ok(obs)
    }

    fn name(&self) -> &str {
        "Compose"
    }
}
