//! Band selection applied to the final composite.

use hts_core::{BandKind, BandName, Image};
use serde::{Deserialize, Serialize};

/// Which bands of the Fourier composite to keep.
///
/// `Summary` keeps the dependent variable together with every coefficient,
/// amplitude and phase band, dropping the design and harmonic bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandSelection {
    /// Keep every band.
    All,
    /// Dependent variable, `*_coef`, `amplitude_*` and `phase_*`.
    Summary,
    /// Keep bands of the listed kinds. `Input` matches the dependent variable.
    Kinds(Vec<BandKind>),
}

impl Default for BandSelection {
    fn default() -> Self {
        Self::Summary
    }
}

impl BandSelection {
    const SUMMARY: [BandKind; 4] = [
        BandKind::Input,
        BandKind::Coefficient,
        BandKind::Amplitude,
        BandKind::Phase,
    ];

    /// Check whether a band is kept.
    #[must_use]
    pub fn keeps(&self, name: &BandName, dependent: &BandName) -> bool {
        let kinds: &[BandKind] = match self {
            Self::All => return true,
            Self::Summary => &Self::SUMMARY,
            Self::Kinds(kinds) => kinds,
        };
        let kind = name.kind();
        if kind == BandKind::Input && name != dependent {
            return false;
        }
        kinds.contains(&kind)
    }

    /// Filter an image, keeping band order.
    #[must_use]
    pub fn apply(&self, image: &Image, dependent: &BandName) -> Image {
        image.select_where(|name| self.keeps(name, dependent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hts_core::{Band, Mode, Term};

    fn image() -> Image {
        let one = Mode::new(1).unwrap();
        let names = vec![
            BandName::input("ndvi"),
            BandName::input("qa"),
            BandName::Term(Term::Constant),
            BandName::Term(Term::Cos(one)),
            BandName::Coefficient(Term::Cos(one)),
            BandName::Phase(one),
            BandName::Amplitude(one),
            BandName::Fitted,
        ];
        Image::from_bands(names.into_iter().map(|n| Band::constant(n, 0.0, 2)).collect()).unwrap()
    }

    fn names(image: &Image) -> Vec<String> {
        image.band_names().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_summary_selection() {
        let selected = BandSelection::Summary.apply(&image(), &BandName::input("ndvi"));
        assert_eq!(names(&selected), vec!["ndvi", "cos_1_coef", "phase_1", "amplitude_1"]);
    }

    #[test]
    fn test_all_selection() {
        let selected = BandSelection::All.apply(&image(), &BandName::input("ndvi"));
        assert_eq!(selected.n_bands(), 8);
    }

    #[test]
    fn test_custom_kinds() {
        let selection = BandSelection::Kinds(vec![BandKind::Amplitude, BandKind::Fitted]);
        let selected = selection.apply(&image(), &BandName::input("ndvi"));
        assert_eq!(names(&selected), vec!["amplitude_1", "fitted"]);
    }

    #[test]
    fn test_selection_serde() {
        let json = r#"{"kinds": ["phase", "coefficient"]}"#;
        let selection: BandSelection = serde_json::from_str(json).unwrap();
        assert_eq!(selection, BandSelection::Kinds(vec![BandKind::Phase, BandKind::Coefficient]));
        let summary: BandSelection = serde_json::from_str("\"summary\"").unwrap();
        assert_eq!(summary, BandSelection::Summary);
    }
}
