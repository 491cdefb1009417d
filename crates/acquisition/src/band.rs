//! Canonical EEG frequency bands

use serde::{Deserialize, Serialize};

/// One of the five canonical EEG frequency bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Band {
    /// 0.5-4 Hz
    Delta,
    /// 4-8 Hz
    Theta,
    /// 8-13 Hz
    Alpha,
    /// 13-30 Hz
    Beta,
    /// 30-100 Hz
    Gamma,
}

impl Band {
    /// All bands in ascending frequency order
    pub const ALL: [Band; 5] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta, Band::Gamma];

    /// Number of bands
    pub const COUNT: usize = 5;

    /// Nominal edges in Hz
    pub fn range_hz(&self) -> (f64, f64) {
        match self {
            Band::Delta => (0.5, 4.0),
            Band::Theta => (4.0, 8.0),
            Band::Alpha => (8.0, 13.0),
            Band::Beta => (13.0, 30.0),
            Band::Gamma => (30.0, 100.0),
        }
    }

    /// Whether a frequency belongs to this band.
    ///
    /// Lower edges are inclusive and upper edges exclusive, except gamma which
    /// also owns 100 Hz, so every frequency in [0.5, 100] has exactly one band.
    pub fn contains(&self, freq: f64) -> bool {
        let (low, high) = self.range_hz();
        match self {
            Band::Gamma => freq >= low && freq <= high,
            _ => freq >= low && freq < high,
        }
    }

    /// Band owning a frequency, if any
    pub fn for_frequency(freq: f64) -> Option<Band> {
        Self::ALL.into_iter().find(|band| band.contains(freq))
    }

    /// Position in [`Band::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Gamma => "gamma",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
