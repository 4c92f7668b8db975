use serde::{Deserialize, Serialize};

/// One of the 16 named compass subdivisions, each 22.5° wide.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindSector {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

/// Half-open `[min, max)` intervals; N wraps through 0°.
const SECTOR_RANGES: [(WindSector, f64, f64); 16] = [
    (WindSector::N, 348.75, 11.25),
    (WindSector::NNE, 11.25, 33.75),
    (WindSector::NE, 33.75, 56.25),
    (WindSector::ENE, 56.25, 78.75),
    (WindSector::E, 78.75, 101.25),
    (WindSector::ESE, 101.25, 123.75),
    (WindSector::SE, 123.75, 146.25),
    (WindSector::SSE, 146.25, 168.75),
    (WindSector::S, 168.75, 191.25),
    (WindSector::SSW, 191.25, 213.75),
    (WindSector::SW, 213.75, 236.25),
    (WindSector::WSW, 236.25, 258.75),
    (WindSector::W, 258.75, 281.25),
    (WindSector::WNW, 281.25, 303.75),
    (WindSector::NW, 303.75, 326.25),
    (WindSector::NNW, 326.25, 348.75),
];

impl WindSector {
    /// Classify a bearing in degrees. Total over `f64`: any real is
    /// normalized into `[0, 360)` first, and non-finite input falls back to N.
    pub fn from_bearing(degrees: f64) -> Self {
        let bearing = normalize_bearing(degrees);

        SECTOR_RANGES
            .iter()
            .find(|(_, min, max)| {
                if min > max {
                    bearing >= *min || bearing < *max
                } else {
                    bearing >= *min && bearing < *max
                }
            })
            .map(|(sector, _, _)| *sector)
            .unwrap_or(WindSector::N)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NNE => "NNE",
            Self::NE => "NE",
            Self::ENE => "ENE",
            Self::E => "E",
            Self::ESE => "ESE",
            Self::SE => "SE",
            Self::SSE => "SSE",
            Self::S => "S",
            Self::SSW => "SSW",
            Self::SW => "SW",
            Self::WSW => "WSW",
            Self::W => "W",
            Self::WNW => "WNW",
            Self::NW => "NW",
            Self::NNW => "NNW",
        }
    }

    /// Arrow pointing the way the wind blows towards.
    pub fn arrow(&self) -> &'static str {
        match self {
            Self::N | Self::NNE => "↓",
            Self::NE | Self::ENE => "↙",
            Self::E | Self::ESE => "←",
            Self::SE | Self::SSE => "↖",
            Self::S | Self::SSW => "↑",
            Self::SW | Self::WSW => "↗",
            Self::W | Self::WNW => "→",
            Self::NW | Self::NNW => "↘",
        }
    }
}

impl std::fmt::Display for WindSector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Map any bearing into `[0, 360)`, e.g. `-10 -> 350`.
pub fn normalize_bearing(degrees: f64) -> f64 {
    let rem = degrees % 360.0;
    if rem < 0.0 { rem + 360.0 } else { rem }
}
