use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Candle bucket sizes accepted by the broker candles endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Month,
    Week,
    Day,
    H12,
    H8,
    H6,
    H4,
    H3,
    H2,
    H1,
    M30,
    M15,
    M10,
    M5,
    M4,
    M2,
    M1,
    S30,
    S15,
    S10,
    S5,
}

impl Granularity {
    pub const ALL: [Granularity; 21] = [
        Granularity::Month,
        Granularity::Week,
        Granularity::Day,
        Granularity::H12,
        Granularity::H8,
        Granularity::H6,
        Granularity::H4,
        Granularity::H3,
        Granularity::H2,
        Granularity::H1,
        Granularity::M30,
        Granularity::M15,
        Granularity::M10,
        Granularity::M5,
        Granularity::M4,
        Granularity::M2,
        Granularity::M1,
        Granularity::S30,
        Granularity::S15,
        Granularity::S10,
        Granularity::S5,
    ];

    pub fn from_label(label: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|granularity| granularity.label() == label)
            .ok_or_else(|| AppError::UnknownGranularity(label.to_string()))
    }

    pub fn label(self) -> &'static str {
        match self {
            Granularity::Month => "M",
            Granularity::Week => "W",
            Granularity::Day => "D",
            Granularity::H12 => "H12",
            Granularity::H8 => "H8",
            Granularity::H6 => "H6",
            Granularity::H4 => "H4",
            Granularity::H3 => "H3",
            Granularity::H2 => "H2",
            Granularity::H1 => "H1",
            Granularity::M30 => "M30",
            Granularity::M15 => "M15",
            Granularity::M10 => "M10",
            Granularity::M5 => "M5",
            Granularity::M4 => "M4",
            Granularity::M2 => "M2",
            Granularity::M1 => "M1",
            Granularity::S30 => "S30",
            Granularity::S15 => "S15",
            Granularity::S10 => "S10",
            Granularity::S5 => "S5",
        }
    }

    /// Seconds covered by one candle. Month is a fixed over-estimate used only to size windows.
    pub fn duration_seconds(self) -> i64 {
        match self {
            Granularity::Month => 3_000_000,
            Granularity::Week => 604_800,
            Granularity::Day => 86_400,
            Granularity::H12 => 43_200,
            Granularity::H8 => 28_800,
            Granularity::H6 => 21_600,
            Granularity::H4 => 14_400,
            Granularity::H3 => 10_800,
            Granularity::H2 => 7_200,
            Granularity::H1 => 3_600,
            Granularity::M30 => 1_800,
            Granularity::M15 => 900,
            Granularity::M10 => 600,
            Granularity::M5 => 300,
            Granularity::M4 => 240,
            Granularity::M2 => 120,
            Granularity::M1 => 60,
            Granularity::S30 => 30,
            Granularity::S15 => 15,
            Granularity::S10 => 10,
            Granularity::S5 => 5,
        }
    }
}

/// Look up the bucket length for a broker granularity label.
pub fn duration_seconds(label: &str) -> Result<i64> {
    Granularity::from_label(label).map(Granularity::duration_seconds)
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Granularity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_label(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_durations() {
        assert_eq!(duration_seconds("H4").unwrap(), 14_400);
        assert_eq!(duration_seconds("M5").unwrap(), 300);
        assert_eq!(duration_seconds("D").unwrap(), 86_400);
        assert_eq!(duration_seconds("W").unwrap(), 604_800);
        assert_eq!(duration_seconds("S5").unwrap(), 5);
        assert_eq!(duration_seconds("M").unwrap(), 3_000_000);
    }

    #[test]
    fn every_label_round_trips_with_positive_duration() {
        for granularity in Granularity::ALL {
            let parsed: Granularity = granularity.label().parse().unwrap();
            assert_eq!(parsed, granularity);
            assert!(granularity.duration_seconds() > 0);
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = duration_seconds("X9").unwrap_err();
        assert!(matches!(err, AppError::UnknownGranularity(ref label) if label == "X9"));
        assert!(Granularity::from_label("h1").is_err());
    }
}
