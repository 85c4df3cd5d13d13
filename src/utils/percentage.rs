use std::{fmt::Display, ops::Deref, str::FromStr};

use anyhow::anyhow;

/// Non-negative share, `12.5` means 12.5%.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Percentage {
    pub const ZERO: Percentage = Percentage(0.);

    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value < 0. || value.is_nan() {
            None
        } else {
            Some(Percentage(value))
        }
    }
}

impl FromStr for Percentage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().trim_end_matches('%');
        Percentage::new_opt(value.parse::<f64>()?)
            .ok_or_else(|| anyhow!("Invalid percentage {s}"))
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `whole` taken by `value`. An empty whole has no shares.
pub fn minutes_percentage(value: f64, whole: f64) -> Percentage {
    if whole <= 0. {
        return Percentage::ZERO;
    }
    Percentage::new_opt(value / whole * 100.).unwrap_or(Percentage::ZERO)
}
