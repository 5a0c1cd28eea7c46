use std::fmt;
use std::str::FromStr;

/// Stability tier of a version, from most to least stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stability {
    Stable,
    RC,
    Beta,
    Alpha,
    Dev,
}

impl Stability {
    /// Numeric weight, higher means less stable.
    pub fn priority(&self) -> u8 {
        match self {
            Stability::Stable => 0,
            Stability::RC => 5,
            Stability::Beta => 10,
            Stability::Alpha => 15,
            Stability::Dev => 20,
        }
    }

    /// Inverse of [`priority`](Self::priority)
    pub fn from_priority(priority: u8) -> Option<Stability> {
        match priority {
            0 => Some(Stability::Stable),
            5 => Some(Stability::RC),
            10 => Some(Stability::Beta),
            15 => Some(Stability::Alpha),
            20 => Some(Stability::Dev),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stability::Stable => "stable",
            Stability::RC => "RC",
            Stability::Beta => "beta",
            Stability::Alpha => "alpha",
            Stability::Dev => "dev",
        }
    }

    /// All tiers at least as stable as `self`.
    pub fn acceptable(&self) -> Vec<Stability> {
        [
            Stability::Stable,
            Stability::RC,
            Stability::Beta,
            Stability::Alpha,
            Stability::Dev,
        ]
        .into_iter()
        .filter(|s| s.priority() <= self.priority())
        .collect()
    }
}

impl Default for Stability {
    fn default() -> Self {
        Stability::Stable
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stable" => Ok(Stability::Stable),
            "rc" => Ok(Stability::RC),
            "beta" => Ok(Stability::Beta),
            "alpha" => Ok(Stability::Alpha),
            "dev" => Ok(Stability::Dev),
            other => Err(format!("Unknown stability \"{}\"", other)),
        }
    }
}
