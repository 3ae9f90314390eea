//! GitLab subscription tiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GitLab subscription level, ordered `Free < Premium < Ultimate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Premium,
    Ultimate,
}

impl Tier {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
            Tier::Ultimate => "ultimate",
        }
    }

    /// Whether an instance on this tier can use something requiring `required`
    pub fn satisfies(&self, required: Tier) -> bool {
        *self >= required
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    /// Accepts current names and the legacy plan names GitLab still reports
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" | "core" | "ce" => Ok(Tier::Free),
            "premium" | "starter" | "bronze" | "silver" => Ok(Tier::Premium),
            "ultimate" | "gold" => Ok(Tier::Ultimate),
            other => Err(format!("unknown GitLab tier '{}'", other)),
        }
    }
}
