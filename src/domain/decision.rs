// src/domain/decision.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Rent,
}

impl Decision {
    /// BUY only when buying is strictly cheaper; ties go to RENT.
    pub fn classify(final_buying_cost: f64, final_renting_cost: f64) -> Self {
        if final_buying_cost < final_renting_cost {
            Decision::Buy
        } else {
            Decision::Rent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Rent => "RENT",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Decision::Buy),
            "RENT" => Ok(Decision::Rent),
            other => Err(format!("unknown decision '{other}'")),
        }
    }
}
