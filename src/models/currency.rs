//! Supported wallet currencies. Only USD is accepted today; new codes are added here
//! and picked up by request validation and configuration parsing.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    USD,
}

impl Currency {
    pub const ALL: &'static [Currency] = &[Currency::USD];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            _ => None,
        }
    }

    /// Human-readable list of accepted codes, e.g. "USD" or "USD, EUR".
    pub fn supported_codes() -> String {
        Self::ALL
            .iter()
            .map(Currency::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
