use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    Sterling,
    Euro,
    Dollar,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Self::Sterling, Self::Euro, Self::Dollar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sterling => "GBP",
            Self::Euro => "EUR",
            Self::Dollar => "USD",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Sterling => "£",
            Self::Euro => "€",
            Self::Dollar => "$",
        }
    }

    /// Accepts the ISO code or the glyph.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s) || c.glyph() == s)
    }
}

impl fmt::Display for Currency {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TipPercentage {
    #[default]
    Ten,
    Twenty,
    Thirty,
    Forty,
}

impl TipPercentage {
    pub const ALL: [TipPercentage; 4] = [Self::Ten, Self::Twenty, Self::Thirty, Self::Forty];

    pub fn percent(&self) -> u32 {
        match self {
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::Thirty => 30,
            Self::Forty => 40,
        }
    }

    /// Accepts `20` or `20%`.
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.trim().trim_end_matches('%');
        let value: u32 = digits.trim().parse().ok()?;
        Self::from_percent(value)
    }

    pub fn from_percent(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.percent() == value)
    }
}

impl fmt::Display for TipPercentage {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// The single per-user settings record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    pub currency: Currency,
    pub tip: TipPercentage,
}
