use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AppointmentId, ArtistId, Review, ShopId, ValidationError};

/// Price exactly as it was entered.
///
/// Prices are kept as text so a stored value always round-trips, but
/// [`Price::parse`] is the only constructor the form boundary uses and it
/// rejects anything that is not a non-negative decimal. Rows imported from
/// older data go through [`Price::from_raw`] and may hold text that
/// [`Price::amount`] cannot read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(String);

impl Price {
    /// Validated constructor. Accepts `,` as a thousands separator.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match parse_amount(input) {
            Some(_) => Ok(Self(input.trim().to_string())),
            None => Err(ValidationError::InvalidPrice(input.to_string())),
        }
    }

    /// Wrap stored text without validating it.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_decimal(amount: Decimal) -> Self {
        Self(amount.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The decimal value, or `None` when the text is not a non-negative decimal.
    pub fn amount(&self) -> Option<Decimal> {
        parse_amount(&self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn parse_amount(input: &str) -> Option<Decimal> {
    let normalized = input.trim().replace(',', "");
    if normalized.is_empty() {
        return None;
    }
    normalized
        .parse::<Decimal>()
        .ok()
        .filter(|amount| !amount.is_sign_negative())
}

/// Where on the body the piece goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BodyPart {
    Arm,
    Back,
    Chest,
    Face,
    Foot,
    Hand,
    Head,
    Hip,
    Leg,
    Neck,
    Ribs,
    Shoulder,
    Stomach,
    #[default]
    Other,
}

impl BodyPart {
    pub const ALL: [BodyPart; 14] = [
        Self::Arm,
        Self::Back,
        Self::Chest,
        Self::Face,
        Self::Foot,
        Self::Hand,
        Self::Head,
        Self::Hip,
        Self::Leg,
        Self::Neck,
        Self::Ribs,
        Self::Shoulder,
        Self::Stomach,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arm => "arm",
            Self::Back => "back",
            Self::Chest => "chest",
            Self::Face => "face",
            Self::Foot => "foot",
            Self::Hand => "hand",
            Self::Head => "head",
            Self::Hip => "hip",
            Self::Leg => "leg",
            Self::Neck => "neck",
            Self::Ribs => "ribs",
            Self::Shoulder => "shoulder",
            Self::Stomach => "stomach",
            Self::Other => "other",
        }
    }

    /// Case-insensitive lookup by code.
    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|part| part.as_str() == needle)
    }
}

impl fmt::Display for BodyPart {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to a stored photo. Storage of the image itself lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub artist: Option<ArtistId>,
    pub date: DateTime<Utc>,
    pub price: Price,
    pub design: String,
    pub location: BodyPart,
    pub notify: bool,
    pub shop: Option<ShopId>,
    pub review: Option<Review>,
    pub photo: Option<PhotoRef>,
}

/// For creating new appointments (no id yet)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub artist: Option<ArtistId>,
    pub date: DateTime<Utc>,
    pub price: Price,
    pub design: String,
    pub location: BodyPart,
    pub notify: bool,
    pub shop: Option<ShopId>,
    pub review: Option<Review>,
    pub photo: Option<PhotoRef>,
}

impl NewAppointment {
    /// Assign a fresh identity.
    pub fn into_appointment(self) -> Appointment {
        self.with_id(AppointmentId::new())
    }

    /// Build the record that replaces `id` on edit.
    pub fn with_id(
        self,
        id: AppointmentId,
    ) -> Appointment {
        Appointment {
            id,
            artist: self.artist,
            date: self.date,
            price: self.price,
            design: self.design,
            location: self.location,
            notify: self.notify,
            shop: self.shop,
            review: self.review,
            photo: self.photo,
        }
    }
}
