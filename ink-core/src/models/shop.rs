use serde::{Deserialize, Serialize};

use super::{ShopId, ValidationError};

/// A point on the map. Latitude and longitude always travel together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(
        latitude: f64,
        longitude: f64,
    ) -> Result<Self, ValidationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build from a pair of optional columns; exactly one being present is an error.
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, ValidationError> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).map(Some),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ValidationError::MissingField("longitude")),
            (None, Some(_)) => Err(ValidationError::MissingField("latitude")),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    /// Unique across all shops.
    pub name: String,
    pub coordinate: Option<Coordinate>,
}

impl Shop {
    pub fn new(
        name: &str,
        coordinate: Option<Coordinate>,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("shop name"));
        }
        Ok(Self {
            id: ShopId::new(),
            name: name.to_string(),
            coordinate,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn coordinate_rejects_out_of_range() {
        assert_eq!(
            Coordinate::new(91.0, 0.0),
            Err(ValidationError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            Coordinate::new(0.0, -180.5),
            Err(ValidationError::LongitudeOutOfRange(-180.5))
        );
    }

    #[test]
    fn from_parts_requires_both_or_neither() {
        assert_eq!(Coordinate::from_parts(None, None), Ok(None));
        assert!(Coordinate::from_parts(Some(51.5), None).is_err());
        assert!(Coordinate::from_parts(None, Some(-0.12)).is_err());

        let coordinate = Coordinate::from_parts(Some(51.5), Some(-0.12))
            .unwrap()
            .unwrap();
        assert_eq!(coordinate.latitude(), 51.5);
        assert_eq!(coordinate.longitude(), -0.12);
    }

    #[test]
    fn shop_name_is_required() {
        assert_eq!(
            Shop::new("", None),
            Err(ValidationError::MissingField("shop name"))
        );
    }
}
