//! The appointment form: raw user text in, a validated [`NewAppointment`] out.
//!
//! Both the `add`/`edit` commands and CSV import fill one of these, so the
//! same rules apply whichever way a record arrives.

use ink_core::{
    Appointment, Artist, BodyPart, NewAppointment, PhotoRef, Price, Rating, Review, Shop,
};
use thiserror::Error;

use crate::utils::parse_datetime;

/// Every problem found in one pass over the form.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{}", .0.join("; "))]
pub struct InvalidForm(pub Vec<String>);

/// Form state for creating or editing an appointment. Empty strings mean
/// "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentForm {
    pub date: String,
    pub price: String,
    pub design: String,
    pub location: String,
    pub notify: bool,
    /// Artist name or id.
    pub artist: String,
    /// Shop name or id.
    pub shop: String,
    pub rating: String,
    pub comment: String,
    pub photo: String,
}

impl AppointmentForm {
    /// Prefill from a stored record so an edit only has to overwrite what
    /// changes.
    pub fn from_appointment(appointment: &Appointment) -> Self {
        Self {
            date: appointment.date.to_rfc3339(),
            price: appointment.price.as_str().to_string(),
            design: appointment.design.clone(),
            location: appointment.location.as_str().to_string(),
            notify: appointment.notify,
            artist: appointment
                .artist
                .map(|id| id.to_string())
                .unwrap_or_default(),
            shop: appointment.shop.map(|id| id.to_string()).unwrap_or_default(),
            rating: appointment
                .review
                .as_ref()
                .map(|r| r.rating.value().to_string())
                .unwrap_or_default(),
            comment: appointment
                .review
                .as_ref()
                .and_then(|r| r.comment.clone())
                .unwrap_or_default(),
            photo: appointment
                .photo
                .as_ref()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse the form into a [`NewAppointment`], collecting every error
    /// rather than stopping at the first.
    pub fn validate(
        &self,
        artists: &[Artist],
        shops: &[Shop],
    ) -> Result<NewAppointment, InvalidForm> {
        let mut errors = Vec::new();

        let date = required(&mut errors, "date", &self.date)
            .and_then(|raw| parse_datetime(raw).map_err(|e| errors.push(e.to_string())).ok());

        let price = required(&mut errors, "price", &self.price)
            .and_then(|raw| Price::parse(raw).map_err(|e| errors.push(e.to_string())).ok());

        let design = required(&mut errors, "design", &self.design).map(str::to_string);

        let location = match self.location.trim() {
            "" => Some(BodyPart::default()),
            raw => BodyPart::parse(raw).or_else(|| {
                errors.push(format!("unknown body part '{raw}'"));
                None
            }),
        };

        let artist = resolve(&mut errors, "artist", &self.artist, artists, |a: &Artist| {
            (a.id, a.name.as_str())
        });
        let shop = resolve(&mut errors, "shop", &self.shop, shops, |s: &Shop| {
            (s.id, s.name.as_str())
        });

        let review = self.review(&mut errors);

        let (Some(date), Some(price), Some(design), Some(location), Some(artist), Some(shop)) =
            (date, price, design, location, artist, shop)
        else {
            return Err(InvalidForm(errors));
        };
        if !errors.is_empty() {
            return Err(InvalidForm(errors));
        }

        Ok(NewAppointment {
            artist,
            date,
            price,
            design,
            location,
            notify: self.notify,
            shop,
            review,
            photo: Some(self.photo.trim())
                .filter(|p| !p.is_empty())
                .map(PhotoRef::new),
        })
    }

    fn review(
        &self,
        errors: &mut Vec<String>,
    ) -> Option<Review> {
        let rating = self.rating.trim();
        let comment = self.comment.trim();
        if rating.is_empty() {
            if !comment.is_empty() {
                errors.push("a review comment needs a rating".to_string());
            }
            return None;
        }

        let value = match rating.parse::<i64>() {
            Ok(v) => v,
            Err(_) => {
                errors.push(format!("rating '{rating}' must be a whole number"));
                return None;
            }
        };
        match Rating::new(value) {
            Ok(rating) => Some(Review::new(rating, Some(comment.to_string()))),
            Err(e) => {
                errors.push(e.to_string());
                None
            }
        }
    }
}

fn required<'a>(
    errors: &mut Vec<String>,
    field: &str,
    value: &'a str,
) -> Option<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(format!("{field} is required"));
        return None;
    }
    Some(trimmed)
}

/// Look up an optional reference by id or case-insensitive name. The outer
/// `Option` is `None` on failure; the inner one is the reference itself.
fn resolve<T, Id>(
    errors: &mut Vec<String>,
    kind: &str,
    value: &str,
    candidates: &[T],
    key: impl Fn(&T) -> (Id, &str),
) -> Option<Option<Id>>
where
    Id: Copy + std::fmt::Display,
{
    let needle = value.trim();
    if needle.is_empty() {
        return Some(None);
    }
    let found = candidates.iter().map(&key).find(|(id, name)| {
        id.to_string().eq_ignore_ascii_case(needle) || name.eq_ignore_ascii_case(needle)
    });
    match found {
        Some((id, _)) => Some(Some(id)),
        None => {
            errors.push(format!("unknown {kind} '{needle}'"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn filled() -> AppointmentForm {
        AppointmentForm {
            date: "2026-06-01T14:00:00Z".to_string(),
            price: "1,200.00".to_string(),
            design: "koi back piece".to_string(),
            location: "Back".to_string(),
            notify: true,
            ..Default::default()
        }
    }

    #[test]
    fn valid_form_produces_appointment() {
        let new = filled().validate(&[], &[]).unwrap();

        assert_eq!(new.date, Utc.with_ymd_and_hms(2026, 6, 1, 14, 0, 0).unwrap());
        assert_eq!(new.price.as_str(), "1,200.00");
        assert_eq!(new.price.amount(), Some(dec!(1200)));
        assert_eq!(new.design, "koi back piece");
        assert_eq!(new.location, BodyPart::Back);
        assert!(new.notify);
        assert_eq!(new.artist, None);
        assert_eq!(new.review, None);
        assert_eq!(new.photo, None);
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let errors = AppointmentForm::default().validate(&[], &[]).unwrap_err();

        assert_eq!(
            errors.0,
            vec![
                "date is required".to_string(),
                "price is required".to_string(),
                "design is required".to_string(),
            ]
        );
    }

    #[test]
    fn bad_price_and_location_are_reported_together() {
        let form = AppointmentForm {
            price: "-20".to_string(),
            location: "elbow pit".to_string(),
            ..filled()
        };

        let errors = form.validate(&[], &[]).unwrap_err();

        assert_eq!(errors.0.len(), 2);
        assert!(errors.0[0].starts_with("invalid price '-20'"));
        assert_eq!(errors.0[1], "unknown body part 'elbow pit'");
    }

    #[test]
    fn blank_location_defaults_to_other() {
        let form = AppointmentForm {
            location: String::new(),
            ..filled()
        };

        assert_eq!(form.validate(&[], &[]).unwrap().location, BodyPart::Other);
    }

    #[test]
    fn artist_resolves_by_name_or_id() {
        let ami = Artist::new("Ami James", Some("@ami")).unwrap();
        let artists = vec![ami.clone()];

        let by_name = AppointmentForm {
            artist: "ami james".to_string(),
            ..filled()
        };
        let by_id = AppointmentForm {
            artist: ami.id.to_string(),
            ..filled()
        };

        assert_eq!(by_name.validate(&artists, &[]).unwrap().artist, Some(ami.id));
        assert_eq!(by_id.validate(&artists, &[]).unwrap().artist, Some(ami.id));
    }

    #[test]
    fn unknown_shop_is_an_error() {
        let form = AppointmentForm {
            shop: "Nowhere Ink".to_string(),
            ..filled()
        };

        let errors = form.validate(&[], &[]).unwrap_err();

        assert_eq!(errors.0, vec!["unknown shop 'Nowhere Ink'".to_string()]);
    }

    #[test]
    fn review_needs_a_valid_rating() {
        let comment_only = AppointmentForm {
            comment: "lovely linework".to_string(),
            ..filled()
        };
        let out_of_range = AppointmentForm {
            rating: "6".to_string(),
            ..filled()
        };
        let rated = AppointmentForm {
            rating: "5".to_string(),
            comment: "lovely linework".to_string(),
            ..filled()
        };

        assert!(comment_only.validate(&[], &[]).is_err());
        assert!(out_of_range.validate(&[], &[]).is_err());
        let review = rated.validate(&[], &[]).unwrap().review.unwrap();
        assert_eq!(review.rating.value(), 5);
        assert_eq!(review.comment.as_deref(), Some("lovely linework"));
    }

    #[test]
    fn prefill_then_validate_reproduces_the_record() {
        let original = filled().validate(&[], &[]).unwrap().into_appointment();

        let again = AppointmentForm::from_appointment(&original)
            .validate(&[], &[])
            .unwrap()
            .with_id(original.id);

        assert_eq!(again, original);
    }

    #[test]
    fn invalid_form_displays_all_errors() {
        let err = InvalidForm(vec!["date is required".into(), "price is required".into()]);
        assert_eq!(err.to_string(), "date is required; price is required");
    }
}
