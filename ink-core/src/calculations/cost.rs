//! Total spend with a tip surcharge.
//!
//! ```text
//! total = sum(readable prices) × (1 + tip% / 100)
//! ```
//!
//! Prices that do not read as a non-negative decimal are left out of the sum
//! rather than failing the whole total. A total too large for [`Decimal`]
//! saturates at [`Decimal::MAX`].
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use rust_decimal_macros::dec;
//! use ink_core::calculations::total_cost;
//! use ink_core::{BodyPart, NewAppointment, Price};
//!
//! let appointment = NewAppointment {
//!     artist: None,
//!     date: Utc::now(),
//!     price: Price::from_raw("250"),
//!     design: "rose".to_string(),
//!     location: BodyPart::Arm,
//!     notify: false,
//!     shop: None,
//!     review: None,
//!     photo: None,
//! }
//! .into_appointment();
//!
//! assert_eq!(total_cost([&appointment], 20), dec!(300));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use crate::Appointment;

/// `1 + percent / 100`.
pub fn tip_multiplier(tip_percent: u32) -> Decimal {
    Decimal::ONE + Decimal::from(tip_percent) / Decimal::ONE_HUNDRED
}

/// Sum of every readable price, scaled by the tip multiplier. Unrounded.
/// Saturates at [`Decimal::MAX`] on overflow.
pub fn total_cost<'a, I>(
    appointments: I,
    tip_percent: u32,
) -> Decimal
where
    I: IntoIterator<Item = &'a Appointment>,
{
    let mut subtotal = Decimal::ZERO;
    for appointment in appointments {
        let Some(amount) = appointment.price.amount() else {
            debug!(
                id = %appointment.id,
                price = appointment.price.as_str(),
                "skipping unreadable price"
            );
            continue;
        };
        match subtotal.checked_add(amount) {
            Some(sum) => subtotal = sum,
            None => {
                warn!(id = %appointment.id, "total cost overflowed, saturating");
                return Decimal::MAX;
            }
        }
    }

    subtotal
        .checked_mul(tip_multiplier(tip_percent))
        .unwrap_or_else(|| {
            warn!(tip_percent, "total cost with tip overflowed, saturating");
            Decimal::MAX
        })
}

/// Two decimal places, midpoint away from zero. For presentation only.
pub fn round_for_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
