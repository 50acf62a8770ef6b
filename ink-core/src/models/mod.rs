mod appointment;
mod artist;
mod ids;
mod preferences;
mod review;
mod shop;
mod validation;

pub use appointment::{Appointment, BodyPart, NewAppointment, PhotoRef, Price};
pub use artist::Artist;
pub use ids::{AppointmentId, ArtistId, ShopId};
pub use preferences::{Currency, TipPercentage, UserPreferences};
pub use review::{Rating, Review};
pub use shop::{Coordinate, Shop};
pub use validation::ValidationError;
