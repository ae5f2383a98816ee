//! Modelos del sistema
//!
//! Estos modelos mapean las tablas PostgreSQL del marketplace.

pub mod agency;
pub mod payment;
pub mod post;
pub mod rating;
pub mod reservation;
pub mod review;
pub mod vehicle;

pub use agency::Agency;
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use post::{DeliveryOption, Post, PostStatus};
pub use rating::{RatingBreakdown, RatingDistribution, RatingSummary};
pub use reservation::{PickupType, Reservation, ReservationStatus};
pub use review::Review;
pub use vehicle::{Vehicle, VehicleStatus};
