//! Repositorios de acceso a datos
//!
//! Cada repositorio encapsula las consultas SQL de una tabla.

pub mod agency_repository;
pub mod payment_repository;
pub mod post_repository;
pub mod reservation_repository;
pub mod review_repository;
pub mod vehicle_repository;

pub use agency_repository::AgencyRepository;
pub use payment_repository::PaymentRepository;
pub use post_repository::PostRepository;
pub use reservation_repository::ReservationRepository;
pub use review_repository::ReviewRepository;
pub use vehicle_repository::VehicleRepository;
