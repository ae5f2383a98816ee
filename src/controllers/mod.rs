//! Controladores: orquestan repositorios y reglas de negocio por recurso

pub mod payment_controller;
pub mod post_controller;
pub mod reservation_controller;
pub mod review_controller;

pub use payment_controller::PaymentController;
pub use post_controller::PostController;
pub use reservation_controller::ReservationController;
pub use review_controller::ReviewController;
