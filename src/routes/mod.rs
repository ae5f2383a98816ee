//! Routers HTTP por recurso

pub mod health_routes;
pub mod payment_routes;
pub mod post_routes;
pub mod reservation_routes;
pub mod review_routes;

pub use health_routes::create_health_router;
pub use payment_routes::create_payment_router;
pub use post_routes::create_post_router;
pub use reservation_routes::create_reservation_router;
pub use review_routes::create_review_router;
