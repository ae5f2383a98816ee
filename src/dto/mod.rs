//! Objetos de transferencia (peticiones y respuestas JSON)

pub mod api_response;
pub mod payment_dto;
pub mod post_dto;
pub mod reservation_dto;
pub mod review_dto;

pub use api_response::ApiResponse;
