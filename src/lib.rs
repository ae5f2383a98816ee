//! Backend del marketplace de alquiler de vehículos
//!
//! Las agencias publican sus vehículos como posts; los clientes filtran el
//! listado, reservan con recogida en agencia o entrega a domicilio y pagan.

pub mod client;
pub mod config;
pub mod controllers;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::cors_middleware;
use crate::state::AppState;

/// Router completo de la API con sus capas
pub fn build_router(state: AppState) -> Router {
    let cors = cors_middleware(&state.config.cors_origins);

    Router::new()
        .merge(routes::create_health_router())
        .nest("/api/posts", routes::create_post_router())
        .nest("/api/reviews", routes::create_review_router())
        .nest("/api/reservations", routes::create_reservation_router())
        .nest("/api/payments", routes::create_payment_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
